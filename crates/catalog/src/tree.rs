//! The display tree: groups and contexts in index-addressed storage.
//!
//! `ItemId` doubles as the arena index — ids are handed out in insertion
//! order and never reused — so direct lookups stay O(1) while `find_by_id`
//! still answers reachability for an arbitrary subtree. The parent relation
//! is a stored id on the child, never an owning reference.

use settings::Language;

use crate::document::{ContextDoc, DocId, GroupDoc};
use crate::ids::{ItemId, LayerId};
use crate::labels::{LocalizedLabel, localize};
use crate::layer::{Layer, LayerSet};

/// A named, orderable subset of layers: one selectable map view.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    pub id: ItemId,
    pub parent: Option<ItemId>,
    pub info_file: Option<String>,
    pub labels: Vec<LocalizedLabel>,
    /// Identity as given in the source document; only used to resolve group
    /// references during construction, never persisted.
    pub original_id: Option<DocId>,
    pub active: bool,
    /// Ordered layer references; order drives rendering and legend order, and
    /// structural duplicates are allowed.
    pub layers: Vec<LayerId>,
    pub inline_legend_url: Option<String>,
}

impl Context {
    pub fn from_doc(
        doc: &ContextDoc,
        id: ItemId,
        layers: &LayerSet,
        languages: &[Language],
    ) -> Self {
        // Unresolved layer references are dropped, not errors: the document
        // may be hand-edited or partially migrated.
        let resolved = doc
            .layers
            .iter()
            .flatten()
            .filter_map(|doc_id| layers.find_by_original(doc_id))
            .map(|layer| layer.id)
            .collect();

        Self {
            id,
            parent: None,
            info_file: doc.info_file.clone().filter(|s| !s.is_empty()),
            labels: localize(&doc.labels, "", languages),
            original_id: doc.id.clone(),
            active: doc.active,
            layers: resolved,
            inline_legend_url: doc.inline_legend_url.clone().filter(|s| !s.is_empty()),
        }
    }

    /// Placeholder for a context a group references but the document never
    /// defines; labelled with the missing identifier so the tree still
    /// renders.
    pub fn dummy(id: ItemId, original: DocId, languages: &[Language]) -> Self {
        Self {
            id,
            parent: None,
            info_file: None,
            labels: localize(&[], &original.to_string(), languages),
            original_id: Some(original),
            active: false,
            layers: Vec::new(),
            inline_legend_url: None,
        }
    }

    /// True iff any referenced layer exposes a legend image or a localized
    /// style label.
    pub fn has_legends(&self, layers: &LayerSet) -> bool {
        self.layers
            .iter()
            .any(|id| layers.get(*id).is_some_and(Layer::has_legend))
    }
}

/// A display-tree node holding ordered children, optionally with
/// radio-button (single-select) semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: ItemId,
    pub parent: Option<ItemId>,
    pub info_file: Option<String>,
    pub labels: Vec<LocalizedLabel>,
    pub exclusive: bool,
    /// Only meaningful on exclusive groups; documents predating the field
    /// get `Some(true)`.
    pub allow_disable_all: Option<bool>,
    pub items: Vec<ItemId>,
}

impl Group {
    pub fn from_doc(
        doc: &GroupDoc,
        id: ItemId,
        parent: Option<ItemId>,
        languages: &[Language],
    ) -> Self {
        let allow_disable_all = if doc.exclusive {
            Some(doc.allow_disable_all.unwrap_or(true))
        } else {
            None
        };

        Self {
            id,
            parent,
            info_file: doc.info_file.clone().filter(|s| !s.is_empty()),
            labels: localize(&doc.labels, "", languages),
            exclusive: doc.exclusive,
            allow_disable_all,
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Group(Group),
    Context(Context),
}

impl Item {
    pub fn id(&self) -> ItemId {
        match self {
            Item::Group(g) => g.id,
            Item::Context(c) => c.id,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Item::Group(_))
    }

    pub fn parent(&self) -> Option<ItemId> {
        match self {
            Item::Group(g) => g.parent,
            Item::Context(c) => c.parent,
        }
    }

    pub fn labels(&self) -> &[LocalizedLabel] {
        match self {
            Item::Group(g) => &g.labels,
            Item::Context(c) => &c.labels,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Item::Group(g) => Some(g),
            Item::Context(_) => None,
        }
    }

    pub fn as_context(&self) -> Option<&Context> {
        match self {
            Item::Context(c) => Some(c),
            Item::Group(_) => None,
        }
    }
}

/// Index-addressed storage for every group and context of one configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemArena {
    items: Vec<Item>,
}

impl ItemArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an item under its own id. Ids come from the build's allocator in
    /// insertion order, so the id always lands at its index.
    pub fn insert(&mut self, item: Item) -> ItemId {
        let id = item.id();
        debug_assert_eq!(id.0 as usize, self.items.len());
        self.items.push(item);
        id
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(id.0 as usize)
    }

    pub fn group(&self, id: ItemId) -> Option<&Group> {
        self.get(id).and_then(Item::as_group)
    }

    pub fn group_mut(&mut self, id: ItemId) -> Option<&mut Group> {
        match self.get_mut(id) {
            Some(Item::Group(g)) => Some(g),
            _ => None,
        }
    }

    pub fn context(&self, id: ItemId) -> Option<&Context> {
        self.get(id).and_then(Item::as_context)
    }

    pub fn context_mut(&mut self, id: ItemId) -> Option<&mut Context> {
        match self.get_mut(id) {
            Some(Item::Context(c)) => Some(c),
            _ => None,
        }
    }

    pub fn set_parent(&mut self, child: ItemId, parent: Option<ItemId>) {
        match self.get_mut(child) {
            Some(Item::Group(g)) => g.parent = parent,
            Some(Item::Context(c)) => c.parent = parent,
            None => {}
        }
    }

    /// Depth-first search in child-list order, starting at (and including)
    /// `start`; contexts never match beyond themselves.
    pub fn find_by_id(&self, start: ItemId, id: ItemId) -> Option<ItemId> {
        let item = self.get(start)?;
        if item.id() == id {
            return Some(id);
        }
        if let Item::Group(group) = item {
            for child in &group.items {
                if let Some(found) = self.find_by_id(*child, id) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Left-to-right depth-first fold over the context leaves reachable from
    /// `start`; groups are transparent.
    pub fn reduce_contexts<T>(
        &self,
        start: ItemId,
        seed: T,
        combine: &mut impl FnMut(T, &Context) -> T,
    ) -> T {
        match self.get(start) {
            Some(Item::Context(context)) => combine(seed, context),
            Some(Item::Group(group)) => {
                let mut acc = seed;
                for child in &group.items {
                    acc = self.reduce_contexts(*child, acc, combine);
                }
                acc
            }
            None => seed,
        }
    }

    /// Context ids reachable from `start`, in tree order; one entry per tree
    /// occurrence.
    pub fn contexts_under(&self, start: ItemId) -> Vec<ItemId> {
        self.reduce_contexts(start, Vec::new(), &mut |mut acc, context| {
            acc.push(context.id);
            acc
        })
    }

    /// Concatenated layer references of every reachable context, tree order,
    /// not deduplicated.
    pub fn layers_under(&self, start: ItemId) -> Vec<LayerId> {
        self.reduce_contexts(start, Vec::new(), &mut |mut acc, context| {
            acc.extend_from_slice(&context.layers);
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdAlloc;
    use pretty_assertions::assert_eq;

    fn langs() -> Vec<Language> {
        vec![Language::new("en", "English")]
    }

    /// root ── g1 ── c1
    ///      └─ c2
    fn sample() -> (ItemArena, ItemId) {
        let mut ids = IdAlloc::new();
        let mut arena = ItemArena::new();
        let langs = langs();

        let root = ItemId(ids.allocate());
        arena.insert(Item::Group(Group::from_doc(&GroupDoc::default(), root, None, &langs)));
        let g1 = ItemId(ids.allocate());
        arena.insert(Item::Group(Group::from_doc(&GroupDoc::default(), g1, Some(root), &langs)));
        let c1 = ItemId(ids.allocate());
        arena.insert(Item::Context(Context::dummy(c1, DocId::from("c1"), &langs)));
        let c2 = ItemId(ids.allocate());
        arena.insert(Item::Context(Context::dummy(c2, DocId::from("c2"), &langs)));

        arena.group_mut(g1).unwrap().items = vec![c1];
        arena.group_mut(root).unwrap().items = vec![g1, c2];
        arena.set_parent(c1, Some(g1));
        arena.set_parent(c2, Some(root));
        (arena, root)
    }

    #[test]
    fn find_by_id_walks_depth_first() {
        let (arena, root) = sample();
        assert_eq!(arena.find_by_id(root, root), Some(root));
        assert_eq!(arena.find_by_id(root, ItemId(2)), Some(ItemId(2)));
        assert_eq!(arena.find_by_id(root, ItemId(99)), None);
        // A context only matches itself.
        assert_eq!(arena.find_by_id(ItemId(2), ItemId(3)), None);
        assert_eq!(arena.find_by_id(ItemId(2), ItemId(2)), Some(ItemId(2)));
    }

    #[test]
    fn reduce_visits_context_leaves_in_tree_order() {
        let (arena, root) = sample();
        assert_eq!(arena.contexts_under(root), vec![ItemId(2), ItemId(3)]);
    }

    #[test]
    fn layers_under_concatenates_without_dedup() {
        let (mut arena, root) = sample();
        arena.context_mut(ItemId(2)).unwrap().layers = vec![LayerId(0), LayerId(1)];
        arena.context_mut(ItemId(3)).unwrap().layers = vec![LayerId(1)];
        assert_eq!(
            arena.layers_under(root),
            vec![LayerId(0), LayerId(1), LayerId(1)]
        );
    }

    #[test]
    fn dummy_contexts_carry_the_missing_id_as_label() {
        let ctx = Context::dummy(ItemId(7), DocId::from(99u32), &langs());
        assert_eq!(ctx.labels, vec![LocalizedLabel::new("en", "99")]);
        assert!(ctx.layers.is_empty());
        assert!(!ctx.active);
        assert_eq!(ctx.original_id, Some(DocId::from(99u32)));
    }

    #[test]
    fn exclusive_groups_default_allow_disable_all() {
        let langs = langs();
        let exclusive: GroupDoc =
            serde_json::from_str(r#"{ "exclusive": true }"#).unwrap();
        let pinned: GroupDoc =
            serde_json::from_str(r#"{ "exclusive": true, "allowDisableAll": false }"#).unwrap();
        let plain = GroupDoc::default();

        let g = Group::from_doc(&exclusive, ItemId(0), None, &langs);
        assert_eq!(g.allow_disable_all, Some(true));
        let g = Group::from_doc(&pinned, ItemId(1), None, &langs);
        assert_eq!(g.allow_disable_all, Some(false));
        let g = Group::from_doc(&plain, ItemId(2), None, &langs);
        assert_eq!(g.allow_disable_all, None);
    }
}
