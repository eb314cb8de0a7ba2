use serde::{Deserialize, Serialize};
use settings::Language;

/// A label bound to one configured language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedLabel {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub label: String,
}

impl LocalizedLabel {
    pub fn new(language: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            label: label.into(),
        }
    }
}

/// Normalize a sparse label list into exactly one entry per configured
/// language.
///
/// Raw entries naming a configured language are kept first, in raw order,
/// falling back to `default_text` when their label is empty; configured
/// languages still missing are then appended in configured order with
/// `default_text`. Entries naming unconfigured languages (or no language at
/// all) are ignored; on duplicates the first raw entry wins.
pub fn localize(
    raw: &[LocalizedLabel],
    default_text: &str,
    languages: &[Language],
) -> Vec<LocalizedLabel> {
    let mut out: Vec<LocalizedLabel> = Vec::with_capacity(languages.len());

    for entry in raw {
        if entry.language.is_empty() {
            continue;
        }
        if !languages.iter().any(|lang| lang.id == entry.language) {
            continue;
        }
        if out.iter().any(|kept| kept.language == entry.language) {
            continue;
        }
        let label = if entry.label.is_empty() {
            default_text.to_string()
        } else {
            entry.label.clone()
        };
        out.push(LocalizedLabel::new(entry.language.clone(), label));
    }

    for lang in languages {
        if !out.iter().any(|kept| kept.language == lang.id) {
            out.push(LocalizedLabel::new(lang.id.clone(), default_text));
        }
    }

    out
}
