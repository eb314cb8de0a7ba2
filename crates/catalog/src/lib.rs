pub mod build;
pub mod document;
pub mod ids;
pub mod labels;
pub mod layer;
pub mod serialize;
pub mod tree;

pub use build::*;
pub use document::*;
pub use ids::*;
pub use labels::*;
pub use layer::*;
pub use serialize::*;
pub use tree::*;
