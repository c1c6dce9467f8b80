//! Note graph: the authoritative model and neighborhood highlighting.

pub mod model;
pub mod selection;

pub use model::{Edge, GraphModel, LoadReport, RelationUpdate};
pub use selection::Highlight;
