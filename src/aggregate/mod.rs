pub mod graph;
pub mod langs;
pub mod types;

pub use graph::collab_graph;
pub use langs::{lang_series, sort_by_date};
pub use types::type_totals;
