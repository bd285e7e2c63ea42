mod engine;
mod ordering;
mod placement;
mod rank;
mod types;

pub use engine::LayoutEngine;
pub use types::{Layout, LayoutNode};
