//! Node components
//!
//! Every component is exclusively owned by one node and dropped with it.
//! Loaders populate them; the scene only mutates already-built components.

pub mod color;
pub mod sprite;
pub mod transform;
pub mod ui;

pub use color::NodeColor;
pub use sprite::{NodeFrame, Region, Sprite};
pub use transform::Transform;
pub use ui::NodeUI;
