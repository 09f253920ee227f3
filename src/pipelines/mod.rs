//! Render pipelines: lit models, the grid helper and the drop overlay.

pub mod basic;
pub mod grid;
pub mod light;
pub mod overlay;
