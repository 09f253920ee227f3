//! Viewer data structures: models, textures, scene bookkeeping and helpers.
//!
//! - `color` converts configured hex colours into linear values
//! - `grid` builds the line geometry of the grid helper
//! - `instance` holds the model transform uploaded next to the vertices
//! - `model` contains CPU load results and their GPU counterparts
//! - `scene` is the container of models, lights and helpers
//! - `texture` wraps GPU textures and their creation

pub mod color;
pub mod grid;
pub mod instance;
pub mod model;
pub mod scene;
pub mod texture;
