//! flow-viewer
//!
//! A minimal 3D model viewer built on wgpu and winit. It frames a single
//! model (FBX, OBJ+MTL or glTF) under an ambient and a directional light,
//! lets the user orbit, pan and zoom around it and replaces the model when a
//! file is dropped onto the window.
//!
//! High-level modules
//! - `camera`: camera, its uniform and the damped orbit controls
//! - `config`: RON configuration and command line options
//! - `context`: GPU context that owns device/queue/pipelines and draws the scene
//! - `data_structures`: scene composition, CPU and GPU model data, textures
//! - `drop_zone`: drag-and-drop state machine feeding the loader
//! - `flow`: the winit application shell and event loop
//! - `pipelines`: render pipelines for models, the grid helper and the drop overlay
//! - `render`: per-frame sequencing of viewport update and scene draw
//! - `resources`: asset loading with progress, cancellation and format parsers
//! - `status`: window title status line and modal alerts
//! - `viewer`: the displayed scene and which load may replace its model
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod drop_zone;
pub mod error;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod status;
pub mod viewer;

pub use config::{Cli, ViewerConfig};
pub use error::{LoadError, ViewerError};
pub use flow::run;
