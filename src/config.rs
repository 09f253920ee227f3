//! Viewer configuration: a RON file, overridden by the command line.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::{
    camera::{Camera, OrbitControls},
    data_structures::scene::{Helper, Light},
    error::ViewerError,
    resources::{AssetFormat, AssetSource, LoadRequest},
};

pub const DEFAULT_MODEL: &str = "assets/models/Julia_Sculpt.fbx";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub title: String,
    /// Model loaded at startup; `None` starts with an empty scene.
    pub model: Option<StartupModel>,
    /// Overrides the per-format unit normalisation of every load.
    pub model_scale: Option<f32>,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    /// Clear colour as `0xRRGGBB`.
    pub background: u32,
    pub lights: Vec<Light>,
    pub helpers: Vec<Helper>,
    /// Extensions accepted by drag and drop, without the dot.
    pub accepted_drop_extensions: Vec<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            title: "flow-viewer".to_string(),
            model: Some(StartupModel {
                location: DEFAULT_MODEL.to_string(),
                format: None,
            }),
            model_scale: None,
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            background: 0xaaaaaa,
            lights: vec![
                Light::Ambient {
                    color: 0x404040,
                    intensity: 2.0,
                },
                Light::Directional {
                    color: 0xffffff,
                    intensity: 1.0,
                    position: [10.0, 10.0, 10.0],
                },
            ],
            helpers: vec![Helper::Grid {
                size: 100.0,
                divisions: 100,
            }],
            accepted_drop_extensions: vec!["fbx".to_string()],
        }
    }
}

impl ViewerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ViewerError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ViewerError::Config {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })?;
        Self::parse(&text, path)
    }

    /// `path` is only used in the error.
    pub fn parse(text: &str, path: &Path) -> Result<Self, ViewerError> {
        ron::from_str(text).map_err(|e| ViewerError::Config {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })
    }

    /// The load to start with, if any.
    pub fn startup_request(&self) -> Result<Option<LoadRequest>, ViewerError> {
        self.model
            .as_ref()
            .map(|m| m.request(self.model_scale))
            .transpose()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StartupModel {
    /// File path or `http(s)://` URL.
    pub location: String,
    /// Inferred from the extension when absent.
    #[serde(default)]
    pub format: Option<AssetFormat>,
}

impl StartupModel {
    pub fn request(&self, scale: Option<f32>) -> Result<LoadRequest, ViewerError> {
        let source = AssetSource::parse(&self.location)?;
        let format = self
            .format
            .or_else(|| source.format())
            .ok_or_else(|| ViewerError::UnsupportedFormat {
                name: source.name(),
                accepted: ".fbx, .obj, .gltf, .glb".to_string(),
            })?;
        Ok(LoadRequest::new(source, format).with_scale(scale))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.7, 1.37, 2.5],
            target: [0.0, 0.0, 0.0],
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraConfig {
    pub fn camera(&self) -> Camera {
        Camera::new(
            self.position,
            self.target,
            cgmath::Deg(self.fov_degrees),
            self.near,
            self.far,
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            damping_factor: 0.05,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.1,
            max_distance: 500.0,
        }
    }
}

impl ControlsConfig {
    pub fn controls(&self) -> OrbitControls {
        let mut controls = OrbitControls::new(self.damping_factor)
            .with_distance_limits(self.min_distance, self.max_distance);
        controls.rotate_speed = self.rotate_speed;
        controls.pan_speed = self.pan_speed;
        controls.zoom_speed = self.zoom_speed;
        controls
    }
}

fn parse_format(s: &str) -> Result<AssetFormat, String> {
    match s.to_ascii_lowercase().as_str() {
        "objmtl" | "obj+mtl" => Ok(AssetFormat::ObjMtl),
        other => AssetFormat::from_extension(other)
            .ok_or_else(|| format!("unknown format {s}, expected fbx, obj or gltf")),
    }
}

#[derive(Debug, Parser)]
#[command(name = "flow-viewer")]
#[command(about = "View FBX, OBJ+MTL and glTF models; drop a file on the window to replace the model")]
pub struct Cli {
    /// Model file or http(s) URL to show at startup
    pub model: Option<String>,
    /// Format of the model when the extension does not tell
    #[arg(long, value_parser = parse_format)]
    pub format: Option<AssetFormat>,
    /// RON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Uniform scale applied to loaded models
    #[arg(long)]
    pub scale: Option<f32>,
}

impl Cli {
    /// The configuration file (or defaults) with the command line applied on top.
    pub fn into_config(self) -> Result<ViewerConfig, ViewerError> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)?,
            None => ViewerConfig::default(),
        };
        if let Some(location) = self.model {
            config.model = Some(StartupModel {
                location,
                format: self.format,
            });
        } else if let (Some(format), Some(model)) = (self.format, config.model.as_mut()) {
            model.format = Some(format);
        }
        if self.scale.is_some() {
            config.model_scale = self.scale;
        }
        Ok(config)
    }
}
