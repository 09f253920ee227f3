//! Asset loading: turns a path, URL or byte buffer into [`ModelData`].
//!
//! Bytes are transferred with progress reporting, then handed to the parser
//! of the declared [`AssetFormat`] on a blocking worker. Nothing in here
//! touches the GPU; see [`Model::upload`](crate::data_structures::model::Model::upload).

use std::{
    fmt,
    path::{Path, PathBuf},
};

use instant::Instant;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;

use crate::{
    data_structures::model::{ModelData, ModelVertex},
    error::LoadError,
};

pub mod fbx;
pub mod gltf_model;
pub mod loader;
pub mod obj;
pub mod progress;
pub mod texture;

pub use progress::{LoadStage, Progress};

const CHUNK_SIZE: usize = 64 * 1024;
/// Upper bound on the buffer reserved up front from a reported size.
const MAX_RESERVE: u64 = 64 << 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetFormat {
    Fbx,
    /// Wavefront OBJ with a companion `.mtl` material library.
    ObjMtl,
    /// glTF 2.0, either `.gltf` JSON or binary `.glb`.
    Gltf,
}

impl AssetFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "fbx" => Some(AssetFormat::Fbx),
            "obj" => Some(AssetFormat::ObjMtl),
            "gltf" | "glb" => Some(AssetFormat::Gltf),
            _ => None,
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Unit normalisation applied when nothing overrides it. FBX exports are
    /// usually authored in centimetres while the scene works in metres.
    pub fn default_scale(&self) -> f32 {
        match self {
            AssetFormat::Fbx => 0.01,
            AssetFormat::ObjMtl | AssetFormat::Gltf => 1.0,
        }
    }
}

impl fmt::Display for AssetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetFormat::Fbx => f.write_str("FBX"),
            AssetFormat::ObjMtl => f.write_str("OBJ+MTL"),
            AssetFormat::Gltf => f.write_str("glTF"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum AssetSource {
    Path(PathBuf),
    Url(reqwest::Url),
    Bytes { name: String, bytes: Vec<u8> },
}

impl AssetSource {
    /// `http(s)://` locations become URLs, everything else a file path.
    pub fn parse(location: &str) -> Result<Self, LoadError> {
        if location.starts_with("http://") || location.starts_with("https://") {
            let url = reqwest::Url::parse(location).map_err(|e| LoadError::parse(location, e))?;
            Ok(AssetSource::Url(url))
        } else {
            Ok(AssetSource::Path(PathBuf::from(location)))
        }
    }

    /// Short name used in log lines and error messages.
    pub fn name(&self) -> String {
        match self {
            AssetSource::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            AssetSource::Url(url) => url
                .path_segments()
                .and_then(|mut s| s.next_back())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| url.to_string()),
            AssetSource::Bytes { name, .. } => name.clone(),
        }
    }

    pub fn format(&self) -> Option<AssetFormat> {
        match self {
            AssetSource::Path(path) => AssetFormat::from_path(path),
            AssetSource::Url(url) => AssetFormat::from_path(url.path()),
            AssetSource::Bytes { name, .. } => AssetFormat::from_path(name),
        }
    }

    /// A file next to this one, e.g. a texture referenced by a material library.
    pub fn sibling(&self, relative: &str) -> Option<AssetSource> {
        match self {
            AssetSource::Path(path) => Some(AssetSource::Path(
                path.parent().unwrap_or(Path::new("")).join(relative),
            )),
            AssetSource::Url(url) => url.join(relative).ok().map(AssetSource::Url),
            AssetSource::Bytes { .. } => None,
        }
    }

    fn base_dir(&self) -> Option<PathBuf> {
        match self {
            AssetSource::Path(path) => path.parent().map(Path::to_path_buf),
            _ => None,
        }
    }
}

impl fmt::Display for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSource::Path(path) => write!(f, "{}", path.display()),
            AssetSource::Url(url) => write!(f, "{url}"),
            AssetSource::Bytes { name, bytes } => write!(f, "{name} ({} bytes)", bytes.len()),
        }
    }
}

/// One request to the asset loader.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadRequest {
    pub source: AssetSource,
    pub format: AssetFormat,
    /// Explicit material library; OBJ requests resolve it by convention otherwise.
    pub material: Option<AssetSource>,
    /// Overrides [`AssetFormat::default_scale`].
    pub scale: Option<f32>,
}

impl LoadRequest {
    pub fn new(source: AssetSource, format: AssetFormat) -> Self {
        Self {
            source,
            format,
            material: None,
            scale: None,
        }
    }

    pub fn with_scale(mut self, scale: Option<f32>) -> Self {
        self.scale = scale;
        self
    }
}

/// Candidate material libraries for an OBJ file, in lookup order.
///
/// Assets are laid out as `<root>/models/<name>.obj` next to
/// `<root>/materials/<name>.mtl`; a `.mtl` beside the `.obj` is the fallback.
pub fn companion_material_paths(obj: &Path) -> Vec<PathBuf> {
    let Some(stem) = obj.file_stem() else {
        return Vec::new();
    };
    let mut file_name = stem.to_os_string();
    file_name.push(".mtl");
    let dir = obj.parent().unwrap_or(Path::new(""));
    let mut candidates = Vec::with_capacity(2);
    if let Some(root) = dir.parent() {
        candidates.push(root.join("materials").join(&file_name));
    }
    candidates.push(dir.join(&file_name));
    candidates
}

async fn resolve_material(request: &LoadRequest) -> Result<AssetSource, LoadError> {
    if let Some(material) = &request.material {
        return Ok(material.clone());
    }
    let name = request.source.name();
    match &request.source {
        AssetSource::Path(path) => {
            let candidates = companion_material_paths(path);
            for candidate in candidates.iter() {
                if tokio::fs::try_exists(candidate).await.unwrap_or(false) {
                    return Ok(AssetSource::Path(candidate.clone()));
                }
            }
            Err(LoadError::MissingMaterial {
                name,
                expected: candidates
                    .iter()
                    .map(|c| c.display().to_string())
                    .collect::<Vec<_>>()
                    .join(" or "),
            })
        }
        AssetSource::Url(url) => {
            let stem = name.rsplit_once('.').map_or(name.as_str(), |(s, _)| s);
            let relative = format!("../materials/{stem}.mtl");
            url.join(&relative)
                .map(AssetSource::Url)
                .map_err(|_| LoadError::MissingMaterial {
                    name: name.clone(),
                    expected: relative,
                })
        }
        AssetSource::Bytes { .. } => Err(LoadError::MissingMaterial {
            name,
            expected: "an explicit material source".to_string(),
        }),
    }
}

/// Read all bytes of `source`, reporting progress whenever the percentage changes.
pub async fn fetch<F>(
    source: &AssetSource,
    stage: LoadStage,
    on_progress: &mut F,
) -> Result<Vec<u8>, LoadError>
where
    F: FnMut(LoadStage, Progress),
{
    let mut last_percent = None;
    let mut report = |loaded: u64, total: u64| {
        let progress = Progress::new(loaded, total);
        let percent = progress.percent();
        if last_percent != Some(percent) {
            last_percent = Some(percent);
            on_progress(stage, progress);
        }
    };

    match source {
        AssetSource::Path(path) => {
            let read_err = |source| LoadError::Read {
                path: path.clone(),
                source,
            };
            let mut file = tokio::fs::File::open(path).await.map_err(read_err)?;
            let total = file.metadata().await.map_err(read_err)?.len();
            let mut data = Vec::with_capacity(total.min(MAX_RESERVE) as usize);
            let mut chunk = vec![0u8; CHUNK_SIZE];
            report(0, total);
            loop {
                let n = file.read(&mut chunk).await.map_err(read_err)?;
                if n == 0 {
                    break;
                }
                data.extend_from_slice(&chunk[..n]);
                report(data.len() as u64, total);
            }
            Ok(data)
        }
        AssetSource::Url(url) => {
            let net_err = |source| LoadError::Network {
                url: url.to_string(),
                source,
            };
            let mut response = reqwest::get(url.clone())
                .await
                .and_then(|r| r.error_for_status())
                .map_err(net_err)?;
            let total = response.content_length().unwrap_or(0);
            let mut data = Vec::with_capacity(total.min(MAX_RESERVE) as usize);
            report(0, total);
            while let Some(chunk) = response.chunk().await.map_err(net_err)? {
                data.extend_from_slice(&chunk);
                report(data.len() as u64, total);
            }
            Ok(data)
        }
        AssetSource::Bytes { bytes, .. } => {
            report(bytes.len() as u64, bytes.len() as u64);
            Ok(bytes.clone())
        }
    }
}

async fn blocking<T, F>(f: F) -> Result<T, LoadError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, LoadError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| LoadError::Task(e.to_string()))?
}

/// Load `request` into CPU-side model data.
///
/// `on_progress` is called from the loading task whenever the transferred
/// percentage of the current stage changes.
pub async fn load_model_data<F>(request: LoadRequest, mut on_progress: F) -> Result<ModelData, LoadError>
where
    F: FnMut(LoadStage, Progress) + Send,
{
    let started = Instant::now();
    let name = request.source.name();
    log::info!("Loading {} as {}", request.source, request.format);

    let (meshes, materials) = match request.format {
        AssetFormat::Fbx => {
            let bytes = fetch(&request.source, LoadStage::Model, &mut on_progress).await?;
            let label = name.clone();
            blocking(move || fbx::load(&label, &bytes)).await?
        }
        AssetFormat::Gltf => {
            let bytes = fetch(&request.source, LoadStage::Model, &mut on_progress).await?;
            let label = name.clone();
            let base = request.source.base_dir();
            blocking(move || gltf_model::load(&label, &bytes, base.as_deref())).await?
        }
        AssetFormat::ObjMtl => {
            let material_source = resolve_material(&request).await?;
            let mtl = fetch(&material_source, LoadStage::Materials, &mut on_progress)
                .await
                .map_err(|e| match e {
                    LoadError::Read { source, .. }
                        if source.kind() == std::io::ErrorKind::NotFound =>
                    {
                        LoadError::MissingMaterial {
                            name: name.clone(),
                            expected: material_source.to_string(),
                        }
                    }
                    other => LoadError::Material {
                        name: name.clone(),
                        cause: other.to_string(),
                    },
                })?;
            let obj_bytes = fetch(&request.source, LoadStage::Model, &mut on_progress).await?;
            let label = name.clone();
            let (meshes, obj_materials) =
                blocking(move || obj::load(&label, &obj_bytes, &mtl)).await?;
            let materials = obj::load_materials(&material_source, obj_materials).await;
            (meshes, materials)
        }
    };

    let data = ModelData {
        name: name.clone(),
        meshes,
        materials,
        scale: request.scale.unwrap_or(request.format.default_scale()),
    };
    if data.meshes.iter().all(|m| m.indices.is_empty()) {
        return Err(LoadError::Empty { name });
    }
    log::info!(
        "Loaded {} ({} meshes, {} triangles) in {:.2?}",
        data.name,
        data.meshes.len(),
        data.triangle_count(),
        started.elapsed()
    );
    Ok(data)
}

/// Area weighted vertex normals for meshes that ship without any.
///
/// Vertices shared between faces get smoothed normals, unshared ones end up
/// with the flat face normal.
pub fn compute_normals(vertices: &mut [ModelVertex], indices: &[u32]) {
    use cgmath::InnerSpace;

    let mut accum = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= vertices.len() || b >= vertices.len() || c >= vertices.len() {
            continue;
        }
        let p0: cgmath::Vector3<f32> = vertices[a].position.into();
        let p1: cgmath::Vector3<f32> = vertices[b].position.into();
        let p2: cgmath::Vector3<f32> = vertices[c].position.into();
        // Unnormalised cross product weights by triangle area
        let face = (p1 - p0).cross(p2 - p0);
        accum[a] += face;
        accum[b] += face;
        accum[c] += face;
    }
    for (v, n) in vertices.iter_mut().zip(accum) {
        v.normal = if n.magnitude2() > 0.0 {
            n.normalize().into()
        } else {
            [0.0, 1.0, 0.0]
        };
    }
}
