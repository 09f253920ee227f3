//! Error types shared by the loader, the viewer and the application shell.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while turning an asset source into model data.
///
/// A `LoadError` is terminal for the load that produced it but never for the
/// viewer: the previously displayed model stays in place.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not fetch {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not parse {name}: {cause}")]
    Parse { name: String, cause: String },
    #[error("no material found for {name} (looked for {expected})")]
    MissingMaterial { name: String, expected: String },
    #[error("could not parse materials of {name}: {cause}")]
    Material { name: String, cause: String },
    #[error("{name} contains no renderable geometry")]
    Empty { name: String },
    #[error("loader task failed: {0}")]
    Task(String),
    #[error("load was superseded by a newer request")]
    Cancelled,
}

impl LoadError {
    pub(crate) fn parse(name: impl Into<String>, cause: impl ToString) -> Self {
        LoadError::Parse {
            name: name.into(),
            cause: cause.to_string(),
        }
    }

    /// True when the failure happened while resolving or reading materials.
    pub fn is_material_error(&self) -> bool {
        matches!(
            self,
            LoadError::MissingMaterial { .. } | LoadError::Material { .. }
        )
    }
}

/// Application level failures.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("unsupported file format: {name} (accepted: {accepted})")]
    UnsupportedFormat { name: String, accepted: String },
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("this system cannot render: {0}")]
    CapabilityUnavailable(String),
    #[error("invalid configuration {path}: {cause}")]
    Config { path: PathBuf, cause: String },
}
