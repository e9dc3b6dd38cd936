use thiserror::Error;

use crate::logging::LoggingError;

/// Unified result type for the layout crate.
pub type Result<T> = std::result::Result<T, LayoutError>;

/// Errors that abort a layout run.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error(
        "no free {width}x{height} region for folder `{folder}` within {radius} cells of its branch point"
    )]
    LayoutOverflow {
        folder: String,
        width: i32,
        height: i32,
        radius: i32,
    },
    #[error("cells planned for `{owner}` were already claimed")]
    PlacementConflict { owner: String },
    #[error("logging failure: {0}")]
    Logging(#[from] LoggingError),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Recoverable anomalies recorded while laying out a repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutWarning {
    #[error("skipped malformed path entry `{path}`")]
    MalformedPathEntry { path: String },
    #[error("skipped duplicate path entry `{path}`")]
    DuplicatePathEntry { path: String },
    #[error("clamped degenerate geometry for `{path}`: {detail}")]
    DegenerateGeometry { path: String, detail: String },
}

impl LayoutWarning {
    pub fn path(&self) -> &str {
        match self {
            LayoutWarning::MalformedPathEntry { path } => path,
            LayoutWarning::DuplicatePathEntry { path } => path,
            LayoutWarning::DegenerateGeometry { path, .. } => path,
        }
    }
}
