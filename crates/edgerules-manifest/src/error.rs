//! Manifest loading error type.

use std::path::PathBuf;

/// Error loading build manifests or scanning a source tree.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// A required manifest file does not exist.
    #[error("required manifest missing: {}", .0.display())]
    Missing(PathBuf),

    /// The build identifier file is missing or empty.
    #[error("build identifier missing: {}", .0.display())]
    MissingBuildId(PathBuf),

    /// I/O failure reading a manifest or scanning a directory.
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A manifest file exists but is not valid JSON of the expected shape.
    #[error("failed to parse {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file watcher could not be started.
    #[error("failed to start file watcher")]
    Watch(#[source] notify::Error),
}
