//! CLI error types.

use edgerules_compiler::CompileError;
use edgerules_manifest::ManifestError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Manifest(#[from] ManifestError),

    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
