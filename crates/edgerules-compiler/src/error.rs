//! Compilation error type.

use edgerules_paths::PatternError;

/// Fatal compilation error.
///
/// Anything recoverable (an optional registry missing, a rewrite with an
/// unmatched destination) is logged and skipped instead of surfacing here.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A redirect/rewrite condition uses capture syntax the edge engine's
    /// pattern language cannot express.
    #[error("unsupported capture syntax in condition '{key}': {value}")]
    UnsupportedCondition { key: String, value: String },

    /// A route pattern failed to compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),
}
