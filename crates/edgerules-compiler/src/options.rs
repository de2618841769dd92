//! Compiler capability options.

use std::path::PathBuf;

/// Capabilities and toggles for one compilation pass.
///
/// A single compiler parameterized by this struct replaces the per-variant
/// compilers the source framework accumulated (standalone server output,
/// builds without data routes, alternate source trees).
#[derive(Clone, Debug)]
pub struct CompilerOptions {
    /// Emit the step-1 default catch-all proxy rule.
    pub default_catch_all: bool,
    /// Emit data-route rules; disable for builds without data endpoints.
    pub data_routes: bool,
    /// Proxy page traffic to the standalone server origin and forward the
    /// original host header.
    pub standalone_server: bool,
    /// Alternate source tree for development scanning (default `pages/`).
    pub source_dir: Option<PathBuf>,
    /// Emit the service-worker routing rule.
    pub service_worker: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            default_catch_all: true,
            data_routes: true,
            standalone_server: false,
            source_dir: None,
            service_worker: true,
        }
    }
}
