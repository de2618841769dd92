//! `edgerules compile` command implementation.

use std::path::{Path, PathBuf};

use clap::Args;
use edgerules_compiler::{CompiledRoutes, CompilerOptions, compile};
use edgerules_manifest::BuildManifests;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the compile command.
#[derive(Args)]
pub(crate) struct CompileArgs {
    /// Build output directory containing the manifest files.
    #[arg(short, long, default_value = "dist")]
    dist_dir: PathBuf,

    /// Public asset directory included in the asset rules.
    #[arg(long)]
    public_dir: Option<PathBuf>,

    /// File the compiled rule set is written to.
    #[arg(short, long, default_value = "routes.json")]
    output: PathBuf,

    /// Skip the default catch-all proxy rule.
    #[arg(long)]
    no_default_catch_all: bool,

    /// Skip data-route rules.
    #[arg(long)]
    no_data_routes: bool,

    /// Proxy page traffic to the standalone server origin.
    #[arg(long)]
    standalone: bool,

    /// Skip the service-worker rule.
    #[arg(long)]
    no_service_worker: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CompileArgs {
    /// Execute the compile command.
    ///
    /// # Errors
    ///
    /// Returns an error if manifests cannot be loaded, compilation fails,
    /// or the output file cannot be written.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let manifests = BuildManifests::load(&self.dist_dir, self.public_dir.as_deref())?;
        output.info(&format!(
            "Loaded {} pages from {}",
            manifests.pages.len(),
            self.dist_dir.display()
        ));

        let routes = compile(&manifests, &self.options())?;
        write_routes(&routes, &self.output)?;

        output.success(&format!(
            "Compiled {} rules ({} warm-up paths) to {}",
            routes.rules.len(),
            routes.warmup.len(),
            self.output.display()
        ));
        Ok(())
    }

    fn options(&self) -> CompilerOptions {
        CompilerOptions {
            default_catch_all: !self.no_default_catch_all,
            data_routes: !self.no_data_routes,
            standalone_server: self.standalone,
            source_dir: None,
            service_worker: !self.no_service_worker,
        }
    }
}

/// Serialize a compiled rule set to disk.
pub(crate) fn write_routes(routes: &CompiledRoutes, path: &Path) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(routes)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_write_routes_produces_readable_json() {
        let temp = tempfile::tempdir().unwrap();
        let mut manifests = BuildManifests {
            build_id: Some("b1".to_owned()),
            ..BuildManifests::default()
        };
        manifests
            .pages
            .insert("/about".to_owned(), "pages/about.html".to_owned());
        let routes = compile(&manifests, &CompilerOptions::default()).unwrap();

        let path = temp.path().join("routes.json");
        write_routes(&routes, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(value["rules"].is_array());
        assert!(value["warmup"].is_array());
        assert_eq!(value["build_id"], "b1");
    }
}
