//! `edgerules watch` command implementation.

use std::path::PathBuf;

use clap::Args;
use edgerules_compiler::{ActiveRules, CompilerOptions, compile};
use edgerules_manifest::DevPageSource;

use crate::commands::compile::write_routes;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the watch command.
#[derive(Args)]
pub(crate) struct WatchArgs {
    /// Source page directory to scan and watch.
    #[arg(short, long, default_value = "pages")]
    source_dir: PathBuf,

    /// File the compiled rule set is written to.
    #[arg(short, long, default_value = "routes.json")]
    output: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl WatchArgs {
    /// Execute the watch command.
    ///
    /// Compiles once at startup, then recompiles on every debounced source
    /// change. A failed recompile keeps the previously-written rule set.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial scan/compile fails or the watcher
    /// cannot be started.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let source = DevPageSource::new(self.source_dir.clone());
        let options = CompilerOptions {
            source_dir: Some(self.source_dir.clone()),
            ..CompilerOptions::default()
        };

        let manifests = source.synthesize()?;
        let active = ActiveRules::new(compile(&manifests, &options)?);
        write_routes(&active.current(), &self.output)?;
        output.info(&format!(
            "Compiled {} rules from {}",
            active.current().rules.len(),
            self.source_dir.display()
        ));

        let (events, _watch_handle) = source.watch()?;
        output.info("Watching for page changes...");

        while let Some(event) = events.recv() {
            tracing::info!(path = %event.path.display(), "page change detected");

            let manifests = match source.synthesize() {
                Ok(manifests) => manifests,
                Err(error) => {
                    output.warning(&format!("Scan failed, keeping previous rules: {error}"));
                    continue;
                }
            };

            match active.rebuild(|| compile(&manifests, &options)) {
                Ok(routes) => {
                    write_routes(&routes, &self.output)?;
                    output.info(&format!("Recompiled {} rules", routes.rules.len()));
                }
                Err(error) => {
                    output.warning(&format!("Recompile failed, keeping previous rules: {error}"));
                }
            }
        }

        Ok(())
    }
}
