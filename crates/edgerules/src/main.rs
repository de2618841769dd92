//! edgerules CLI - route manifest compiler.
//!
//! Provides commands for:
//! - `compile`: compile a production build's manifests into an edge rule set
//! - `watch`: development mode, recompiling on source-tree changes

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CompileArgs, WatchArgs};
use output::Output;

/// edgerules - route manifest compiler for the edge routing layer.
#[derive(Parser)]
#[command(name = "edgerules", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a production build into an ordered edge rule set.
    Compile(CompileArgs),
    /// Watch a source page tree and recompile on changes.
    Watch(WatchArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Compile(args) => args.verbose,
        Commands::Watch(args) => args.verbose,
    };

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Compile(args) => args.execute(),
        Commands::Watch(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
