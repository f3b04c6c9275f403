//! event-bindgen - validate event catalogs and render client bindings
//!
//! ```text
//! event-bindgen check events.json
//! event-bindgen generate events.json --client PocketOptionClient --out src/bindings.rs
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use event_bindgen::{compile_file, generate, validate, BindingOptions, Catalog, CompileError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "event-bindgen")]
#[command(version)]
#[command(about = "Compile an event catalog into typed Rust client bindings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a catalog and report every problem
    Check {
        catalog: PathBuf,
    },
    /// Render bindings to a file, or to stdout without --out
    Generate {
        catalog: PathBuf,

        #[arg(long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        paths: PathArgs,
    },
}

#[derive(Args)]
struct PathArgs {
    /// Type the generated impl block is written for
    #[arg(long, default_value = "Client")]
    client: String,

    #[arg(long, default_value = "crate::models")]
    models: String,

    #[arg(long, default_value = "crate::transforms")]
    transforms: String,

    #[arg(long, default_value = "::eventsockets")]
    runtime: String,
}

impl From<PathArgs> for BindingOptions {
    fn from(args: PathArgs) -> Self {
        BindingOptions::new(args.client)
            .models(args.models)
            .transforms(args.transforms)
            .runtime(args.runtime)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<CompileError>() {
                Some(CompileError::Schema(schema)) => error!("{schema}"),
                _ => error!("{e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Check { catalog: path } => {
            let catalog = Catalog::load(&path)?;
            validate(&catalog).map_err(CompileError::from)?;
            info!(
                inbound = catalog.on.len(),
                outbound = catalog.emit.len(),
                "{} is valid",
                path.display()
            );
        }
        Commands::Generate { catalog: path, out, paths } => {
            let options = BindingOptions::from(paths);
            match out {
                Some(out) => {
                    let written = compile_file(&path, &out, &options)?;
                    if !written {
                        info!("{} is up to date", out.display());
                    }
                }
                None => {
                    let catalog = Catalog::load(&path)?;
                    let source = generate(&catalog, &options)
                        .with_context(|| format!("failed to generate bindings for {}", path.display()))?;
                    print!("{source}");
                }
            }
        }
    }
    Ok(())
}
