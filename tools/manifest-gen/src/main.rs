//! Asset manifest generator for the LLApp offline cache.
//!
//! Scans the static directory and writes the list of paths the offline
//! controller pre-caches on install.
//!
//! ## Usage
//!
//! ```bash
//! # Generate from the Django static directory
//! manifest-gen generate --root base/static --prefix /static \
//!     --include / --include /lessons-repository/ --output manifest.json
//!
//! # Validate an existing manifest
//! manifest-gen check manifest.json
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use llapp_core::{init_logging, LogConfig, LogFormat};
use llapp_offline::AssetManifest;
use tracing::info;

mod scan;

#[derive(Parser)]
#[command(name = "manifest-gen")]
#[command(about = "Generate the offline asset manifest from the static directory")]
struct Cli {
    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a static directory and write a manifest
    Generate {
        /// Static files directory
        #[arg(short, long)]
        root: PathBuf,
        /// URL prefix the directory is served under
        #[arg(short, long, default_value = "/static")]
        prefix: String,
        /// Extra paths to cache (pages rather than files)
        #[arg(short, long)]
        include: Vec<String>,
        /// Output path; stdout if omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a manifest file
    Check {
        /// Manifest path
        manifest: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        init_logging(&LogConfig {
            format: LogFormat::Compact,
            ..LogConfig::debug()
        })?;
    }

    match cli.command {
        Commands::Generate {
            root,
            prefix,
            include,
            output,
        } => {
            let manifest = scan::generate(&root, &prefix, &include)
                .with_context(|| format!("scanning {}", root.display()))?;
            let json = manifest.to_json_pretty()?;

            match output {
                Some(path) => {
                    std::fs::write(&path, format!("{json}\n"))
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), assets = manifest.len(), "Manifest written");
                    eprintln!("Wrote {} assets to {}", manifest.len(), path.display());
                }
                None => println!("{json}"),
            }
        }

        Commands::Check { manifest } => {
            let loaded = AssetManifest::load(&manifest)
                .with_context(|| format!("invalid manifest {}", manifest.display()))?;
            println!("{}: {} assets OK", manifest.display(), loaded.len());
        }
    }

    Ok(())
}
