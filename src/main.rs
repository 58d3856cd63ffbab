//! initrdgen - initrd image builder for lightweight guest VMs.
//!
//! Builds a bootable initrd embedding either a single sensitive program
//! (CODE mode) or a full container root filesystem (ROOTFS mode), plus
//! the guest-side helpers (busybox, vsock bridge, optional attestation
//! agent) and a generated /init boot script.
#![allow(dead_code)]

mod clean;
mod commands;
mod common;
mod config;
mod error;
mod initrd;
mod preflight;
mod process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use commands::build::BuildArgs;
use config::Config;

#[derive(Parser)]
#[command(name = "initrdgen")]
#[command(about = "Builds bootable initrd images for lightweight guest VMs")]
#[command(
    after_help = "QUICK START:\n  initrdgen preflight                                  Check host tools and payloads\n  initrdgen build --tag t1 --mode code ./agent.bin     Build a CODE image\n  initrdgen build --tag t2 --mode rootfs --work-path /app ./rootfs.tar\n  initrdgen clean                                      Remove build artifacts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an initrd image
    Build {
        /// Build tag; names the output directory under the build root
        #[arg(long)]
        tag: String,

        /// Build mode: 'code' (sensitive program) or 'rootfs' (container root filesystem)
        #[arg(long)]
        mode: String,

        /// Working directory for the container init (rootfs mode only)
        #[arg(long)]
        work_path: Option<String>,

        /// Attestation agent binary to include
        #[arg(long)]
        attestation_agent: Option<PathBuf>,

        /// Sensitive program (code mode) or rootfs archive (rootfs mode)
        source: PathBuf,
    },

    /// Check host tools and component payloads
    Preflight,

    /// Clean build artifacts
    Clean {
        /// Clean only this tag's build tree (default: everything)
        #[arg(long)]
        tag: Option<String>,
    },

    /// Show information
    Show {
        #[command(subcommand)]
        what: ShowTarget,
    },
}

#[derive(Subcommand)]
enum ShowTarget {
    /// Show resolved configuration
    Config,
    /// List finished builds
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let base_dir = std::env::current_dir()?;

    // Load .env if present
    dotenvy::dotenv().ok();
    let config = Config::load(&base_dir);

    match cli.command {
        Commands::Build {
            tag,
            mode,
            work_path,
            attestation_agent,
            source,
        } => {
            commands::cmd_build(
                BuildArgs {
                    tag,
                    source,
                    mode,
                    work_path,
                    attestation_agent,
                },
                &config,
            )?;
        }

        Commands::Preflight => {
            commands::cmd_preflight(&config)?;
        }

        Commands::Clean { tag } => {
            commands::cmd_clean(&config, tag)?;
        }

        Commands::Show { what } => {
            let target = match what {
                ShowTarget::Config => commands::show::ShowTarget::Config,
                ShowTarget::Status => commands::show::ShowTarget::Status,
            };
            commands::cmd_show(&config, target)?;
        }
    }

    Ok(())
}
