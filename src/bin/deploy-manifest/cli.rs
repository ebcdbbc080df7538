//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// deploy-manifest - write a manifest of deployed build targets
#[derive(Parser)]
#[command(name = "deploy-manifest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a settings file without building
    Check(CheckArgs),

    /// Deploy the project and write its manifest
    Build(BuildArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Settings file (.json, otherwise TOML)
    pub settings: PathBuf,

    /// Project root holding the build targets
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Deploy directory
    #[arg(long, default_value = "deploy")]
    pub deploy: PathBuf,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Settings file (.json, otherwise TOML)
    pub settings: PathBuf,

    /// Project root holding the build targets
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Deploy directory
    #[arg(long, default_value = "deploy")]
    pub deploy: PathBuf,

    /// Development build (no cache busting)
    #[arg(long)]
    pub dev: bool,
}
