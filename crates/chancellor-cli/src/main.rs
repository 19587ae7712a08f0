//! Chancellor CLI - load and inspect asset trees without a GPU or audio device

mod commands;

use anyhow::Result;
use chancellor_asset::ChancellorConfig;
use clap::{Parser, Subcommand};
use commands::asset;
use env_logger::{Builder, Env};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chancellor")]
#[command(about = "Asset store tooling for the Chancellor engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file to use instead of ./chancellor.toml and ~/.chancellor/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Asset store operations
    #[command(subcommand)]
    Assets(asset::AssetCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ChancellorConfig::load_from_file(path)?,
        None => ChancellorConfig::load()?,
    };

    Builder::from_env(Env::default().default_filter_or(config.log_level.as_str())).init();

    match cli.command {
        Commands::Assets(cmd) => asset::run(cmd, &config),
    }
}
