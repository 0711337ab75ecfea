mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use spbe_lib::RunConfig;

#[derive(Parser)]
#[command(name = "spbe")]
#[command(about = "Scrape bond reference data and prospectuses from SPB Exchange")]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory root (overrides the config file)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the bond reference-data CSV
    Refdata(commands::refdata::RefdataArgs),
    /// Download prospectus documents for every listed bond
    Prospectuses(commands::prospectuses::ProspectusesArgs),
    /// Run both pipelines over a single collection pass
    All(commands::all::AllArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("spbe_lib=info".parse().unwrap())
                .add_directive("spbe_extract=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::from_env(),
    };
    if let Some(dir) = &cli.output_dir {
        cfg.output_dir = dir.clone();
    }

    match &cli.command {
        Commands::Refdata(args) => commands::refdata::run(args, &cfg).await?,
        Commands::Prospectuses(args) => commands::prospectuses::run(args, &cfg).await?,
        Commands::All(args) => commands::all::run(args, &cfg).await?,
    }

    Ok(())
}
