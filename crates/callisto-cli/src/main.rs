mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "callisto", about = "Astronomical image alignment and combination")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML file overriding the default alignment settings
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Align images onto a reference image
    Align(commands::align::AlignArgs),
    /// Median-combine aligned images
    Combine(commands::combine::CombineArgs),
    /// Align CSV point catalogs onto a reference catalog
    Catalogs(commands::catalogs::CatalogsArgs),
    /// List alignment methods and whether they are available
    Methods,
    /// Print or save the default configuration as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = commands::load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Align(args) => commands::align::run(args, config),
        Commands::Combine(args) => commands::combine::run(args, &config),
        Commands::Catalogs(args) => commands::catalogs::run(args, &config),
        Commands::Methods => commands::methods::run(&config),
        Commands::Config(args) => commands::config::run(args, &config),
    }
}
