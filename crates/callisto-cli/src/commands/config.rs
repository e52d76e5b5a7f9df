use std::path::PathBuf;

use anyhow::{Context, Result};
use callisto_core::config::AlignConfig;
use clap::Args;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save the effective configuration as TOML.
pub fn run(args: &ConfigArgs, config: &AlignConfig) -> Result<()> {
    let toml_str = config.to_toml_string()?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
