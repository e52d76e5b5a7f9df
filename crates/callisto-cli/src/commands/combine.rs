use std::path::PathBuf;

use anyhow::{Context, Result};
use callisto_core::combine::{combine, CombineMethod};
use callisto_core::config::AlignConfig;
use callisto_core::io::image_io::{load_image, save_image};
use clap::Args;

#[derive(Args)]
pub struct CombineArgs {
    /// Aligned images to combine
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Combination method (default: `combine_method` from the config)
    #[arg(short, long)]
    pub method: Option<String>,

    /// Output file path
    #[arg(short, long, default_value = "combined.tiff")]
    pub output: PathBuf,
}

pub fn run(args: &CombineArgs, config: &AlignConfig) -> Result<()> {
    let method = resolve_method(args.method.as_deref(), config)?;

    let images = args
        .files
        .iter()
        .map(|path| load_image(path).with_context(|| format!("Failed to load {}", path.display())))
        .collect::<Result<Vec<_>>>()?;

    let combined = combine(images, method)?;
    save_image(&combined, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let (h, w) = combined.dim();
    println!(
        "Combined {} images ({}x{}, {}) into {}",
        args.files.len(),
        w,
        h,
        method,
        args.output.display()
    );
    Ok(())
}

/// `--method` when given, else the configured default.
fn resolve_method(name: Option<&str>, config: &AlignConfig) -> Result<CombineMethod> {
    match name {
        Some(name) => Ok(name.parse()?),
        None => Ok(config.combine_method),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_falls_back_to_config() {
        let mut config = AlignConfig::default();
        config.combine_method = CombineMethod::Swarp;
        assert_eq!(resolve_method(None, &config).unwrap(), CombineMethod::Swarp);
        assert_eq!(resolve_method(Some("numpy"), &config).unwrap(), CombineMethod::Numpy);
        assert!(resolve_method(Some("xyz"), &config).is_err());
    }
}
