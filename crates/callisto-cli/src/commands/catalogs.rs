use std::path::PathBuf;

use anyhow::{Context, Result};
use callisto_core::catalog::align_catalogs_with_config;
use callisto_core::config::AlignConfig;
use callisto_core::io::catalog_csv::{load_catalog_csv, save_catalog_csv};
use clap::Args;

use super::{output_path, progress_bar};

#[derive(Args)]
pub struct CatalogsArgs {
    /// CSV catalogs with x and y columns
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Reference catalog (default: the first input)
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Directory for the aligned catalogs
    #[arg(short, long, default_value = "aligned")]
    pub output_dir: PathBuf,
}

pub fn run(args: &CatalogsArgs, config: &AlignConfig) -> Result<()> {
    let load = |path: &PathBuf| {
        load_catalog_csv(path).with_context(|| format!("Failed to load {}", path.display()))
    };
    let catalogs = args.files.iter().map(load).collect::<Result<Vec<_>>>()?;
    let reference = args.reference.as_ref().map(load).transpose()?;

    let aligned = align_catalogs_with_config(&catalogs, reference.as_ref(), &config.triangle)?;

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    let pb = progress_bar(aligned.len(), "Saving")?;
    for (input, catalog) in args.files.iter().zip(&aligned) {
        let path = output_path(&args.output_dir, input, "csv");
        save_catalog_csv(catalog, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        pb.inc(1);
    }
    pb.finish();

    println!(
        "Aligned {} catalogs into {}",
        aligned.len(),
        args.output_dir.display()
    );
    Ok(())
}
