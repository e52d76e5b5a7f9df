use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use callisto_core::align::{align_with_config, AlignMethod};
use callisto_core::config::AlignConfig;
use callisto_core::image::to_array;
use callisto_core::io::image_io::{load_image, save_image};
use clap::Args;
use indicatif::ProgressBar;

use super::{output_path, progress_bar};

#[derive(Args)]
pub struct AlignArgs {
    /// Images to align
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Reference image (default: the sharpest input)
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Alignment method: astroalign, skimage, chi2 or imreg
    #[arg(short, long)]
    pub method: Option<String>,

    /// Directory for the aligned images
    #[arg(short, long, default_value = "aligned")]
    pub output_dir: PathBuf,
}

pub fn run(args: &AlignArgs, mut config: AlignConfig) -> Result<()> {
    if let Some(ref name) = args.method {
        config.method = name.parse::<AlignMethod>()?;
    }

    let pb = progress_bar(args.files.len(), "Loading")?;
    let images = args
        .files
        .iter()
        .map(|path| {
            let image =
                load_image(path).with_context(|| format!("Failed to load {}", path.display()));
            pb.inc(1);
            image
        })
        .collect::<Result<Vec<_>>>()?;
    pb.finish();

    let reference = args
        .reference
        .as_ref()
        .map(|path| load_image(path).with_context(|| format!("Failed to load {}", path.display())))
        .transpose()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Aligning {} images with {}", images.len(), config.method));
    spinner.enable_steady_tick(Duration::from_millis(100));
    let aligned = align_with_config(images, reference.as_ref(), &config)?;
    spinner.finish_and_clear();

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;
    let pb = progress_bar(aligned.len(), "Saving")?;
    for (input, image) in args.files.iter().zip(aligned.as_slice()) {
        let path = output_path(&args.output_dir, input, "tiff");
        let data = to_array(image, "Cannot save unexpected type")?;
        save_image(&data, &path).with_context(|| format!("Failed to write {}", path.display()))?;
        pb.inc(1);
    }
    pb.finish();

    println!(
        "Aligned {} images with {} into {}",
        aligned.len(),
        config.method,
        args.output_dir.display()
    );
    Ok(())
}
