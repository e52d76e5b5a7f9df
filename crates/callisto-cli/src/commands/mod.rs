pub mod align;
pub mod catalogs;
pub mod combine;
pub mod config;
pub mod methods;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use callisto_core::config::AlignConfig;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

/// Defaults, or the given TOML file.
pub fn load_config(path: Option<&Path>) -> Result<AlignConfig> {
    match path {
        Some(path) => {
            let config = AlignConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            debug!(path = %path.display(), method = %config.method, "loaded config");
            Ok(config)
        }
        None => Ok(AlignConfig::default()),
    }
}

pub fn progress_bar(len: usize, label: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!("{label} [{{bar:40}}] {{pos}}/{{len}}"))?
            .progress_chars("=> "),
    );
    Ok(pb)
}

/// `<dir>/<stem>_aligned.<extension>`
pub fn output_path(dir: &Path, input: &Path, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    dir.join(format!("{stem}_aligned.{extension}"))
}
