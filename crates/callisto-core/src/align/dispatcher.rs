use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{AlignConfig, AlignMethod};
use crate::consts::PARALLEL_FRAME_THRESHOLD;
use crate::error::{CallistoError, Result};
use crate::image::{to_array, Image, Images};
use crate::quality::pick_reference;

use super::registry::BackendRegistry;

/// Align `sources` onto `reference` with the named method and default
/// parameters.
///
/// Without a reference the sharpest source is used. The result has the same
/// shape as `sources` (one image or a list of the same length and order) and
/// each output keeps the carrier variant and header of its input.
pub fn align(
    sources: impl Into<Images>,
    reference: Option<&Image>,
    method: AlignMethod,
) -> Result<Images> {
    align_with_config(sources, reference, &AlignConfig::with_method(method))
}

/// [`align`] with explicit backend parameters; `config.method` selects the
/// backend.
pub fn align_with_config(
    sources: impl Into<Images>,
    reference: Option<&Image>,
    config: &AlignConfig,
) -> Result<Images> {
    align_with_registry(sources, reference, config, BackendRegistry::global())
}

/// [`align_with_config`] against a caller-supplied backend registry.
pub fn align_with_registry(
    sources: impl Into<Images>,
    reference: Option<&Image>,
    config: &AlignConfig,
    registry: &BackendRegistry,
) -> Result<Images> {
    let sources = sources.into();
    let single = sources.is_single();
    let images = sources.as_slice();
    if images.is_empty() {
        return Err(CallistoError::EmptySequence);
    }

    let reference = match reference {
        Some(image) => image,
        None => pick_reference(images, config.reference_metric)?,
    };
    let reference = to_array(reference, "Cannot align to unexpected type")?;
    let backend = registry.get(config.method);

    info!(
        method = %config.method,
        count = images.len(),
        "aligning images"
    );

    let align_one = |(i, source): (usize, &Image)| -> Result<Image> {
        let data = to_array(source, "Cannot align unexpected type")?;
        let aligned = backend.invoke(&reference, &data, config)?;
        debug!(index = i, method = %config.method, "aligned image");
        Ok(source.rewrap(aligned))
    };

    let outputs = if images.len() >= PARALLEL_FRAME_THRESHOLD {
        images
            .par_iter()
            .enumerate()
            .map(align_one)
            .collect::<Result<Vec<_>>>()?
    } else {
        images
            .iter()
            .enumerate()
            .map(align_one)
            .collect::<Result<Vec<_>>>()?
    };

    Ok(Images::collapse(outputs, single))
}
