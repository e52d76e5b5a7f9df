pub mod gradient;
pub mod laplacian;

use ndarray::Array2;
use rayon::prelude::*;
use tracing::debug;

use crate::config::QualityMetric;
use crate::error::{CallistoError, Result};
use crate::image::{to_array, Image};

/// Score an array using the specified quality metric.
pub fn score_with_metric(data: &Array2<f32>, metric: QualityMetric) -> f64 {
    match metric {
        QualityMetric::Laplacian => laplacian::laplacian_variance(data),
        QualityMetric::Gradient => gradient::gradient_score(data),
    }
}

/// Score all arrays and return `(index, score)` sorted by score descending.
/// Equal scores keep their input order.
pub fn rank_arrays(arrays: &[Array2<f32>], metric: QualityMetric) -> Vec<(usize, f64)> {
    let mut scores: Vec<(usize, f64)> = arrays
        .par_iter()
        .enumerate()
        .map(|(i, data)| (i, score_with_metric(data, metric)))
        .collect();

    scores.sort_by(|a, b| b.1.total_cmp(&a.1));
    scores
}

/// Pick the image best suited as an alignment target: the sharpest one.
pub fn pick_reference(images: &[Image], metric: QualityMetric) -> Result<&Image> {
    let arrays = images
        .iter()
        .map(|image| to_array(image, "Cannot align unexpected type"))
        .collect::<Result<Vec<_>>>()?;

    let ranked = rank_arrays(&arrays, metric);
    let (best, score) = ranked.first().ok_or(CallistoError::EmptySequence)?;
    debug!(index = best, score, ?metric, "picked reference image");
    Ok(&images[*best])
}
