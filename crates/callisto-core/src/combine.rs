use ndarray::Array2;
use rayon::prelude::*;
use tracing::info;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::error::{CallistoError, Result};
use crate::image::{to_array, Images};

pub use crate::config::CombineMethod;

/// Reduce already-aligned images to one array, pixel by pixel.
///
/// The result is a bare array; headers are not carried over.
pub fn combine(images: impl Into<Images>, method: CombineMethod) -> Result<Array2<f32>> {
    if method != CombineMethod::Numpy {
        return Err(CallistoError::NotImplemented(method.to_string()));
    }

    let images = images.into();
    if images.is_empty() {
        return Err(CallistoError::EmptySequence);
    }
    let arrays = images
        .as_slice()
        .iter()
        .map(|image| to_array(image, "Cannot combine unexpected type"))
        .collect::<Result<Vec<_>>>()?;

    let expected = arrays[0].dim();
    if let Some(bad) = arrays.iter().find(|a| a.dim() != expected) {
        return Err(CallistoError::DimensionMismatch {
            expected,
            found: bad.dim(),
        });
    }

    info!(count = arrays.len(), %method, "combining images");
    Ok(median_stack(&arrays))
}

/// Pixel-wise median over equally sized arrays. Even counts average the two
/// middle samples.
pub fn median_stack(arrays: &[Array2<f32>]) -> Array2<f32> {
    let Some(first) = arrays.first() else {
        return Array2::zeros((0, 0));
    };
    let (h, w) = first.dim();
    let n = arrays.len();

    let median_row = |row: usize| -> Vec<f32> {
        let mut samples = vec![0.0f32; n];
        (0..w)
            .map(|col| {
                for (sample, array) in samples.iter_mut().zip(arrays) {
                    *sample = array[[row, col]];
                }
                median(&mut samples)
            })
            .collect()
    };

    let rows: Vec<Vec<f32>> = if h * w >= PARALLEL_PIXEL_THRESHOLD && n > 1 {
        (0..h).into_par_iter().map(median_row).collect()
    } else {
        (0..h).map(median_row).collect()
    };

    Array2::from_shape_fn((h, w), |(row, col)| rows[row][col])
}

fn median(samples: &mut [f32]) -> f32 {
    let n = samples.len();
    let mid = n / 2;
    if n == 1 {
        samples[0]
    } else if n % 2 == 1 {
        *samples.select_nth_unstable_by(mid, |a, b| a.total_cmp(b)).1
    } else {
        samples.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        let upper = samples[mid];
        let lower = samples[..mid]
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        (lower + upper) / 2.0
    }
}
