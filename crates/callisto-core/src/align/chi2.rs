//! Translation by chi-squared minimisation.
//!
//! For a trial offset `q` the misfit is
//! `chi2(q) = Σ ref² + Σ src² - 2 Σ ref(x)·src(x + q)` over mean-subtracted
//! images with uniform errors, so the minimum sits at the maximum of the
//! cross-correlation `SRC·conj(REF)`.

use ndarray::Array2;
use num_complex::Complex;

use crate::config::AlignConfig;
use crate::consts::MAX_CHI2_UPSAMPLE;
use crate::error::Result;

use super::fourier::{cross_power, fft2d, fft2d_f64, ifft2d_real, shift_spectrum, signed_offset};
use super::upsampled::refine_peak;
use super::{check_same_shape, AlignmentOffset};

/// Chi-squared surface over all periodic integer offsets.
pub fn chi2_surface(reference: &Array2<f32>, source: &Array2<f32>) -> Result<Array2<f64>> {
    let (spectrum, sum_sq) = prepare(reference, source)?;
    Ok(surface_from(&spectrum, sum_sq))
}

/// Offset of `source` relative to `reference`: `source(x) ≈ reference(x - d)`.
///
/// `upsample` of `None` uses `min(100, max(h, w))`.
pub fn chi2_shift(
    reference: &Array2<f32>,
    source: &Array2<f32>,
    upsample: Option<usize>,
) -> Result<AlignmentOffset> {
    let (spectrum, sum_sq) = prepare(reference, source)?;
    let surface = surface_from(&spectrum, sum_sq);
    let (h, w) = surface.dim();

    let mut best = (0, 0);
    let mut best_val = f64::INFINITY;
    for ((r, c), &v) in surface.indexed_iter() {
        if v < best_val {
            best_val = v;
            best = (r, c);
        }
    }

    let upsample = upsample.unwrap_or_else(|| MAX_CHI2_UPSAMPLE.min(h.max(w)));
    let coarse = (signed_offset(best.0, h), signed_offset(best.1, w));
    let (dy, dx) = refine_peak(&spectrum, coarse, upsample);
    tracing::debug!(dx, dy, chi2 = best_val, upsample, "chi2 offset");
    Ok(AlignmentOffset { dx, dy })
}

/// `chi2` backend: shift the current source by the negated offset.
pub fn align_chi2(
    reference: &Array2<f32>,
    source: &Array2<f32>,
    config: &AlignConfig,
) -> Result<Array2<f32>> {
    let offset = chi2_shift(reference, source, config.chi2.upsample_factor)?;
    Ok(shift_spectrum(&fft2d(source), -offset.dy, -offset.dx))
}

fn prepare(reference: &Array2<f32>, source: &Array2<f32>) -> Result<(Array2<Complex<f64>>, f64)> {
    check_same_shape(reference, source)?;
    let reference = subtract_mean(reference);
    let source = subtract_mean(source);
    let sum_sq: f64 = reference.iter().chain(source.iter()).map(|v| v * v).sum();
    let spectrum = cross_power(&fft2d_f64(&source), &fft2d_f64(&reference));
    Ok((spectrum, sum_sq))
}

fn surface_from(spectrum: &Array2<Complex<f64>>, sum_sq: f64) -> Array2<f64> {
    ifft2d_real(spectrum).mapv(|c| sum_sq - 2.0 * c)
}

fn subtract_mean(data: &Array2<f32>) -> Array2<f64> {
    let mean = data.iter().map(|&v| v as f64).sum::<f64>() / data.len().max(1) as f64;
    data.mapv(|v| v as f64 - mean)
}
