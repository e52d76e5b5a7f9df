//! Sub-pixel translation by upsampled cross-correlation, applied as a
//! Fourier-domain phase ramp.

use ndarray::Array2;
use num_complex::Complex;

use crate::config::AlignConfig;
use crate::error::Result;

use super::fourier::{cross_power, fft2d, find_peak, ifft2d_real, shift_spectrum, signed_offset};
use super::upsampled::refine_peak;
use super::{check_same_shape, AlignmentOffset};

/// Translation that moves `source` onto `reference`, to `1/upsample` pixel.
pub fn register_translation(
    reference: &Array2<f32>,
    source: &Array2<f32>,
    upsample: usize,
) -> Result<AlignmentOffset> {
    check_same_shape(reference, source)?;
    let source_fft = fft2d(source);
    Ok(register_spectra(&fft2d(reference), &source_fft, upsample))
}

pub(crate) fn register_spectra(
    reference_fft: &Array2<Complex<f64>>,
    source_fft: &Array2<Complex<f64>>,
    upsample: usize,
) -> AlignmentOffset {
    let (h, w) = reference_fft.dim();
    let product = cross_power(reference_fft, source_fft);
    let correlation = ifft2d_real(&product);
    let (peak_row, peak_col, _) = find_peak(&correlation);

    let coarse = (signed_offset(peak_row, h), signed_offset(peak_col, w));
    let (dy, dx) = refine_peak(&product, coarse, upsample);
    AlignmentOffset { dx, dy }
}

/// `skimage` backend: estimate the translation, then shift the source in the
/// Fourier domain and keep the real part.
pub fn align_cross_correlation(
    reference: &Array2<f32>,
    source: &Array2<f32>,
    config: &AlignConfig,
) -> Result<Array2<f32>> {
    check_same_shape(reference, source)?;
    let source_fft = fft2d(source);
    let offset = register_spectra(
        &fft2d(reference),
        &source_fft,
        config.cross_correlation.upsample_factor,
    );
    tracing::debug!(dx = offset.dx, dy = offset.dy, "cross-correlation shift");
    Ok(shift_spectrum(&source_fft, offset.dy, offset.dx))
}
