//! Matrix-multiply DFT refinement of a correlation peak
//! (Guizar-Sicairos, Thurman & Fienup, Optics Letters 33(2), 2008).
//!
//! Instead of zero-padding the whole spectrum, the inverse DFT is evaluated
//! only on a small grid spaced `1/upsample` pixels apart around the coarse
//! peak, which costs two small matrix products.

use std::f64::consts::TAU;

use ndarray::Array2;
use num_complex::Complex;

use crate::consts::UPSAMPLED_REGION_PIXELS;

use super::fourier::fftfreq;

/// Inverse DFT kernel of shape `(size, n)`: row `j` evaluates the transform
/// at position `center + (j - size/2) / upsample` along an axis of length `n`.
fn idft_kernel(n: usize, size: usize, upsample: f64, center: f64) -> Array2<Complex<f64>> {
    let freqs = fftfreq(n);
    let half = (size / 2) as f64;
    Array2::from_shape_fn((size, n), |(j, k)| {
        let pos = center + (j as f64 - half) / upsample;
        let phase = TAU * pos * freqs[k];
        Complex::new(phase.cos(), phase.sin())
    })
}

/// Evaluate the (unnormalized) inverse DFT of `spectrum` on a `size × size`
/// grid centred on `(center_row, center_col)`.
pub fn upsampled_idft(
    spectrum: &Array2<Complex<f64>>,
    size: usize,
    upsample: f64,
    center: (f64, f64),
) -> Array2<Complex<f64>> {
    let (h, w) = spectrum.dim();
    let row_kernel = idft_kernel(h, size, upsample, center.0);
    let col_kernel = idft_kernel(w, size, upsample, center.1);
    // (size, h) · (h, w) · (w, size)
    row_kernel.dot(spectrum).dot(&col_kernel.t())
}

/// Refine a coarse integer peak of the inverse transform of `spectrum` to
/// `1/upsample` pixel precision.
///
/// `coarse` is the signed `(row, col)` offset of the peak. Returns the refined
/// `(row, col)` offset.
pub fn refine_peak(
    spectrum: &Array2<Complex<f64>>,
    coarse: (f64, f64),
    upsample: usize,
) -> (f64, f64) {
    if upsample <= 1 {
        return coarse;
    }
    let upsample = upsample as f64;
    let size = (UPSAMPLED_REGION_PIXELS * upsample).ceil() as usize;
    let half = (size / 2) as f64;

    let surface = upsampled_idft(spectrum, size, upsample, coarse);

    let mut best = (0, 0);
    let mut best_val = f64::NEG_INFINITY;
    for ((r, c), v) in surface.indexed_iter() {
        if v.re > best_val {
            best_val = v.re;
            best = (r, c);
        }
    }

    (
        coarse.0 + (best.0 as f64 - half) / upsample,
        coarse.1 + (best.1 as f64 - half) / upsample,
    )
}
