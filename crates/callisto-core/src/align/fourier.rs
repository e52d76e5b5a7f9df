//! 2-D FFT helpers shared by the Fourier-domain backends.

use std::f64::consts::TAU;
use std::sync::Arc;

use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayViewMut1, Axis};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::consts::{EPSILON, PARALLEL_PIXEL_THRESHOLD};

/// 2-D forward FFT of a real image.
pub fn fft2d(data: &Array2<f32>) -> Array2<Complex<f64>> {
    let mut spectrum = data.mapv(|v| Complex::new(v as f64, 0.0));
    fft2d_in_place(&mut spectrum, false);
    spectrum
}

/// 2-D forward FFT of a double-precision real array.
pub fn fft2d_f64(data: &Array2<f64>) -> Array2<Complex<f64>> {
    let mut spectrum = data.mapv(|v| Complex::new(v, 0.0));
    fft2d_in_place(&mut spectrum, false);
    spectrum
}

/// 2-D inverse FFT, normalized by `1/(h*w)`.
pub fn ifft2d(spectrum: &Array2<Complex<f64>>) -> Array2<Complex<f64>> {
    let mut work = spectrum.clone();
    fft2d_in_place(&mut work, true);
    let scale = 1.0 / work.len() as f64;
    work.mapv_inplace(|v| v * scale);
    work
}

/// Real part of the normalized 2-D inverse FFT.
pub fn ifft2d_real(spectrum: &Array2<Complex<f64>>) -> Array2<f64> {
    ifft2d(spectrum).mapv(|v| v.re)
}

fn fft2d_in_place(data: &mut Array2<Complex<f64>>, inverse: bool) {
    let (h, w) = data.dim();
    if h == 0 || w == 0 {
        return;
    }
    let mut planner = FftPlanner::new();
    let (fft_row, fft_col) = if inverse {
        (planner.plan_fft_inverse(w), planner.plan_fft_inverse(h))
    } else {
        (planner.plan_fft_forward(w), planner.plan_fft_forward(h))
    };

    // Rows are lanes of Axis(0) iteration, columns of Axis(1).
    process_lanes(data, Axis(0), &fft_row);
    process_lanes(data, Axis(1), &fft_col);
}

fn process_lanes(data: &mut Array2<Complex<f64>>, outer: Axis, fft: &Arc<dyn Fft<f64>>) {
    let run = |mut lane: ArrayViewMut1<Complex<f64>>| {
        let mut buffer = lane.to_vec();
        fft.process(&mut buffer);
        for (dst, src) in lane.iter_mut().zip(buffer) {
            *dst = src;
        }
    };

    if data.len() >= PARALLEL_PIXEL_THRESHOLD {
        data.axis_iter_mut(outer).into_par_iter().for_each(run);
    } else {
        data.axis_iter_mut(outer).for_each(run);
    }
}

/// Sample frequencies in cycles per sample, in FFT order.
pub fn fftfreq(n: usize) -> Vec<f64> {
    let half = n.div_ceil(2);
    (0..n)
        .map(|k| {
            if k < half {
                k as f64 / n as f64
            } else {
                (k as f64 - n as f64) / n as f64
            }
        })
        .collect()
}

/// Cross-power spectrum `reference * conj(source)`.
///
/// Its inverse transform peaks at the shift that moves `source` onto
/// `reference`.
pub fn cross_power(
    reference: &Array2<Complex<f64>>,
    source: &Array2<Complex<f64>>,
) -> Array2<Complex<f64>> {
    let mut product = reference.clone();
    product.zip_mut_with(source, |r, s| *r *= s.conj());
    product
}

/// Cross-power spectrum normalized to unit magnitude (phase correlation).
pub fn normalized_cross_power(
    reference: &Array2<Complex<f64>>,
    source: &Array2<Complex<f64>>,
) -> Array2<Complex<f64>> {
    let mut product = cross_power(reference, source);
    product.mapv_inplace(|c| {
        let mag = c.norm();
        if mag > EPSILON {
            c / mag
        } else {
            Complex::new(0.0, 0.0)
        }
    });
    product
}

/// Multiply a spectrum by the phase ramp that translates the image by
/// `(dy, dx)` pixels. Positive values move content down and right.
pub fn fourier_shift(spectrum: &Array2<Complex<f64>>, dy: f64, dx: f64) -> Array2<Complex<f64>> {
    let (h, w) = spectrum.dim();
    let fy = fftfreq(h);
    let fx = fftfreq(w);
    let mut shifted = spectrum.clone();
    shifted.indexed_iter_mut().for_each(|((r, c), v)| {
        let phase = -TAU * (fy[r] * dy + fx[c] * dx);
        *v *= Complex::new(phase.cos(), phase.sin());
    });
    shifted
}

/// Translate an image by `(dy, dx)` with periodic boundaries.
pub fn shift_image(data: &Array2<f32>, dy: f64, dx: f64) -> Array2<f32> {
    shift_spectrum(&fft2d(data), dy, dx)
}

/// Translate the image whose spectrum is given and return the real part.
pub fn shift_spectrum(spectrum: &Array2<Complex<f64>>, dy: f64, dx: f64) -> Array2<f32> {
    ifft2d_real(&fourier_shift(spectrum, dy, dx)).mapv(|v| v as f32)
}

/// Location and value of the maximum of a real surface.
pub fn find_peak(data: &Array2<f64>) -> (usize, usize, f64) {
    let mut best = (0, 0, f64::NEG_INFINITY);
    for ((row, col), &v) in data.indexed_iter() {
        if v > best.2 {
            best = (row, col, v);
        }
    }
    best
}

/// Convert a peak index on a periodic axis of length `n` to a signed offset.
pub fn signed_offset(index: usize, n: usize) -> f64 {
    if index > n / 2 {
        index as f64 - n as f64
    } else {
        index as f64
    }
}

/// Separable Hann window.
pub fn apply_hann(data: &Array2<f32>) -> Array2<f32> {
    let (h, w) = data.dim();
    let wy: Vec<f64> = (0..h)
        .map(|r| 0.5 * (1.0 - (TAU * r as f64 / h as f64).cos()))
        .collect();
    let wx: Vec<f64> = (0..w)
        .map(|c| 0.5 * (1.0 - (TAU * c as f64 / w as f64).cos()))
        .collect();
    Array2::from_shape_fn((h, w), |(r, c)| data[[r, c]] * (wy[r] * wx[c]) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp(h: usize, w: usize) -> Array2<f32> {
        Array2::from_shape_fn((h, w), |(r, c)| ((r * 7 + c * 3) % 11) as f32 / 10.0)
    }

    #[test]
    fn fft_roundtrip_restores_image() {
        let img = ramp(12, 10);
        let back = ifft2d_real(&fft2d(&img));
        for (a, b) in img.iter().zip(back.iter()) {
            assert_abs_diff_eq!(*a as f64, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn integer_shift_is_circular_roll() {
        let img = ramp(8, 8);
        let shifted = shift_image(&img, 2.0, -3.0);
        for r in 0..8 {
            for c in 0..8 {
                let src = img[[(r + 8 - 2) % 8, (c + 3) % 8]];
                assert_abs_diff_eq!(shifted[[r, c]], src, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn fftfreq_matches_numpy_layout() {
        assert_eq!(fftfreq(4), vec![0.0, 0.25, -0.5, -0.25]);
        assert_eq!(fftfreq(5), vec![0.0, 0.2, 0.4, -0.4, -0.2]);
    }

    #[test]
    fn signed_offset_wraps_upper_half() {
        assert_eq!(signed_offset(3, 16), 3.0);
        assert_eq!(signed_offset(8, 16), 8.0);
        assert_eq!(signed_offset(13, 16), -3.0);
    }
}
