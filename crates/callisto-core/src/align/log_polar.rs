//! Similarity registration (translation, rotation, uniform scale) by the
//! Fourier-Mellin method.
//!
//! 1. Magnitude spectra are translation invariant. Resampled on a log-polar
//!    grid, a rotation becomes a shift along the angle axis and a scale
//!    change a shift along the log-radius axis; phase correlation finds both
//!    once the angle-independent radial profile is removed.
//! 2. The magnitude spectrum is symmetric, so the angle is known modulo pi.
//!    Both candidates are tried and the one whose translation step gives the
//!    stronger phase-correlation peak wins.
//! 3. The source is resampled once with the combined transform.

use std::f64::consts::PI;

use ndarray::Array2;

use crate::config::{AlignConfig, LogPolarConfig};
use crate::error::{CallistoError, Result};
use crate::transform::Transform2D;

use super::check_same_shape;
use super::fourier::{
    apply_hann, fft2d, fftfreq, find_peak, ifft2d_real, normalized_cross_power, signed_offset,
};
use super::subpixel::refine_peak_paraboloid;
use super::upsampled::refine_peak;
use super::warp::{bilinear_sample, warp_image};

/// Outcome of [`similarity`].
#[derive(Clone, Debug)]
pub struct SimilarityResult {
    /// Maps source pixel coordinates onto reference pixel coordinates.
    pub transform: Transform2D,
    /// Rotation of the source relative to the reference, radians.
    pub angle: f64,
    /// Scale of the source relative to the reference.
    pub scale: f64,
    /// Height of the final phase-correlation peak, in [0, 1].
    pub success: f64,
    /// Source resampled onto the reference grid.
    pub image: Array2<f32>,
}

/// Register `source` against `reference` with a similarity transform.
pub fn similarity(
    reference: &Array2<f32>,
    source: &Array2<f32>,
    config: &LogPolarConfig,
) -> Result<SimilarityResult> {
    check_same_shape(reference, source)?;
    let (h, w) = reference.dim();
    if h < 4 || w < 4 || config.angles < 2 || config.radii < 2 {
        return Err(CallistoError::Config(format!(
            "log-polar registration needs at least 4x4 pixels and 2x2 samples, got {}x{} and {}x{}",
            w, h, config.angles, config.radii
        )));
    }

    let grid = LogPolarGrid::new(h, w, config);
    let ref_lp = grid.resample(reference);
    let src_lp = grid.resample(source);

    let correlation = ifft2d_real(&normalized_cross_power(&fft2d(&ref_lp), &fft2d(&src_lp)));
    let (peak_a, peak_r, _) = find_peak(&correlation);
    let (sub_a, sub_r) = refine_peak_paraboloid(&correlation, peak_a, peak_r);

    // The source log-polar map is the reference one shifted by (+angle, -ln scale);
    // the correlation peaks at the negated shift.
    let angle = -(signed_offset(peak_a, config.angles) + sub_a) * grid.angle_step;
    let scale = ((signed_offset(peak_r, config.radii) + sub_r) * grid.log_step).exp();
    tracing::debug!(angle_deg = angle.to_degrees(), scale, "log-polar rotation/scale");

    let center = Transform2D::translation(w as f64 / 2.0, h as f64 / 2.0);
    let uncenter = Transform2D::translation(-(w as f64) / 2.0, -(h as f64) / 2.0);

    let mut best: Option<(f64, f64, Transform2D)> = None;
    for candidate in [angle, angle + PI] {
        let forward = Transform2D::similarity(scale, candidate, 0.0, 0.0);
        let to_source = center.compose(&forward).compose(&uncenter);
        let unrotated = warp_image(source, &to_source, (h, w));

        let (dy, dx, peak) = translation_peak(reference, &unrotated, config.translation_upsample);
        let to_source = to_source.compose(&Transform2D::translation(-dx, -dy));
        if best.as_ref().is_none_or(|(_, p, _)| peak > *p) {
            best = Some((candidate, peak, to_source));
        }
    }

    let (angle, success, to_source) =
        best.ok_or_else(|| CallistoError::NoMatch("no rotation candidate".to_string()))?;
    let transform = to_source
        .inverse()
        .ok_or_else(|| CallistoError::NoMatch(format!("degenerate scale {}", scale)))?;

    Ok(SimilarityResult {
        transform,
        angle: wrap_angle(angle),
        scale,
        success,
        image: warp_image(source, &to_source, (h, w)),
    })
}

/// `imreg` backend: the resampled source of [`similarity`].
pub fn align_log_polar(
    reference: &Array2<f32>,
    source: &Array2<f32>,
    config: &AlignConfig,
) -> Result<Array2<f32>> {
    similarity(reference, source, &config.log_polar).map(|result| result.image)
}

/// Phase-correlation translation moving `image` onto `reference`, with the
/// peak height as a match score.
fn translation_peak(
    reference: &Array2<f32>,
    image: &Array2<f32>,
    upsample: usize,
) -> (f64, f64, f64) {
    let (h, w) = reference.dim();
    let product = normalized_cross_power(&fft2d(reference), &fft2d(image));
    let correlation = ifft2d_real(&product);
    let (row, col, peak) = find_peak(&correlation);
    let coarse = (signed_offset(row, h), signed_offset(col, w));
    let (dy, dx) = refine_peak(&product, coarse, upsample);
    (dy, dx, peak)
}

fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

/// Log-polar sampling of the high-passed magnitude spectrum.
struct LogPolarGrid {
    angles: usize,
    radii: usize,
    angle_step: f64,
    log_step: f64,
    min_freq: f64,
    /// High-pass weight per spectrum bin, in FFT order.
    highpass: Array2<f64>,
}

impl LogPolarGrid {
    fn new(h: usize, w: usize, config: &LogPolarConfig) -> Self {
        let min_freq = 1.0 / h.min(w) as f64;
        let max_freq = 0.5;
        let fy = fftfreq(h);
        let fx = fftfreq(w);
        let highpass = Array2::from_shape_fn((h, w), |(r, c)| {
            let x = (PI * fy[r]).cos() * (PI * fx[c]).cos();
            (1.0 - x) * (2.0 - x)
        });
        Self {
            angles: config.angles,
            radii: config.radii,
            angle_step: PI / config.angles as f64,
            log_step: (max_freq / min_freq).ln() / (config.radii - 1) as f64,
            min_freq,
            highpass,
        }
    }

    /// Rows are angles in [0, pi), columns log-spaced radii.
    fn resample(&self, data: &Array2<f32>) -> Array2<f32> {
        let (h, w) = data.dim();
        let spectrum = fft2d(&apply_hann(data));

        // fftshift so the zero frequency sits at (h/2, w/2)
        let mut magnitude = Array2::<f32>::zeros((h, w));
        for ((r, c), v) in spectrum.indexed_iter() {
            let value = (v.norm() * self.highpass[[r, c]]).ln_1p();
            magnitude[[(r + h / 2) % h, (c + w / 2) % w]] = value as f32;
        }

        let (cy, cx) = ((h / 2) as f64, (w / 2) as f64);
        let mut polar = Array2::from_shape_fn((self.angles, self.radii), |(a, j)| {
            let theta = a as f64 * self.angle_step;
            let freq = self.min_freq * (j as f64 * self.log_step).exp();
            let y = cy + freq * theta.sin() * h as f64;
            let x = cx + freq * theta.cos() * w as f64;
            bilinear_sample(&magnitude, y, x)
        });
        suppress_fixed_pattern(&mut polar);
        polar
    }
}

/// Standardize each radius over all angles and Hann-taper the radial axis.
///
/// Isotropic terms (point-spread envelope, high-pass, window) are the same in
/// both images and otherwise pull the correlation peak to zero shift. Radii
/// whose spread is below a tenth of the largest are scaled down rather than
/// amplified. The radial axis is not periodic, hence the taper.
fn suppress_fixed_pattern(polar: &mut Array2<f32>) {
    let radii = polar.ncols();
    let spreads: Vec<f32> = polar
        .columns_mut()
        .into_iter()
        .map(|mut column| {
            let mean = column.mean().unwrap_or(0.0);
            column.mapv_inplace(|v| v - mean);
            column.mapv(|v| v * v).mean().unwrap_or(0.0).sqrt()
        })
        .collect();
    let floor = 0.1 * spreads.iter().copied().fold(0.0f32, f32::max);
    if floor <= 0.0 {
        return;
    }

    for (j, mut column) in polar.columns_mut().into_iter().enumerate() {
        let taper = 0.5 * (1.0 - (2.0 * PI * j as f64 / (radii - 1) as f64).cos());
        let scale = taper as f32 / spreads[j].max(floor);
        column.mapv_inplace(|v| v * scale);
    }
}
