use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_CROSS_CORRELATION_UPSAMPLE, DEFAULT_DETECTION_SIGMA, DEFAULT_INVARIANT_TOLERANCE,
    DEFAULT_LOG_POLAR_ANGLES, DEFAULT_LOG_POLAR_RADII, DEFAULT_LOG_POLAR_TRANSLATION_UPSAMPLE,
    DEFAULT_MAX_CONTROL_POINTS, DEFAULT_MAX_HYPOTHESES, DEFAULT_MIN_MATCHES_FRACTION,
    DEFAULT_MIN_STAR_AREA, DEFAULT_NEAREST_NEIGHBORS, DEFAULT_PIXEL_TOLERANCE,
};
use crate::error::{CallistoError, Result};

/// Alignment backend, identified by name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignMethod {
    /// Star-triangle feature registration.
    #[default]
    Astroalign,
    /// Upsampled cross-correlation translation, applied in the Fourier domain.
    Skimage,
    /// Chi-squared translation estimate.
    Chi2,
    /// Log-polar similarity registration.
    Imreg,
}

impl AlignMethod {
    pub const ALL: [AlignMethod; 4] = [
        AlignMethod::Astroalign,
        AlignMethod::Skimage,
        AlignMethod::Chi2,
        AlignMethod::Imreg,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AlignMethod::Astroalign => "astroalign",
            AlignMethod::Skimage => "skimage",
            AlignMethod::Chi2 => "chi2",
            AlignMethod::Imreg => "imreg",
        }
    }
}

impl fmt::Display for AlignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlignMethod {
    type Err = CallistoError;

    fn from_str(s: &str) -> Result<Self> {
        AlignMethod::ALL
            .into_iter()
            .find(|m| m.name() == s)
            .ok_or_else(|| CallistoError::InvalidMethod(s.to_string()))
    }
}

/// Pixel-wise reduction used to combine aligned images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineMethod {
    /// Pixel-wise median.
    #[default]
    Numpy,
    /// Resampling co-addition. Recognized but not implemented.
    Swarp,
}

impl CombineMethod {
    pub fn name(&self) -> &'static str {
        match self {
            CombineMethod::Numpy => "numpy",
            CombineMethod::Swarp => "swarp",
        }
    }
}

impl fmt::Display for CombineMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CombineMethod {
    type Err = CallistoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "numpy" => Ok(CombineMethod::Numpy),
            "swarp" => Ok(CombineMethod::Swarp),
            other => Err(CallistoError::NotImplemented(other.to_string())),
        }
    }
}

/// Sharpness metric used to pick a reference image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityMetric {
    #[default]
    Laplacian,
    Gradient,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossCorrelationConfig {
    /// Sub-pixel precision is 1/upsample_factor. 1 disables refinement.
    pub upsample_factor: usize,
}

impl Default for CrossCorrelationConfig {
    fn default() -> Self {
        Self {
            upsample_factor: DEFAULT_CROSS_CORRELATION_UPSAMPLE,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Chi2Config {
    /// `None` picks the factor from the image size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upsample_factor: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogPolarConfig {
    /// Angular samples over [0, pi).
    pub angles: usize,
    /// Radial (log-spaced) samples.
    pub radii: usize,
    /// Upsampling factor of the final translation estimate.
    pub translation_upsample: usize,
}

impl Default for LogPolarConfig {
    fn default() -> Self {
        Self {
            angles: DEFAULT_LOG_POLAR_ANGLES,
            radii: DEFAULT_LOG_POLAR_RADII,
            translation_upsample: DEFAULT_LOG_POLAR_TRANSLATION_UPSAMPLE,
        }
    }
}

/// Star detection and triangle matching parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriangleMatchConfig {
    /// Use at most this many points (brightest first) from each set.
    #[serde(default = "default_max_control_points")]
    pub max_control_points: usize,
    /// Neighbourhood size, including the star itself, used to form triangles.
    #[serde(default = "default_nearest_neighbors")]
    pub nearest_neighbors: usize,
    /// Inlier residual in pixels.
    #[serde(default = "default_pixel_tolerance")]
    pub pixel_tolerance: f64,
    /// Fraction of matched triangles that must agree on the transform.
    #[serde(default = "default_min_matches_fraction")]
    pub min_matches_fraction: f64,
    /// Maximum distance between matching triangle invariants.
    #[serde(default = "default_invariant_tolerance")]
    pub invariant_tolerance: f64,
    /// Star detection threshold, in background standard deviations.
    #[serde(default = "default_detection_sigma")]
    pub detection_sigma: f32,
    /// Minimum star area in pixels.
    #[serde(default = "default_min_star_area")]
    pub min_star_area: usize,
    /// Triangle matches tried as transform hypotheses, closest invariants first.
    #[serde(default = "default_max_hypotheses")]
    pub max_hypotheses: usize,
}

fn default_max_control_points() -> usize {
    DEFAULT_MAX_CONTROL_POINTS
}
fn default_nearest_neighbors() -> usize {
    DEFAULT_NEAREST_NEIGHBORS
}
fn default_pixel_tolerance() -> f64 {
    DEFAULT_PIXEL_TOLERANCE
}
fn default_min_matches_fraction() -> f64 {
    DEFAULT_MIN_MATCHES_FRACTION
}
fn default_invariant_tolerance() -> f64 {
    DEFAULT_INVARIANT_TOLERANCE
}
fn default_detection_sigma() -> f32 {
    DEFAULT_DETECTION_SIGMA
}
fn default_min_star_area() -> usize {
    DEFAULT_MIN_STAR_AREA
}
fn default_max_hypotheses() -> usize {
    DEFAULT_MAX_HYPOTHESES
}

impl Default for TriangleMatchConfig {
    fn default() -> Self {
        Self {
            max_control_points: DEFAULT_MAX_CONTROL_POINTS,
            nearest_neighbors: DEFAULT_NEAREST_NEIGHBORS,
            pixel_tolerance: DEFAULT_PIXEL_TOLERANCE,
            min_matches_fraction: DEFAULT_MIN_MATCHES_FRACTION,
            invariant_tolerance: DEFAULT_INVARIANT_TOLERANCE,
            detection_sigma: DEFAULT_DETECTION_SIGMA,
            min_star_area: DEFAULT_MIN_STAR_AREA,
            max_hypotheses: DEFAULT_MAX_HYPOTHESES,
        }
    }
}

/// Settings for [`crate::align::align_with_config`] and the point-set aligner.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignConfig {
    #[serde(default)]
    pub method: AlignMethod,
    #[serde(default)]
    pub reference_metric: QualityMetric,
    #[serde(default)]
    pub combine_method: CombineMethod,
    #[serde(default)]
    pub cross_correlation: CrossCorrelationConfig,
    #[serde(default)]
    pub chi2: Chi2Config,
    #[serde(default)]
    pub log_polar: LogPolarConfig,
    #[serde(default)]
    pub triangle: TriangleMatchConfig,
}

impl AlignConfig {
    pub fn with_method(method: AlignMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CallistoError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| CallistoError::Config(e.to_string()))
    }
}
