/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Minimum image count to align images in parallel.
pub const PARALLEL_FRAME_THRESHOLD: usize = 4;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f64 = 1e-12;

/// Upsampling factor for the cross-correlation backend (1/100 pixel).
pub const DEFAULT_CROSS_CORRELATION_UPSAMPLE: usize = 100;

/// Upper bound of the automatically chosen chi-squared upsampling factor.
pub const MAX_CHI2_UPSAMPLE: usize = 100;

/// Width of the refined region around a coarse correlation peak, in pixels.
pub const UPSAMPLED_REGION_PIXELS: f64 = 1.5;

/// Angular samples of the log-polar spectrum over [0, pi).
pub const DEFAULT_LOG_POLAR_ANGLES: usize = 360;

/// Radial samples of the log-polar spectrum.
pub const DEFAULT_LOG_POLAR_RADII: usize = 256;

/// Upsampling factor for the translation step after rotation/scale recovery.
pub const DEFAULT_LOG_POLAR_TRANSLATION_UPSAMPLE: usize = 10;

/// Maximum number of stars (brightest first) used as control points.
pub const DEFAULT_MAX_CONTROL_POINTS: usize = 50;

/// Stars per neighbourhood (including the star itself) used to build triangles.
pub const DEFAULT_NEAREST_NEIGHBORS: usize = 5;

/// Maximum residual, in pixels, for a triangle match to count as an inlier.
pub const DEFAULT_PIXEL_TOLERANCE: f64 = 2.0;

/// Fraction of matched triangles that must agree on a transform.
pub const DEFAULT_MIN_MATCHES_FRACTION: f64 = 0.8;

/// Upper bound on the number of agreeing triangles required.
pub const MAX_REQUIRED_MATCHES: usize = 10;

/// Maximum distance between two triangle invariants to count as a match.
pub const DEFAULT_INVARIANT_TOLERANCE: f64 = 0.1;

/// Triangle matches tried as transform hypotheses before giving up.
pub const DEFAULT_MAX_HYPOTHESES: usize = 500;

/// Minimum number of stars needed to form a triangle.
pub const MIN_STARS: usize = 3;

/// Detection threshold in standard deviations above the background.
pub const DEFAULT_DETECTION_SIGMA: f32 = 3.0;

/// Minimum connected pixel count for a detected star.
pub const DEFAULT_MIN_STAR_AREA: usize = 5;
