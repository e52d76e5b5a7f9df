mod dispatcher;
pub mod fourier;
mod registry;
pub mod subpixel;
pub mod upsampled;
pub mod warp;

#[cfg(feature = "chi2")]
pub mod chi2;
#[cfg(feature = "skimage")]
pub mod cross_correlation;
#[cfg(feature = "astroalign")]
pub mod feature_match;
#[cfg(feature = "imreg")]
pub mod log_polar;
#[cfg(feature = "astroalign")]
pub mod stars;

use ndarray::Array2;

use crate::error::{CallistoError, Result};

pub use crate::config::AlignMethod;
pub use dispatcher::{align, align_with_config, align_with_registry};
pub use registry::{Backend, BackendFn, BackendRegistry};

/// Translation of a source relative to a reference, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AlignmentOffset {
    pub dx: f64,
    pub dy: f64,
}

pub(crate) fn check_same_shape(reference: &Array2<f32>, source: &Array2<f32>) -> Result<()> {
    if reference.dim() != source.dim() {
        return Err(CallistoError::DimensionMismatch {
            expected: reference.dim(),
            found: source.dim(),
        });
    }
    Ok(())
}
