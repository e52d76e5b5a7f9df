use thiserror::Error;

#[derive(Error, Debug)]
pub enum CallistoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Catalog format error: {0}")]
    Csv(#[from] csv::Error),

    /// The value cannot be converted to a 2-D pixel array.
    #[error("{context} {found}; expected a 2-D pixel array or an image with header")]
    UnsupportedType { context: &'static str, found: String },

    #[error(
        "Alignment method {method} is disabled because the {dependency} feature is not enabled"
    )]
    FeatureUnavailable {
        method: &'static str,
        dependency: &'static str,
    },

    #[error("Unexpected alignment method {0}!")]
    InvalidMethod(String),

    #[error("Combine method {0} is not implemented")]
    NotImplemented(String),

    #[error("Empty image sequence")]
    EmptySequence,

    #[error("Array size mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Found {found} stars, at least {required} are required")]
    NotEnoughStars { found: usize, required: usize },

    #[error("No acceptable transform: {0}")]
    NoMatch(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CallistoError>;
