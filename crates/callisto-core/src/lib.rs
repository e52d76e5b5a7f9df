pub mod error;
pub mod consts;
pub mod image;
pub mod config;
pub mod quality;
pub mod transform;
pub mod align;
pub mod catalog;
pub mod combine;
pub mod io;

pub use align::{align, align_with_config, align_with_registry};
pub use catalog::{align_catalogs, Catalog};
pub use combine::combine;
pub use error::{CallistoError, Result};
pub use image::{Header, Image, Images};
