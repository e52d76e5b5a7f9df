pub mod catalog_csv;
pub mod image_io;

pub use catalog_csv::{load_catalog_csv, save_catalog_csv};
pub use image_io::{load_image, save_image};
