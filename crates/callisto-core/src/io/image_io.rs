use std::path::Path;

use image::{GrayImage, ImageBuffer, ImageFormat, Luma};
use ndarray::Array2;

use crate::error::Result;
use crate::image::Image;

/// Load an image file as grayscale, scaled to [0, 1].
pub fn load_image(path: &Path) -> Result<Image> {
    let gray = image::open(path)?.to_luma16();
    let (w, h) = gray.dimensions();
    let data = Array2::from_shape_fn((h as usize, w as usize), |(row, col)| {
        gray.get_pixel(col as u32, row as u32).0[0] as f32 / 65535.0
    });
    tracing::debug!(path = %path.display(), width = w, height = h, "loaded image");
    Ok(Image::bare(data))
}

/// Save as 16-bit grayscale TIFF.
pub fn save_tiff(data: &Array2<f32>, path: &Path) -> Result<()> {
    let (h, w) = data.dim();
    let img = ImageBuffer::<Luma<u16>, Vec<u16>>::from_fn(w as u32, h as u32, |col, row| {
        Luma([(data[[row as usize, col as usize]].clamp(0.0, 1.0) * 65535.0) as u16])
    });
    img.save_with_format(path, ImageFormat::Tiff)?;
    Ok(())
}

/// Save as 8-bit grayscale PNG.
pub fn save_png(data: &Array2<f32>, path: &Path) -> Result<()> {
    let (h, w) = data.dim();
    let img = GrayImage::from_fn(w as u32, h as u32, |col, row| {
        Luma([(data[[row as usize, col as usize]].clamp(0.0, 1.0) * 255.0) as u8])
    });
    img.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Save, choosing the format from the file extension (TIFF by default).
/// Values outside [0, 1] are clipped.
pub fn save_image(data: &Array2<f32>, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => save_png(data, path),
        _ => save_tiff(data, path),
    }
}
