use crate::{Error, Result};
use image::{ImageFormat, imageops::FilterType};
use std::io::Cursor;

/// Decodes `bytes`, halves both dimensions (rounding down) and re-encodes
/// as PNG.
pub fn half_size_png(bytes: &[u8]) -> Result<Vec<u8>> {
    let image = image::load_from_memory(bytes)?;
    let (width, height) = (image.width() / 2, image.height() / 2);
    if width == 0 || height == 0 {
        return Err(Error::invalid_input(format!(
            "image {}x{} is too small for a thumbnail",
            image.width(),
            image.height()
        )));
    }

    let resized = image.resize_exact(width, height, FilterType::CatmullRom);
    let mut buffer = Cursor::new(Vec::new());
    resized.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}
