//! Image decoding for the image viewer.

use std::path::Path;

use anyhow::Context as _;
use image::DynamicImage;

/// Decodes an image file into memory. Zooming and panning are display
/// concerns; the engine hands back the full-resolution frame.
pub fn load_image(path: &Path) -> anyhow::Result<DynamicImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image {}", path.display()))?;
    image::load_from_memory(&bytes)
        .with_context(|| format!("decode image {}", path.display()))
}
