use anyhow::Context;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use image::RgbImage;
use std::path::Path;

/// Decode an image file and convert it to packed RGB8.
pub fn load_rgb(path: impl AsRef<Path>) -> anyhow::Result<RgbImage> {
    let path = path.as_ref();
    let img = image::open(path).with_context(|| format!("Failed to decode {}", path.display()))?;
    Ok(img.to_rgb8())
}

pub(crate) fn check_buffer(pixels: &[u8], width: u32, height: u32) -> anyhow::Result<()> {
    let expected_size = (width as usize) * (height as usize) * 3;
    if pixels.len() != expected_size {
        anyhow::bail!(
            "Buffer size mismatch: expected {}, got {} bytes",
            expected_size,
            pixels.len()
        );
    }
    if width == 0 || height == 0 {
        anyhow::bail!("Cannot preprocess an empty {}x{} image", width, height);
    }
    Ok(())
}

/// Bilinear resize of a packed RGB8 buffer.
pub(crate) fn resize_rgb(
    resizer: &mut Resizer,
    pixels: &[u8],
    width: u32,
    height: u32,
    new_width: u32,
    new_height: u32,
) -> anyhow::Result<Vec<u8>> {
    let src = ImageRef::new(width, height, pixels, PixelType::U8x3)?;
    let mut resized = Image::new(new_width, new_height, PixelType::U8x3);

    resizer.resize(
        &src,
        &mut resized,
        &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
    )?;

    Ok(resized.buffer().to_vec())
}
