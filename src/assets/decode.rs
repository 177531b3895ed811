use std::sync::Arc;

use crate::foundation::{
    error::{PressPlayError, PressPlayResult},
    math::premultiply_rgba8_in_place,
};

/// Raster image in premultiplied RGBA8 form, ready to be painted.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    /// Premultiply a straight-alpha RGBA8 image.
    pub fn from_rgba8(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut rgba8_premul = img.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);
        Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        }
    }
}

/// Decode JPEG/PNG (or anything else `image` recognizes) into straight-alpha RGBA8.
pub fn decode_image(bytes: &[u8]) -> PressPlayResult<image::RgbaImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| PressPlayError::render(format!("decode image: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(PressPlayError::render("decoded image has zero size"));
    }
    Ok(rgba)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
