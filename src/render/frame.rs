use std::sync::Arc;

use crate::{
    assets::decode::PreparedImage,
    foundation::{
        core::{Affine, Canvas},
        error::{PressPlayError, PressPlayResult},
    },
};

/// A rendered frame as RGBA8 pixels.
///
/// Frames are **premultiplied alpha**; sinks flatten them over a background before encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Frame sized for `canvas` with every pixel transparent.
    pub fn transparent(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.rgba8_len()],
            premultiplied: true,
        }
    }

    /// Straight-alpha copy suitable for PNG export.
    pub fn to_rgba_image(&self) -> PressPlayResult<image::RgbaImage> {
        let mut data = self.data.clone();
        if self.premultiplied {
            for px in data.chunks_exact_mut(4) {
                let a = u16::from(px[3]);
                if a == 0 || a == 255 {
                    continue;
                }
                for c in &mut px[..3] {
                    *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
                }
            }
        }
        image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| PressPlayError::render("frame byte length does not match its size"))
    }
}

pub(crate) fn canvas_dims_u16(canvas: Canvas) -> PressPlayResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| PressPlayError::render("canvas width exceeds u16"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| PressPlayError::render("canvas height exceeds u16"))?;
    Ok((w, h))
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

/// Wrap premultiplied pixels as a `vello_cpu` image paint.
pub(crate) fn image_paint(prepared: &PreparedImage) -> PressPlayResult<vello_cpu::Image> {
    let w: u16 = prepared
        .width
        .try_into()
        .map_err(|_| PressPlayError::render("image width exceeds u16"))?;
    let h: u16 = prepared
        .height
        .try_into()
        .map_err(|_| PressPlayError::render("image height exceeds u16"))?;
    let bytes = prepared.rgba8_premul.as_slice();
    if bytes.len() != (prepared.width as usize) * (prepared.height as usize) * 4 {
        return Err(PressPlayError::render("pixmap byte len mismatch"));
    }

    // Pixmap stores PremulRgba8; our bytes are already premultiplied.
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]])
        })
        .collect::<Vec<_>>();
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, true);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
