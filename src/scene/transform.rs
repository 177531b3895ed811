//! Stateless image transforms applied to every background before it becomes a scene.
//!
//! Each step is a plain function so it can be tested without rendering a frame:
//! `decode -> fit_to_height -> cover_to_canvas -> premultiply`, then per frame
//! [`ken_burns_transform`] animates the zoom.

use image::{RgbaImage, imageops};

use crate::{
    assets::decode::{PreparedImage, decode_image},
    foundation::{
        core::{Affine, Canvas, Vec2},
        error::PressPlayResult,
    },
};

/// Zoom range of the Ken-Burns effect, as scale factors of the canvas.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ZoomRange {
    /// Scale at the first frame of a scene.
    pub from: f64,
    /// Scale at the last frame of a scene.
    pub to: f64,
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self { from: 1.0, to: 1.1 }
    }
}

impl ZoomRange {
    /// Scale factor at `progress` in `[0, 1]` (clamped), linear in time.
    pub fn scale_at(self, progress: f64) -> f64 {
        let p = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.from + (self.to - self.from) * p
    }
}

/// Resize to exactly `height` pixels tall, preserving aspect ratio.
pub fn fit_to_height(img: &RgbaImage, height: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    if h == height {
        return img.clone();
    }
    let scaled_w = ((f64::from(w) * f64::from(height)) / f64::from(h))
        .round()
        .max(1.0) as u32;
    imageops::resize(img, scaled_w, height, imageops::FilterType::Lanczos3)
}

/// Center `img` on a `canvas`-sized transparent image.
///
/// Larger images are center-cropped; smaller ones are padded on both sides.
pub fn cover_to_canvas(img: &RgbaImage, canvas: Canvas) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w == canvas.width && h == canvas.height {
        return img.clone();
    }
    let mut out = RgbaImage::new(canvas.width, canvas.height);
    let x = (i64::from(canvas.width) - i64::from(w)) / 2;
    let y = (i64::from(canvas.height) - i64::from(h)) / 2;
    imageops::replace(&mut out, img, x, y);
    out
}

/// Decode an encoded image and bring it to canvas size, ready to paint.
pub fn prepare_background(bytes: &[u8], canvas: Canvas) -> PressPlayResult<PreparedImage> {
    let decoded = decode_image(bytes)?;
    let fitted = fit_to_height(&decoded, canvas.height);
    Ok(PreparedImage::from_rgba8(cover_to_canvas(&fitted, canvas)))
}

/// Transform for a canvas-sized background drawn at the origin, scaled about the canvas center.
pub fn ken_burns_transform(progress: f64, canvas: Canvas, zoom: ZoomRange) -> Affine {
    let s = zoom.scale_at(progress);
    let c = canvas.center().to_vec2();
    Affine::translate(c) * Affine::scale(s) * Affine::translate(Vec2::ZERO - c)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/transform.rs"]
mod tests;
