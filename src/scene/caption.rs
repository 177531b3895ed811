use std::sync::Arc;

use crate::{
    assets::font::CaptionFont,
    foundation::{
        core::{Canvas, Point, Rect},
        error::{PressPlayError, PressPlayResult},
    },
};

/// RGBA8 brush color carried through Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl From<[u8; 4]> for TextBrushRgba8 {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self { r, g, b, a }
    }
}

/// Visual contract of the per-scene caption.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CaptionStyle {
    /// Glyph size in pixels.
    pub font_size_px: f32,
    /// Maximum plate width in pixels, padding included.
    pub max_width_px: f32,
    /// Space between the plate edge and the text.
    pub padding_px: f32,
    /// Glyph color, straight RGBA8.
    pub text_rgba: [u8; 4],
    /// Plate color, straight RGBA8.
    pub plate_rgba: [u8; 4],
    /// Plate top edge as a fraction of frame height.
    pub anchor_y: f32,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_size_px: 36.0,
            max_width_px: 1200.0,
            padding_px: 12.0,
            text_rgba: [255, 255, 255, 255],
            plate_rgba: [0, 0, 0, 153],
            anchor_y: 0.8,
        }
    }
}

impl CaptionStyle {
    /// Check ranges; called from `PipelineConfig::validate`.
    pub fn validate(&self, canvas: Canvas) -> PressPlayResult<()> {
        if !self.font_size_px.is_finite() || self.font_size_px <= 0.0 {
            return Err(PressPlayError::config("caption font_size_px must be > 0"));
        }
        if !self.padding_px.is_finite() || self.padding_px < 0.0 {
            return Err(PressPlayError::config("caption padding_px must be >= 0"));
        }
        let wrap = self.max_width_px - 2.0 * self.padding_px;
        if !wrap.is_finite() || wrap < self.font_size_px {
            return Err(PressPlayError::config(
                "caption max_width_px leaves no room for text after padding",
            ));
        }
        if self.max_width_px > canvas.width as f32 {
            return Err(PressPlayError::config(
                "caption max_width_px must not exceed the canvas width",
            ));
        }
        if !(0.0..=1.0).contains(&self.anchor_y) {
            return Err(PressPlayError::config("caption anchor_y must be in [0, 1]"));
        }
        Ok(())
    }

    fn wrap_width(&self) -> f32 {
        self.max_width_px - 2.0 * self.padding_px
    }
}

/// Caption laid out and placed for one scene; static for the scene's whole duration.
#[derive(Clone)]
pub struct CaptionLayer {
    /// Shaped, wrapped text.
    pub layout: Arc<parley::Layout<TextBrushRgba8>>,
    /// Horizontal offset of each line so lines are centered within the block.
    pub line_offsets: Vec<f32>,
    /// Background plate in frame coordinates.
    pub plate: Rect,
    /// Top-left of the text block in frame coordinates.
    pub origin: Point,
    /// Plate color, straight RGBA8.
    pub plate_rgba: [u8; 4],
}

impl std::fmt::Debug for CaptionLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionLayer")
            .field("lines", &self.line_offsets.len())
            .field("plate", &self.plate)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Builds caption layers with a single registered font.
pub struct CaptionEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
}

impl CaptionEngine {
    /// Register `font` with a fresh Parley context.
    pub fn new(font: &CaptionFont) -> PressPlayResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.bytes.as_ref().clone()), None);

        let mut names = Vec::with_capacity(families.len());
        for (id, _) in &families {
            if let Some(name) = font_ctx.collection.family_name(*id) {
                names.push(name.to_string());
            }
        }
        let family_name = names
            .iter()
            .find(|n| **n == font.family)
            .or_else(|| names.first())
            .cloned()
            .ok_or_else(|| {
                PressPlayError::render_dependency(format!(
                    "caption font '{}' registered no usable family",
                    font.family
                ))
            })?;

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    /// Family name used for every caption.
    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Shape `text`, wrap it to the style's width and place the plate on `canvas`.
    pub fn layout(
        &mut self,
        text: &str,
        style: &CaptionStyle,
        canvas: Canvas,
    ) -> PressPlayResult<CaptionLayer> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.font_size_px));
        builder.push_default(parley::style::StyleProperty::FontWeight(
            parley::style::FontWeight::BOLD,
        ));
        builder.push_default(parley::style::StyleProperty::Brush(TextBrushRgba8::from(
            style.text_rgba,
        )));

        let wrap = style.wrap_width();
        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(Some(wrap));
        layout.align(
            Some(wrap),
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );

        let mut advances = Vec::new();
        let mut block_h = 0.0f32;
        for line in layout.lines() {
            let m = line.metrics();
            advances.push(m.advance.min(wrap));
            block_h += m.ascent + m.descent + m.leading;
        }
        if advances.is_empty() {
            return Err(PressPlayError::render("caption produced no lines"));
        }

        let block_w = advances.iter().copied().fold(0.0f32, f32::max);
        let line_offsets = advances.iter().map(|a| (block_w - a) / 2.0).collect();
        let (plate, origin) = place_plate(block_w, block_h, style, canvas);

        Ok(CaptionLayer {
            layout: Arc::new(layout),
            line_offsets,
            plate,
            origin,
            plate_rgba: style.plate_rgba,
        })
    }
}

/// Center the plate horizontally with its top at `anchor_y`, pulled up if it would leave the frame.
///
/// The plate is snapped to whole pixels so its edges stay opaque.
pub(crate) fn place_plate(
    block_w: f32,
    block_h: f32,
    style: &CaptionStyle,
    canvas: Canvas,
) -> (Rect, Point) {
    let pad = f64::from(style.padding_px);
    let plate_w = (f64::from(block_w) + 2.0 * pad)
        .ceil()
        .min(f64::from(style.max_width_px).floor());
    let plate_h = (f64::from(block_h) + 2.0 * pad).ceil();
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));

    let x = ((cw - plate_w) / 2.0).max(0.0).floor();
    let anchored = (f64::from(style.anchor_y) * ch).round();
    let y = anchored.min((ch - plate_h - pad).floor()).max(0.0);

    let plate = Rect::new(x, y, x + plate_w, y + plate_h);
    (plate, Point::new(x + pad, y + pad))
}

#[cfg(test)]
#[path = "../../tests/unit/scene/caption.rs"]
mod tests;
