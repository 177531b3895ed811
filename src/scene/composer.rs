use std::sync::Arc;

use crate::{
    assets::{decode::PreparedImage, font::CaptionFont},
    foundation::{
        core::{Affine, Canvas, Rect},
        error::{PressPlayError, PressPlayResult},
    },
    render::frame::{FrameRGBA, affine_to_cpu, canvas_dims_u16, image_paint},
    scene::{
        caption::{CaptionEngine, CaptionLayer, CaptionStyle},
        transform::{ZoomRange, ken_burns_transform},
    },
};

/// Everything needed to draw any frame of one scene. Read-only once built.
#[derive(Clone)]
pub struct ScenePlan {
    /// Scene index in timeline order.
    pub index: usize,
    /// Canvas-sized background paint.
    pub background: vello_cpu::Image,
    /// Caption overlay.
    pub caption: CaptionLayer,
    /// Zoom applied over the scene duration.
    pub zoom: ZoomRange,
    /// Scene duration in seconds.
    pub duration_secs: f64,
}

impl std::fmt::Debug for ScenePlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenePlan")
            .field("index", &self.index)
            .field("caption", &self.caption)
            .field("zoom", &self.zoom)
            .field("duration_secs", &self.duration_secs)
            .finish()
    }
}

impl ScenePlan {
    /// Normalized position of `local_secs` inside the scene, clamped to `[0, 1]`.
    pub fn progress(&self, local_secs: f64) -> f64 {
        if self.duration_secs <= 0.0 {
            return 1.0;
        }
        (local_secs / self.duration_secs).clamp(0.0, 1.0)
    }
}

/// Turns narration units and prepared images into [`ScenePlan`]s and renders their frames.
pub struct SceneComposer {
    canvas: Canvas,
    style: CaptionStyle,
    zoom: ZoomRange,
    bg_rgba: [u8; 4],
    engine: CaptionEngine,
    painter: FramePainter,
    // Keyed by pixel buffer identity; scenes cycling through the pool share one pixmap.
    paints: Vec<(Arc<Vec<u8>>, vello_cpu::Image)>,
}

impl SceneComposer {
    /// Build a composer drawing captions with `font`.
    pub fn new(
        canvas: Canvas,
        style: CaptionStyle,
        zoom: ZoomRange,
        bg_rgba: [u8; 4],
        font: &CaptionFont,
    ) -> PressPlayResult<Self> {
        let engine = CaptionEngine::new(font)?;
        let painter = PainterSettings::new(canvas, bg_rgba, font)?.build();
        Ok(Self {
            canvas,
            style,
            zoom,
            bg_rgba,
            engine,
            painter,
            paints: Vec::new(),
        })
    }

    /// Output canvas.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Lay out the caption for `text` over `background` for a scene of `duration_secs`.
    pub fn plan_scene(
        &mut self,
        index: usize,
        text: &str,
        background: &PreparedImage,
        duration_secs: f64,
    ) -> PressPlayResult<ScenePlan> {
        if background.width != self.canvas.width || background.height != self.canvas.height {
            return Err(PressPlayError::render(format!(
                "scene {index} background is {}x{}, expected {}x{}",
                background.width, background.height, self.canvas.width, self.canvas.height
            )));
        }
        let caption = self.engine.layout(text, &self.style, self.canvas)?;
        Ok(ScenePlan {
            index,
            background: self.background_paint(background)?,
            caption,
            zoom: self.zoom,
            duration_secs,
        })
    }

    fn background_paint(
        &mut self,
        background: &PreparedImage,
    ) -> PressPlayResult<vello_cpu::Image> {
        let pixels = &background.rgba8_premul;
        if let Some((_, paint)) = self.paints.iter().find(|(p, _)| Arc::ptr_eq(p, pixels)) {
            return Ok(paint.clone());
        }
        let paint = image_paint(background)?;
        self.paints.push((Arc::clone(pixels), paint.clone()));
        Ok(paint)
    }

    /// Render the frame of `plan` at `local_secs` seconds into the scene.
    pub fn render_frame(
        &mut self,
        plan: &ScenePlan,
        local_secs: f64,
    ) -> PressPlayResult<FrameRGBA> {
        self.painter.paint(plan, local_secs)
    }

    /// Settings from which render workers build their own [`FramePainter`].
    pub fn painter_settings(&self) -> PainterSettings {
        self.painter.settings.clone()
    }

    /// Background color that transparent regions flatten to.
    pub fn bg_rgba(&self) -> [u8; 4] {
        self.bg_rgba
    }
}

/// Everything a worker needs to build a [`FramePainter`]; cheap to clone and `Send + Sync`.
#[derive(Clone)]
pub struct PainterSettings {
    canvas: Canvas,
    dims: (u16, u16),
    bg_rgba: [u8; 4],
    font: vello_cpu::peniko::FontData,
}

impl PainterSettings {
    fn new(canvas: Canvas, bg_rgba: [u8; 4], font: &CaptionFont) -> PressPlayResult<Self> {
        Ok(Self {
            canvas,
            dims: canvas_dims_u16(canvas)?,
            bg_rgba,
            font: vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(font.bytes.as_ref().clone()),
                font.index,
            ),
        })
    }

    /// Allocate a painter with its own render context and pixmap.
    pub fn build(&self) -> FramePainter {
        let (w, h) = self.dims;
        FramePainter {
            settings: self.clone(),
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
        }
    }
}

/// Per-worker drawing state: one `vello_cpu` context and target pixmap.
pub struct FramePainter {
    settings: PainterSettings,
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
}

impl FramePainter {
    /// Draw background, zoomed image, caption plate and glyphs.
    pub fn paint(&mut self, plan: &ScenePlan, local_secs: f64) -> PressPlayResult<FrameRGBA> {
        let canvas = self.settings.canvas;
        let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
        let full = vello_cpu::kurbo::Rect::new(0.0, 0.0, cw, ch);
        let ctx = &mut self.ctx;
        ctx.reset();

        let [r, g, b, a] = self.settings.bg_rgba;
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_rect(&full);

        let zoom = ken_burns_transform(plan.progress(local_secs), canvas, plan.zoom);
        ctx.set_transform(affine_to_cpu(zoom));
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(plan.background.clone());
        ctx.fill_rect(&full);

        draw_caption(ctx, &self.settings.font, &plan.caption);

        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        Ok(FrameRGBA {
            width: canvas.width,
            height: canvas.height,
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn draw_caption(
    ctx: &mut vello_cpu::RenderContext,
    font: &vello_cpu::peniko::FontData,
    caption: &CaptionLayer,
) {
    let [r, g, b, a] = caption.plate_rgba;
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
    ctx.fill_rect(&rect_to_cpu(caption.plate));

    for (line, offset) in caption.layout.lines().zip(caption.line_offsets.iter()) {
        let origin = Affine::translate((
            caption.origin.x + f64::from(*offset),
            caption.origin.y,
        ));
        ctx.set_transform(affine_to_cpu(origin));
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/composer.rs"]
mod tests;
