use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::{
    encode::sink::{FrameSink, SinkConfig},
    foundation::{
        core::{FrameIndex, FrameRange},
        error::{PressPlayError, PressPlayResult},
    },
    render::frame::FrameRGBA,
    scene::composer::{FramePainter, PainterSettings, ScenePlan},
    timeline::{
        assemble::{FrameSample, Timeline},
        composite::crossfade_in_place,
    },
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Threading and chunking controls for multi-frame rendering.
pub struct RenderThreading {
    /// Enable parallel rendering when `true`.
    pub parallel: bool,
    /// Chunk size in frames for batched scheduling.
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
}

impl Default for RenderThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
/// Aggregated rendering counters.
pub struct RenderStats {
    /// Frames pushed to the sink.
    pub frames_total: u64,
    /// Frames that were actually painted.
    pub frames_rendered: u64,
    /// Frames reused from an identical previous sample (held last frame).
    pub frames_elided: u64,
    /// Frames blended from two scenes.
    pub frames_crossfaded: u64,
}

/// Paint the frame a timeline sample describes.
pub fn render_sample(
    painter: &mut FramePainter,
    plans: &[ScenePlan],
    sample: FrameSample,
) -> PressPlayResult<FrameRGBA> {
    match sample {
        FrameSample::Single { scene, local_secs } => {
            painter.paint(plan_at(plans, scene)?, local_secs)
        }
        FrameSample::Crossfade {
            from,
            from_local_secs,
            to,
            to_local_secs,
            weight,
        } => {
            let mut out = painter.paint(plan_at(plans, from)?, from_local_secs)?;
            let incoming = painter.paint(plan_at(plans, to)?, to_local_secs)?;
            crossfade_in_place(&mut out.data, &incoming.data, weight)?;
            Ok(out)
        }
    }
}

/// Render every frame of `timeline` into `sink`.
///
/// Frames are produced in chunks; in parallel mode each rayon worker owns a [`FramePainter`] and
/// chunk results are pushed in frame order, so the output matches the sequential path exactly.
/// `cancel` is checked before every chunk.
#[tracing::instrument(level = "debug", skip_all, fields(frames = timeline.frame_count()))]
pub fn render_timeline(
    timeline: &Timeline,
    plans: &[ScenePlan],
    painter_settings: &PainterSettings,
    sink: &mut dyn FrameSink,
    sink_cfg: SinkConfig,
    threading: &RenderThreading,
    cancel: Option<&AtomicBool>,
) -> PressPlayResult<RenderStats> {
    let range = timeline.frame_range();
    if range.is_empty() {
        return Err(PressPlayError::render("timeline has no frames to render"));
    }
    if plans.len() != timeline.scenes.len() {
        return Err(PressPlayError::render(format!(
            "{} scene plans for {} timeline scenes",
            plans.len(),
            timeline.scenes.len()
        )));
    }

    let pool = if threading.parallel {
        Some(build_thread_pool(threading.threads)?)
    } else {
        None
    };
    let mut sequential = painter_settings.build();
    let chunk_size = normalized_chunk_size(threading.chunk_size);
    let mut stats = RenderStats::default();

    sink.begin(sink_cfg)?;
    let mut prev: Option<(FrameSample, FrameRGBA)> = None;

    let mut chunk_start = range.start.0;
    while chunk_start < range.end.0 {
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            tracing::info!(frame = chunk_start, "render cancelled");
            return Err(PressPlayError::Cancelled);
        }
        let chunk_end = (chunk_start + chunk_size).min(range.end.0);
        let chunk = FrameRange::new(FrameIndex(chunk_start), FrameIndex(chunk_end))?;

        let samples = (chunk.start.0..chunk.end.0)
            .map(|f| timeline.sample(FrameIndex(f)))
            .collect::<PressPlayResult<Vec<_>>>()?;
        let unique = unique_samples(&samples, prev.as_ref().map(|(s, _)| *s));

        let rendered = match pool.as_ref() {
            Some(pool) => render_parallel(pool, painter_settings, plans, &unique.samples)?,
            None => unique
                .samples
                .iter()
                .map(|s| render_sample(&mut sequential, plans, *s))
                .collect::<PressPlayResult<Vec<_>>>()?,
        };

        stats.frames_rendered += rendered.len() as u64;
        stats.frames_crossfaded += unique
            .samples
            .iter()
            .filter(|s| matches!(s, FrameSample::Crossfade { .. }))
            .count() as u64;

        let mut current = prev.as_ref().map(|(_, f)| f);
        for (offset, slot) in unique.frame_to_unique.iter().enumerate() {
            let idx = FrameIndex(chunk.start.0 + offset as u64);
            match slot {
                Some(u) => current = Some(&rendered[*u]),
                None => stats.frames_elided += 1,
            }
            let frame = current.ok_or_else(|| {
                PressPlayError::render("internal error: elided frame has no predecessor")
            })?;
            sink.push_frame(idx, frame)?;
            stats.frames_total += 1;
        }

        if let (Some(s), Some(f)) = (unique.samples.last(), rendered.last()) {
            prev = Some((*s, f.clone()));
        }
        chunk_start = chunk_end;
    }

    sink.end()?;
    tracing::debug!(?stats, "render finished");
    Ok(stats)
}

struct UniqueSamples {
    samples: Vec<FrameSample>,
    // `None` repeats the previous frame.
    frame_to_unique: Vec<Option<usize>>,
}

// Consecutive identical samples (the held last frame) are painted once.
fn unique_samples(samples: &[FrameSample], carried: Option<FrameSample>) -> UniqueSamples {
    let mut out = UniqueSamples {
        samples: Vec::with_capacity(samples.len()),
        frame_to_unique: Vec::with_capacity(samples.len()),
    };
    let mut last = carried;
    for s in samples {
        if last.as_ref() == Some(s) {
            out.frame_to_unique.push(None);
        } else {
            out.frame_to_unique.push(Some(out.samples.len()));
            out.samples.push(*s);
        }
        last = Some(*s);
    }
    out
}

fn render_parallel(
    pool: &rayon::ThreadPool,
    settings: &PainterSettings,
    plans: &[ScenePlan],
    samples: &[FrameSample],
) -> PressPlayResult<Vec<FrameRGBA>> {
    let rendered = pool.install(|| {
        samples
            .par_iter()
            .map_init(
                || settings.build(),
                |painter, sample| render_sample(painter, plans, *sample),
            )
            .collect::<Vec<_>>()
    });
    rendered.into_iter().collect()
}

fn plan_at(plans: &[ScenePlan], i: usize) -> PressPlayResult<&ScenePlan> {
    plans
        .get(i)
        .ok_or_else(|| PressPlayError::render(format!("no scene plan for scene {i}")))
}

fn build_thread_pool(threads: Option<usize>) -> PressPlayResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(PressPlayError::config(
            "render threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| PressPlayError::render(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
