//! Scene timing: even split of the narration across scenes, overlap sequencing and the
//! frame-by-frame sampling the renderer follows.
//!
//! Scene `i` of duration `d` starts at `i * (d - c)` where `c` is the crossfade. Inside an overlap
//! the outgoing and incoming scenes are blended with weight `(t - start_in) / c`.

use crate::{
    assets::pool::pool_index,
    foundation::{
        core::{Fps, FrameIndex, FrameRange},
        error::{PressPlayError, PressPlayResult, ValidationError},
    },
    script::NarrationUnit,
};

/// How the video is reconciled with a narration longer than the overlapped scenes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSync {
    /// Hold the last frame until the narration ends.
    #[default]
    FreezeLastFrame,
    /// Keep the overlapped length; the narration runs past the last frame.
    Overlap,
}

impl std::str::FromStr for AudioSync {
    type Err = PressPlayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "freeze" | "freeze_last_frame" => Ok(Self::FreezeLastFrame),
            "overlap" => Ok(Self::Overlap),
            other => Err(PressPlayError::config(format!(
                "unknown audio sync policy '{other}' (expected 'freeze' or 'overlap')"
            ))),
        }
    }
}

/// Timing knobs for [`assemble`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelineOpts {
    /// Requested crossfade between consecutive scenes.
    pub crossfade_secs: f64,
    /// Output frame rate.
    pub fps: Fps,
    /// Audio/video reconciliation policy.
    pub audio_sync: AudioSync,
}

impl Default for TimelineOpts {
    fn default() -> Self {
        Self {
            crossfade_secs: 0.5,
            fps: Fps { num: 24, den: 1 },
            audio_sync: AudioSync::default(),
        }
    }
}

/// One narration unit placed on the timeline.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Scene {
    /// Narration unit shown as the caption.
    pub unit: NarrationUnit,
    /// Index into the image pool.
    pub image_index: usize,
    /// Start on the video timeline.
    pub start_secs: f64,
    /// Scene length, crossfades included.
    pub duration_secs: f64,
    /// Whether the scene fades in over the previous one.
    pub transition_in: bool,
}

impl Scene {
    /// End on the video timeline.
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }
}

/// Ordered scenes plus the parameters needed to sample frames.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Timeline {
    /// Scenes in narration order.
    pub scenes: Vec<Scene>,
    /// Narration length.
    pub audio_secs: f64,
    /// Effective crossfade after clamping.
    pub crossfade_secs: f64,
    /// Output frame rate.
    pub fps: Fps,
    /// Audio/video reconciliation policy.
    pub audio_sync: AudioSync,
}

/// What a single output frame shows.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FrameSample {
    /// One scene at `local_secs` into it.
    Single {
        /// Scene index.
        scene: usize,
        /// Time since the scene start, clamped to the scene duration.
        local_secs: f64,
    },
    /// Blend of the outgoing scene into the incoming one.
    Crossfade {
        /// Outgoing scene index.
        from: usize,
        /// Time since the outgoing scene start.
        from_local_secs: f64,
        /// Incoming scene index.
        to: usize,
        /// Time since the incoming scene start.
        to_local_secs: f64,
        /// Weight of the incoming scene in `[0, 1]`.
        weight: f32,
    },
}

/// Split `audio_secs` evenly across `n` scenes.
pub fn allocate_durations(audio_secs: f64, n: usize) -> PressPlayResult<Vec<f64>> {
    if n == 0 {
        return Err(ValidationError::NoSentences.into());
    }
    if !audio_secs.is_finite() || audio_secs <= 0.0 {
        return Err(PressPlayError::render(format!(
            "audio duration must be a positive number of seconds, got {audio_secs}"
        )));
    }
    Ok(vec![audio_secs / n as f64; n])
}

/// Effective crossfade for scenes of `scene_secs`: `c` itself, or `d / 2` when `c > d / 2`.
///
/// At most two scenes may overlap at any instant, so a fade must finish before the next one
/// begins.
pub fn effective_crossfade(crossfade_secs: f64, scene_secs: f64) -> PressPlayResult<f64> {
    if !crossfade_secs.is_finite() || crossfade_secs < 0.0 {
        return Err(PressPlayError::config(
            "crossfade must be a finite, non-negative number of seconds",
        ));
    }
    let clamped = scene_secs / 2.0;
    if crossfade_secs > clamped {
        tracing::warn!(
            requested = crossfade_secs,
            scene_secs,
            clamped,
            "crossfade is longer than half a scene; clamping to half the scene"
        );
        return Ok(clamped);
    }
    Ok(crossfade_secs)
}

/// Place `units` on a timeline that lasts `audio_secs`, cycling through `image_count` images.
pub fn assemble(
    units: &[NarrationUnit],
    image_count: usize,
    audio_secs: f64,
    opts: TimelineOpts,
) -> PressPlayResult<Timeline> {
    if image_count == 0 {
        return Err(ValidationError::NoImages.into());
    }
    let durations = allocate_durations(audio_secs, units.len())?;
    let scene_secs = durations[0];
    let crossfade = effective_crossfade(opts.crossfade_secs, scene_secs)?;
    let stride = scene_secs - crossfade;

    let scenes = units
        .iter()
        .zip(durations)
        .enumerate()
        .map(|(i, (unit, duration_secs))| Scene {
            unit: unit.clone(),
            image_index: pool_index(i, image_count),
            start_secs: i as f64 * stride,
            duration_secs,
            transition_in: i > 0,
        })
        .collect();

    Ok(Timeline {
        scenes,
        audio_secs,
        crossfade_secs: crossfade,
        fps: opts.fps,
        audio_sync: opts.audio_sync,
    })
}

impl Timeline {
    /// Length of the overlapped scene sequence: `N·d − (N−1)·c`.
    pub fn nominal_video_secs(&self) -> f64 {
        self.scenes.last().map(Scene::end_secs).unwrap_or(0.0)
    }

    /// Length of the rendered video track.
    pub fn output_secs(&self) -> f64 {
        let nominal = self.nominal_video_secs();
        match self.audio_sync {
            AudioSync::FreezeLastFrame => nominal.max(self.audio_secs),
            AudioSync::Overlap => nominal,
        }
    }

    /// Number of frames to render.
    pub fn frame_count(&self) -> u64 {
        self.fps.secs_to_frames_ceil(self.output_secs())
    }

    /// All frames of the video.
    pub fn frame_range(&self) -> FrameRange {
        FrameRange {
            start: FrameIndex(0),
            end: FrameIndex(self.frame_count()),
        }
    }

    /// Sum of scene durations.
    pub fn total_scene_secs(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration_secs).sum()
    }

    /// Decide which scene(s) frame `frame` shows.
    pub fn sample(&self, frame: FrameIndex) -> PressPlayResult<FrameSample> {
        if self.scenes.is_empty() {
            return Err(PressPlayError::render("timeline has no scenes"));
        }
        let t = self.fps.frame_to_secs(frame);

        // Latest scene that has started by `t`.
        let j = self
            .scenes
            .partition_point(|s| s.start_secs <= t)
            .saturating_sub(1);
        let cur = &self.scenes[j];
        let local = (t - cur.start_secs).clamp(0.0, cur.duration_secs);

        if j > 0 && cur.transition_in && self.crossfade_secs > 0.0 {
            let prev = &self.scenes[j - 1];
            if t < prev.end_secs() {
                let weight = ((t - cur.start_secs) / self.crossfade_secs).clamp(0.0, 1.0) as f32;
                return Ok(FrameSample::Crossfade {
                    from: j - 1,
                    from_local_secs: (t - prev.start_secs).clamp(0.0, prev.duration_secs),
                    to: j,
                    to_local_secs: local,
                    weight,
                });
            }
        }
        Ok(FrameSample::Single {
            scene: j,
            local_secs: local,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/assemble.rs"]
mod tests;
