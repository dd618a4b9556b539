use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{SceneError, SceneResult};
use crate::narration::sync::NarrationEffects;
use crate::render::backend::RenderBackend;
use crate::session::player::Player;
use crate::timeline::controller::TickOutcome;

/// Seconds of held final frame appended after playback ends.
pub const DEFAULT_TAIL_SECS: f64 = 0.5;

/// Options for [`export_playthrough`].
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOpts {
    /// Capture rate. Each captured frame is one playback tick.
    pub fps: Fps,
    /// Seconds of the last frame repeated after playback ends.
    pub tail_secs: f64,
}

impl Default for ExportOpts {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            tail_secs: DEFAULT_TAIL_SECS,
        }
    }
}

impl ExportOpts {
    pub fn with_fps(mut self, fps: Fps) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_tail_secs(mut self, tail_secs: f64) -> Self {
        self.tail_secs = tail_secs;
        self
    }
}

/// Frame counts of one export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Frames pushed to the sink.
    pub frames_total: u64,
    /// Frames rendered while playback was running, the final one included.
    pub frames_rendered: u64,
    /// Tail frames that repeat the final render.
    pub frames_held: u64,
}

/// Play the loaded scene from the top at a fixed rate and capture every tick into `sink`.
///
/// Drives the player the way an interactive host would: `reset`, `play`, then one `advance` per
/// frame with synthetic timestamps `frame / fps`. Narration fires through the player's effects.
/// Pending images are decoded up front so they appear from the first frame.
#[tracing::instrument(skip_all, fields(scene_id = %player.document().scene_id(), fps = opts.fps.as_f64()))]
pub fn export_playthrough<N: NarrationEffects>(
    player: &mut Player<N>,
    backend: &mut dyn RenderBackend,
    sink: &mut dyn FrameSink,
    opts: &ExportOpts,
) -> SceneResult<ExportStats> {
    let fps = Fps::new(opts.fps.num, opts.fps.den)?;
    if !opts.tail_secs.is_finite() || opts.tail_secs < 0.0 {
        return Err(SceneError::validation(
            "export tail_secs must be finite and >= 0",
        ));
    }

    let canvas = player.document().canvas();
    player.poll_images();
    sink.begin(SinkConfig {
        width: canvas.width,
        height: canvas.height,
        fps,
        scene_id: player.document().scene_id().to_owned(),
    })?;

    player.reset();
    player.play(0.0);

    // Bounded by the frame count that covers the duration, plus one for the clamped end tick.
    let max_frames = fps.secs_to_frames_ceil(player.document().duration()) + 1;
    let mut stats = ExportStats::default();
    let mut idx = 0u64;
    let last_frame = loop {
        let outcome = player.advance(fps.frames_to_secs(idx)).outcome;
        let frame = player.render(backend)?;
        sink.push_frame(FrameIndex(idx), &frame)?;
        stats.frames_rendered += 1;
        idx += 1;
        match outcome {
            TickOutcome::Ended => break frame,
            TickOutcome::Advanced if idx <= max_frames => {}
            _ => {
                return Err(SceneError::evaluation(
                    "export playback stopped before reaching the scene end",
                ));
            }
        }
    };

    let hold = fps.secs_to_frames_ceil(opts.tail_secs);
    for _ in 0..hold {
        sink.push_frame(FrameIndex(idx), &last_frame)?;
        idx += 1;
        stats.frames_held += 1;
    }
    sink.end()?;

    stats.frames_total = idx;
    tracing::info!(
        frames = stats.frames_total,
        rendered = stats.frames_rendered,
        held = stats.frames_held,
        "export finished"
    );
    Ok(stats)
}

#[cfg(test)]
#[path = "../../tests/unit/export/capture.rs"]
mod tests;
