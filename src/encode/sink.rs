use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{SceneError, SceneResult};
use crate::render::backend::FrameRGBA;

/// Configuration handed to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
    /// Scene id of the capture, possibly empty. Sinks may use it for naming.
    pub scene_id: String,
}

/// File name for a capture of `scene_id`: `<sceneId>.<ext>`, or `scene.<ext>` when the id has
/// nothing usable in it.
pub fn output_file_name(scene_id: &str, ext: &str) -> String {
    let stem: String = scene_id
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.chars().all(|c| c == '_') {
        format!("scene.{ext}")
    } else {
        format!("{stem}.{ext}")
    }
}

/// Consumer of captured frames.
///
/// `push_frame` is called with strictly increasing [`FrameIndex`] values between one `begin` and
/// one `end`.
pub trait FrameSink: Send {
    fn begin(&mut self, cfg: SinkConfig) -> SceneResult<()>;
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SceneResult<()>;
    fn end(&mut self) -> SceneResult<()>;
}

/// Keeps every frame in memory. Meant for tests and previews.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// Whether `end` has been called since the last `begin`.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> SceneResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> SceneResult<()> {
        if self.cfg.is_none() {
            return Err(SceneError::evaluation("in-memory sink not started"));
        }
        if let Some((last, _)) = self.frames.last()
            && idx <= *last
        {
            return Err(SceneError::evaluation(
                "in-memory sink received out-of-order frame index",
            ));
        }
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> SceneResult<()> {
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
