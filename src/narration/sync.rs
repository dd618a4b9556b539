use crate::foundation::error::SceneResult;
use crate::scene::document::SceneDocument;
use crate::timeline::controller::PlaybackState;

/// Host capabilities used for one-shot narration effects.
///
/// Speech is best-effort: an `Err` from [`NarrationEffects::speak`] is logged and otherwise
/// ignored, and step highlighting still happens.
pub trait NarrationEffects {
    /// Mark `action_id` as the single active step, replacing any previous one.
    fn highlight_step(&mut self, action_id: &str);
    /// Remove the active-step highlight.
    fn clear_highlight(&mut self);
    /// Start speaking `text`.
    fn speak(&mut self, text: &str) -> SceneResult<()>;
    /// Stop any in-flight speech immediately.
    fn cancel_speech(&mut self);
}

/// Effects sink that does nothing. Speech always "succeeds".
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentNarration;

impl NarrationEffects for SilentNarration {
    fn highlight_step(&mut self, _action_id: &str) {}
    fn clear_highlight(&mut self) {}
    fn speak(&mut self, _text: &str) -> SceneResult<()> {
        Ok(())
    }
    fn cancel_speech(&mut self) {}
}

/// One observed narration effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NarrationEvent {
    Highlight(String),
    ClearHighlight,
    Speak(String),
    CancelSpeech,
}

/// Effects sink that records every call, in order.
#[derive(Clone, Debug, Default)]
pub struct RecordingNarration {
    pub events: Vec<NarrationEvent>,
}

impl RecordingNarration {
    /// Drain and return the recorded events.
    pub fn take(&mut self) -> Vec<NarrationEvent> {
        std::mem::take(&mut self.events)
    }

    /// Texts passed to `speak`, in order.
    pub fn spoken(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                NarrationEvent::Speak(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl NarrationEffects for RecordingNarration {
    fn highlight_step(&mut self, action_id: &str) {
        self.events
            .push(NarrationEvent::Highlight(action_id.to_owned()));
    }
    fn clear_highlight(&mut self) {
        self.events.push(NarrationEvent::ClearHighlight);
    }
    fn speak(&mut self, text: &str) -> SceneResult<()> {
        self.events.push(NarrationEvent::Speak(text.to_owned()));
        Ok(())
    }
    fn cancel_speech(&mut self) {
        self.events.push(NarrationEvent::CancelSpeech);
    }
}

#[derive(Clone, Debug)]
struct Cue {
    start: f64,
    id: String,
    narration: Option<String>,
}

/// Decides when each action's one-shot highlight/speech runs.
#[derive(Clone, Debug)]
pub struct NarrationSync {
    cues: Vec<Cue>,
    enabled: bool,
}

impl NarrationSync {
    /// Cues in `(start, document index)` order, narration enabled.
    pub fn new(doc: &SceneDocument) -> Self {
        let cues = doc
            .actions_by_start()
            .map(|a| Cue {
                start: a.start,
                id: a.id.clone(),
                narration: a.narration().map(str::to_owned),
            })
            .collect();
        Self {
            cues,
            enabled: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn effects on or off. The fired set is left alone either way.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Fire every action reached by `state.current_time()` that has not fired yet.
    ///
    /// Call once per forward tick, with the same time the frame was resolved at. Returns the ids
    /// fired by this call. Nothing fires (and nothing is recorded) while disabled.
    pub fn on_tick<E>(&self, state: &mut PlaybackState, effects: &mut E) -> Vec<String>
    where
        E: NarrationEffects + ?Sized,
    {
        if !self.enabled {
            return Vec::new();
        }
        let t = state.current_time();
        let mut newly = Vec::new();
        for cue in &self.cues {
            if cue.start > t || state.fired.contains(&cue.id) {
                continue;
            }
            state.fired.insert(cue.id.clone());
            state.active_step = Some(cue.id.clone());
            effects.highlight_step(&cue.id);
            if let Some(text) = &cue.narration
                && let Err(e) = effects.speak(text)
            {
                tracing::warn!(action_id = %cue.id, error = %e, "narration speech failed");
            }
            tracing::debug!(action_id = %cue.id, t, "step fired");
            newly.push(cue.id.clone());
        }
        newly
    }
}

#[cfg(test)]
#[path = "../../tests/unit/narration/sync.rs"]
mod tests;
