use std::collections::BTreeSet;

use serde::Serialize;

use crate::scene::document::SceneDocument;

/// Coarse playback phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PlaybackPhase {
    /// At time zero after load or reset.
    Stopped,
    /// Advancing on every tick.
    Playing,
    /// Held at the current time.
    Paused,
    /// Reached the scene duration.
    Ended,
}

/// Mutable playback bookkeeping for one loaded scene.
///
/// Created at time zero on load, mutated only through [`TimelineController`] and the narration
/// synchronizer, and dropped when the scene is replaced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlaybackState {
    current_time: f64,
    phase: PlaybackPhase,
    #[serde(skip)]
    last_timestamp: Option<f64>,
    pub(crate) fired: BTreeSet<String>,
    pub(crate) active_step: Option<String>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_time: 0.0,
            phase: PlaybackPhase::Stopped,
            last_timestamp: None,
            fired: BTreeSet::new(),
            active_step: None,
        }
    }
}

impl PlaybackState {
    /// Seconds into the scene, always within `[0, duration]`.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    /// Ids of actions whose one-shot narration effect has already run in this pass.
    pub fn fired(&self) -> &BTreeSet<String> {
        &self.fired
    }

    /// Step currently highlighted, if any.
    pub fn active_step(&self) -> Option<&str> {
        self.active_step.as_deref()
    }
}

/// Result of one [`TimelineController::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing; nothing changed.
    Idle,
    /// Time advanced and playback continues.
    Advanced,
    /// Time reached the duration and playback stopped.
    Ended,
}

/// Delta-time math for one scene. Owns no clock; timestamps are fed in by the host.
#[derive(Clone, Debug)]
pub struct TimelineController {
    duration: f64,
    /// `(start, id)` of every action in document order.
    starts: Vec<(f64, String)>,
}

impl TimelineController {
    pub fn new(doc: &SceneDocument) -> Self {
        Self {
            duration: doc.duration(),
            starts: doc
                .actions()
                .iter()
                .map(|a| (a.start, a.id.clone()))
                .collect(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Start playing, anchoring the wall clock at `now` (seconds).
    ///
    /// From `Ended` the time stays at the duration, so the next tick ends playback again.
    pub fn play(&self, state: &mut PlaybackState, now: f64) {
        if state.phase == PlaybackPhase::Playing {
            return;
        }
        state.phase = PlaybackPhase::Playing;
        state.last_timestamp = Some(now);
        tracing::debug!(t = state.current_time, "playback started");
    }

    /// Stop advancing. Returns `true` if playback was running.
    pub fn pause(&self, state: &mut PlaybackState) -> bool {
        state.last_timestamp = None;
        if state.phase != PlaybackPhase::Playing {
            return false;
        }
        state.phase = PlaybackPhase::Paused;
        tracing::debug!(t = state.current_time, "playback paused");
        true
    }

    /// Advance by the wall-clock delta since the previous tick (or `play`).
    ///
    /// Negative deltas are treated as zero. Crossing the duration clamps time to it exactly.
    pub fn tick(&self, state: &mut PlaybackState, now: f64) -> TickOutcome {
        if state.phase != PlaybackPhase::Playing {
            return TickOutcome::Idle;
        }
        let last = state.last_timestamp.unwrap_or(now);
        let dt = (now - last).max(0.0);
        state.last_timestamp = Some(now);
        state.current_time += dt;

        if state.current_time >= self.duration {
            state.current_time = self.duration;
            state.phase = PlaybackPhase::Ended;
            state.last_timestamp = None;
            tracing::debug!(duration = self.duration, "playback ended");
            return TickOutcome::Ended;
        }
        TickOutcome::Advanced
    }

    /// Jump to `t` (clamped) without changing the phase.
    ///
    /// The fired set becomes exactly the actions starting strictly before the new time, so
    /// earlier narration is not replayed and anything at or after `t` is armed again.
    pub fn seek(&self, state: &mut PlaybackState, t: f64) -> f64 {
        let t = if t.is_nan() {
            0.0
        } else {
            t.clamp(0.0, self.duration)
        };
        state.current_time = t;
        state.fired = self
            .starts
            .iter()
            .filter(|(start, _)| *start < t)
            .map(|(_, id)| id.clone())
            .collect();
        if state
            .active_step
            .as_ref()
            .is_some_and(|id| !state.fired.contains(id))
        {
            state.active_step = None;
        }
        t
    }

    /// [`TimelineController::seek`] that also re-anchors the wall clock while playing.
    pub fn scrub(&self, state: &mut PlaybackState, t: f64, now: f64) -> f64 {
        let t = self.seek(state, t);
        if state.phase == PlaybackPhase::Playing {
            state.last_timestamp = Some(now);
        }
        t
    }

    /// Pause, rewind to zero and forget every fired action.
    pub fn reset(&self, state: &mut PlaybackState) {
        self.pause(state);
        self.seek(state, 0.0);
        state.fired.clear();
        state.active_step = None;
        state.phase = PlaybackPhase::Stopped;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/controller.rs"]
mod tests;
