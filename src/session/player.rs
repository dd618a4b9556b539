use std::cell::Cell;
use std::path::PathBuf;

use crate::assets::cache::{FsImageLoader, ImageCache, ImageLoader};
use crate::eval::resolver::{ResolvedObjectState, SceneResolver};
use crate::foundation::error::SceneResult;
use crate::generate::service::{GenerationRequest, SceneGenerator};
use crate::narration::sync::{NarrationEffects, NarrationSync, SilentNarration};
use crate::render::backend::{FrameRGBA, RenderBackend};
use crate::render::plan::{DrawPlan, compile_draw_plan};
use crate::scene::document::SceneDocument;
use crate::scene::steps::{StepEntry, format_time_display, step_list};
use crate::timeline::controller::{PlaybackPhase, PlaybackState, TickOutcome, TimelineController};

/// Options for [`Player`].
#[derive(Clone, Debug)]
pub struct PlayerOpts {
    /// Whether narration effects fire while playing.
    pub narration_enabled: bool,
    /// Directory that relative image `src` values resolve against.
    pub assets_root: PathBuf,
}

impl Default for PlayerOpts {
    fn default() -> Self {
        Self {
            narration_enabled: true,
            assets_root: PathBuf::from("."),
        }
    }
}

impl PlayerOpts {
    pub fn with_narration_enabled(mut self, enabled: bool) -> Self {
        self.narration_enabled = enabled;
        self
    }

    pub fn with_assets_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.assets_root = root.into();
        self
    }
}

/// Everything observed during one [`Player::advance`], all at the same scene time.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutput<'a> {
    /// Scene time the frame was resolved at.
    pub time: f64,
    pub outcome: TickOutcome,
    /// Resolved objects in draw order.
    pub states: Vec<ResolvedObjectState<'a>>,
    /// Actions whose narration effect fired during this advance.
    pub fired: Vec<String>,
}

/// One loaded scene plus its playback state, driven by host timestamps.
///
/// The player owns no clock. The host calls [`Player::advance`] from its frame callback with a
/// monotonic timestamp in seconds; everything else is synchronous.
pub struct Player<N: NarrationEffects = SilentNarration> {
    doc: SceneDocument,
    resolver: SceneResolver,
    timeline: TimelineController,
    sync: NarrationSync,
    state: PlaybackState,
    images: ImageCache,
    loader: Box<dyn ImageLoader>,
    narrator: N,
    /// Set when the scene changes; the next render clears backend caches.
    backend_stale: Cell<bool>,
}

impl Player<SilentNarration> {
    /// Player without speech or highlight output.
    pub fn new(doc: SceneDocument, opts: PlayerOpts) -> Self {
        Self::with_narrator(doc, SilentNarration, opts)
    }
}

impl<N: NarrationEffects> Player<N> {
    pub fn with_narrator(doc: SceneDocument, narrator: N, opts: PlayerOpts) -> Self {
        let mut sync = NarrationSync::new(&doc);
        sync.set_enabled(opts.narration_enabled);
        let mut images = ImageCache::new();
        images.request_all(&doc);
        Self {
            resolver: SceneResolver::new(&doc),
            timeline: TimelineController::new(&doc),
            sync,
            state: PlaybackState::default(),
            images,
            loader: Box::new(FsImageLoader::new(opts.assets_root)),
            narrator,
            backend_stale: Cell::new(false),
            doc,
        }
    }

    /// Replace the image loader. Already decoded images are dropped and requested again.
    pub fn with_image_loader(mut self, loader: impl ImageLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self.images.clear();
        self.images.request_all(&self.doc);
        self
    }

    pub fn document(&self) -> &SceneDocument {
        &self.doc
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn current_time(&self) -> f64 {
        self.state.current_time()
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.state.phase()
    }

    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn narrator(&self) -> &N {
        &self.narrator
    }

    pub fn narrator_mut(&mut self) -> &mut N {
        &mut self.narrator
    }

    pub fn images(&self) -> &ImageCache {
        &self.images
    }

    /// Replace the scene. Playback restarts from zero with nothing fired.
    #[tracing::instrument(level = "debug", skip_all, fields(scene_id = %doc.scene_id()))]
    pub fn load(&mut self, doc: SceneDocument) {
        self.stop_effects();
        let narration_enabled = self.sync.is_enabled();
        self.resolver = SceneResolver::new(&doc);
        self.timeline = TimelineController::new(&doc);
        self.sync = NarrationSync::new(&doc);
        self.sync.set_enabled(narration_enabled);
        self.state = PlaybackState::default();
        self.images.clear();
        self.images.request_all(&doc);
        self.backend_stale.set(true);
        tracing::info!(
            scene_id = %doc.scene_id(),
            objects = doc.objects().len(),
            actions = doc.actions().len(),
            duration = doc.duration(),
            "scene loaded"
        );
        self.doc = doc;
    }

    /// Parse and load a scene. On error the current scene stays loaded, untouched.
    pub fn load_json(&mut self, json: &str) -> SceneResult<()> {
        let doc = SceneDocument::from_json_str(json)?;
        self.load(doc);
        Ok(())
    }

    /// Ask `generator` for a scene and load it. On error nothing changes.
    pub fn generate<G>(&mut self, generator: &mut G, request: &GenerationRequest) -> SceneResult<()>
    where
        G: SceneGenerator + ?Sized,
    {
        let doc = generator.generate(request)?;
        self.load(doc);
        Ok(())
    }

    /// Start or resume playback, anchoring the wall clock at `now` (seconds).
    pub fn play(&mut self, now: f64) {
        self.timeline.play(&mut self.state, now);
    }

    /// Stop advancing and cancel in-flight speech. Returns `true` if playback was running.
    pub fn pause(&mut self) -> bool {
        let was_playing = self.timeline.pause(&mut self.state);
        self.narrator.cancel_speech();
        was_playing
    }

    /// Play if paused, pause if playing. Returns whether playback is now running.
    pub fn toggle(&mut self, now: f64) -> bool {
        if self.is_playing() {
            self.pause();
        } else {
            self.play(now);
        }
        self.is_playing()
    }

    /// Jump to `t` without changing play/pause. Returns the clamped time.
    pub fn seek(&mut self, t: f64) -> f64 {
        let had_active = self.state.active_step().is_some();
        let t = self.timeline.seek(&mut self.state, t);
        self.after_jump(had_active);
        t
    }

    /// Scrub-bar input: [`Player::seek`] that also re-anchors the clock at `now` while playing.
    pub fn scrub(&mut self, t: f64, now: f64) -> f64 {
        let had_active = self.state.active_step().is_some();
        let t = self.timeline.scrub(&mut self.state, t, now);
        self.after_jump(had_active);
        t
    }

    /// Pause, rewind to zero, forget fired narration and clear the highlight.
    pub fn reset(&mut self) {
        self.stop_effects();
        self.timeline.reset(&mut self.state);
    }

    /// Advance playback to `now` and resolve the frame at the resulting time.
    ///
    /// Narration runs only for ticks that moved time, using the same time the states were
    /// resolved at. Reaching the end pauses (cancelling speech) before the last narration check.
    pub fn advance(&mut self, now: f64) -> FrameOutput<'_> {
        let outcome = self.timeline.tick(&mut self.state, now);
        let fired = match outcome {
            TickOutcome::Idle => Vec::new(),
            TickOutcome::Advanced => self.sync.on_tick(&mut self.state, &mut self.narrator),
            TickOutcome::Ended => {
                self.narrator.cancel_speech();
                self.sync.on_tick(&mut self.state, &mut self.narrator)
            }
        };
        let time = self.state.current_time();
        FrameOutput {
            time,
            outcome,
            states: self.resolver.resolve(&self.doc, time),
            fired,
        }
    }

    /// Resolved objects at the current time, without advancing.
    pub fn frame(&self) -> Vec<ResolvedObjectState<'_>> {
        self.resolver.resolve(&self.doc, self.state.current_time())
    }

    /// Resolved objects at an arbitrary time. Playback state is not consulted.
    pub fn frame_at(&self, t: f64) -> Vec<ResolvedObjectState<'_>> {
        self.resolver.resolve(&self.doc, t)
    }

    /// Draw plan for the current time.
    pub fn draw_plan(&self) -> DrawPlan {
        compile_draw_plan(self.doc.canvas(), &self.frame(), &self.images)
    }

    /// Render the current time with `backend`.
    ///
    /// The first render after [`Player::load`] clears the backend's caches.
    pub fn render(&self, backend: &mut dyn RenderBackend) -> SceneResult<FrameRGBA> {
        if self.backend_stale.replace(false) {
            backend.clear_caches();
        }
        backend.render_plan(&self.draw_plan())
    }

    /// Step list in start order.
    pub fn steps(&self) -> Vec<StepEntry> {
        step_list(&self.doc)
    }

    /// `"<t>s / <duration>s"` for the current time.
    pub fn time_display(&self) -> String {
        format_time_display(self.state.current_time(), self.doc.duration())
    }

    pub fn narration_enabled(&self) -> bool {
        self.sync.is_enabled()
    }

    /// Toggle narration effects. The fired set is not touched.
    pub fn set_narration_enabled(&mut self, enabled: bool) {
        self.sync.set_enabled(enabled);
    }

    /// Decode pending images. Returns how many became ready.
    pub fn poll_images(&mut self) -> usize {
        self.images.poll(self.loader.as_ref())
    }

    fn stop_effects(&mut self) {
        self.narrator.cancel_speech();
        if self.state.active_step().is_some() {
            self.narrator.clear_highlight();
        }
    }

    fn after_jump(&mut self, had_active: bool) {
        if had_active && self.state.active_step().is_none() {
            self.narrator.clear_highlight();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/player.rs"]
mod tests;
