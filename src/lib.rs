//! Sceneplay is a time-indexed playback engine for declarative animated scenes.
//!
//! A scene is a list of drawable objects plus timed actions (translate, scale, rotate, fade,
//! follow a path). The engine maps `(document, t)` to per-object state, drives a timeline from
//! host timestamps, and fires one-shot narration in step with it:
//!
//! - Load a [`SceneDocument`]
//! - Wrap it in a [`Player`] and feed [`Player::advance`] from a frame callback
//! - Compile frames to a [`DrawPlan`] and rasterize them with [`CpuBackend`]
//! - Capture a full play-through into a [`FrameSink`] with [`export_playthrough`]
#![forbid(unsafe_code)]

mod foundation;

pub(crate) mod animation;
pub(crate) mod assets;
pub(crate) mod encode;
pub(crate) mod eval;
pub(crate) mod export;
pub(crate) mod generate;
pub(crate) mod geometry;
pub(crate) mod narration;
pub(crate) mod render;
pub(crate) mod scene;
pub(crate) mod session;
pub(crate) mod timeline;

pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Fps, FrameIndex, Point, Rect, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{SceneError, SceneResult};

pub use crate::animation::interp::{apply_action, progress};
pub use crate::assets::cache::{FsImageLoader, ImageCache, ImageLoader, ImageSlot};
pub use crate::assets::decode::{DecodedImage, decode_image};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig, output_file_name};
pub use crate::eval::resolver::{ResolvedObjectState, SceneResolver, resolve};
pub use crate::export::capture::{DEFAULT_TAIL_SECS, ExportOpts, ExportStats, export_playthrough};
pub use crate::generate::service::{
    GenerationOptions, GenerationRequest, GenerationTransport, SceneGenerator, ServiceGenerator,
    ServiceReply, parse_service_response,
};
pub use crate::geometry::path::PathGeometry;
pub use crate::narration::sync::{
    NarrationEffects, NarrationEvent, NarrationSync, RecordingNarration, SilentNarration,
};
pub use crate::render::backend::{FrameRGBA, RenderBackend};
pub use crate::render::cpu::{CpuBackend, CpuBackendOpts};
pub use crate::render::plan::{DrawItem, DrawPlan, DrawShape, TextAlign, compile_draw_plan};
pub use crate::scene::color::CssColor;
pub use crate::scene::document::{LoadWarning, SceneDocument};
pub use crate::scene::model::{
    Action, ActionKind, Baseline, ObjectKind, ObjectProps, PointTarget, SceneObject,
};
pub use crate::scene::steps::{StepEntry, format_time_display, step_list};
pub use crate::session::player::{FrameOutput, Player, PlayerOpts};
pub use crate::timeline::controller::{
    PlaybackPhase, PlaybackState, TickOutcome, TimelineController,
};
