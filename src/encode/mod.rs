//! Frame sinks consume rendered frames in capture order.

/// MP4 output through the system `ffmpeg`.
pub(crate) mod ffmpeg;
/// Sink trait and the in-memory sink.
pub(crate) mod sink;
