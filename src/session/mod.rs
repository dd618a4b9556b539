/// Interactive playback session over one loaded scene.
pub(crate) mod player;
