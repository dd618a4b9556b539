/// Fixed-rate play-through capture into a frame sink.
pub(crate) mod capture;
