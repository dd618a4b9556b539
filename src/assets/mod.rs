/// Image source cache with a poll-driven load model.
pub(crate) mod cache;
/// Raster image decoding into premultiplied RGBA8.
pub(crate) mod decode;
