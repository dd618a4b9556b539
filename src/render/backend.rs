use crate::foundation::error::SceneResult;
use crate::render::plan::DrawPlan;

/// A rendered frame as RGBA8 pixels.
///
/// Frames are premultiplied alpha by default; the flag makes it explicit at API boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Something that turns a [`DrawPlan`] into pixels.
pub trait RenderBackend {
    fn render_plan(&mut self, plan: &DrawPlan) -> SceneResult<FrameRGBA>;

    /// Drop prepared paints. Called when the scene being rendered is replaced.
    fn clear_caches(&mut self) {}
}
