use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use kurbo::{Cap, Stroke, StrokeOpts};

use crate::assets::decode::DecodedImage;
use crate::foundation::core::{Affine, BezPath, Point, Rect, Vec2};
use crate::foundation::error::{SceneError, SceneResult};
use crate::foundation::math::clamp01;
use crate::render::backend::{FrameRGBA, RenderBackend};
use crate::render::plan::{DrawItem, DrawPlan, DrawShape, SHAPE_TOLERANCE, TextAlign};
use crate::render::text::{TextBrushRgba8, TextLayoutEngine};
use crate::scene::color::CssColor;

/// Options for [`CpuBackend`].
#[derive(Clone, Debug, Default)]
pub struct CpuBackendOpts {
    /// Straight RGBA8 color painted under every frame. `None` leaves it transparent.
    pub clear_rgba: Option<[u8; 4]>,
    /// Font file used for all text. Without one, text items are skipped.
    pub font_path: Option<PathBuf>,
}

impl CpuBackendOpts {
    pub fn with_clear_rgba(mut self, clear: Option<[u8; 4]>) -> Self {
        self.clear_rgba = clear;
        self
    }

    pub fn with_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }
}

struct LoadedFont {
    engine: TextLayoutEngine,
    data: vello_cpu::peniko::FontData,
}

const RASTER_CACHE_CAPACITY_ENV: &str = "SCENEPLAY_RASTER_CACHE_CAPACITY";
const DEFAULT_RASTER_CACHE_CAPACITY: usize = 64;

/// Gradient geometry is keyed and rasterized on a 1/64 px grid.
const GRADIENT_GRID: f64 = 64.0;

/// Identity of a gradient raster: geometry relative to its bounds, in grid units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct GradientKey {
    size: [i64; 2],
    from: [i64; 3],
    to: [i64; 3],
    colors: [[u8; 4]; 2],
}

fn to_grid(v: f64) -> i64 {
    (v * GRADIENT_GRID).round() as i64
}

fn from_grid(v: i64) -> f64 {
    v as f64 / GRADIENT_GRID
}

/// Least-recently-used map of prepared paints.
struct PaintCache<K> {
    entries: HashMap<K, vello_cpu::Image>,
    lru: VecDeque<K>,
    capacity: usize,
}

impl<K: Copy + Eq + Hash> PaintCache<K> {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn get(&mut self, key: &K) -> Option<vello_cpu::Image> {
        let img = self.entries.get(key).cloned()?;
        self.touch(*key);
        Some(img)
    }

    fn insert(&mut self, key: K, img: vello_cpu::Image) {
        self.entries.insert(key, img);
        self.touch(key);
        while self.lru.len() > self.capacity {
            if let Some(old) = self.lru.pop_front() {
                self.entries.remove(&old);
            }
        }
    }

    fn touch(&mut self, key: K) {
        if let Some(pos) = self.lru.iter().position(|k| *k == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }
}

fn raster_cache_capacity() -> usize {
    std::env::var(RASTER_CACHE_CAPACITY_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_RASTER_CACHE_CAPACITY)
}

/// Software rasterizer powered by `vello_cpu`.
pub struct CpuBackend {
    opts: CpuBackendOpts,
    ctx: Option<vello_cpu::RenderContext>,
    font: Option<LoadedFont>,
    image_cache: PaintCache<usize>,
    /// Keeps the pixel buffers behind `image_cache` keys alive so addresses are not reused.
    image_sources: HashMap<usize, Arc<Vec<u8>>>,
    gradient_cache: PaintCache<GradientKey>,
}

impl CpuBackend {
    /// Build a backend, reading the configured font file up front.
    pub fn new(opts: CpuBackendOpts) -> SceneResult<Self> {
        let font = match &opts.font_path {
            None => None,
            Some(path) => {
                let bytes = std::fs::read(path)
                    .with_context(|| format!("read font '{}'", path.display()))?;
                let engine = TextLayoutEngine::new(&bytes)?;
                tracing::debug!(family = engine.family_name(), "font loaded");
                let data =
                    vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0);
                Some(LoadedFont { engine, data })
            }
        };
        let capacity = raster_cache_capacity();
        Ok(Self {
            opts,
            ctx: None,
            font,
            image_cache: PaintCache::new(capacity),
            image_sources: HashMap::new(),
            gradient_cache: PaintCache::new(capacity),
        })
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn image_paint_for(&mut self, img: &DecodedImage) -> SceneResult<vello_cpu::Image> {
        let key = Arc::as_ptr(&img.rgba8_premul) as usize;
        if let Some(paint) = self.image_cache.get(&key) {
            return Ok(paint);
        }
        let paint = rgba_premul_to_image(&img.rgba8_premul, img.width, img.height)?;
        self.image_cache.insert(key, paint.clone());
        self.image_sources.insert(key, img.rgba8_premul.clone());
        let live = &self.image_cache.entries;
        self.image_sources.retain(|k, _| live.contains_key(k));
        Ok(paint)
    }

    /// Rasterize (or reuse) a two-circle gradient covering `bounds`.
    ///
    /// The returned image has its origin at `bounds.origin()`.
    #[allow(clippy::too_many_arguments)]
    fn gradient_paint(
        &mut self,
        bounds: Rect,
        from_center: Point,
        from_radius: f64,
        from_color: CssColor,
        to_center: Point,
        to_radius: f64,
        to_color: CssColor,
    ) -> SceneResult<vello_cpu::Image> {
        let origin = bounds.origin();
        let key = GradientKey {
            size: [to_grid(bounds.width()), to_grid(bounds.height())],
            from: [
                to_grid(from_center.x - origin.x),
                to_grid(from_center.y - origin.y),
                to_grid(from_radius),
            ],
            to: [
                to_grid(to_center.x - origin.x),
                to_grid(to_center.y - origin.y),
                to_grid(to_radius),
            ],
            colors: [
                [from_color.r, from_color.g, from_color.b, from_color.a],
                [to_color.r, to_color.g, to_color.b, to_color.a],
            ],
        };
        if let Some(img) = self.gradient_cache.get(&key) {
            return Ok(img);
        }

        let w = from_grid(key.size[0]).ceil().max(1.0) as u32;
        let h = from_grid(key.size[1]).ceil().max(1.0) as u32;
        let c0 = Point::new(from_grid(key.from[0]), from_grid(key.from[1]));
        let r0 = from_grid(key.from[2]);
        let c1 = Point::new(from_grid(key.to[0]), from_grid(key.to[1]));
        let r1 = from_grid(key.to[2]);
        let mut bytes = vec![0u8; (w as usize).saturating_mul(h as usize).saturating_mul(4)];
        for y in 0..h {
            for x in 0..w {
                let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                let Some(s) = radial_gradient_param(p, c0, r0, c1, r1) else {
                    continue;
                };
                let c = mix_colors(from_color, to_color, clamp01(s)).to_premul();
                let idx = ((y as usize) * (w as usize) + (x as usize)) * 4;
                bytes[idx..idx + 4].copy_from_slice(&[c.r, c.g, c.b, c.a]);
            }
        }
        let img = rgba_premul_to_image(&bytes, w, h)?;
        self.gradient_cache.insert(key, img.clone());
        Ok(img)
    }

    fn draw_item(&mut self, item: &DrawItem, ctx: &mut vello_cpu::RenderContext) -> SceneResult<()> {
        let opacity = item.opacity.clamp(0.0, 1.0) as f32;
        if opacity <= 0.0 {
            return Ok(());
        }
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }

        match &item.shape {
            DrawShape::Fill { path, color } => {
                ctx.set_transform(affine_to_cpu(item.transform));
                ctx.set_paint(css_to_cpu(*color));
                ctx.fill_path(&bezpath_to_cpu(path));
            }
            DrawShape::Stroke {
                path,
                color,
                width,
                round_caps,
            } => {
                let mut style = Stroke::new(*width);
                if *round_caps {
                    style = style.with_caps(Cap::Round);
                }
                let outline = kurbo::stroke(
                    path.elements().iter().copied(),
                    &style,
                    &StrokeOpts::default(),
                    SHAPE_TOLERANCE,
                );
                ctx.set_transform(affine_to_cpu(item.transform));
                ctx.set_paint(css_to_cpu(*color));
                ctx.fill_path(&bezpath_to_cpu(&outline));
            }
            DrawShape::RadialFill {
                path,
                bounds,
                from_center,
                from_radius,
                from_color,
                to_center,
                to_radius,
                to_color,
            } => {
                let img = self.gradient_paint(
                    *bounds,
                    *from_center,
                    *from_radius,
                    *from_color,
                    *to_center,
                    *to_radius,
                    *to_color,
                )?;
                let origin = bounds.origin().to_vec2();
                let local = Affine::translate(-origin) * path.clone();
                ctx.set_transform(affine_to_cpu(item.transform * Affine::translate(origin)));
                ctx.set_paint(img);
                ctx.fill_path(&bezpath_to_cpu(&local));
            }
            DrawShape::Text {
                text,
                anchor,
                size_px,
                bold,
                color,
                align,
            } => {
                let Some(font) = self.font.as_mut() else {
                    tracing::debug!(object_id = %item.object_id, "no font configured; text skipped");
                    if opacity < 1.0 {
                        ctx.pop_layer();
                    }
                    return Ok(());
                };
                let brush = TextBrushRgba8 {
                    r: color.r,
                    g: color.g,
                    b: color.b,
                    a: color.a,
                };
                let layout = font
                    .engine
                    .layout_line(text, *size_px as f32, *bold, brush)?;
                let baseline = layout
                    .lines()
                    .next()
                    .map(|l| f64::from(l.metrics().baseline))
                    .unwrap_or(0.0);
                let dx = match align {
                    TextAlign::Start => 0.0,
                    TextAlign::Center => -f64::from(layout.width()) / 2.0,
                };
                let tr = item.transform
                    * Affine::translate(Vec2::new(anchor.x + dx, anchor.y - baseline));
                ctx.set_transform(affine_to_cpu(tr));
                for line in layout.lines() {
                    for run_item in line.items() {
                        let parley::layout::PositionedLayoutItem::GlyphRun(run) = run_item else {
                            continue;
                        };
                        let brush = run.style().brush;
                        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                            brush.r, brush.g, brush.b, brush.a,
                        ));
                        let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                            id: g.id,
                            x: g.x,
                            y: g.y,
                        });
                        ctx.glyph_run(&font.data)
                            .font_size(run.run().font_size())
                            .fill_glyphs(glyphs);
                    }
                }
            }
            DrawShape::Image { image, dest } => {
                let paint = self.image_paint_for(image)?;
                let sx = dest.width() / f64::from(image.width.max(1));
                let sy = dest.height() / f64::from(image.height.max(1));
                let tr = item.transform
                    * Affine::translate(dest.origin().to_vec2())
                    * Affine::scale_non_uniform(sx, sy);
                ctx.set_transform(affine_to_cpu(tr));
                ctx.set_paint(paint);
                ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    f64::from(image.width),
                    f64::from(image.height),
                ));
            }
        }

        if opacity < 1.0 {
            ctx.pop_layer();
        }
        Ok(())
    }
}

impl RenderBackend for CpuBackend {
    fn clear_caches(&mut self) {
        self.image_cache.clear();
        self.image_sources.clear();
        self.gradient_cache.clear();
        tracing::debug!("render caches cleared");
    }

    #[tracing::instrument(level = "debug", skip_all, fields(items = plan.items.len()))]
    fn render_plan(&mut self, plan: &DrawPlan) -> SceneResult<FrameRGBA> {
        let width: u16 = plan
            .canvas
            .width
            .try_into()
            .map_err(|_| SceneError::evaluation("canvas width exceeds u16"))?;
        let height: u16 = plan
            .canvas
            .height
            .try_into()
            .map_err(|_| SceneError::evaluation("canvas height exceeds u16"))?;

        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();

        if let Some([r, g, b, a]) = self.opts.clear_rgba {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(width),
                f64::from(height),
            ));
        }

        let drawn = plan
            .items
            .iter()
            .try_for_each(|item| self.draw_item(item, &mut ctx));
        if let Err(e) = drawn {
            self.ctx = Some(ctx);
            return Err(e);
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(width, height);
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);

        Ok(FrameRGBA {
            width: plan.canvas.width,
            height: plan.canvas.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

/// Gradient parameter `s` of a two-circle radial gradient at `p`.
///
/// Solves `|p - c(s)| = r(s)` with centers and radii interpolated linearly in `s`, keeping the
/// largest root with a non-negative radius. `None` where the gradient is undefined.
pub(crate) fn radial_gradient_param(
    p: Point,
    c0: Point,
    r0: f64,
    c1: Point,
    r1: f64,
) -> Option<f64> {
    let cd = c1 - c0;
    let pd = p - c0;
    let dr = r1 - r0;
    let a = cd.dot(cd) - dr * dr;
    let b = pd.dot(cd) + r0 * dr;
    let c = pd.dot(pd) - r0 * r0;

    let valid = |s: f64| r0 + s * dr >= 0.0;
    if a.abs() < 1e-12 {
        if b.abs() < 1e-12 {
            return None;
        }
        let s = c / (2.0 * b);
        return valid(s).then_some(s);
    }
    let disc = b * b - a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let (s_hi, s_lo) = {
        let s1 = (b + sq) / a;
        let s2 = (b - sq) / a;
        (s1.max(s2), s1.min(s2))
    };
    if valid(s_hi) {
        Some(s_hi)
    } else if valid(s_lo) {
        Some(s_lo)
    } else {
        None
    }
}

fn mix_colors(a: CssColor, b: CssColor, t: f64) -> CssColor {
    let mix = |x: u8, y: u8| -> u8 {
        let xf = f64::from(x);
        (xf + (f64::from(y) - xf) * t).round().clamp(0.0, 255.0) as u8
    };
    CssColor::rgba(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), mix(a.a, b.a))
}

fn css_to_cpu(c: CssColor) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> SceneResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| SceneError::evaluation("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| SceneError::evaluation("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(SceneError::evaluation("pixmap byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

fn rgba_premul_to_image(
    bytes_premul: &[u8],
    width: u32,
    height: u32,
) -> SceneResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes_premul, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
