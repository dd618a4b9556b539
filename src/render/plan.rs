use std::f64::consts::PI;

use kurbo::{Circle, RoundedRect, Shape as _};

use crate::assets::cache::ImageCache;
use crate::assets::decode::DecodedImage;
use crate::eval::resolver::ResolvedObjectState;
use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect, Vec2};
use crate::scene::color::CssColor;
use crate::scene::model::ObjectKind;

/// Curve flattening tolerance for shapes converted to paths.
pub const SHAPE_TOLERANCE: f64 = 0.1;

const RECT_CORNER_RADIUS: f64 = 4.0;
const RECT_LABEL_SIZE_PX: f64 = 16.0;
const RECT_LABEL_INSET: f64 = 10.0;
const DEFAULT_FONT_SIZE_PX: f64 = 16.0;
const PATH_LINE_WIDTH: f64 = 2.0;
const ARROW_LINE_WIDTH: f64 = 3.0;
const ARROW_HEAD_LEN: f64 = 12.0;
const AXIS_LINE_WIDTH: f64 = 1.0;

/// Backend-agnostic list of draw items for one frame, in back-to-front order.
#[derive(Clone, Debug)]
pub struct DrawPlan {
    pub canvas: Canvas,
    pub items: Vec<DrawItem>,
}

/// One object's contribution to a frame.
///
/// An object may produce several items (a rectangle and its label); they share `object_id`.
#[derive(Clone, Debug)]
pub struct DrawItem {
    pub object_id: String,
    /// Rotation and scale about the object's center.
    pub transform: Affine,
    /// Group opacity in `(0, 1]`.
    pub opacity: f64,
    pub shape: DrawShape,
}

/// Horizontal text anchoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    Start,
    Center,
}

#[derive(Clone, Debug)]
pub enum DrawShape {
    /// Fill a closed path with a solid color.
    Fill { path: BezPath, color: CssColor },
    /// Stroke a path with a solid color.
    Stroke {
        path: BezPath,
        color: CssColor,
        width: f64,
        round_caps: bool,
    },
    /// Fill `path` with a two-circle radial gradient, padded outside `[0, 1]`.
    RadialFill {
        path: BezPath,
        /// Area the gradient needs to cover.
        bounds: Rect,
        from_center: Point,
        from_radius: f64,
        from_color: CssColor,
        to_center: Point,
        to_radius: f64,
        to_color: CssColor,
    },
    /// Single line of text with its alphabetic baseline at `anchor.y`.
    Text {
        text: String,
        anchor: Point,
        size_px: f64,
        bold: bool,
        color: CssColor,
        align: TextAlign,
    },
    /// Decoded image scaled into `dest`.
    Image { image: DecodedImage, dest: Rect },
}

/// Size and weight pulled out of a CSS `font` shorthand.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FontSpec {
    pub size_px: f64,
    pub bold: bool,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            size_px: DEFAULT_FONT_SIZE_PX,
            bold: false,
        }
    }
}

impl FontSpec {
    /// Parse shorthands such as `"bold 32px Inter"` or `"600 12px sans-serif"`.
    ///
    /// Family names are ignored; unknown tokens keep the defaults.
    pub fn parse_css(font: &str) -> Self {
        let mut out = Self::default();
        for tok in font.split_whitespace() {
            let lower = tok.to_ascii_lowercase();
            if lower == "bold" || lower == "bolder" {
                out.bold = true;
            } else if let Ok(w) = lower.parse::<u32>() {
                out.bold = w >= 600;
            } else if let Some(px) = lower
                .split('/')
                .next()
                .and_then(|s| s.strip_suffix("px"))
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v > 0.0)
            {
                out.size_px = px;
            }
        }
        out
    }
}

/// Compile resolved states into a draw plan.
///
/// Invisible objects (`opacity <= 0`) and objects missing the fields their kind needs produce no
/// items. Image objects appear only once decoded in `images`.
#[tracing::instrument(level = "debug", skip_all, fields(objects = states.len()))]
pub fn compile_draw_plan(
    canvas: Canvas,
    states: &[ResolvedObjectState<'_>],
    images: &ImageCache,
) -> DrawPlan {
    let mut items = Vec::with_capacity(states.len());
    for st in states {
        if !st.is_visible() {
            continue;
        }
        compile_object(st, images, &mut items);
    }
    DrawPlan { canvas, items }
}

fn object_transform(center: Point, rotation_deg: f64, scale: f64) -> Affine {
    let c = center.to_vec2();
    Affine::translate(c)
        * Affine::rotate(rotation_deg * PI / 180.0)
        * Affine::scale(scale)
        * Affine::translate(-c)
}

fn finite_positive(v: Option<f64>) -> Option<f64> {
    v.filter(|v| v.is_finite() && *v > 0.0)
}

fn compile_object(st: &ResolvedObjectState<'_>, images: &ImageCache, out: &mut Vec<DrawItem>) {
    let s = st.state;
    let props = st.props();
    let color = CssColor::parse_or(props.color.as_deref(), CssColor::BLACK);
    let opacity = s.opacity.min(1.0);

    let center = match st.kind() {
        ObjectKind::Rect | ObjectKind::Bar => Point::new(
            s.x + props.width.unwrap_or(0.0) / 2.0,
            s.y + props.height.unwrap_or(0.0) / 2.0,
        ),
        _ => Point::new(s.x, s.y),
    };
    let transform = object_transform(center, s.rotation, s.scale);
    let mut push = |shape: DrawShape| {
        out.push(DrawItem {
            object_id: st.id().to_owned(),
            transform,
            opacity,
            shape,
        });
    };

    match st.kind() {
        ObjectKind::Rect | ObjectKind::Bar => {
            let (Some(w), Some(h)) = (props.width, props.height) else {
                return;
            };
            let rect = Rect::new(s.x, s.y, s.x + w, s.y + h).abs();
            let radius = RECT_CORNER_RADIUS
                .min(rect.width() / 2.0)
                .min(rect.height() / 2.0);
            push(DrawShape::Fill {
                path: RoundedRect::from_rect(rect, radius).to_path(SHAPE_TOLERANCE),
                color,
            });
            if let Some(text) = props.text.as_deref().filter(|t| !t.is_empty()) {
                push(DrawShape::Text {
                    text: text.to_owned(),
                    anchor: Point::new(s.x + w / 2.0, s.y + h - RECT_LABEL_INSET),
                    size_px: RECT_LABEL_SIZE_PX,
                    bold: true,
                    color: CssColor::WHITE,
                    align: TextAlign::Center,
                });
            }
        }
        ObjectKind::Circle => {
            let Some(r) = finite_positive(props.r) else {
                return;
            };
            push(DrawShape::Fill {
                path: Circle::new((s.x, s.y), r).to_path(SHAPE_TOLERANCE),
                color,
            });
        }
        ObjectKind::Sphere => {
            let Some(r) = finite_positive(props.r) else {
                return;
            };
            let c = Point::new(s.x, s.y);
            let circle = Circle::new(c, r);
            push(DrawShape::RadialFill {
                path: circle.to_path(SHAPE_TOLERANCE),
                bounds: circle.bounding_box(),
                from_center: c - Vec2::new(r / 3.0, r / 3.0),
                from_radius: r / 10.0,
                from_color: CssColor::parse_or(props.color2.as_deref(), CssColor::WHITE),
                to_center: c,
                to_radius: r,
                to_color: color,
            });
        }
        ObjectKind::Text => {
            let Some(text) = props.text.as_deref().filter(|t| !t.is_empty()) else {
                return;
            };
            let font = props
                .font
                .as_deref()
                .map(FontSpec::parse_css)
                .unwrap_or_default();
            push(DrawShape::Text {
                text: text.to_owned(),
                anchor: Point::new(s.x, s.y),
                size_px: font.size_px,
                bold: font.bold,
                color,
                align: TextAlign::Start,
            });
        }
        ObjectKind::Path => {
            let Some(path) = props
                .d
                .as_deref()
                .and_then(|d| BezPath::from_svg(d.trim()).ok())
            else {
                return;
            };
            push(DrawShape::Stroke {
                path,
                color,
                width: finite_positive(props.width).unwrap_or(PATH_LINE_WIDTH),
                round_caps: false,
            });
        }
        ObjectKind::Arrow => {
            let Some(path) = props
                .points
                .as_deref()
                .and_then(|pts| arrow_path(Point::new(s.x, s.y), pts))
            else {
                return;
            };
            push(DrawShape::Stroke {
                path,
                color,
                width: finite_positive(props.width).unwrap_or(ARROW_LINE_WIDTH),
                round_caps: true,
            });
        }
        ObjectKind::Axis => {
            let mut path = BezPath::new();
            path.move_to((s.x, s.y));
            path.line_to((s.x + props.width.unwrap_or(0.0), s.y));
            path.move_to((s.x, s.y));
            path.line_to((s.x, s.y - props.height.unwrap_or(0.0)));
            push(DrawShape::Stroke {
                path,
                color,
                width: AXIS_LINE_WIDTH,
                round_caps: false,
            });
        }
        ObjectKind::Image => {
            let (Some(img), Some(w), Some(h)) = (images.get(st.id()), props.width, props.height)
            else {
                return;
            };
            push(DrawShape::Image {
                image: img.clone(),
                dest: Rect::new(s.x, s.y, s.x + w, s.y + h).abs(),
            });
        }
        ObjectKind::Other(_) => {}
    }
}

/// Arrow shaft plus a two-stroke head, moved so the shaft starts at `origin`.
///
/// `points` is `[x1, y1, x2, y2, ..]`; only the first four values are used.
pub fn arrow_path(origin: Point, points: &[f64]) -> Option<BezPath> {
    let &[x1, y1, x2, y2, ..] = points else {
        return None;
    };
    let offset = origin - Point::new(x1, y1);
    let p1 = Point::new(x1, y1) + offset;
    let p2 = Point::new(x2, y2) + offset;
    let angle = (p2.y - p1.y).atan2(p2.x - p1.x);
    let head = |a: f64| {
        Point::new(
            p2.x - ARROW_HEAD_LEN * a.cos(),
            p2.y - ARROW_HEAD_LEN * a.sin(),
        )
    };

    let mut path = BezPath::new();
    path.move_to(p1);
    path.line_to(p2);
    path.line_to(head(angle - PI / 6.0));
    path.move_to(p2);
    path.line_to(head(angle + PI / 6.0));
    Some(path)
}

#[cfg(test)]
#[path = "../../tests/unit/render/plan.rs"]
mod tests;
