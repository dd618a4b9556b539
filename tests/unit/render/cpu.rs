use super::*;
use crate::foundation::core::Canvas;
use kurbo::{Circle, Shape};

fn plan(items: Vec<DrawItem>) -> DrawPlan {
    DrawPlan {
        canvas: Canvas {
            width: 40,
            height: 40,
        },
        items,
    }
}

fn red_circle(opacity: f64) -> DrawItem {
    DrawItem {
        object_id: "c".to_string(),
        transform: Affine::IDENTITY,
        opacity,
        shape: DrawShape::Fill {
            path: Circle::new((20.0, 20.0), 10.0).to_path(SHAPE_TOLERANCE),
            color: CssColor::rgba(255, 0, 0, 255),
        },
    }
}

fn close(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b).all(|(x, y)| (i16::from(*x) - i16::from(y)).abs() <= 2)
}

#[test]
fn concentric_gradient_param_is_radial_fraction() {
    let s = radial_gradient_param(
        Point::new(5.0, 0.0),
        Point::ZERO,
        0.0,
        Point::ZERO,
        10.0,
    )
    .unwrap();
    assert!((s - 0.5).abs() < 1e-12);
}

#[test]
fn offset_gradient_reaches_one_on_outer_circle() {
    let c0 = Point::new(20.0, 20.0);
    let c1 = Point::new(30.0, 30.0);
    let edge = radial_gradient_param(Point::new(60.0, 30.0), c0, 3.0, c1, 30.0).unwrap();
    assert!((edge - 1.0).abs() < 1e-9);
    let inner = radial_gradient_param(c0, c0, 3.0, c1, 30.0).unwrap();
    assert!(inner <= 0.0);
}

#[test]
fn clear_color_and_fill() {
    let mut be =
        CpuBackend::new(CpuBackendOpts::default().with_clear_rgba(Some([255, 255, 255, 255])))
            .unwrap();
    let frame = be.render_plan(&plan(vec![red_circle(1.0)])).unwrap();
    assert_eq!((frame.width, frame.height), (40, 40));
    assert!(frame.premultiplied);
    assert_eq!(frame.pixel(20, 20), Some([255, 0, 0, 255]));
    assert_eq!(frame.pixel(1, 1), Some([255, 255, 255, 255]));
}

#[test]
fn group_opacity_blends() {
    let mut be = CpuBackend::new(CpuBackendOpts::default()).unwrap();
    let frame = be.render_plan(&plan(vec![red_circle(0.5)])).unwrap();
    let px = frame.pixel(20, 20).unwrap();
    assert!(close(px, [128, 0, 0, 128]), "got {px:?}");
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 0]));
}

#[test]
fn text_without_font_is_skipped() {
    let mut be = CpuBackend::new(CpuBackendOpts::default()).unwrap();
    assert!(!be.has_font());
    let item = DrawItem {
        object_id: "t".to_string(),
        transform: Affine::IDENTITY,
        opacity: 0.5,
        shape: DrawShape::Text {
            text: "hello".to_string(),
            anchor: Point::new(2.0, 20.0),
            size_px: 16.0,
            bold: false,
            color: CssColor::BLACK,
            align: TextAlign::Start,
        },
    };
    let frame = be.render_plan(&plan(vec![item])).unwrap();
    assert!(frame.data.iter().all(|&b| b == 0));
}

#[test]
fn missing_font_file_is_an_error() {
    let opts = CpuBackendOpts::default().with_font_path("/definitely/not/here.ttf");
    assert!(CpuBackend::new(opts).is_err());
}

#[test]
fn images_are_scaled_into_destination() {
    let mut be = CpuBackend::new(CpuBackendOpts::default()).unwrap();
    let img = DecodedImage {
        width: 1,
        height: 1,
        rgba8_premul: Arc::new(vec![0, 0, 255, 255]),
    };
    let item = DrawItem {
        object_id: "img".to_string(),
        transform: Affine::IDENTITY,
        opacity: 1.0,
        shape: DrawShape::Image {
            image: img,
            dest: Rect::new(10.0, 10.0, 30.0, 30.0),
        },
    };
    let frame = be.render_plan(&plan(vec![item])).unwrap();
    let px = frame.pixel(20, 20).unwrap();
    assert!(close(px, [0, 0, 255, 255]), "got {px:?}");
    assert_eq!(frame.pixel(5, 5), Some([0, 0, 0, 0]));
}

#[test]
fn oversized_canvas_is_rejected() {
    let mut be = CpuBackend::new(CpuBackendOpts::default()).unwrap();
    let p = DrawPlan {
        canvas: Canvas {
            width: 70_000,
            height: 10,
        },
        items: vec![],
    };
    assert!(matches!(be.render_plan(&p), Err(SceneError::Evaluation(_))));
}

fn sphere_at(cx: f64, cy: f64) -> DrawItem {
    let r = 10.0;
    let center = Point::new(cx, cy);
    DrawItem {
        object_id: "s".to_string(),
        transform: Affine::IDENTITY,
        opacity: 1.0,
        shape: DrawShape::RadialFill {
            path: Circle::new(center, r).to_path(SHAPE_TOLERANCE),
            bounds: Rect::new(cx - r, cy - r, cx + r, cy + r),
            from_center: Point::new(cx - r / 3.0, cy - r / 3.0),
            from_radius: r / 10.0,
            from_color: CssColor::rgba(255, 255, 255, 255),
            to_center: center,
            to_radius: r,
            to_color: CssColor::rgba(0, 0, 255, 255),
        },
    }
}

#[test]
fn moving_sphere_reuses_one_gradient_raster() {
    let mut be = CpuBackend::new(CpuBackendOpts::default()).unwrap();
    for i in 0..200 {
        let x = 20.0 + f64::from(i) * 0.01;
        be.render_plan(&plan(vec![sphere_at(x, 20.0)])).unwrap();
    }
    assert_eq!(be.gradient_cache.entries.len(), 1);

    let frame = be.render_plan(&plan(vec![sphere_at(20.0, 20.0)])).unwrap();
    let rim = frame.pixel(28, 20).unwrap();
    assert!(rim[2] > 150 && rim[0] < 100, "got {rim:?}");
}

#[test]
fn gradient_cache_is_bounded_and_clearable() {
    let mut be = CpuBackend::new(CpuBackendOpts::default()).unwrap();
    be.gradient_cache = PaintCache::new(4);
    for i in 0..10 {
        let mut item = sphere_at(20.0, 20.0);
        if let DrawShape::RadialFill { to_color, .. } = &mut item.shape {
            *to_color = CssColor::rgba(0, 0, 100 + i * 10, 255);
        }
        be.render_plan(&plan(vec![item])).unwrap();
    }
    assert_eq!(be.gradient_cache.entries.len(), 4);
    assert_eq!(be.gradient_cache.lru.len(), 4);

    be.clear_caches();
    assert!(be.gradient_cache.entries.is_empty());
    assert!(be.image_cache.entries.is_empty());
}
