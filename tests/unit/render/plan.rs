use super::*;
use crate::eval::resolver::resolve;
use crate::scene::document::SceneDocument;
use serde_json::json;

fn doc(objects: serde_json::Value, actions: serde_json::Value) -> SceneDocument {
    SceneDocument::from_value(json!({
        "width": 200, "height": 100, "duration": 2,
        "objects": objects,
        "actions": actions
    }))
    .unwrap()
}

fn plan_at(d: &SceneDocument, t: f64) -> DrawPlan {
    compile_draw_plan(d.canvas(), &resolve(d, t), &ImageCache::new())
}

#[test]
fn font_shorthand_parsing() {
    assert_eq!(
        FontSpec::parse_css("bold 32px Inter"),
        FontSpec {
            size_px: 32.0,
            bold: true
        }
    );
    assert_eq!(FontSpec::parse_css("600 12px/1.5 serif").size_px, 12.0);
    assert!(FontSpec::parse_css("600 12px serif").bold);
    assert_eq!(FontSpec::parse_css("Inter"), FontSpec::default());
}

#[test]
fn draw_order_follows_objects_and_skips_invisible() {
    let d = doc(
        json!([
            {"id": "a", "type": "circle", "props": {"r": 5}},
            {"id": "b", "type": "circle", "props": {"r": 5, "opacity": 0}},
            {"id": "c", "type": "rect", "props": {"width": 10, "height": 10, "text": "7"}},
            {"id": "bg", "type": "bg"}
        ]),
        json!([]),
    );
    let plan = plan_at(&d, 0.0);
    let ids: Vec<&str> = plan.items.iter().map(|i| i.object_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c", "c"]);
}

#[test]
fn rect_rotates_about_its_center() {
    let d = doc(
        json!([{"id": "r", "type": "rect", "props": {"x": 10, "y": 20, "width": 40, "height": 20, "rotation": 90}}]),
        json!([]),
    );
    let plan = plan_at(&d, 0.0);
    let center = Point::new(30.0, 30.0);
    let moved = plan.items[0].transform * center;
    assert!((moved - center).hypot() < 1e-9);
    let corner = plan.items[0].transform * Point::new(10.0, 20.0);
    assert!((corner.x - 40.0).abs() < 1e-9 && (corner.y - 10.0).abs() < 1e-9);
}

#[test]
fn scale_applies_about_object_position() {
    let d = doc(
        json!([{"id": "o", "type": "circle", "props": {"x": 50, "y": 50, "r": 10}}]),
        json!([{"id": "s", "objectId": "o", "type": "scale", "start": 0, "end": 1, "params": {"scale": 2}}]),
    );
    let plan = plan_at(&d, 1.0);
    let tr = plan.items[0].transform;
    assert_eq!(tr * Point::new(50.0, 50.0), Point::new(50.0, 50.0));
    assert_eq!(tr * Point::new(60.0, 50.0), Point::new(70.0, 50.0));
}

#[test]
fn rect_label_is_white_bold_and_centered() {
    let d = doc(
        json!([{"id": "bar", "type": "bar", "props": {"x": 0, "y": 0, "width": 40, "height": 60, "text": 12}}]),
        json!([]),
    );
    let plan = plan_at(&d, 0.0);
    match &plan.items[1].shape {
        DrawShape::Text {
            text,
            anchor,
            size_px,
            bold,
            color,
            align,
        } => {
            assert_eq!(text, "12");
            assert_eq!(*anchor, Point::new(20.0, 50.0));
            assert_eq!(*size_px, 16.0);
            assert!(*bold);
            assert_eq!(*color, CssColor::WHITE);
            assert_eq!(*align, TextAlign::Center);
        }
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn sphere_gradient_geometry() {
    let d = doc(
        json!([{"id": "s", "type": "sphere", "props": {"x": 30, "y": 30, "r": 30, "color": "#ff0000"}}]),
        json!([]),
    );
    let plan = plan_at(&d, 0.0);
    match &plan.items[0].shape {
        DrawShape::RadialFill {
            from_center,
            from_radius,
            from_color,
            to_center,
            to_radius,
            to_color,
            ..
        } => {
            assert_eq!(*from_center, Point::new(20.0, 20.0));
            assert_eq!(*from_radius, 3.0);
            assert_eq!(*from_color, CssColor::WHITE);
            assert_eq!(*to_center, Point::new(30.0, 30.0));
            assert_eq!(*to_radius, 30.0);
            assert_eq!(*to_color, CssColor::rgba(255, 0, 0, 255));
        }
        other => panic!("expected radial fill, got {other:?}"),
    }
}

#[test]
fn stroke_defaults_per_kind() {
    let d = doc(
        json!([
            {"id": "p", "type": "path", "props": {"d": "M 0 0 L 10 0"}},
            {"id": "a", "type": "arrow", "props": {"points": [0, 0, 10, 0]}},
            {"id": "ax", "type": "axis", "props": {"width": 100, "height": 50}}
        ]),
        json!([]),
    );
    let widths: Vec<(f64, bool)> = plan_at(&d, 0.0)
        .items
        .iter()
        .map(|i| match &i.shape {
            DrawShape::Stroke {
                width, round_caps, ..
            } => (*width, *round_caps),
            other => panic!("expected stroke, got {other:?}"),
        })
        .collect();
    assert_eq!(widths, vec![(2.0, false), (3.0, true), (1.0, false)]);
}

#[test]
fn arrow_is_offset_to_object_position() {
    let path = arrow_path(Point::new(100.0, 50.0), &[10.0, 10.0, 40.0, 10.0]).unwrap();
    let els = path.elements();
    assert_eq!(els[0], kurbo::PathEl::MoveTo(Point::new(100.0, 50.0)));
    assert_eq!(els[1], kurbo::PathEl::LineTo(Point::new(130.0, 50.0)));
    let kurbo::PathEl::LineTo(h) = els[2] else {
        panic!("expected head stroke");
    };
    let expected = Point::new(
        130.0 - 12.0 * (-PI / 6.0).cos(),
        50.0 - 12.0 * (-PI / 6.0).sin(),
    );
    assert!((h - expected).hypot() < 1e-9);
    assert!(arrow_path(Point::ZERO, &[1.0, 2.0]).is_none());
}

#[test]
fn images_wait_for_decode() {
    let d = doc(
        json!([{"id": "img", "type": "image", "props": {"src": "a.png", "width": 10, "height": 10}}]),
        json!([]),
    );
    let mut cache = ImageCache::new();
    cache.request_all(&d);
    let states = resolve(&d, 0.0);
    assert!(compile_draw_plan(d.canvas(), &states, &cache).items.is_empty());
}
