use super::*;
use serde_json::json;

#[test]
fn object_kind_round_trips_unknown_types() {
    let obj: SceneObject = serde_json::from_value(json!({
        "id": "bg",
        "type": "bg",
        "props": {"color": "#111"}
    }))
    .unwrap();
    assert_eq!(obj.kind, ObjectKind::Other("bg".to_string()));
    let back = serde_json::to_value(&obj).unwrap();
    assert_eq!(back["type"], "bg");
}

#[test]
fn baseline_defaults_when_absent() {
    let props = ObjectProps::default();
    assert_eq!(props.baseline(), Baseline::default());
    let b = Baseline::default();
    assert_eq!((b.x, b.y, b.scale, b.rotation, b.opacity), (0.0, 0.0, 1.0, 0.0, 1.0));
}

#[test]
fn props_keep_unknown_keys_and_accept_numeric_text() {
    let props: ObjectProps = serde_json::from_value(json!({
        "x": 10,
        "text": 42,
        "glow": true
    }))
    .unwrap();
    assert_eq!(props.x, Some(10.0));
    assert_eq!(props.text.as_deref(), Some("42"));
    assert_eq!(props.extra.get("glow"), Some(&json!(true)));
}

#[test]
fn action_kinds_parse_from_type_strings() {
    let a: Action = serde_json::from_value(json!({
        "id": "a1", "objectId": "o", "type": "translate",
        "start": 0, "end": 1, "params": {"to": {"x": 10, "y": 20}}
    }))
    .unwrap();
    assert_eq!(
        a.kind,
        ActionKind::Translate {
            to: Some(PointTarget {
                x: Some(10.0),
                y: Some(20.0)
            })
        }
    );

    let f = ActionKind::parse("followPath", &json!({"pathId": "orbit"}));
    assert_eq!(
        f,
        ActionKind::FollowPath {
            path_id: Some("orbit".to_string())
        }
    );
}

#[test]
fn missing_or_malformed_params_become_empty_targets() {
    assert_eq!(
        ActionKind::parse("fade", &json!({"color": "#f1c40f"})),
        ActionKind::Fade { opacity: None }
    );
    assert_eq!(
        ActionKind::parse("scale", &json!({"scale": "big"})),
        ActionKind::Scale { scale: None }
    );
    assert_eq!(
        ActionKind::parse("rotate", &serde_json::Value::Null),
        ActionKind::Rotate { rotation: None }
    );
}

#[test]
fn unknown_action_type_is_kept() {
    let a: Action = serde_json::from_value(json!({
        "id": "w", "objectId": "o", "type": "wobble", "start": 1, "end": 2
    }))
    .unwrap();
    assert_eq!(a.kind.type_name(), "wobble");
    let back = serde_json::to_value(&a).unwrap();
    assert_eq!(back["type"], "wobble");
}

#[test]
fn missing_end_is_instantaneous() {
    let a: Action = serde_json::from_value(json!({
        "id": "s", "objectId": "o", "type": "scale", "start": 2.5, "params": {"scale": 2}
    }))
    .unwrap();
    assert_eq!(a.start, 2.5);
    assert_eq!(a.end, 2.5);
}

#[test]
fn blank_narrative_counts_as_absent() {
    let a = Action::new("a", "o", "fade", 0.0, 1.0, json!({"opacity": 0})).with_narrative("  ");
    assert_eq!(a.narration(), None);
    let a = a.with_narrative("Fading out.");
    assert_eq!(a.narration(), Some("Fading out."));
}
