use super::*;
use crate::scene::model::PointTarget;

#[test]
fn progress_windows() {
    assert_eq!(progress(1.0, 3.0, 0.5), None);
    assert_eq!(progress(1.0, 3.0, 1.0), Some(0.0));
    assert_eq!(progress(1.0, 3.0, 2.0), Some(0.5));
    assert_eq!(progress(1.0, 3.0, 9.0), Some(1.0));
}

#[test]
fn instantaneous_window_snaps_at_start() {
    assert_eq!(progress(2.0, 2.0, 1.999), None);
    assert_eq!(progress(2.0, 2.0, 2.0), Some(1.0));
    assert_eq!(progress(2.0, 2.0, 5.0), Some(1.0));
}

#[test]
fn translate_moves_from_running_position() {
    let mut s = Baseline {
        x: 10.0,
        y: 4.0,
        ..Baseline::default()
    };
    let kind = ActionKind::Translate {
        to: Some(PointTarget {
            x: Some(20.0),
            y: None,
        }),
    };
    apply_action(&kind, &mut s, 0.5, None);
    assert_eq!(s.x, 15.0);
    assert_eq!(s.y, 4.0);
}

#[test]
fn targets_are_exact_at_full_progress() {
    let mut s = Baseline::default();
    apply_action(&ActionKind::Fade { opacity: Some(0.3) }, &mut s, 1.0, None);
    apply_action(&ActionKind::Scale { scale: Some(2.5) }, &mut s, 1.0, None);
    apply_action(
        &ActionKind::Rotate {
            rotation: Some(45.0),
        },
        &mut s,
        1.0,
        None,
    );
    assert_eq!(s.opacity, 0.3);
    assert_eq!(s.scale, 2.5);
    assert_eq!(s.rotation, 45.0);
}

#[test]
fn missing_targets_are_no_ops() {
    let before = Baseline {
        x: 3.0,
        rotation: 12.0,
        ..Baseline::default()
    };
    let mut s = before;
    apply_action(&ActionKind::Rotate { rotation: None }, &mut s, 0.7, None);
    apply_action(&ActionKind::Translate { to: None }, &mut s, 0.7, None);
    apply_action(&ActionKind::Fade { opacity: None }, &mut s, 0.7, None);
    apply_action(
        &ActionKind::FollowPath {
            path_id: Some("p".to_string()),
        },
        &mut s,
        0.7,
        None,
    );
    apply_action(
        &ActionKind::Unknown {
            type_name: "wobble".to_string(),
        },
        &mut s,
        0.7,
        None,
    );
    assert_eq!(s, before);
}

#[test]
fn follow_path_assigns_absolute_position() {
    let g = PathGeometry::from_svg("M 0 0 L 100 0").unwrap();
    let mut s = Baseline {
        x: 500.0,
        y: 500.0,
        ..Baseline::default()
    };
    let kind = ActionKind::FollowPath {
        path_id: Some("p".to_string()),
    };
    apply_action(&kind, &mut s, 0.5, Some(&g));
    assert!((s.x - 50.0).abs() < 1e-4);
    assert!(s.y.abs() < 1e-4);
}
