use crate::foundation::math::{clamp01, lerp};
use crate::geometry::path::PathGeometry;
use crate::scene::model::{ActionKind, Baseline};

/// Normalized progress of an action window at time `t`.
///
/// `None` before `start`. Instantaneous windows (`end <= start`) report `1` from `start` on.
pub fn progress(start: f64, end: f64, t: f64) -> Option<f64> {
    if t < start {
        return None;
    }
    let span = end - start;
    if span <= 0.0 {
        return Some(1.0);
    }
    Some(clamp01((t - start) / span))
}

/// Apply one action to an object's running state at progress `p`.
///
/// Interpolating actions start from the running value as it stands when this action is reached,
/// so chained actions compose. `path` is the geometry of the referenced path object for
/// `followPath`; `None` makes it a no-op. Missing targets leave the state untouched.
pub fn apply_action(kind: &ActionKind, state: &mut Baseline, p: f64, path: Option<&PathGeometry>) {
    match kind {
        ActionKind::Translate { to } => {
            let Some(to) = to else { return };
            if let Some(x) = to.x {
                state.x = lerp(state.x, x, p);
            }
            if let Some(y) = to.y {
                state.y = lerp(state.y, y, p);
            }
        }
        ActionKind::Scale { scale } => {
            if let Some(target) = scale {
                state.scale = lerp(state.scale, *target, p);
            }
        }
        ActionKind::Rotate { rotation } => {
            if let Some(target) = rotation {
                state.rotation = lerp(state.rotation, *target, p);
            }
        }
        ActionKind::Fade { opacity } => {
            if let Some(target) = opacity {
                state.opacity = lerp(state.opacity, *target, p);
            }
        }
        ActionKind::FollowPath { .. } => {
            if let Some(pt) = path.and_then(|g| g.point_at_fraction(p)) {
                state.x = pt.x;
                state.y = pt.y;
            }
        }
        ActionKind::Unknown { .. } => {}
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/interp.rs"]
mod tests;
