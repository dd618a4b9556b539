use kurbo::{BezPath, ParamCurve, ParamCurveArclen, PathEl, PathSeg, Point};

use crate::foundation::error::{SceneError, SceneResult};
use crate::foundation::math::clamp01;

/// Accuracy (in canvas units) used for arc-length measurement and inversion.
pub const ARCLEN_ACCURACY: f64 = 1e-6;

/// Arc-length parameterized view of an SVG path.
///
/// Lengths are measured per segment with kurbo's adaptive arc-length routines, so curves are not
/// approximated by a fixed polyline. Subpath jumps (`M` inside a path) contribute no length.
/// When a target length falls exactly on a segment boundary, the earlier segment's end point is
/// returned.
#[derive(Clone, Debug)]
pub struct PathGeometry {
    segments: Vec<PathSeg>,
    /// Cumulative length at the end of each segment.
    cumulative: Vec<f64>,
    origin: Option<Point>,
}

impl PathGeometry {
    /// Parse SVG path data (`d` attribute syntax).
    pub fn from_svg(d: &str) -> SceneResult<Self> {
        let d = d.trim();
        if d.is_empty() {
            return Err(SceneError::validation("path data must be non-empty"));
        }
        let path = BezPath::from_svg(d)
            .map_err(|e| SceneError::validation(format!("invalid path data: {e}")))?;
        Ok(Self::from_bezpath(&path))
    }

    /// Measure an already-built path.
    pub fn from_bezpath(path: &BezPath) -> Self {
        let origin = path.elements().iter().find_map(|el| match el {
            PathEl::MoveTo(p) => Some(*p),
            _ => None,
        });

        let mut segments = Vec::new();
        let mut cumulative = Vec::new();
        let mut total = 0.0;
        for seg in path.segments() {
            let len = seg.arclen(ARCLEN_ACCURACY);
            if !len.is_finite() {
                continue;
            }
            total += len;
            segments.push(seg);
            cumulative.push(total);
        }

        Self {
            segments,
            cumulative,
            origin,
        }
    }

    /// Total arc length.
    pub fn length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Point at arc-length fraction `fraction` (clamped into `[0, 1]`).
    ///
    /// Returns the initial move-to point for paths without drawable segments and `None` for
    /// paths with no points at all.
    pub fn point_at_fraction(&self, fraction: f64) -> Option<Point> {
        if self.segments.is_empty() {
            return self.origin;
        }

        let target = clamp01(fraction) * self.length();
        let last = self.segments.len() - 1;
        let i = self.cumulative.partition_point(|&c| c < target).min(last);

        let seg_start = if i == 0 { 0.0 } else { self.cumulative[i - 1] };
        let seg_len = self.cumulative[i] - seg_start;
        let seg = self.segments[i];
        let local = (target - seg_start).clamp(0.0, seg_len);

        let t = if local >= seg_len {
            1.0
        } else if local <= 0.0 {
            0.0
        } else {
            seg.inv_arclen(local, ARCLEN_ACCURACY)
        };
        Some(seg.eval(t))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/path.rs"]
mod tests;
