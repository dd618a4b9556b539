/// Linear interpolation from `a` toward `b` by ratio `p`.
///
/// `p >= 1` returns `b` itself so a finished action lands exactly on its target.
pub(crate) fn lerp(a: f64, b: f64, p: f64) -> f64 {
    if p >= 1.0 { b } else { a + (b - a) * p }
}

/// Clamp into the unit interval. NaN maps to 0.
pub(crate) fn clamp01(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
