use crate::foundation::core::Rgba8Premul;

/// Straight-alpha RGBA8 color parsed from a CSS color string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CssColor {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl CssColor {
    /// Opaque black, the canvas default fill.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);

    /// Build from straight channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)` or a basic named color.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }
        if let Some(body) = s
            .strip_prefix("rgba(")
            .or_else(|| s.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_rgb_fn(body);
        }
        named(&s)
    }

    /// Parse, falling back to `default` when `s` is absent or unparseable.
    pub fn parse_or(s: Option<&str>, default: Self) -> Self {
        s.and_then(Self::parse).unwrap_or(default)
    }

    /// Convert to premultiplied form.
    pub fn to_premul(self) -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(self.r, self.g, self.b, self.a)
    }
}

fn parse_hex(hex: &str) -> Option<CssColor> {
    fn nibble(c: u8) -> Option<u8> {
        (c as char).to_digit(16).map(|v| v as u8)
    }
    fn byte(pair: &[u8]) -> Option<u8> {
        Some(nibble(pair[0])? * 16 + nibble(pair[1])?)
    }

    let b = hex.as_bytes();
    match b.len() {
        3 | 4 => {
            let mut ch = [255u8; 4];
            for (i, &c) in b.iter().enumerate() {
                let v = nibble(c)?;
                ch[i] = v * 16 + v;
            }
            Some(CssColor::rgba(ch[0], ch[1], ch[2], ch[3]))
        }
        6 | 8 => {
            let a = if b.len() == 8 { byte(&b[6..8])? } else { 255 };
            Some(CssColor::rgba(
                byte(&b[0..2])?,
                byte(&b[2..4])?,
                byte(&b[4..6])?,
                a,
            ))
        }
        _ => None,
    }
}

fn parse_rgb_fn(body: &str) -> Option<CssColor> {
    let parts: Vec<&str> = body
        .split([',', ' ', '/'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let channel = |p: &str| -> Option<u8> {
        let v: f64 = p.parse().ok()?;
        Some(v.round().clamp(0.0, 255.0) as u8)
    };
    let alpha = match parts.get(3) {
        Some(p) => {
            let v: f64 = p.parse().ok()?;
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        None => 255,
    };

    Some(CssColor::rgba(
        channel(parts[0])?,
        channel(parts[1])?,
        channel(parts[2])?,
        alpha,
    ))
}

fn named(s: &str) -> Option<CssColor> {
    let c = match s {
        "black" => CssColor::BLACK,
        "white" => CssColor::WHITE,
        "red" => CssColor::rgba(255, 0, 0, 255),
        "green" => CssColor::rgba(0, 128, 0, 255),
        "lime" => CssColor::rgba(0, 255, 0, 255),
        "blue" => CssColor::rgba(0, 0, 255, 255),
        "yellow" => CssColor::rgba(255, 255, 0, 255),
        "orange" => CssColor::rgba(255, 165, 0, 255),
        "purple" => CssColor::rgba(128, 0, 128, 255),
        "cyan" => CssColor::rgba(0, 255, 255, 255),
        "magenta" => CssColor::rgba(255, 0, 255, 255),
        "gray" | "grey" => CssColor::rgba(128, 128, 128, 255),
        "transparent" => CssColor::rgba(0, 0, 0, 0),
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/color.rs"]
mod tests;
