//! RGBA colors: parsing, interpolation, and source-over blending.
//!
//! Colors arrive from control-panel input as CSS-style strings (`#rrggbb`,
//! `#rgb`, `#rrggbbaa`, or a small set of keywords), so [`Color`] serializes
//! to and from that form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::LienzoError;

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Linear interpolation between two colors, `t` clamped to [0, 1].
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Composite `self` over `dst` (source-over), weighted by `coverage`.
    ///
    /// Coverage scales the source alpha, which is how anti-aliased glyph
    /// edges and clipped overlay pixels blend into the surface.
    pub fn over(self, dst: [u8; 4], coverage: f32) -> [u8; 4] {
        let sa = (self.a as f32 / 255.0) * coverage.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return dst;
        }
        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return [0, 0, 0, 0];
        }
        let blend = |s: u8, d: u8| {
            let s = s as f32 / 255.0;
            let d = d as f32 / 255.0;
            (((s * sa + d * da * (1.0 - sa)) / out_a) * 255.0).round() as u8
        };
        [
            blend(self.r, dst[0]),
            blend(self.g, dst[1]),
            blend(self.b, dst[2]),
            (out_a * 255.0).round() as u8,
        ]
    }

    pub fn to_rgba(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }
}

impl FromStr for Color {
    type Err = LienzoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| {
                LienzoError::Image(format!("invalid hex color: {s:?}"))
            });
        }
        match s.to_ascii_lowercase().as_str() {
            "black" => Ok(Color::BLACK),
            "white" => Ok(Color::WHITE),
            "red" => Ok(Color::rgb(255, 0, 0)),
            "green" => Ok(Color::rgb(0, 128, 0)),
            "blue" => Ok(Color::rgb(0, 0, 255)),
            "yellow" => Ok(Color::rgb(255, 255, 0)),
            "cyan" => Ok(Color::rgb(0, 255, 255)),
            "magenta" => Ok(Color::rgb(255, 0, 255)),
            "gray" | "grey" => Ok(Color::rgb(128, 128, 128)),
            "transparent" => Ok(Color::TRANSPARENT),
            _ => Err(LienzoError::Image(format!("unknown color name: {s:?}"))),
        }
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let nibble = |c: u8| (c as char).to_digit(16).map(|d| d as u8);
    match hex.len() {
        // #rgb
        3 => {
            let b = hex.as_bytes();
            let r = nibble(b[0])?;
            let g = nibble(b[1])?;
            let bl = nibble(b[2])?;
            Some(Color::rgb(r * 17, g * 17, bl * 17))
        }
        // #rrggbb
        6 => {
            let v = u32::from_str_radix(hex, 16).ok()?;
            Some(Color::rgb(
                (v >> 16) as u8,
                (v >> 8) as u8,
                v as u8,
            ))
        }
        // #rrggbbaa
        8 => {
            let v = u32::from_str_radix(hex, 16).ok()?;
            Some(Color::rgba(
                (v >> 24) as u8,
                (v >> 16) as u8,
                (v >> 8) as u8,
                v as u8,
            ))
        }
        _ => None,
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
