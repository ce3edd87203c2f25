use std::fmt;

use raqote::{SolidSource, Source};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

/// Straight (non-premultiplied) RGB color with a float opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: f32,
}

impl Color {
    /// `rgb` is a packed `0xRRGGBB` value; higher bits are ignored.
    pub const fn from_rgb(rgb: u32, alpha: f32) -> Self {
        Color {
            red: ((rgb >> 16) & 0xFF) as u8,
            green: ((rgb >> 8) & 0xFF) as u8,
            blue: (rgb & 0xFF) as u8,
            alpha,
        }
    }

    pub fn alpha_byte(&self) -> u8 {
        (self.alpha.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    pub fn to_solid_source(&self) -> SolidSource {
        SolidSource::from_unpremultiplied_argb(self.alpha_byte(), self.red, self.green, self.blue)
    }

    pub fn to_source(&self) -> Source<'static> {
        Source::Solid(self.to_solid_source())
    }

    /// CSS form used by style JSON, e.g. `rgba(128, 26, 134, 0.3)`.
    pub fn to_css(&self) -> String {
        format!("rgba({}, {}, {}, {})", self.red, self.green, self.blue, self.alpha)
    }
}

struct ColorVisitor;

impl<'de> Visitor<'de> for ColorVisitor {
    type Value = Color;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a color string of the form '#RRGGBBAA'")
    }

    fn visit_str<E>(self, string: &str) -> Result<Self::Value, E> where E: de::Error {
        if string.len() != 9 || !string.starts_with('#') {
            return Err(de::Error::invalid_value(de::Unexpected::Str(string), &self))
        }
        let r = parse_hex_byte(&self, &string[1..3])?;
        let g = parse_hex_byte(&self, &string[3..5])?;
        let b = parse_hex_byte(&self, &string[5..7])?;
        let a = parse_hex_byte(&self, &string[7..9])?;
        Ok(Color {
            red: r,
            green: g,
            blue: b,
            alpha: f32::from(a) / 255.0,
        })
    }
}

fn parse_hex_byte<E>(visitor: &ColorVisitor, string: &str) -> Result<u8, E> where E: de::Error {
    u8::from_str_radix(string, 16).map_err(|_| {
        de::Error::invalid_value(de::Unexpected::Str(string), visitor)
    })
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: Deserializer<'de> {
        deserializer.deserialize_str(ColorVisitor)
    }
}
