use std::str::FromStr;

use crate::ColorParseError;

/// Straight (non-premultiplied) sRGB colour, `Color(r, g, b, a)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color(pub u8, pub u8, pub u8, pub u8);

impl Color {
    pub const TRANSPARENT: Color = Color(0, 0, 0, 0);
    pub const BLACK: Color = Color(0, 0, 0, 255);
    pub const WHITE: Color = Color(255, 255, 255, 255);
    pub const RED: Color = Color(255, 0, 0, 255);
    pub const GREEN: Color = Color(0, 255, 0, 255);
    pub const BLUE: Color = Color(0, 0, 255, 255);

    /// Packed `0xAARRGGBB`, the layout Android hands out for colour ints.
    pub fn from_argb(packed: u32) -> Self {
        let [a, r, g, b] = packed.to_be_bytes();
        Color(r, g, b, a)
    }

    pub fn to_argb(self) -> u32 {
        u32::from_be_bytes([self.3, self.0, self.1, self.2])
    }

    /// Lenient hex parser: bad digits become 0 (alpha becomes 255), unknown
    /// lengths give opaque black. Use `str::parse` for strict parsing.
    pub fn from_hex(hex: &str) -> Self {
        hex.parse().unwrap_or_else(|_| {
            let s = hex.trim_start_matches('#');
            let digit = |i: usize, default: u8| {
                s.get(i..i + 2)
                    .and_then(|d| u8::from_str_radix(d, 16).ok())
                    .unwrap_or(default)
            };
            match s.len() {
                6 => Color(digit(0, 0), digit(2, 0), digit(4, 0), 255),
                8 => Color(digit(0, 0), digit(2, 0), digit(4, 0), digit(6, 255)),
                _ => Color::BLACK,
            }
        })
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Color(self.0, self.1, self.2, a)
    }

    pub fn to_linear(self) -> [f32; 4] {
        fn srgb_to_linear(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }
        let r = srgb_to_linear(self.0 as f32 / 255.0);
        let g = srgb_to_linear(self.1 as f32 / 255.0);
        let b = srgb_to_linear(self.2 as f32 / 255.0);
        let a = self.3 as f32 / 255.0;
        [r, g, b, a]
    }
}

impl From<u32> for Color {
    fn from(packed: u32) -> Self {
        Color::from_argb(packed)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    /// Accepts `RRGGBB` or `RRGGBBAA`, with or without a leading `#`.
    fn from_str(hex: &str) -> Result<Self, Self::Err> {
        let s = hex.trim_start_matches('#');
        if s.len() != 6 && s.len() != 8 {
            return Err(ColorParseError::Length(s.len()));
        }
        let byte = |i: usize| -> Result<u8, ColorParseError> {
            let digits = s
                .get(i..i + 2)
                .ok_or_else(|| ColorParseError::Digit(s.to_string()))?;
            u8::from_str_radix(digits, 16).map_err(|_| ColorParseError::Digit(digits.to_string()))
        };
        let a = if s.len() == 8 { byte(6)? } else { 255 };
        Ok(Color(byte(0)?, byte(2)?, byte(4)?, a))
    }
}
