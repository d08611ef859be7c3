use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VotemapError;

/// Color representation.
///
/// Colors are serialized as hex strings. Opaque colors use the short `#RRGGBB` form, the rest `#RRGGBBAA`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

/// CSS color keywords used by color associations.
const NAMED_COLORS: &[(&str, Color)] = &[
    ("black", Color::BLACK),
    ("blue", Color::BLUE),
    ("gray", Color::GRAY),
    ("green", Color::rgba(0, 128, 0, 255)),
    ("grey", Color::GRAY),
    ("orange", Color::rgba(255, 165, 0, 255)),
    ("purple", Color::PURPLE),
    ("red", Color::RED),
    ("transparent", Color::TRANSPARENT),
    ("white", Color::WHITE),
    ("yellow", Color::YELLOW),
];

impl Color {
    /// Transparent color: `#00000000`
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    /// Red color: `#FF0000`
    pub const RED: Color = Color::rgba(255, 0, 0, 255);
    /// Blue color: `#0000FF`
    pub const BLUE: Color = Color::rgba(0, 0, 255, 255);
    /// Yellow color: `#FFFF00`
    pub const YELLOW: Color = Color::rgba(255, 255, 0, 255);
    /// White color: `#FFFFFF`
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    /// Black color: `#000000`
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    /// Gray color: `#808080`
    pub const GRAY: Color = Color::rgba(128, 128, 128, 255);
    /// Purple color: `#800080`
    pub const PURPLE: Color = Color::rgba(128, 0, 128, 255);

    /// Constructs color from its RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses a color from the hex string. Hex string can be either HEX6 (`#RRGGBB`) or HEX8 (`#RRGGBBAA`).
    pub fn try_from_hex(hex_string: &str) -> Option<Self> {
        let digits = hex_string.strip_prefix('#')?;
        if (digits.len() != 6 && digits.len() != 8) || !digits.is_ascii() {
            return None;
        }

        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        let a = if digits.len() == 8 { channel(6)? } else { 255 };

        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a,
        })
    }

    /// Looks up a CSS color keyword, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        NAMED_COLORS
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name.trim()))
            .map(|(_, color)| *color)
    }

    /// Converts the color into a CSS hex string.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl FromStr for Color {
    type Err = VotemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from_hex(s)
            .or_else(|| Self::from_name(s))
            .ok_or_else(|| VotemapError::InvalidColor(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = VotemapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(val: Color) -> Self {
        val.to_hex()
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}
