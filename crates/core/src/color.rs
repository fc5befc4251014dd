use image::Rgba;
use std::str::FromStr;
use thiserror::Error;

const NAMED_COLORS: &[(&str, TextColor)] = &[
    ("white", TextColor::new(255, 255, 255)),
    ("black", TextColor::new(0, 0, 0)),
    ("red", TextColor::new(255, 0, 0)),
    ("green", TextColor::new(0, 128, 0)),
    ("lime", TextColor::new(0, 255, 0)),
    ("blue", TextColor::new(0, 0, 255)),
    ("yellow", TextColor::new(255, 255, 0)),
    ("cyan", TextColor::new(0, 255, 255)),
    ("magenta", TextColor::new(255, 0, 255)),
    ("gray", TextColor::new(128, 128, 128)),
    ("grey", TextColor::new(128, 128, 128)),
    ("orange", TextColor::new(255, 165, 0)),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TextColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn with_alpha(self, alpha: u8) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, alpha])
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("color is empty")]
    Empty,
    #[error("hex color must be #RGB or #RRGGBB, got '{0}'")]
    BadLength(String),
    #[error("invalid hex digit in '{0}'")]
    BadDigit(String),
    #[error("unknown color name '{0}'")]
    UnknownName(String),
}

impl FromStr for TextColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(ColorError::Empty);
        }

        if let Some(hex) = input.strip_prefix('#') {
            return parse_hex(hex, input);
        }

        NAMED_COLORS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(input))
            .map(|(_, color)| *color)
            .ok_or_else(|| ColorError::UnknownName(input.to_string()))
    }
}

fn parse_hex(hex: &str, original: &str) -> Result<TextColor, ColorError> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColorError::BadDigit(original.to_string()));
    }

    let channel = |range: std::ops::Range<usize>| -> Result<u8, ColorError> {
        u8::from_str_radix(&hex[range], 16).map_err(|_| ColorError::BadDigit(original.to_string()))
    };

    match hex.len() {
        3 => Ok(TextColor::new(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        6 => Ok(TextColor::new(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        _ => Err(ColorError::BadLength(original.to_string())),
    }
}
