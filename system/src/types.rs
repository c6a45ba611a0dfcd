use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

pub type SessionId = uuid::Uuid;
pub type Point = euclid::default::Point2D<f32>;

const MAX_COLOR_LEN: usize = 64;

/// CSS color value as sent by the drawing client, e.g. `#000` or `rgb(0, 0, 0)`.
///
/// Only the shape is checked (non-empty, bounded length). The string is handed to the
/// canvas as is, so an unknown color name is the canvas' problem, not the wire's.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidColor(pub String);

impl Color {
    pub fn black() -> Self {
        Self("#000000".into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::default::Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

impl TryFrom<String> for Color {
    type Error = InvalidColor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_COLOR_LEN {
            Err(InvalidColor(value))
        } else {
            Ok(Self(trimmed.to_owned()))
        }
    }
}

impl TryFrom<&str> for Color {
    type Error = InvalidColor;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.to_owned())
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for InvalidColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color value {:?}", self.0)
    }
}

impl std::error::Error for InvalidColor {}
