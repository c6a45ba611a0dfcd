use crate::types::{Color, InvalidColor, Point};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// How a segment is painted. An eraser has no color; it punches transparency.
#[derive(Debug, Clone, PartialEq)]
pub enum StrokeStyle {
    Brush { color: Color, size: f32 },
    Eraser { size: f32 },
}

impl StrokeStyle {
    pub fn size(&self) -> f32 {
        match self {
            Self::Brush { size, .. } | Self::Eraser { size } => *size,
        }
    }

    pub fn is_eraser(&self) -> bool {
        matches!(self, Self::Eraser { .. })
    }
}

/// One straight piece of a stroke, in the emitting client's own canvas pixel space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStrokeSegment", into = "RawStrokeSegment")]
pub struct StrokeSegment {
    pub from: Point,
    pub to: Point,
    pub style: StrokeStyle,
}

/// Flat `draw` payload as it travels: `{x0, y0, x1, y1, color, size, isEraser}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStrokeSegment {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
    #[serde(default)]
    pub color: String,
    pub size: f32,
    #[serde(default)]
    pub is_eraser: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvalidSegment {
    NonFiniteCoordinate,
    InvalidSize(f32),
    InvalidColor(InvalidColor),
}

impl StrokeSegment {
    pub fn new(from: Point, to: Point, style: StrokeStyle) -> Self {
        Self { from, to, style }
    }
}

impl TryFrom<RawStrokeSegment> for StrokeSegment {
    type Error = InvalidSegment;

    fn try_from(raw: RawStrokeSegment) -> Result<Self, Self::Error> {
        if ![raw.x0, raw.y0, raw.x1, raw.y1].iter().all(|v| v.is_finite()) {
            return Err(InvalidSegment::NonFiniteCoordinate);
        }
        if !raw.size.is_finite() || raw.size <= 0.0 {
            return Err(InvalidSegment::InvalidSize(raw.size));
        }
        let style = if raw.is_eraser {
            StrokeStyle::Eraser { size: raw.size }
        } else {
            StrokeStyle::Brush {
                color: Color::try_from(raw.color).map_err(InvalidSegment::InvalidColor)?,
                size: raw.size,
            }
        };
        Ok(Self {
            from: Point::new(raw.x0, raw.y0),
            to: Point::new(raw.x1, raw.y1),
            style,
        })
    }
}

impl From<StrokeSegment> for RawStrokeSegment {
    fn from(segment: StrokeSegment) -> Self {
        let (color, size, is_eraser) = match segment.style {
            StrokeStyle::Brush { color, size } => (color.into(), size, false),
            StrokeStyle::Eraser { size } => (String::new(), size, true),
        };
        Self {
            x0: segment.from.x,
            y0: segment.from.y,
            x1: segment.to.x,
            y1: segment.to.y,
            color,
            size,
            is_eraser,
        }
    }
}

impl fmt::Display for InvalidSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFiniteCoordinate => f.write_str("segment has a non-finite coordinate"),
            Self::InvalidSize(size) => write!(f, "segment size must be positive, got {}", size),
            Self::InvalidColor(e) => write!(f, "segment {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    Draw(StrokeSegment),
    Clear,
    PongCheck,
    /// Advisory notice sent right before the client closes its connection.
    Leave,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServerMessage {
    Draw(StrokeSegment),
    Clear,
    UserCount(u32),
    PingCheck,
}

/// Encoding negotiated per connection. Binary frames carry bincode, text frames carry JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Binary,
    Json,
}

impl std::default::Default for WireFormat {
    fn default() -> Self {
        WireFormat::Binary
    }
}

impl FromStr for WireFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary" => Ok(WireFormat::Binary),
            "json" => Ok(WireFormat::Json),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Binary(Vec<u8>),
    Text(String),
}

#[derive(Debug)]
pub enum CodecError {
    Bincode(bincode::Error),
    Json(serde_json::Error),
}

impl WireFormat {
    pub fn encode<T: Serialize>(&self, message: &T) -> Result<Frame, CodecError> {
        match self {
            WireFormat::Binary => bincode::serialize(message)
                .map(Frame::Binary)
                .map_err(CodecError::Bincode),
            WireFormat::Json => serde_json::to_string(message)
                .map(Frame::Text)
                .map_err(CodecError::Json),
        }
    }
}

impl Frame {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        match self {
            Frame::Binary(bytes) => bincode::deserialize(bytes).map_err(CodecError::Bincode),
            Frame::Text(text) => serde_json::from_str(text).map_err(CodecError::Json),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Frame::Binary(bytes) => bytes.len(),
            Frame::Text(text) => text.len(),
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Bincode(e) => write!(f, "malformed binary frame: {}", e),
            CodecError::Json(e) => write!(f, "malformed text frame: {}", e),
        }
    }
}

impl std::error::Error for CodecError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn black_segment() -> StrokeSegment {
        StrokeSegment::new(
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            StrokeStyle::Brush {
                color: Color::try_from("#000").expect(""),
                size: 4.0,
            },
        )
    }

    #[test]
    fn it_uses_flat_camel_case_payload_in_json() {
        let frame = WireFormat::Json
            .encode(&ClientMessage::Draw(black_segment()))
            .expect("");
        let json = match frame {
            Frame::Text(text) => serde_json::from_str::<serde_json::Value>(&text).expect(""),
            _ => panic!("json must be a text frame"),
        };
        assert_eq!(
            json,
            serde_json::json!({
                "draw": {"x0": 0.0, "y0": 0.0, "x1": 10.0, "y1": 10.0,
                         "color": "#000", "size": 4.0, "isEraser": false}
            })
        );
    }

    #[test]
    fn it_names_unit_events_like_the_wire() {
        assert_eq!(
            serde_json::to_string(&ServerMessage::PingCheck).expect(""),
            "\"pingCheck\""
        );
        assert_eq!(
            serde_json::to_string(&ServerMessage::UserCount(3)).expect(""),
            "{\"userCount\":3}"
        );
        let message: ClientMessage = serde_json::from_str("\"pongCheck\"").expect("");
        assert_eq!(message, ClientMessage::PongCheck);
    }

    #[test]
    fn it_ignores_color_of_eraser_segment() {
        let message: ClientMessage = Frame::Text(
            r##"{"draw":{"x0":1,"y0":2,"x1":3,"y1":4,"color":"#f00","size":12,"isEraser":true}}"##
                .into(),
        )
        .decode()
        .expect("");
        match message {
            ClientMessage::Draw(segment) => {
                assert_eq!(segment.style, StrokeStyle::Eraser { size: 12.0 })
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn it_rejects_malformed_draw_payloads() {
        let cases = [
            r##"{"draw":{"x0":0,"y0":0,"x1":1,"y1":1,"color":"#000","size":0,"isEraser":false}}"##,
            r##"{"draw":{"x0":0,"y0":0,"x1":1,"y1":1,"color":"","size":3,"isEraser":false}}"##,
            r##"{"draw":{"x0":0,"y0":0,"x1":1,"color":"#000","size":3}}"##,
            r##"{"draw":null}"##,
            r##"{"paint":{}}"##,
        ];
        for case in cases.iter() {
            let result = Frame::Text(case.to_string()).decode::<ClientMessage>();
            assert!(result.is_err(), "{} must be rejected", case);
        }
    }

    #[test]
    fn it_rejects_non_finite_binary_segment() {
        let raw = RawStrokeSegment {
            x0: f32::NAN,
            y0: 0.0,
            x1: 1.0,
            y1: 1.0,
            color: "#000".into(),
            size: 2.0,
            is_eraser: false,
        };
        // Variant index 0 is `draw`.
        let mut bytes = bincode::serialize(&0u32).expect("");
        bytes.extend(bincode::serialize(&raw).expect(""));
        assert!(Frame::Binary(bytes).decode::<ClientMessage>().is_err());
    }

    #[test]
    fn it_carries_segment_through_binary_frame() {
        let frame = WireFormat::Binary
            .encode(&ServerMessage::Draw(black_segment()))
            .expect("");
        assert!(matches!(frame, Frame::Binary(_)));
        assert_eq!(
            frame.decode::<ServerMessage>().expect(""),
            ServerMessage::Draw(black_segment())
        );
    }

    #[test]
    fn it_parses_wire_format_names() {
        assert_eq!("json".parse::<WireFormat>(), Ok(WireFormat::Json));
        assert_eq!("binary".parse::<WireFormat>(), Ok(WireFormat::Binary));
        assert!("xml".parse::<WireFormat>().is_err());
    }
}
