use crate::message::StrokeStyle;
use crate::types::Color;
use std::convert::TryFrom;
use std::fmt;

pub const MIN_SIZE: f32 = 1.0;
pub const MAX_SIZE: f32 = 100.0;
pub const DEFAULT_SIZE: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Brush,
    Eraser,
}

/// Local drawing tool state. Never sent as a unit; each segment carries a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    tool: Tool,
    color: Color,
    size: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolError {
    InvalidColor(String),
    InvalidSize(f32),
}

impl ToolConfig {
    pub fn new() -> Self {
        Self {
            tool: Tool::Brush,
            color: Color::black(),
            size: DEFAULT_SIZE,
        }
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    /// Picking a color also switches back to the brush.
    pub fn set_color(&mut self, color: &str) -> Result<(), ToolError> {
        self.color = Color::try_from(color).map_err(|e| ToolError::InvalidColor(e.0))?;
        self.tool = Tool::Brush;
        Ok(())
    }

    pub fn set_size(&mut self, size: f32) -> Result<(), ToolError> {
        if !size.is_finite() || size <= 0.0 {
            return Err(ToolError::InvalidSize(size));
        }
        self.size = size.max(MIN_SIZE).min(MAX_SIZE);
        Ok(())
    }

    pub fn snapshot(&self) -> StrokeStyle {
        match self.tool {
            Tool::Brush => StrokeStyle::Brush {
                color: self.color.clone(),
                size: self.size,
            },
            Tool::Eraser => StrokeStyle::Eraser { size: self.size },
        }
    }
}

impl std::default::Default for ToolConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::InvalidColor(color) => write!(f, "invalid color {:?}", color),
            ToolError::InvalidSize(size) => write!(f, "invalid brush size {}", size),
        }
    }
}

impl std::error::Error for ToolError {}
