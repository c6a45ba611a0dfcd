use crate::types::{Color, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeMode {
    SourceOver,
    /// Punches transparency where the path is stroked.
    DestinationOut,
}

impl CompositeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompositeMode::SourceOver => "source-over",
            CompositeMode::DestinationOut => "destination-out",
        }
    }
}

/// Canvas bounding box in client (viewport) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasBounds {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

/// The subset of a 2D drawing context the stroke engine needs.
///
/// Attribute setters affect every following `stroke` until the matching `restore`.
pub trait DrawingSurface {
    fn save(&mut self);
    fn restore(&mut self);

    fn set_composite(&mut self, mode: CompositeMode);
    fn set_stroke_color(&mut self, color: &Color);
    fn set_line_width(&mut self, width: f32);

    fn begin_path(&mut self);
    fn move_to(&mut self, point: Point);
    fn line_to(&mut self, point: Point);
    fn stroke(&mut self);
    fn close_path(&mut self);

    fn clear(&mut self);
    fn bounds(&self) -> CanvasBounds;
}

#[derive(Debug, Clone, PartialEq)]
struct Attributes {
    composite: CompositeMode,
    color: Color,
    width: f32,
}

/// A painted stroke as it would land on the bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct PaintedStroke {
    pub path: Vec<Point>,
    pub composite: CompositeMode,
    pub color: Color,
    pub width: f32,
}

/// Headless surface that keeps every painted stroke since the last clear.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    bounds: CanvasBounds,
    current: Attributes,
    saved: Vec<Attributes>,
    path: Vec<Point>,
    painted: Vec<PaintedStroke>,
    clear_count: usize,
}

impl RecordingSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            bounds: CanvasBounds {
                left: 0.0,
                top: 0.0,
                width,
                height,
            },
            current: Attributes {
                composite: CompositeMode::SourceOver,
                color: Color::black(),
                width: 1.0,
            },
            saved: Vec::new(),
            path: Vec::new(),
            painted: Vec::new(),
            clear_count: 0,
        }
    }

    pub fn with_bounds(bounds: CanvasBounds) -> Self {
        Self {
            bounds,
            ..Self::new(bounds.width, bounds.height)
        }
    }

    pub fn painted(&self) -> &[PaintedStroke] {
        &self.painted
    }

    pub fn is_blank(&self) -> bool {
        self.painted.is_empty()
    }

    pub fn clear_count(&self) -> usize {
        self.clear_count
    }

    pub fn composite(&self) -> CompositeMode {
        self.current.composite
    }

    pub fn stroke_color(&self) -> &Color {
        &self.current.color
    }

    pub fn line_width(&self) -> f32 {
        self.current.width
    }

    pub fn save_depth(&self) -> usize {
        self.saved.len()
    }
}

impl DrawingSurface for RecordingSurface {
    fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    fn restore(&mut self) {
        if let Some(attributes) = self.saved.pop() {
            self.current = attributes;
        }
    }

    fn set_composite(&mut self, mode: CompositeMode) {
        self.current.composite = mode;
    }

    fn set_stroke_color(&mut self, color: &Color) {
        self.current.color = color.clone();
    }

    fn set_line_width(&mut self, width: f32) {
        self.current.width = width;
    }

    fn begin_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, point: Point) {
        self.path.clear();
        self.path.push(point);
    }

    fn line_to(&mut self, point: Point) {
        self.path.push(point);
    }

    fn stroke(&mut self) {
        if self.path.len() < 2 {
            return;
        }
        self.painted.push(PaintedStroke {
            path: self.path.clone(),
            composite: self.current.composite,
            color: self.current.color.clone(),
            width: self.current.width,
        });
    }

    fn close_path(&mut self) {}

    fn clear(&mut self) {
        self.painted.clear();
        self.clear_count += 1;
    }

    fn bounds(&self) -> CanvasBounds {
        self.bounds
    }
}
