use crate::message::StrokeSegment;
use crate::renderer::draw_segment;
use crate::surface::{CanvasBounds, DrawingSurface};
use crate::tool::ToolConfig;
use crate::types::Point;

/// Pointer input already mapped to canvas-local pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
    PointerLeave,
    TouchCancel,
}

/// Raw pointer position before it is mapped onto the canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerInput {
    Mouse { client: Point },
    Touch { touches: Vec<Point> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureState {
    Idle,
    Drawing { last: Point },
}

/// Maps mouse or touch client coordinates to canvas-local pixels. Only the first touch counts.
pub fn canvas_point(input: &PointerInput, bounds: &CanvasBounds) -> Option<Point> {
    let client = match input {
        PointerInput::Mouse { client } => *client,
        PointerInput::Touch { touches } => *touches.first()?,
    };
    Some(Point::new(client.x - bounds.left, client.y - bounds.top))
}

/// Turns pointer gestures into line segments. There is no end-of-stroke message; a stroke
/// simply stops producing segments.
pub struct StrokeCapture {
    state: CaptureState,
}

impl StrokeCapture {
    pub fn new() -> Self {
        Self {
            state: CaptureState::Idle,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Feeds one input event. A pointer move while drawing paints the segment locally and
    /// returns it for sending, with the tool config snapshotted at this moment.
    pub fn handle<S: DrawingSurface + ?Sized>(
        &mut self,
        event: InputEvent,
        tool: &ToolConfig,
        surface: &mut S,
    ) -> Option<StrokeSegment> {
        match (self.state, event) {
            (_, InputEvent::PointerDown(point)) => {
                self.state = CaptureState::Drawing { last: point };
                None
            }
            (CaptureState::Drawing { last }, InputEvent::PointerMove(point)) => {
                let segment = StrokeSegment::new(last, point, tool.snapshot());
                draw_segment(surface, &segment);
                self.state = CaptureState::Drawing { last: point };
                Some(segment)
            }
            (CaptureState::Idle, InputEvent::PointerMove(_)) => None,
            (_, InputEvent::PointerUp)
            | (_, InputEvent::PointerLeave)
            | (_, InputEvent::TouchCancel) => {
                self.state = CaptureState::Idle;
                None
            }
        }
    }
}

impl std::default::Default for StrokeCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::StrokeStyle;
    use crate::surface::RecordingSurface;
    use crate::tool::Tool;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn it_emits_chained_segments_while_drawing() {
        let mut capture = StrokeCapture::new();
        let tool = ToolConfig::new();
        let mut surface = RecordingSurface::new(100.0, 100.0);

        assert_eq!(capture.handle(InputEvent::PointerDown(p(1.0, 1.0)), &tool, &mut surface), None);
        let first = capture
            .handle(InputEvent::PointerMove(p(2.0, 3.0)), &tool, &mut surface)
            .expect("");
        let second = capture
            .handle(InputEvent::PointerMove(p(5.0, 8.0)), &tool, &mut surface)
            .expect("");

        assert_eq!((first.from, first.to), (p(1.0, 1.0), p(2.0, 3.0)));
        assert_eq!((second.from, second.to), (p(2.0, 3.0), p(5.0, 8.0)));
        assert_eq!(surface.painted().len(), 2);
    }

    #[test]
    fn it_emits_nothing_when_stroke_ends_or_when_idle() {
        let mut capture = StrokeCapture::new();
        let tool = ToolConfig::new();
        let mut surface = RecordingSurface::new(100.0, 100.0);

        let idle_move = InputEvent::PointerMove(p(2.0, 2.0));
        assert_eq!(capture.handle(idle_move, &tool, &mut surface), None);

        let ends = [
            InputEvent::PointerUp,
            InputEvent::PointerLeave,
            InputEvent::TouchCancel,
        ];
        for end in ends.iter() {
            capture.handle(InputEvent::PointerDown(p(0.0, 0.0)), &tool, &mut surface);
            assert_eq!(capture.handle(*end, &tool, &mut surface), None);
            assert_eq!(capture.state(), CaptureState::Idle);
            let late_move = InputEvent::PointerMove(p(9.0, 9.0));
            assert_eq!(capture.handle(late_move, &tool, &mut surface), None);
        }
        assert!(surface.is_blank());
    }

    #[test]
    fn it_snapshots_tool_per_segment() {
        let mut capture = StrokeCapture::new();
        let mut tool = ToolConfig::new();
        let mut surface = RecordingSurface::new(100.0, 100.0);

        capture.handle(InputEvent::PointerDown(p(0.0, 0.0)), &tool, &mut surface);
        let brush = capture
            .handle(InputEvent::PointerMove(p(1.0, 0.0)), &tool, &mut surface)
            .expect("");
        tool.set_tool(Tool::Eraser);
        let eraser = capture
            .handle(InputEvent::PointerMove(p(2.0, 0.0)), &tool, &mut surface)
            .expect("");

        assert!(!brush.style.is_eraser());
        assert_eq!(eraser.style, StrokeStyle::Eraser { size: tool.size() });
    }

    #[test]
    fn it_maps_mouse_and_first_touch_relative_to_bounds() {
        let bounds = CanvasBounds {
            left: 10.0,
            top: 20.0,
            width: 300.0,
            height: 200.0,
        };
        assert_eq!(
            canvas_point(&PointerInput::Mouse { client: p(15.0, 25.0) }, &bounds),
            Some(p(5.0, 5.0))
        );
        assert_eq!(
            canvas_point(
                &PointerInput::Touch {
                    touches: vec![p(110.0, 120.0), p(0.0, 0.0)]
                },
                &bounds
            ),
            Some(p(100.0, 100.0))
        );
        assert_eq!(
            canvas_point(&PointerInput::Touch { touches: vec![] }, &bounds),
            None
        );
    }
}
