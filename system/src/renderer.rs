use crate::message::{StrokeSegment, StrokeStyle};
use crate::surface::{CompositeMode, DrawingSurface};
use crate::types::Color;

/// Paints one segment with its own style and leaves the surface attributes as they were.
///
/// Runs as a single save/draw/restore sequence so a local stroke and a remote stroke
/// never see each other's composite mode, color or width.
pub fn draw_segment<S: DrawingSurface + ?Sized>(surface: &mut S, segment: &StrokeSegment) {
    surface.save();
    match &segment.style {
        StrokeStyle::Brush { color, size } => {
            surface.set_composite(CompositeMode::SourceOver);
            surface.set_stroke_color(color);
            surface.set_line_width(*size);
        }
        StrokeStyle::Eraser { size } => {
            // destination-out only reads alpha, so any opaque color erases fully.
            surface.set_composite(CompositeMode::DestinationOut);
            surface.set_stroke_color(&Color::black());
            surface.set_line_width(*size);
        }
    }
    surface.begin_path();
    surface.move_to(segment.from);
    surface.line_to(segment.to);
    surface.stroke();
    surface.close_path();
    surface.restore();
}

/// Paints a segment received from another participant.
pub fn apply_remote<S: DrawingSurface + ?Sized>(surface: &mut S, segment: &StrokeSegment) {
    log::trace!("Remote segment {:?}", segment);
    draw_segment(surface, segment);
}

/// Wipes the whole surface. Clearing a blank surface is a no-op.
pub fn apply_clear<S: DrawingSurface + ?Sized>(surface: &mut S) {
    surface.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;
    use crate::types::Point;
    use std::convert::TryFrom;

    fn segment(x0: f32, y0: f32, x1: f32, y1: f32, style: StrokeStyle) -> StrokeSegment {
        StrokeSegment::new(Point::new(x0, y0), Point::new(x1, y1), style)
    }

    fn brush(color: &str, size: f32) -> StrokeStyle {
        StrokeStyle::Brush {
            color: Color::try_from(color).expect(""),
            size,
        }
    }

    #[test]
    fn it_paints_with_segment_style_and_restores_local_attributes() {
        let mut surface = RecordingSurface::new(200.0, 200.0);
        let local = Color::try_from("#123456").expect("");
        surface.set_stroke_color(&local);
        surface.set_line_width(2.0);

        apply_remote(&mut surface, &segment(0.0, 0.0, 10.0, 10.0, brush("#ff0000", 8.0)));

        let painted = &surface.painted()[0];
        assert_eq!(painted.color.as_str(), "#ff0000");
        assert_eq!(painted.width, 8.0);
        assert_eq!(painted.path, vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)]);
        assert_eq!(surface.stroke_color(), &local);
        assert_eq!(surface.line_width(), 2.0);
        assert_eq!(surface.composite(), CompositeMode::SourceOver);
    }

    #[test]
    fn it_never_erases_with_local_color() {
        let mut surface = RecordingSurface::new(200.0, 200.0);
        let local = Color::try_from("rgba(255, 0, 0, 0.2)").expect("");
        surface.set_stroke_color(&local);

        apply_remote(
            &mut surface,
            &segment(5.0, 5.0, 6.0, 6.0, StrokeStyle::Eraser { size: 20.0 }),
        );

        let painted = &surface.painted()[0];
        assert_eq!(painted.composite, CompositeMode::DestinationOut);
        assert_ne!(painted.color, local);
        assert_eq!(painted.width, 20.0);
        assert_eq!(surface.composite(), CompositeMode::SourceOver);
    }

    #[test]
    fn it_clears_blank_surface_safely() {
        let mut surface = RecordingSurface::new(10.0, 10.0);
        apply_clear(&mut surface);
        apply_clear(&mut surface);
        assert!(surface.is_blank());
        assert_eq!(surface.clear_count(), 2);
    }
}
