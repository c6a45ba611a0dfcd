use sharedraw_system::{CanvasBounds, Color, CompositeMode, DrawingSurface, Point};
use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// `DrawingSurface` on a browser 2D canvas.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
        let mut surface = Self { canvas, ctx };
        surface.resize();
        surface
    }

    /// Matches the bitmap to the element's layout size. Resizing wipes the bitmap.
    pub fn resize(&mut self) {
        let rect = self.canvas.get_bounding_client_rect();
        self.canvas.set_width(rect.width().max(0.0) as u32);
        self.canvas.set_height(rect.height().max(0.0) as u32);
        self.ctx.set_line_cap("round");
        self.ctx.set_line_join("round");
    }
}

impl DrawingSurface for CanvasSurface {
    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn set_composite(&mut self, mode: CompositeMode) {
        if let Err(e) = self.ctx.set_global_composite_operation(mode.as_str()) {
            log::warn!("Cannot set composite mode {}: {:?}", mode.as_str(), e);
        }
    }

    fn set_stroke_color(&mut self, color: &Color) {
        self.ctx.set_stroke_style(&JsValue::from_str(color.as_str()));
    }

    fn set_line_width(&mut self, width: f32) {
        self.ctx.set_line_width(width as f64);
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, point: Point) {
        self.ctx.move_to(point.x as f64, point.y as f64);
    }

    fn line_to(&mut self, point: Point) {
        self.ctx.line_to(point.x as f64, point.y as f64);
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
    }

    fn bounds(&self) -> CanvasBounds {
        let rect = self.canvas.get_bounding_client_rect();
        CanvasBounds {
            left: rect.left() as f32,
            top: rect.top() as f32,
            width: rect.width() as f32,
            height: rect.height() as f32,
        }
    }
}
