use web_sys as web;

/// Last known pointer position over the canvas.
#[derive(Clone, Copy, Debug)]
pub struct PointerState {
    pub uv: [f32; 2],
    pub inside: bool,
}

impl Default for PointerState {
    fn default() -> Self {
        Self {
            uv: [0.5, 0.5],
            inside: false,
        }
    }
}

#[inline]
pub fn pointer_canvas_uv(ev: &web::PointerEvent, canvas: &web::HtmlCanvasElement) -> [f32; 2] {
    let rect = canvas.get_bounding_client_rect();
    let x_css = ev.client_x() as f32 - rect.left() as f32;
    let y_css = ev.client_y() as f32 - rect.top() as f32;
    let w = rect.width() as f32;
    let h = rect.height() as f32;
    if w > 0.0 && h > 0.0 {
        let u = (x_css / w).clamp(0.0, 1.0);
        let v = (y_css / h).clamp(0.0, 1.0);
        [u, v]
    } else {
        [0.5, 0.5]
    }
}
