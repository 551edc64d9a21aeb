use crate::input;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Keep `pointer` in sync with the pointer over `canvas`.
pub fn wire_pointer_tracking(canvas: &web::HtmlCanvasElement, pointer: Rc<RefCell<input::PointerState>>) {
    let canvas_move = canvas.clone();
    let pointer_move = pointer.clone();
    let on_move = wasm_bindgen::closure::Closure::wrap(Box::new(move |ev: web::PointerEvent| {
        let mut p = pointer_move.borrow_mut();
        p.uv = input::pointer_canvas_uv(&ev, &canvas_move);
        p.inside = true;
    }) as Box<dyn FnMut(_)>);
    _ = canvas.add_event_listener_with_callback("pointermove", on_move.as_ref().unchecked_ref());
    on_move.forget();

    let on_leave = wasm_bindgen::closure::Closure::wrap(Box::new(move |_ev: web::PointerEvent| {
        pointer.borrow_mut().inside = false;
    }) as Box<dyn FnMut(_)>);
    _ = canvas.add_event_listener_with_callback("pointerleave", on_leave.as_ref().unchecked_ref());
    on_leave.forget();
}
