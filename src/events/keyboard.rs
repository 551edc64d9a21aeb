use crate::audio::Playback;
use crate::core::controls::{action_for_key, KeyAction};
use crate::frame::{ActionQueue, FrameLoop};
use crate::overlay;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Pause or resume audio and the frame loop together.
pub fn toggle_playback(playback: &Rc<RefCell<Playback>>, frame_loop: &FrameLoop) {
    if frame_loop.is_running() {
        playback.borrow().pause();
        frame_loop.stop();
        log::info!("[keys] paused");
    } else {
        playback.borrow().play();
        frame_loop.start();
        log::info!("[keys] resumed");
    }
}

pub fn handle_global_keydown(
    ev: &web::KeyboardEvent,
    document: &web::Document,
    playback: &Rc<RefCell<Playback>>,
    frame_loop: &FrameLoop,
    actions: &ActionQueue,
) {
    if ev.repeat() && ev.key() == " " {
        return;
    }
    let Some(action) = action_for_key(&ev.key()) else {
        return;
    };
    match action {
        KeyAction::TogglePlayback => toggle_playback(playback, frame_loop),
        KeyAction::ToggleOverlay => overlay::toggle(document),
        other => actions.borrow_mut().push(other),
    }
    ev.prevent_default();
}

pub fn wire_global_keydown(
    document: web::Document,
    playback: Rc<RefCell<Playback>>,
    frame_loop: Rc<FrameLoop>,
    actions: ActionQueue,
) {
    if let Some(window) = web::window() {
        let closure =
            wasm_bindgen::closure::Closure::wrap(Box::new(move |ev: web::KeyboardEvent| {
                handle_global_keydown(&ev, &document, &playback, &frame_loop, &actions);
            }) as Box<dyn FnMut(_)>);
        _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}
