use js_sys::Promise;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys as web;

/// The soundtrack. Its playback position is the clock the scene follows.
///
/// A `Playback` without an element is silent: positions are `None` and the
/// frame clock falls back to wall time.
pub struct Playback {
    element: Option<web::HtmlAudioElement>,
}

impl Playback {
    pub fn new(src: &str) -> Self {
        match web::HtmlAudioElement::new_with_src(src) {
            Ok(el) => {
                el.set_preload("auto");
                Self { element: Some(el) }
            }
            Err(e) => {
                log::warn!("[audio] cannot create element for {}: {:?}", src, e);
                Self::silent()
            }
        }
    }

    pub fn silent() -> Self {
        Self { element: None }
    }

    /// Drop the element after it failed to load.
    pub fn mute(&mut self) {
        if let Some(el) = self.element.take() {
            _ = el.pause();
        }
    }

    pub fn has_audio(&self) -> bool {
        self.element.is_some()
    }

    /// Playback position in seconds.
    pub fn position(&self) -> Option<f64> {
        self.element.as_ref().map(|el| el.current_time())
    }

    /// True while the element is running, i.e. not paused and not ended.
    pub fn is_playing(&self) -> bool {
        self.element
            .as_ref()
            .is_some_and(|el| !el.paused() && !el.ended())
    }

    pub fn play(&self) {
        let Some(el) = &self.element else {
            return;
        };
        match el.play() {
            Ok(promise) => spawn_local(async move {
                if let Err(e) = JsFuture::from(promise).await {
                    log::warn!("[audio] play rejected: {:?}", e);
                }
            }),
            Err(e) => log::warn!("[audio] play failed: {:?}", e),
        }
    }

    pub fn pause(&self) {
        if let Some(el) = &self.element {
            _ = el.pause();
        }
    }

    /// Resolves once enough data is buffered to play through, rejects on a
    /// media error.
    pub fn ready(&self) -> Promise {
        let Some(el) = self.element.clone() else {
            return Promise::reject(&JsValue::from_str("no audio element"));
        };
        // HAVE_ENOUGH_DATA
        if el.ready_state() >= 4 {
            return Promise::resolve(&JsValue::NULL);
        }
        Promise::new(&mut |resolve, reject| {
            let opts = web::AddEventListenerOptions::new();
            opts.set_once(true);
            let on_ready = Closure::once_into_js(move || {
                _ = resolve.call0(&JsValue::NULL);
            });
            let on_error = Closure::once_into_js(move || {
                _ = reject.call1(&JsValue::NULL, &JsValue::from_str("media error"));
            });
            _ = el.add_event_listener_with_callback_and_add_event_listener_options(
                "canplaythrough",
                on_ready.unchecked_ref(),
                &opts,
            );
            _ = el.add_event_listener_with_callback_and_add_event_listener_options(
                "error",
                on_error.unchecked_ref(),
                &opts,
            );
        })
    }
}
