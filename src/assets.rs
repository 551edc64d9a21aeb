use crate::audio::Playback;
use crate::constants::{
    ASSET_ITEM_TIMEOUT_MS, ASSET_TIMEOUT_MS, CAPTIONS_URL, PROP_VARIANT_URLS,
};
use crate::core::cues::CueTrack;
use crate::core::geometry::MeshData;
use crate::core::readiness::{Readiness, ReadinessState, ResourceState};
use instant::Instant;
use js_sys::{Array, Promise, Uint8Array};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys as web;

const AUDIO_SLOT: usize = 0;
const CAPTIONS_SLOT: usize = 1;
const FIRST_PROP_SLOT: usize = 2;

/// Everything setup waits for. Missing pieces are already replaced by their
/// fallbacks (no audio, no captions, placeholder props).
pub struct LoadedAssets {
    pub prop_variants: Vec<MeshData>,
    pub cues: CueTrack,
    pub audio_ready: bool,
    pub state: ReadinessState,
}

enum Body {
    Text,
    Bytes,
}

type Slots = Rc<RefCell<Vec<Option<JsValue>>>>;

/// Load the soundtrack, captions and prop variants concurrently.
///
/// Each load races its own timeout; the whole set waits at most
/// `ASSET_TIMEOUT_MS` before setup proceeds with whatever arrived.
pub async fn load_all(playback: &Playback) -> LoadedAssets {
    let started = Instant::now();
    let readiness = Rc::new(RefCell::new(Readiness::new(
        0.0,
        ASSET_TIMEOUT_MS as f64 / 1000.0,
    )));

    let mut work: Vec<(String, Promise)> = vec![
        ("audio".to_string(), playback.ready()),
        (CAPTIONS_URL.to_string(), fetch(CAPTIONS_URL, Body::Text)),
    ];
    for &url in PROP_VARIANT_URLS {
        work.push((url.to_string(), fetch(url, Body::Bytes)));
    }

    let slots: Slots = Rc::new(RefCell::new(vec![None; work.len()]));
    let settled = Array::new();
    for (slot, (id, promise)) in work.into_iter().enumerate() {
        readiness.borrow_mut().declare(&id);
        settled.push(&settle(slot, id, promise, readiness.clone(), slots.clone()));
    }
    let deadline = delay(ASSET_TIMEOUT_MS, Ok(JsValue::from_str("deadline")));
    _ = JsFuture::from(Promise::race(&Array::of2(&Promise::all(&settled), &deadline))).await;

    let state = readiness.borrow().poll(started.elapsed().as_secs_f64());
    match &state {
        ReadinessState::Ready => log::info!(
            "[assets] ready in {:.0} ms",
            started.elapsed().as_secs_f64() * 1000.0
        ),
        ReadinessState::TimedOut { missing } => {
            log::warn!("[assets] timed out; proceeding without {:?}", missing)
        }
        ReadinessState::Pending => log::warn!(
            "[assets] proceeding with {:?} still pending",
            readiness.borrow().pending()
        ),
    }

    let values = std::mem::take(&mut *slots.borrow_mut());
    let audio_ready = readiness.borrow().state("audio") == Some(&ResourceState::Ready)
        && values.get(AUDIO_SLOT).is_some_and(Option::is_some);

    let cues = match values.get(CAPTIONS_SLOT).and_then(|v| v.as_ref()?.as_string()) {
        Some(text) => CueTrack::parse(&text).unwrap_or_else(|e| {
            log::warn!("[assets] captions rejected: {}", e);
            readiness.borrow_mut().fallback(CAPTIONS_URL, e.to_string());
            CueTrack::default()
        }),
        None => CueTrack::default(),
    };

    let mut prop_variants = Vec::new();
    for (url, value) in PROP_VARIANT_URLS
        .iter()
        .zip(values.iter().skip(FIRST_PROP_SLOT))
    {
        let Some(value) = value else {
            continue;
        };
        match MeshData::from_le_bytes(&Uint8Array::new(value).to_vec()) {
            Ok(mesh) if !mesh.is_empty() => prop_variants.push(mesh),
            Ok(_) => log::warn!("[assets] {} has no triangles; skipped", url),
            Err(e) => {
                log::warn!("[assets] {} rejected: {}", url, e);
                readiness.borrow_mut().fallback(url, e.to_string());
            }
        }
    }
    log::info!(
        "[assets] audio={} cues={} prop variants={}/{}",
        audio_ready,
        cues.len(),
        prop_variants.len(),
        PROP_VARIANT_URLS.len()
    );

    LoadedAssets {
        prop_variants,
        cues,
        audio_ready,
        state,
    }
}

/// A promise that always fulfils: with the load's value stored in `slot`, or
/// after recording a fallback when the load failed or timed out.
fn settle(
    slot: usize,
    id: String,
    work: Promise,
    readiness: Rc<RefCell<Readiness>>,
    slots: Slots,
) -> Promise {
    let timeout = delay(ASSET_ITEM_TIMEOUT_MS, Err(JsValue::from_str("timed out")));
    let raced = Promise::race(&Array::of2(&work, &timeout));
    future_to_promise(async move {
        match JsFuture::from(raced).await {
            Ok(value) => {
                readiness.borrow_mut().resolve(&id);
                if let Some(s) = slots.borrow_mut().get_mut(slot) {
                    *s = Some(value);
                }
            }
            Err(e) => {
                let reason = describe(&e);
                log::warn!("[assets] {} unavailable ({}); using fallback", id, reason);
                readiness.borrow_mut().fallback(&id, reason);
            }
        }
        Ok(JsValue::UNDEFINED)
    })
}

/// Settles with `outcome` after `ms` milliseconds.
fn delay(ms: i32, outcome: Result<JsValue, JsValue>) -> Promise {
    Promise::new(&mut |resolve, reject| {
        let (callback, value) = match &outcome {
            Ok(v) => (resolve, v.clone()),
            Err(e) => (reject, e.clone()),
        };
        if let Some(w) = web::window() {
            _ = w.set_timeout_with_callback_and_timeout_and_arguments_1(&callback, ms, &value);
        }
    })
}

fn fetch(url: &'static str, body: Body) -> Promise {
    future_to_promise(async move {
        let window = web::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let resp: web::Response = JsFuture::from(window.fetch_with_str(url))
            .await?
            .dyn_into()?;
        if !resp.ok() {
            return Err(JsValue::from_str(&format!("HTTP {}", resp.status())));
        }
        match body {
            Body::Text => JsFuture::from(resp.text()?).await,
            Body::Bytes => {
                let buf = JsFuture::from(resp.array_buffer()?).await?;
                Ok(Uint8Array::new(&buf).into())
            }
        }
    })
}

fn describe(e: &JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{:?}", e))
}
