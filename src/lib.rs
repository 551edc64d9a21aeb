#![cfg(target_arch = "wasm32")]
use crate::core::clock::FrameClock;
use crate::core::config::SceneConfig;
use crate::core::field::FieldManager;
use crate::core::geometry;
use crate::core::readiness::ReadinessState;
use crate::core::scene::{LayerMask, MeshOwnership, SceneGraph, SceneNode, LAYER_CURSOR};
use constants::*;
use glam::Vec3;
use instant::Instant;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod assets;
mod audio;
mod constants;
mod core;
mod dom;
mod events;
mod frame;
mod input;
mod overlay;
mod render;

fn wire_canvas_resize(canvas: &web::HtmlCanvasElement) {
    dom::sync_canvas_backing_size(canvas);
    let canvas_resize = canvas.clone();
    dom::add_window_listener("resize", move || {
        dom::sync_canvas_backing_size(&canvas_resize);
    });
}

/// Defaults overridden by the page's query string.
fn load_config() -> SceneConfig {
    let mut config = SceneConfig::default();
    if let Some(search) = dom::location_search() {
        for e in config.apply_query(&search) {
            log::warn!("[config] {}", e);
        }
    }
    config
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            log::info!("[field] seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("canopy-web starting");

    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
            if let Some(document) = dom::window_document() {
                overlay::show_error(&document, &e.to_string());
            }
        }
    });
    Ok(())
}

/// Change a config value by name from JS, e.g. `set_parameter("fov", 60)`.
/// Applied at the start of the next frame; rejected values are logged.
#[wasm_bindgen]
pub fn set_parameter(name: String, value: f32) {
    frame::queue_parameter(name, value);
}

async fn init() -> anyhow::Result<()> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow::anyhow!("no document"))?;

    let canvas_el = document
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| anyhow::anyhow!("missing #{}", CANVAS_ID))?;
    let canvas: web::HtmlCanvasElement = canvas_el
        .dyn_into::<web::HtmlCanvasElement>()
        .map_err(|e| anyhow::anyhow!(format!("{:?}", e)))?;

    // Maintain canvas internal pixel size to match CSS size * devicePixelRatio
    wire_canvas_resize(&canvas);

    let config = load_config();
    overlay::set_status(&document, "Loading…");

    let mut playback = audio::Playback::new(AUDIO_URL);
    let loaded = assets::load_all(&playback).await;
    if !loaded.audio_ready && playback.has_audio() {
        log::warn!("[audio] soundtrack unavailable; running on wall-clock time");
        playback.mute();
    }
    let playback = Rc::new(RefCell::new(playback));

    let pipeline = frame::init_pipeline(&canvas, &config).await?;

    let mut scene = SceneGraph::new();
    let variants = loaded
        .prop_variants
        .into_iter()
        .map(|mesh| scene.add_mesh(mesh, MeshOwnership::Shared))
        .collect();
    let mut field = FieldManager::new(config.field.clone(), seeded_rng(config.seed));
    field.set_prop_variants(variants);
    let live = field.populate_initial(&mut scene);
    log::info!("[field] initial population {}", live);

    let orb = scene.add_mesh(geometry::cursor_orb(CURSOR_RADIUS), MeshOwnership::Owned);
    let cursor = scene.insert(
        SceneNode::new(orb, Vec3::new(0.0, 1.0, -CURSOR_DISTANCE))
            .with_layers(LayerMask::layer(LAYER_CURSOR))
            .with_bounds(CURSOR_RADIUS),
    );

    let pointer = Rc::new(RefCell::new(input::PointerState::default()));
    events::wire_pointer_tracking(&canvas, pointer.clone());

    let actions: frame::ActionQueue = Rc::new(RefCell::new(Vec::new()));
    let frame_ctx = Rc::new(RefCell::new(frame::FrameContext {
        canvas: canvas.clone(),
        document: document.clone(),
        playback: playback.clone(),
        pointer,
        actions: actions.clone(),
        config,
        scene,
        field,
        pipeline,
        cursor,
        cues: loaded.cues,
        clock: FrameClock::default(),
        started: Instant::now(),
        elapsed: 0.0,
        camera: None,
        caption_index: None,
    }));
    let frame_loop = frame::FrameLoop::new(frame_ctx);

    events::wire_global_keydown(
        document.clone(),
        playback.clone(),
        frame_loop.clone(),
        actions,
    );

    let loop_ok = frame_loop.clone();
    let playback_ok = playback.clone();
    dom::add_click_listener(&document, OVERLAY_OK_ID, move || {
        playback_ok.borrow().play();
        loop_ok.start();
        if let Some(d) = dom::window_document() {
            overlay::hide(&d);
        }
    });

    let loop_hide = frame_loop.clone();
    dom::add_window_listener("pagehide", move || {
        loop_hide.shutdown();
    });

    match &loaded.state {
        ReadinessState::TimedOut { missing } => {
            overlay::set_status(&document, &format!("Ready (without {})", missing.join(", ")))
        }
        _ => overlay::set_status(&document, "Ready"),
    }
    overlay::show(&document);
    Ok(())
}
