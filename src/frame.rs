use crate::audio::Playback;
use crate::constants::*;
use crate::core::camera::{uv_to_ndc, Camera};
use crate::core::clock::FrameClock;
use crate::core::config::{ConfigChange, ConfigError, SceneConfig};
use crate::core::controls::KeyAction;
use crate::core::cues::CueTrack;
use crate::core::depth::{depth_blur_radius, linearize_depth, prepass_depth};
use crate::core::passes::PassId;
use crate::core::field::{FieldManager, InstanceKind};
use crate::core::scene::{NodeId, SceneGraph};
use crate::input;
use crate::overlay;
use crate::render;
use glam::Vec2;
use instant::Instant;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

/// Key presses that need the frame's state, drained at the top of a frame.
pub type ActionQueue = Rc<RefCell<Vec<KeyAction>>>;

thread_local! {
    static PENDING_PARAMETERS: RefCell<Vec<(String, f32)>> = const { RefCell::new(Vec::new()) };
}

/// Queue a named config change for the next frame.
pub fn queue_parameter(name: String, value: f32) {
    PENDING_PARAMETERS.with(|p| p.borrow_mut().push((name, value)));
}

fn take_parameters() -> Vec<(String, f32)> {
    PENDING_PARAMETERS.with(|p| std::mem::take(&mut *p.borrow_mut()))
}

pub struct FrameContext<'a> {
    pub canvas: web::HtmlCanvasElement,
    pub document: web::Document,
    pub playback: Rc<RefCell<Playback>>,
    pub pointer: Rc<RefCell<input::PointerState>>,
    pub actions: ActionQueue,

    pub config: SceneConfig,
    pub scene: SceneGraph,
    pub field: FieldManager<StdRng>,
    pub pipeline: render::Pipeline<'a>,
    pub cursor: NodeId,
    pub cues: CueTrack,

    pub clock: FrameClock,
    pub started: Instant,
    pub elapsed: f32,
    pub camera: Option<Camera>,
    pub caption_index: Option<usize>,
}

impl<'a> FrameContext<'a> {
    /// Per frame: clock tick, field advance and recycle, camera, render.
    pub fn frame(&mut self) -> anyhow::Result<()> {
        let wall = self.started.elapsed().as_secs_f64();
        let (position, playing) = {
            let playback = self.playback.borrow();
            (playback.position(), playback.is_playing())
        };
        let dt = self.clock.tick(wall, position, playing);
        self.elapsed += dt;

        self.apply_actions();
        self.apply_parameters();

        self.field
            .advance(self.config.travel_speed * dt, &mut self.scene);
        self.field.recycle(&mut self.scene);

        let (w, h) = (self.canvas.width(), self.canvas.height());
        self.pipeline.resize_if_needed(w, h);
        let aspect = w.max(1) as f32 / h.max(1) as f32;
        let camera = Camera::rig(&self.config.camera, aspect, self.elapsed);

        self.update_cursor(&camera);
        self.update_caption(position.unwrap_or(self.elapsed as f64));

        self.pipeline.execute(&mut self.scene, &camera, dt)?;
        self.camera = Some(camera);
        Ok(())
    }

    fn apply_actions(&mut self) {
        let actions: Vec<KeyAction> = std::mem::take(&mut *self.actions.borrow_mut());
        for action in actions {
            match action {
                KeyAction::Nudge { pass, name, delta } => {
                    let result = self
                        .pipeline
                        .params()
                        .get(pass, name)
                        .and_then(|v| self.pipeline.set_parameter(pass, name, (v + delta).max(0.0)));
                    match result {
                        Ok(()) => self.config.post = self.pipeline.params().clone(),
                        Err(e) => log::warn!("[keys] {}", e),
                    }
                }
                KeyAction::Repopulate => {
                    let live = self.field.populate_initial(&mut self.scene);
                    log::info!(
                        "[field] repopulated: {} live ({} ground, {} props), {} meshes resident",
                        live,
                        self.field.count_of(InstanceKind::GroundCover),
                        self.field.count_of(InstanceKind::Prop),
                        self.pipeline.resident_meshes()
                    );
                }
                KeyAction::ProbeDepth => self.log_center_depth(),
                KeyAction::TogglePlayback | KeyAction::ToggleOverlay => {}
            }
        }
    }

    fn apply_parameters(&mut self) {
        for (name, value) in take_parameters() {
            if let Err(e) = self.set_parameter(&name, value) {
                log::warn!("[config] {}", e);
            }
        }
    }

    /// Change one config value by name and push it into the live state.
    ///
    /// Field tuning applies to instances spawned from now on; camera and
    /// travel values are read every frame.
    pub fn set_parameter(&mut self, name: &str, value: f32) -> Result<(), ConfigError> {
        match self.config.set(name, value)? {
            ConfigChange::Field => self.field.set_config(self.config.field.clone()),
            ConfigChange::Post { pass, param } => {
                let value = self.config.post.get(pass, param)?;
                self.pipeline.set_parameter(pass, param, value)?;
            }
            ConfigChange::DepthLayers => self
                .pipeline
                .set_excluded_layers(self.config.depth_excluded_layers),
            ConfigChange::Seed => {
                if let Some(seed) = self.config.seed {
                    self.field.set_rng(StdRng::seed_from_u64(seed));
                }
            }
            ConfigChange::Camera | ConfigChange::TravelSpeed => {}
        }
        log::info!("[config] {} = {}", name, value);
        Ok(())
    }

    fn log_center_depth(&mut self) {
        let Some(camera) = &self.camera else {
            return;
        };
        let depth = prepass_depth(
            &mut self.scene,
            camera,
            Vec2::ZERO,
            self.config.depth_excluded_layers,
        );
        let max_blur = self
            .pipeline
            .params()
            .get(PassId::DepthBlur, "max_blur_size")
            .unwrap_or(0.0);
        log::info!(
            "[depth] center raw={:.5} linear={:.4} blur={:.2}px",
            depth,
            if depth < 0.0 { 0.0 } else { linearize_depth(depth, camera.znear, camera.zfar) },
            depth_blur_radius(depth, camera.znear, camera.zfar, max_blur)
        );
    }

    fn update_cursor(&mut self, camera: &Camera) {
        let pointer = *self.pointer.borrow();
        let ndc = uv_to_ndc(pointer.uv);
        let position = camera.point_along_ndc(ndc, CURSOR_DISTANCE);
        self.scene.set_position(self.cursor, position);
        if let Some(node) = self.scene.node_mut(self.cursor) {
            node.visible = pointer.inside;
        }
    }

    fn update_caption(&mut self, position: f64) {
        let index = self
            .cues
            .active(position)
            .and_then(|active| self.cues.cues().iter().position(|c| c == active));
        if index != self.caption_index {
            self.caption_index = index;
            let text = index.and_then(|i| self.cues.cues().get(i)).map(|c| c.text.as_str());
            overlay::set_caption(&self.document, text);
        }
        if let Some(progress) = self.cues.progress(position) {
            overlay::set_caption_offset(&self.document, -progress * CAPTION_SCROLL_PX);
        }
    }

    /// Release the field and every GPU resource.
    pub fn dispose(&mut self) {
        self.field.dispose(&mut self.scene);
        self.scene.remove(self.cursor);
        self.pipeline.dispose();
    }
}

pub async fn init_pipeline(
    canvas: &web::HtmlCanvasElement,
    config: &SceneConfig,
) -> anyhow::Result<render::Pipeline<'static>> {
    // leak a canvas clone to satisfy 'static lifetime for surface
    let leaked_canvas = Box::leak(Box::new(canvas.clone()));
    render::Pipeline::new(
        leaked_canvas,
        config,
        render::SceneLook {
            clear_color: CLEAR_COLOR,
            fog_start: FOG_START,
            fog_end: FOG_END,
            ground_half_extent: GROUND_HALF_EXTENT,
            ground_color: GROUND_COLOR,
        },
    )
    .await
}

/// requestAnimationFrame loop that can be stopped and restarted.
///
/// Stopping cancels the pending frame; starting again resets the frame clock
/// so the pause does not turn into one large step. A frame error stops the
/// loop for good and is shown in the overlay.
pub struct FrameLoop {
    ctx: Rc<RefCell<FrameContext<'static>>>,
    tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
    handle: Rc<Cell<Option<i32>>>,
    failed: Rc<Cell<bool>>,
}

impl FrameLoop {
    pub fn new(ctx: Rc<RefCell<FrameContext<'static>>>) -> Rc<Self> {
        let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
        let handle = Rc::new(Cell::new(None));
        let failed = Rc::new(Cell::new(false));

        let tick_clone = tick.clone();
        let ctx_tick = ctx.clone();
        let handle_tick = handle.clone();
        let failed_tick = failed.clone();
        *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            handle_tick.set(None);
            let result = ctx_tick.borrow_mut().frame();
            if let Err(e) = result {
                log::error!("frame error: {:?}", e);
                failed_tick.set(true);
                overlay::show_error(&ctx_tick.borrow().document, &e.to_string());
                return;
            }
            if let Some(cb) = tick_clone.borrow().as_ref() {
                handle_tick.set(request_frame(cb));
            }
        }) as Box<dyn FnMut()>));

        Rc::new(Self {
            ctx,
            tick,
            handle,
            failed,
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.get().is_some()
    }

    pub fn start(&self) {
        if self.is_running() || self.failed.get() {
            return;
        }
        self.ctx.borrow_mut().clock.reset();
        if let Some(cb) = self.tick.borrow().as_ref() {
            self.handle.set(request_frame(cb));
        }
    }

    pub fn stop(&self) {
        if let Some(id) = self.handle.take() {
            if let Some(w) = web::window() {
                _ = w.cancel_animation_frame(id);
            }
        }
    }

    /// Stop for good and release the scene and GPU resources.
    pub fn shutdown(&self) {
        self.stop();
        self.failed.set(true);
        self.ctx.borrow_mut().dispose();
    }
}

fn request_frame(cb: &Closure<dyn FnMut()>) -> Option<i32> {
    web::window().and_then(|w| w.request_animation_frame(cb.as_ref().unchecked_ref()).ok())
}
