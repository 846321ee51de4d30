//! Per-page state shared by the exported API, DOM callbacks and frame loops.
//!
//! All callbacks hold a `Weak` to the stage and borrow it only for the
//! duration of one event. JS callbacks are invoked after the borrow ends so
//! host code may call back into the API.

use crate::constants::*;
use crate::dom::{self, ListenerHandle, SlotDom};
use crate::frame::FrameLoop;
use crate::loader;
use crate::render::{BoxInstance, DrawList, GpuState};
use crate::visibility::VisibilityWatch;
use fnv::FnvHashMap;
use instant::Instant;
use showroom_core::{
    placeholder_for, pick_hotspot, Camera, CtaActivation, DecoderRegistry, FrameOutcome, HotspotEvent,
    LifecycleAction, LoadRequest, Lod, LodTransition, PerformanceCapabilities, QualityMode,
    QualityTuning, RenderSession, RenderSettings, SceneConfig, SceneContent, SceneVisual,
    SurfaceError, ViewportArena, ViewportConfig, ViewportId, HOTSPOT_MARKER_SIZE,
    HOTSPOT_PICK_RADIUS,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

pub type SharedStage = Rc<RefCell<Stage>>;
type WeakStage = Weak<RefCell<Stage>>;

struct Slot {
    dom: SlotDom,
    scene: SceneContent,
    frame_loop: Option<FrameLoop>,
    _visibility: Option<VisibilityWatch>,
    _click: Option<ListenerHandle>,
    on_select: Option<js_sys::Function>,
    on_lod: Option<js_sys::Function>,
    on_cta: Option<js_sys::Function>,
    last_frame_ms: Option<f64>,
    orbit: f32,
}

impl Slot {
    fn stop_loop(&mut self) {
        self.frame_loop = None;
        self.last_frame_ms = None;
    }

    fn camera(&self, config: &ViewportConfig, width: u32, height: u32) -> Camera {
        Camera::from_pose(
            &self.scene.config().camera,
            config.fov_y_degrees,
            width as f32,
            height as f32,
        )
        .orbited(self.orbit)
    }
}

pub struct Stage {
    session: RenderSession,
    tuning: QualityTuning,
    decoders: Arc<DecoderRegistry>,
    arena: ViewportArena<GpuState>,
    slots: FnvHashMap<ViewportId, Slot>,
}

/// Deferred calls into host JS.
enum Notice {
    Hotspot(js_sys::Function, HotspotEvent),
    Lod(js_sys::Function, LodTransition),
    Cta(js_sys::Function, CtaActivation),
}

impl Notice {
    fn deliver(self) {
        let result = match &self {
            Notice::Hotspot(f, HotspotEvent::Selected(id)) => {
                f.call1(&JsValue::NULL, &JsValue::from_str(id))
            }
            Notice::Hotspot(f, HotspotEvent::Cleared) => f.call1(&JsValue::NULL, &JsValue::NULL),
            Notice::Lod(f, t) => f.call3(
                &JsValue::NULL,
                &JsValue::from_str(t.from.as_str()),
                &JsValue::from_str(t.to.as_str()),
                &JsValue::from_f64(t.avg_fps),
            ),
            Notice::Cta(f, cta) => f.call2(
                &JsValue::NULL,
                &JsValue::from_str(&cta.hotspot_id),
                &JsValue::from_str(&cta.href),
            ),
        };
        if let Err(e) = result {
            log::warn!("[stage] host callback threw: {:?}", e);
        }
    }
}

impl Stage {
    pub fn new(session: RenderSession, tuning: QualityTuning, decoders: Arc<DecoderRegistry>) -> Self {
        Self {
            session,
            tuning,
            decoders,
            arena: ViewportArena::new(),
            slots: FnvHashMap::default(),
        }
    }

    pub fn session(&self) -> &RenderSession {
        &self.session
    }

    pub fn current_lod(&self, id: ViewportId) -> Option<Lod> {
        self.arena.get(id)?.lod_state().map(|s| s.current)
    }

    pub fn active_hotspot(&self, id: ViewportId) -> Option<String> {
        let slot = self.slots.get(&id)?;
        slot.scene.active_hotspot().map(|h| h.id.clone())
    }

    pub fn active_cta_href(&self, id: ViewportId) -> Option<String> {
        let slot = self.slots.get(&id)?;
        slot.scene.active_cta_href().map(str::to_string)
    }

    pub fn viewport_count(&self) -> usize {
        self.arena.len()
    }

    pub fn viewport_ids(&self) -> Vec<ViewportId> {
        self.arena.ids()
    }

    pub fn set_forced_lod(&mut self, id: ViewportId, forced: Option<Lod>) -> bool {
        match self.arena.get_mut(id) {
            Some(lc) => {
                lc.set_forced_lod(forced);
                true
            }
            None => false,
        }
    }

    pub fn on_hotspot_select(&mut self, id: ViewportId, callback: Option<js_sys::Function>) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.on_select = callback;
        }
    }

    pub fn on_lod_change(&mut self, id: ViewportId, callback: Option<js_sys::Function>) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.on_lod = callback;
        }
    }

    pub fn on_cta_activate(&mut self, id: ViewportId, callback: Option<js_sys::Function>) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.on_cta = callback;
        }
    }

    pub fn switch_scene(&mut self, id: ViewportId, scene: SceneConfig) -> bool {
        let Some(slot) = self.slots.get_mut(&id) else {
            return false;
        };
        slot.scene.switch_scene(scene);
        slot.dom.set_poster(slot.scene.config());
        slot.dom.show_hotspot(None);
        true
    }

    /// Carry out a lifecycle action on the DOM side and refresh what the
    /// slot shows.
    fn apply_action(&mut self, stage: &WeakStage, id: ViewportId, action: LifecycleAction) {
        let (Some(lc), Some(slot)) = (self.arena.get_mut(id), self.slots.get_mut(&id)) else {
            return;
        };
        match action {
            LifecycleAction::None => {}
            LifecycleAction::Construct { ticket, settings } => {
                slot.stop_loop();
                match slot.dom.create_canvas() {
                    Ok(canvas) => {
                        slot.dom.fit_canvas(settings.pixel_ratio(dom::device_pixel_ratio()));
                        spawn_local(construct(stage.clone(), id, ticket, canvas));
                    }
                    Err(e) => {
                        lc.finish_construction(
                            ticket,
                            Err(SurfaceError::ContextUnavailable(e.to_string())),
                            &self.session,
                        );
                    }
                }
            }
            LifecycleAction::Release | LifecycleAction::ShowPoster => {
                slot.stop_loop();
                slot.dom.remove_canvas();
            }
        }
        slot.dom.present(lc.presentation(&self.session));
    }

    fn resync_all(&mut self, stage: &WeakStage) {
        for (id, action) in self.arena.reconcile_all(&self.session) {
            self.apply_action(stage, id, action);
        }
    }
}

pub fn mount(
    stage: &SharedStage,
    container_id: &str,
    scene: SceneConfig,
    config: ViewportConfig,
) -> anyhow::Result<ViewportId> {
    let dom = SlotDom::build(container_id, &scene)?;
    let container: web::Element = dom.container.clone().into();
    let weak = Rc::downgrade(stage);

    let id = {
        let mut guard = stage.borrow_mut();
        let st = &mut *guard;
        let id = st.arena.insert_with_tuning(config.clone(), st.tuning.clone());
        let slot = Slot {
            dom,
            scene: SceneContent::new(scene),
            frame_loop: None,
            _visibility: None,
            _click: None,
            on_select: None,
            on_lod: None,
            on_cta: None,
            last_frame_ms: None,
            orbit: 0.0,
        };
        if let Some(lc) = st.arena.get(id) {
            slot.dom.present(lc.presentation(&st.session));
        }
        st.slots.insert(id, slot);
        id
    };

    let weak_click = weak.clone();
    let click = ListenerHandle::attach(&container, "click", move |ev: web::Event| {
        handle_click(&weak_click, id, &ev);
    })?;
    let weak_vis = weak.clone();
    let visibility = VisibilityWatch::observe(&container, &config, move |visible| {
        handle_visibility(&weak_vis, id, visible);
    })?;

    if let Some(slot) = stage.borrow_mut().slots.get_mut(&id) {
        slot._click = Some(click);
        slot._visibility = Some(visibility);
    }
    log::info!("[stage] mounted viewport {} ({})", id.0, config.label);
    Ok(id)
}

/// Drop a viewport and everything it owns. Listener closures are freed after
/// the current event so this is safe to call from a host callback.
pub fn unmount(stage: &SharedStage, id: ViewportId) -> bool {
    let (lifecycle, slot) = {
        let mut st = stage.borrow_mut();
        (st.arena.remove(id), st.slots.remove(&id))
    };
    drop(lifecycle);
    let Some(mut slot) = slot else {
        return false;
    };
    slot.stop_loop();
    slot.dom.remove();
    spawn_local(async move { drop(slot) });
    log::info!("[stage] unmounted viewport {}", id.0);
    true
}

pub fn set_quality(stage: &SharedStage, quality: QualityMode) -> bool {
    let mut guard = stage.borrow_mut();
    let accepted = guard.session.set_quality(quality);
    guard.resync_all(&Rc::downgrade(stage));
    accepted
}

pub fn update_capabilities(stage: &SharedStage, caps: PerformanceCapabilities) {
    let mut guard = stage.borrow_mut();
    guard.session.update_capabilities(caps);
    guard.resync_all(&Rc::downgrade(stage));
}

pub fn clear_all_selections(stage: &SharedStage) {
    let mut notices = Vec::new();
    {
        let mut guard = stage.borrow_mut();
        for slot in guard.slots.values_mut() {
            if let Some(event) = slot.scene.clear_selection() {
                slot.dom.show_hotspot(None);
                if let Some(f) = &slot.on_select {
                    notices.push(Notice::Hotspot(f.clone(), event));
                }
            }
        }
    }
    notices.into_iter().for_each(Notice::deliver);
}

fn handle_visibility(stage: &WeakStage, id: ViewportId, visible: bool) {
    let Some(shared) = stage.upgrade() else {
        return;
    };
    let mut guard = shared.borrow_mut();
    let st = &mut *guard;
    let Some(lc) = st.arena.get_mut(id) else {
        return;
    };
    if lc.is_visible() == visible {
        return;
    }
    let action = lc.on_visibility(visible, &st.session);
    st.apply_action(stage, id, action);
}

async fn construct(stage: WeakStage, id: ViewportId, ticket: u64, canvas: web::HtmlCanvasElement) {
    let started = Instant::now();
    let result = GpuState::new(&canvas).await;
    log::debug!(
        "[stage] viewport {} surface attempt took {} ms",
        id.0,
        started.elapsed().as_millis()
    );
    let Some(shared) = stage.upgrade() else {
        return;
    };
    let mut guard = shared.borrow_mut();
    let st = &mut *guard;
    let (Some(lc), Some(slot)) = (st.arena.get_mut(id), st.slots.get_mut(&id)) else {
        return;
    };
    let presentation = lc.finish_construction(ticket, result, &st.session);
    if lc.has_failed() {
        slot.stop_loop();
        slot.dom.remove_canvas();
    } else if lc.is_mounted() && slot.frame_loop.is_none() {
        let weak = stage.clone();
        slot.last_frame_ms = None;
        slot.frame_loop = Some(FrameLoop::start(move |now_ms| {
            weak.upgrade()
                .map(|s| frame_tick(&s, id, now_ms))
                .unwrap_or(false)
        }));
    }
    slot.dom.present(presentation);
}

async fn load(stage: WeakStage, id: ViewportId, request: LoadRequest, decoders: Arc<DecoderRegistry>) {
    let result = loader::load_model(&request.path, &decoders).await;
    let Some(shared) = stage.upgrade() else {
        return;
    };
    let mut st = shared.borrow_mut();
    if let Some(slot) = st.slots.get_mut(&id) {
        if !slot.scene.complete_load(&request, result) {
            log::debug!("[asset] dropped stale result for {}", request.path);
        }
    }
}

fn build_instances(scene: &SceneContent, show_hotspots: bool) -> Vec<BoxInstance> {
    let blocks = match scene.visual() {
        SceneVisual::Model(model) if !model.proxies.is_empty() => model.proxies.clone(),
        SceneVisual::Model(_) => placeholder_for(scene.config().category),
        SceneVisual::Placeholder(blocks) => blocks,
    };
    let mut out: Vec<BoxInstance> = blocks
        .iter()
        .map(|b| BoxInstance {
            center: b.center.to_array(),
            size: b.size.to_array(),
            color: [b.color[0], b.color[1], b.color[2], 1.0],
        })
        .collect();
    if show_hotspots {
        let active = scene.active_hotspot().map(|h| h.id.as_str());
        for h in scene.hotspots() {
            let c = if active == Some(h.id.as_str()) {
                MARKER_ACTIVE_COLOR
            } else {
                MARKER_COLOR
            };
            out.push(BoxInstance {
                center: h.position.to_array(),
                size: [HOTSPOT_MARKER_SIZE; 3],
                color: [c[0], c[1], c[2], 1.0],
            });
        }
    }
    out
}

fn frame_tick(stage: &SharedStage, id: ViewportId, now_ms: f64) -> bool {
    let mut notices = Vec::new();
    let keep = {
        let mut guard = stage.borrow_mut();
        let st = &mut *guard;
        let weak = Rc::downgrade(stage);
        let stale = st
            .arena
            .get(id)
            .map(|lc| lc.needs_reconcile(&st.session))
            .unwrap_or(false);
        if stale {
            let action = match st.arena.get_mut(id) {
                Some(lc) => lc.reconcile(&st.session),
                None => return false,
            };
            st.apply_action(&weak, id, action);
            return st.arena.get(id).map(|lc| lc.is_mounted()).unwrap_or(false);
        }
        let (Some(lc), Some(slot)) = (st.arena.get_mut(id), st.slots.get_mut(&id)) else {
            return false;
        };

        // The first frame after mounting has no delta to measure.
        let delta_sec = slot
            .last_frame_ms
            .map(|prev| ((now_ms - prev) / 1000.0).max(0.0));
        slot.last_frame_ms = Some(now_ms);
        let outcome = match delta_sec {
            Some(dt) => lc.on_frame(now_ms, dt, &st.session),
            None => lc
                .lod_state()
                .zip(RenderSettings::for_mode(st.session.mode(), st.session.capabilities()))
                .map(|(state, settings)| FrameOutcome {
                    lod: state.current,
                    settings,
                    transitioned: None,
                }),
        };
        let Some(outcome) = outcome else {
            return false;
        };

        if let (Some(t), Some(f)) = (outcome.transitioned, &slot.on_lod) {
            notices.push(Notice::Lod(f.clone(), t));
        }
        if let Some(request) = slot.scene.sync_lod(outcome.lod) {
            spawn_local(load(weak, id, request, st.decoders.clone()));
        }

        let config = lc.config().clone();
        if config.auto_rotate && !st.session.capabilities().prefers_reduced_motion {
            slot.orbit += AUTO_ROTATE_SPEED * delta_sec.unwrap_or(0.0) as f32;
        }
        slot.dom
            .fit_canvas(outcome.settings.pixel_ratio(dom::device_pixel_ratio()));
        let Some(canvas) = &slot.dom.canvas else {
            return false;
        };
        let (width, height) = (canvas.width(), canvas.height());
        let camera = slot.camera(&config, width, height);
        let instances = build_instances(&slot.scene, config.show_hotspots);
        let clear = slot.scene.config().environment.sky_color();

        match lc.surface_mut() {
            Some(gpu) => {
                gpu.resize_if_needed(width, height);
                let draw = DrawList {
                    view_proj: camera.view_projection(),
                    clear,
                    instances: &instances,
                    settings: outcome.settings,
                };
                if let Err(e) = gpu.render(&draw) {
                    log::error!("[frame] {} render error: {:?}", config.label, e);
                }
                true
            }
            None => false,
        }
    };
    notices.into_iter().for_each(Notice::deliver);
    keep
}

fn handle_click(stage: &WeakStage, id: ViewportId, ev: &web::Event) {
    if on_cta_link(ev) {
        handle_cta(stage, id);
        return;
    }
    let on_canvas = ev
        .target()
        .map(|t| t.is_instance_of::<web::HtmlCanvasElement>())
        .unwrap_or(false);
    let Some(mouse) = ev.dyn_ref::<web::MouseEvent>() else {
        return;
    };
    if !on_canvas {
        return;
    }
    let Some(shared) = stage.upgrade() else {
        return;
    };
    let notice = {
        let mut guard = shared.borrow_mut();
        let st = &mut *guard;
        let (Some(lc), Some(slot)) = (st.arena.get(id), st.slots.get_mut(&id)) else {
            return;
        };
        if !lc.config().show_hotspots || !lc.is_mounted() {
            return;
        }
        let Some(canvas) = &slot.dom.canvas else {
            return;
        };
        let rect = canvas.get_bounding_client_rect();
        let (width, height) = (canvas.width(), canvas.height());
        let sx = (mouse.client_x() as f64 - rect.left()) / rect.width().max(1.0) * width as f64;
        let sy = (mouse.client_y() as f64 - rect.top()) / rect.height().max(1.0) * height as f64;
        let camera = slot.camera(lc.config(), width, height);
        let (ro, rd) = camera.screen_ray(sx as f32, sy as f32, width as f32, height as f32);
        let picked = pick_hotspot(slot.scene.hotspots(), ro, rd, HOTSPOT_PICK_RADIUS)
            .map(|h| h.id.clone());
        let event = match picked {
            Some(hotspot_id) => slot.scene.select_hotspot(&hotspot_id),
            None => slot.scene.clear_selection(),
        };
        slot.dom.show_hotspot(slot.scene.active_hotspot());
        match (event, &slot.on_select) {
            (Some(event), Some(f)) => Some(Notice::Hotspot(f.clone(), event)),
            _ => None,
        }
    };
    if let Some(n) = notice {
        n.deliver();
    }
}

fn on_cta_link(ev: &web::Event) -> bool {
    ev.target()
        .and_then(|t| t.dyn_into::<web::Element>().ok())
        .and_then(|el| el.closest(&format!(".{CLASS_CTA}")).ok().flatten())
        .is_some()
}

/// Link clicks navigate as usual; the host only hears about them.
fn handle_cta(stage: &WeakStage, id: ViewportId) {
    let Some(shared) = stage.upgrade() else {
        return;
    };
    let notice = {
        let guard = shared.borrow();
        let Some(slot) = guard.slots.get(&id) else {
            return;
        };
        match (slot.scene.activate_cta(), &slot.on_cta) {
            (Some(cta), Some(f)) => {
                log::debug!("[stage] cta {} -> {}", cta.hotspot_id, cta.href);
                Some(Notice::Cta(f.clone(), cta))
            }
            _ => None,
        }
    };
    if let Some(n) = notice {
        n.deliver();
    }
}
