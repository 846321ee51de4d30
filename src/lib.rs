#![cfg(target_arch = "wasm32")]
use showroom_core::{
    detect, DecoderConfig, DecoderRegistry, Lod, QualityMode, QualityTuning, RenderSession,
    SceneConfig, ViewportConfig, ViewportId,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys as web;

mod constants;
mod dom;
mod frame;
mod loader;
mod probe;
mod render;
mod stage;
mod visibility;

use dom::ListenerHandle;
use stage::SharedStage;

// One render session per page.
static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("showroom-web starting");
    Ok(())
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Session handle exported to the host page.
///
/// Options JSON (all optional): `{"tuning": {...}, "decoders": {...}}`.
#[wasm_bindgen]
pub struct Showroom {
    stage: SharedStage,
    _listeners: Vec<ListenerHandle>,
}

#[derive(serde::Deserialize, Default)]
#[serde(default)]
struct Options {
    tuning: QualityTuning,
    decoders: DecoderConfig,
}

#[wasm_bindgen]
impl Showroom {
    #[wasm_bindgen(constructor)]
    pub fn new(options_json: Option<String>) -> Result<Showroom, JsValue> {
        let options: Options = match options_json.as_deref() {
            Some(json) if !json.trim().is_empty() => serde_json::from_str(json).map_err(js_err)?,
            _ => Options::default(),
        };
        options.tuning.validate().map_err(js_err)?;
        if SESSION_ACTIVE.swap(true, Ordering::SeqCst) {
            return Err(js_err("a Showroom session already exists on this page"));
        }

        let caps = detect(&probe::BrowserProbe::new());
        let session = RenderSession::new(caps);
        let decoders = DecoderRegistry::shared_with(options.decoders);
        let stage: SharedStage = Rc::new(RefCell::new(stage::Stage::new(
            session,
            options.tuning,
            decoders,
        )));

        let mut listeners = Vec::new();
        let weak = Rc::downgrade(&stage);
        match probe::watch_reduced_motion(move |reduced| {
            if let Some(stage) = weak.upgrade() {
                let caps = stage
                    .borrow()
                    .session()
                    .capabilities()
                    .with_reduced_motion(reduced);
                log::info!("[caps] reduced motion now {}", reduced);
                stage::update_capabilities(&stage, caps);
            }
        }) {
            Ok(Some(handle)) => listeners.push(handle),
            Ok(None) => {}
            Err(e) => log::warn!("[caps] reduced-motion watch unavailable: {:?}", e),
        }

        if let Some(window) = web::window() {
            let weak = Rc::downgrade(&stage);
            let handle = ListenerHandle::attach(&window, "keydown", move |ev: web::Event| {
                let escape = ev
                    .dyn_ref::<web::KeyboardEvent>()
                    .map(|k| k.key() == "Escape")
                    .unwrap_or(false);
                if let (true, Some(stage)) = (escape, weak.upgrade()) {
                    stage::clear_all_selections(&stage);
                }
            })
            .map_err(js_err)?;
            listeners.push(handle);
        }

        Ok(Showroom {
            stage,
            _listeners: listeners,
        })
    }

    /// Mount a viewport into the element with id `container_id`. `variant` is
    /// `"property"` or `"office"`. Returns the viewport id.
    pub fn mount(&self, container_id: &str, scene_json: &str, variant: &str) -> Result<u32, JsValue> {
        let scene = SceneConfig::from_json(scene_json).map_err(js_err)?;
        let config = ViewportConfig::variant(variant)
            .ok_or_else(|| js_err(format!("unknown viewport variant {:?}", variant)))?;
        let id = stage::mount(&self.stage, container_id, scene, config).map_err(js_err)?;
        Ok(id.0)
    }

    pub fn unmount(&self, viewport: u32) -> bool {
        stage::unmount(&self.stage, ViewportId(viewport))
    }

    #[wasm_bindgen(js_name = switchScene)]
    pub fn switch_scene(&self, viewport: u32, scene_json: &str) -> Result<bool, JsValue> {
        let scene = SceneConfig::from_json(scene_json).map_err(js_err)?;
        Ok(self
            .stage
            .borrow_mut()
            .switch_scene(ViewportId(viewport), scene))
    }

    /// `"standard"` or `"high"`. Returns false when the toggle has no effect.
    #[wasm_bindgen(js_name = setQuality)]
    pub fn set_quality(&self, mode: &str) -> Result<bool, JsValue> {
        let quality =
            QualityMode::parse(mode).ok_or_else(|| js_err(format!("unknown quality {:?}", mode)))?;
        Ok(stage::set_quality(&self.stage, quality))
    }

    pub fn quality(&self) -> String {
        self.stage.borrow().session().quality().as_str().to_string()
    }

    #[wasm_bindgen(js_name = renderMode)]
    pub fn render_mode(&self) -> String {
        self.stage.borrow().session().mode().as_str().to_string()
    }

    #[wasm_bindgen(js_name = shouldRender3d)]
    pub fn should_render_3d(&self) -> bool {
        self.stage.borrow().session().should_render_3d()
    }

    /// Capability record as JSON.
    pub fn capabilities(&self) -> Result<String, JsValue> {
        serde_json::to_string(self.stage.borrow().session().capabilities()).map_err(js_err)
    }

    /// Pin a viewport to `"high"`, `"mid"` or `"low"`; `null` resumes
    /// adaptation.
    #[wasm_bindgen(js_name = setForcedLod)]
    pub fn set_forced_lod(&self, viewport: u32, lod: Option<String>) -> Result<bool, JsValue> {
        let forced = match lod.as_deref() {
            Some(s) => Some(Lod::parse(s).ok_or_else(|| js_err(format!("unknown lod {:?}", s)))?),
            None => None,
        };
        Ok(self
            .stage
            .borrow_mut()
            .set_forced_lod(ViewportId(viewport), forced))
    }

    /// Current LOD, or `undefined` while no surface is mounted.
    #[wasm_bindgen(js_name = currentLod)]
    pub fn current_lod(&self, viewport: u32) -> Option<String> {
        self.stage
            .borrow()
            .current_lod(ViewportId(viewport))
            .map(|l| l.as_str().to_string())
    }

    #[wasm_bindgen(js_name = activeHotspot)]
    pub fn active_hotspot(&self, viewport: u32) -> Option<String> {
        self.stage.borrow().active_hotspot(ViewportId(viewport))
    }

    #[wasm_bindgen(js_name = activeCtaHref)]
    pub fn active_cta_href(&self, viewport: u32) -> Option<String> {
        self.stage.borrow().active_cta_href(ViewportId(viewport))
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&self) {
        stage::clear_all_selections(&self.stage);
    }

    /// `callback(hotspotId | null)` on every selection change.
    #[wasm_bindgen(js_name = onHotspotSelect)]
    pub fn on_hotspot_select(&self, viewport: u32, callback: Option<js_sys::Function>) {
        self.stage
            .borrow_mut()
            .on_hotspot_select(ViewportId(viewport), callback);
    }

    /// `callback(from, to, averageFps)` on every automatic LOD transition.
    #[wasm_bindgen(js_name = onLodChange)]
    pub fn on_lod_change(&self, viewport: u32, callback: Option<js_sys::Function>) {
        self.stage
            .borrow_mut()
            .on_lod_change(ViewportId(viewport), callback);
    }

    /// `callback(hotspotId, href)` when the active hotspot's link is followed.
    #[wasm_bindgen(js_name = onCtaActivate)]
    pub fn on_cta_activate(&self, viewport: u32, callback: Option<js_sys::Function>) {
        self.stage
            .borrow_mut()
            .on_cta_activate(ViewportId(viewport), callback);
    }

    #[wasm_bindgen(js_name = viewportCount)]
    pub fn viewport_count(&self) -> usize {
        self.stage.borrow().viewport_count()
    }
}

impl Drop for Showroom {
    fn drop(&mut self) {
        let ids = self.stage.borrow().viewport_ids();
        for id in ids {
            stage::unmount(&self.stage, id);
        }
        SESSION_ACTIVE.store(false, Ordering::SeqCst);
    }
}
