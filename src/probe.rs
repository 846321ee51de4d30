use crate::constants::REDUCED_MOTION_QUERY;
use crate::dom::ListenerHandle;
use showroom_core::CapabilityProbe;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

/// Reads device signals from the browser. Every getter tolerates the API
/// being absent and reports `None` instead.
pub struct BrowserProbe {
    window: Option<web::Window>,
}

impl BrowserProbe {
    pub fn new() -> Self {
        Self {
            window: web::window(),
        }
    }

    fn navigator(&self) -> Option<web::Navigator> {
        self.window.as_ref().map(|w| w.navigator())
    }

    fn has_webgpu(&self) -> Option<bool> {
        let nav = self.navigator()?;
        let gpu = js_sys::Reflect::get(&nav, &JsValue::from_str("gpu")).ok()?;
        Some(!gpu.is_undefined() && !gpu.is_null())
    }

    fn has_webgl2(&self) -> Option<bool> {
        let document = self.window.as_ref()?.document()?;
        let canvas: web::HtmlCanvasElement =
            document.create_element("canvas").ok()?.dyn_into().ok()?;
        Some(matches!(canvas.get_context("webgl2"), Ok(Some(_))))
    }
}

impl CapabilityProbe for BrowserProbe {
    fn device_memory_gib(&self) -> Option<f64> {
        let nav = self.navigator()?;
        js_sys::Reflect::get(&nav, &JsValue::from_str("deviceMemory"))
            .ok()?
            .as_f64()
    }

    fn logical_cores(&self) -> Option<u32> {
        let n = self.navigator()?.hardware_concurrency();
        (n.is_finite() && n >= 1.0).then_some(n as u32)
    }

    fn supports_modern_graphics_api(&self) -> Option<bool> {
        match self.has_webgpu() {
            Some(true) => Some(true),
            _ => self.has_webgl2(),
        }
    }

    fn prefers_reduced_motion(&self) -> Option<bool> {
        let mql = self
            .window
            .as_ref()?
            .match_media(REDUCED_MOTION_QUERY)
            .ok()??;
        Some(mql.matches())
    }

    fn user_agent(&self) -> Option<String> {
        self.navigator()?.user_agent().ok()
    }

    fn viewport_width(&self) -> Option<f64> {
        self.window.as_ref()?.inner_width().ok()?.as_f64()
    }
}

/// Calls `on_change` whenever the reduced-motion preference flips.
pub fn watch_reduced_motion(
    mut on_change: impl FnMut(bool) + 'static,
) -> anyhow::Result<Option<ListenerHandle>> {
    let window = web::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let Some(mql) = window
        .match_media(REDUCED_MOTION_QUERY)
        .map_err(|e| anyhow::anyhow!("{:?}", e))?
    else {
        return Ok(None);
    };
    let handle = ListenerHandle::attach(&mql, "change", move |ev: web::Event| {
        if let Some(ev) = ev.dyn_ref::<web::MediaQueryListEvent>() {
            on_change(ev.matches());
        }
    })?;
    Ok(Some(handle))
}
