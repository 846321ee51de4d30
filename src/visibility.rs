use showroom_core::ViewportConfig;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys as web;

/// IntersectionObserver on one container. Disconnects when dropped.
pub struct VisibilityWatch {
    observer: web::IntersectionObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, web::IntersectionObserver)>,
}

impl VisibilityWatch {
    pub fn observe(
        target: &web::Element,
        config: &ViewportConfig,
        mut on_change: impl FnMut(bool) + 'static,
    ) -> anyhow::Result<Self> {
        let threshold = config.visibility_threshold;
        let callback = Closure::wrap(Box::new(
            move |entries: js_sys::Array, _observer: web::IntersectionObserver| {
                // Only the latest entry matters when several queue up.
                let Some(entry) = entries
                    .iter()
                    .filter_map(|e| e.dyn_into::<web::IntersectionObserverEntry>().ok())
                    .last()
                else {
                    return;
                };
                let visible =
                    entry.is_intersecting() && entry.intersection_ratio() >= threshold;
                on_change(visible);
            },
        )
            as Box<dyn FnMut(js_sys::Array, web::IntersectionObserver)>);

        let init = web::IntersectionObserverInit::new();
        init.set_threshold(&JsValue::from_f64(threshold));
        init.set_root_margin(&config.root_margin());
        let observer =
            web::IntersectionObserver::new_with_options(callback.as_ref().unchecked_ref(), &init)
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        observer.observe(target);
        log::debug!(
            "[visibility] observing {} (threshold {}, margin {})",
            config.label,
            threshold,
            config.root_margin()
        );
        Ok(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for VisibilityWatch {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}
