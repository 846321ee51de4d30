use crate::constants::*;
use showroom_core::{Hotspot, Presentation, SceneConfig};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

#[inline]
pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

#[inline]
pub fn device_pixel_ratio() -> f64 {
    web::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0)
}

/// Match the canvas backing store to the CSS size of `sizing` times
/// `pixel_ratio`. Returns true when the size changed.
pub fn sync_canvas_backing_size(
    canvas: &web::HtmlCanvasElement,
    sizing: &web::Element,
    pixel_ratio: f64,
) -> bool {
    let rect = sizing.get_bounding_client_rect();
    let w_px = ((rect.width() * pixel_ratio) as u32).max(1);
    let h_px = ((rect.height() * pixel_ratio) as u32).max(1);
    if canvas.width() == w_px && canvas.height() == h_px {
        return false;
    }
    canvas.set_width(w_px);
    canvas.set_height(h_px);
    true
}

#[inline]
pub fn show(el: &web::Element) {
    _ = el.class_list().remove_1(CLASS_HIDDEN);
    _ = el.set_attribute("style", "");
}

#[inline]
pub fn hide(el: &web::Element) {
    _ = el.class_list().add_1(CLASS_HIDDEN);
    // fallback for pages without the stylesheet
    _ = el.set_attribute("style", "display:none");
}

/// An event listener removed again when dropped.
pub struct ListenerHandle {
    target: web::EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web::Event)>,
}

impl ListenerHandle {
    pub fn attach(
        target: &web::EventTarget,
        kind: &'static str,
        handler: impl FnMut(web::Event) + 'static,
    ) -> anyhow::Result<Self> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(web::Event)>);
        target
            .add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
        })
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

/// Elements one viewport owns inside its host container.
pub struct SlotDom {
    pub container: web::HtmlElement,
    pub poster: web::HtmlImageElement,
    pub placeholder: web::Element,
    pub card: web::Element,
    pub canvas: Option<web::HtmlCanvasElement>,
}

fn create(document: &web::Document, tag: &str, class: &str) -> anyhow::Result<web::Element> {
    let el = document
        .create_element(tag)
        .map_err(|e| anyhow::anyhow!("{:?}", e))?;
    el.set_class_name(class);
    Ok(el)
}

impl SlotDom {
    pub fn build(container_id: &str, scene: &SceneConfig) -> anyhow::Result<Self> {
        let document = window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
        let container: web::HtmlElement = document
            .get_element_by_id(container_id)
            .ok_or_else(|| anyhow::anyhow!("missing #{}", container_id))?
            .dyn_into()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;

        let poster: web::HtmlImageElement = create(&document, "img", CLASS_POSTER)?
            .dyn_into()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        let placeholder = create(&document, "div", CLASS_PLACEHOLDER)?;
        placeholder.set_text_content(Some(PLACEHOLDER_TEXT));
        let card = create(&document, "div", CLASS_HOTSPOT_CARD)?;

        let poster_el: &web::Element = poster.as_ref();
        for el in [poster_el, &placeholder, &card] {
            hide(el);
            container
                .append_child(el)
                .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        }
        let dom = Self {
            container,
            poster,
            placeholder,
            card,
            canvas: None,
        };
        dom.set_poster(scene);
        Ok(dom)
    }

    pub fn set_poster(&self, scene: &SceneConfig) {
        self.poster.set_src(&scene.poster);
        self.poster.set_alt(&scene.label);
    }

    /// Fresh canvas for a new surface. Any previous one is removed first.
    pub fn create_canvas(&mut self) -> anyhow::Result<web::HtmlCanvasElement> {
        self.remove_canvas();
        let document = window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
        let canvas: web::HtmlCanvasElement = create(&document, "canvas", CLASS_CANVAS)?
            .dyn_into()
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        hide(&canvas);
        self.container
            .append_child(&canvas)
            .map_err(|e| anyhow::anyhow!("{:?}", e))?;
        self.canvas = Some(canvas.clone());
        Ok(canvas)
    }

    /// The canvas fills its container, which stays laid out even while the
    /// canvas itself is hidden.
    pub fn fit_canvas(&self, pixel_ratio: f64) -> bool {
        match &self.canvas {
            Some(canvas) => sync_canvas_backing_size(canvas, &self.container, pixel_ratio),
            None => false,
        }
    }

    pub fn remove_canvas(&mut self) {
        if let Some(canvas) = self.canvas.take() {
            canvas.remove();
        }
    }

    /// Exactly one of poster, placeholder and canvas is visible.
    pub fn present(&self, presentation: Presentation) {
        let poster: &web::Element = self.poster.as_ref();
        match presentation {
            Presentation::Poster => {
                show(poster);
                hide(&self.placeholder);
            }
            Presentation::Placeholder => {
                hide(poster);
                show(&self.placeholder);
            }
            Presentation::Surface => {
                hide(poster);
                hide(&self.placeholder);
            }
        }
        if let Some(canvas) = &self.canvas {
            if presentation == Presentation::Surface {
                show(canvas);
            } else {
                hide(canvas);
            }
        }
    }

    /// Info card for the active hotspot; the CTA is a plain link.
    pub fn show_hotspot(&self, hotspot: Option<&Hotspot>) {
        self.card.set_inner_html("");
        let Some(h) = hotspot else {
            hide(&self.card);
            return;
        };
        let Some(document) = window_document() else {
            return;
        };
        if let Ok(title) = document.create_element("h3") {
            title.set_text_content(Some(&h.label));
            _ = self.card.append_child(&title);
        }
        if !h.description.is_empty() {
            if let Ok(body) = document.create_element("p") {
                body.set_text_content(Some(&h.description));
                _ = self.card.append_child(&body);
            }
        }
        if let Some(cta) = &h.cta {
            if let Ok(link) = document.create_element("a") {
                _ = link.set_attribute("href", &cta.href);
                link.set_class_name(CLASS_CTA);
                link.set_text_content(Some(&cta.label));
                _ = self.card.append_child(&link);
            }
        }
        show(&self.card);
    }

    pub fn remove(&mut self) {
        self.remove_canvas();
        self.poster.remove();
        self.placeholder.remove();
        self.card.remove();
    }
}
