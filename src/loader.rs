use showroom_core::{inspect_glb, AssetError, DecoderRegistry, ModelInfo};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

async fn fetch_bytes(path: &str) -> Result<Vec<u8>, AssetError> {
    let window = web::window().ok_or_else(|| AssetError::Network("no window".into()))?;
    let resp_value = JsFuture::from(window.fetch_with_str(path))
        .await
        .map_err(|e| AssetError::Network(format!("{:?}", e)))?;
    let resp: web::Response = resp_value
        .dyn_into()
        .map_err(|e| AssetError::Network(format!("{:?}", e)))?;
    if !resp.ok() {
        return Err(AssetError::Http(resp.status()));
    }
    let buffer = resp
        .array_buffer()
        .map_err(|e| AssetError::Network(format!("{:?}", e)))?;
    let buffer = JsFuture::from(buffer)
        .await
        .map_err(|e| AssetError::Network(format!("{:?}", e)))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

/// Fetch and inspect one LOD asset, attaching the shared decoders it needs.
pub async fn load_model(path: &str, decoders: &DecoderRegistry) -> Result<ModelInfo, AssetError> {
    let bytes = fetch_bytes(path).await?;
    let model = inspect_glb(path, &bytes)?;
    let attached = decoders.decoders_for(&model);
    if let Some(g) = &attached.geometry {
        log::debug!("[asset] {} uses geometry decoder {}", path, g.module_url());
    }
    if let Some(t) = &attached.texture {
        log::debug!("[asset] {} uses texture transcoder {}", path, t.module_url());
    }
    log::info!(
        "[asset] loaded {} ({} bytes, {} parts)",
        path,
        model.byte_len,
        model.proxies.len()
    );
    Ok(model)
}
