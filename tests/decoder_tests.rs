// Host-side tests for the shared decoder registry.

use showroom_core::*;
use std::sync::Arc;

fn model(draco: bool, basisu: bool) -> ModelInfo {
    ModelInfo {
        path: "/models/villa-high.glb".into(),
        byte_len: 1024,
        proxies: BlockList::new(),
        needs_geometry_decoder: draco,
        needs_texture_transcoder: basisu,
    }
}

#[test]
fn shared_registry_is_one_instance() {
    let a = DecoderRegistry::shared();
    let b = DecoderRegistry::shared_with(DecoderConfig {
        worker_limit: 1,
        ..Default::default()
    });
    assert!(Arc::ptr_eq(&a, &b));
    // The first caller's config wins.
    assert_eq!(b.config().worker_limit, DEFAULT_DECODER_WORKER_LIMIT);
}

#[test]
fn decoders_are_built_once_and_shared() {
    let reg = DecoderRegistry::new(DecoderConfig::default());
    assert_eq!(reg.construction_count(), 0);

    let first = reg.geometry_decoder();
    let second = reg.geometry_decoder();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(reg.construction_count(), 1);

    let t1 = reg.texture_transcoder();
    let t2 = reg.texture_transcoder();
    assert!(Arc::ptr_eq(&t1, &t2));
    assert_eq!(reg.construction_count(), 2);
}

#[test]
fn only_needed_decoders_are_initialized() {
    let reg = DecoderRegistry::new(DecoderConfig::default());
    let plain = reg.decoders_for(&model(false, false));
    assert!(plain.geometry.is_none());
    assert!(plain.texture.is_none());
    assert_eq!(reg.construction_count(), 0);

    let draco = reg.decoders_for(&model(true, false));
    assert!(draco.geometry.is_some());
    assert!(reg.is_initialized(DecoderKind::Geometry));
    assert!(!reg.is_initialized(DecoderKind::Texture));

    // Two scenes loading compressed models share the same handles.
    let a = reg.decoders_for(&model(true, true));
    let b = reg.decoders_for(&model(true, true));
    assert!(Arc::ptr_eq(
        a.geometry.as_ref().unwrap(),
        b.geometry.as_ref().unwrap()
    ));
    assert!(Arc::ptr_eq(
        a.texture.as_ref().unwrap(),
        b.texture.as_ref().unwrap()
    ));
    assert_eq!(reg.construction_count(), 2);
}

#[test]
fn decoder_config_overrides_from_json() {
    let config: DecoderConfig =
        serde_json::from_str(r#"{"geometryDecoderPath": "/cdn/draco/", "workerLimit": 2}"#)
            .unwrap();
    assert_eq!(config.texture_transcoder_path, DEFAULT_TEXTURE_TRANSCODER_PATH);
    let reg = DecoderRegistry::new(config);
    let geometry = reg.geometry_decoder();
    assert_eq!(geometry.module_url(), "/cdn/draco/draco_decoder.wasm");
    assert_eq!(geometry.worker_limit, 2);
}
