use crate::asset::ModelInfo;
use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecoderKind {
    Geometry,
    Texture,
}

impl DecoderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DecoderKind::Geometry => "geometry",
            DecoderKind::Texture => "texture",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DecoderConfig {
    pub geometry_decoder_path: String,
    pub texture_transcoder_path: String,
    pub worker_limit: u32,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            geometry_decoder_path: DEFAULT_GEOMETRY_DECODER_PATH.to_string(),
            texture_transcoder_path: DEFAULT_TEXTURE_TRANSCODER_PATH.to_string(),
            worker_limit: DEFAULT_DECODER_WORKER_LIMIT,
        }
    }
}

fn join(dir: &str, file: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{file}")
    } else {
        format!("{dir}/{file}")
    }
}

/// Compressed-mesh decoder handle (worker pool + wasm module location).
#[derive(Debug, PartialEq)]
pub struct GeometryDecoder {
    pub decoder_path: String,
    pub worker_limit: u32,
}

impl GeometryDecoder {
    pub fn module_url(&self) -> String {
        join(&self.decoder_path, "draco_decoder.wasm")
    }
}

/// Supercompressed-texture transcoder handle.
#[derive(Debug, PartialEq)]
pub struct TextureTranscoder {
    pub transcoder_path: String,
    pub worker_limit: u32,
}

impl TextureTranscoder {
    pub fn module_url(&self) -> String {
        join(&self.transcoder_path, "basis_transcoder.wasm")
    }
}

#[derive(Clone, Debug, Default)]
pub struct AttachedDecoders {
    pub geometry: Option<Arc<GeometryDecoder>>,
    pub texture: Option<Arc<TextureTranscoder>>,
}

pub struct DecoderRegistry {
    config: DecoderConfig,
    geometry: OnceLock<Arc<GeometryDecoder>>,
    texture: OnceLock<Arc<TextureTranscoder>>,
    constructions: AtomicUsize,
}

static SHARED: OnceLock<Arc<DecoderRegistry>> = OnceLock::new();

impl DecoderRegistry {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            geometry: OnceLock::new(),
            texture: OnceLock::new(),
            constructions: AtomicUsize::new(0),
        }
    }

    pub fn shared() -> Arc<Self> {
        Self::shared_with(DecoderConfig::default())
    }

    /// The process-wide registry. The first caller's config wins; later
    /// configs are ignored.
    pub fn shared_with(config: DecoderConfig) -> Arc<Self> {
        SHARED
            .get_or_init(|| {
                log::debug!("[decoders] registry created");
                Arc::new(Self::new(config))
            })
            .clone()
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn geometry_decoder(&self) -> Arc<GeometryDecoder> {
        self.geometry
            .get_or_init(|| {
                self.constructions.fetch_add(1, Ordering::Relaxed);
                log::info!(
                    "[decoders] geometry decoder initialized from {}",
                    self.config.geometry_decoder_path
                );
                Arc::new(GeometryDecoder {
                    decoder_path: self.config.geometry_decoder_path.clone(),
                    worker_limit: self.config.worker_limit,
                })
            })
            .clone()
    }

    pub fn texture_transcoder(&self) -> Arc<TextureTranscoder> {
        self.texture
            .get_or_init(|| {
                self.constructions.fetch_add(1, Ordering::Relaxed);
                log::info!(
                    "[decoders] texture transcoder initialized from {}",
                    self.config.texture_transcoder_path
                );
                Arc::new(TextureTranscoder {
                    transcoder_path: self.config.texture_transcoder_path.clone(),
                    worker_limit: self.config.worker_limit,
                })
            })
            .clone()
    }

    pub fn is_initialized(&self, kind: DecoderKind) -> bool {
        match kind {
            DecoderKind::Geometry => self.geometry.get().is_some(),
            DecoderKind::Texture => self.texture.get().is_some(),
        }
    }

    pub fn construction_count(&self) -> usize {
        self.constructions.load(Ordering::Relaxed)
    }

    /// Only the decoders a model actually needs are built.
    pub fn decoders_for(&self, model: &ModelInfo) -> AttachedDecoders {
        AttachedDecoders {
            geometry: model
                .needs_geometry_decoder
                .then(|| self.geometry_decoder()),
            texture: model
                .needs_texture_transcoder
                .then(|| self.texture_transcoder()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_urls_tolerate_missing_trailing_slash() {
        let reg = DecoderRegistry::new(DecoderConfig {
            geometry_decoder_path: "/static/draco".into(),
            ..Default::default()
        });
        assert_eq!(
            reg.geometry_decoder().module_url(),
            "/static/draco/draco_decoder.wasm"
        );
        assert_eq!(
            reg.texture_transcoder().module_url(),
            "/basis/basis_transcoder.wasm"
        );
    }
}
