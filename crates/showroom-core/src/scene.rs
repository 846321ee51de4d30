use crate::asset::{AssetError, ModelInfo};
use crate::lod::Lod;
use fnv::FnvHashMap;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneCategory {
    Residential,
    Commercial,
    Office,
    Industrial,
    Hospitality,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentPreset {
    Apartment,
    #[default]
    City,
    Dawn,
    Forest,
    Lobby,
    Night,
    Park,
    Studio,
    Sunset,
    Warehouse,
}

impl EnvironmentPreset {
    /// Linear background color approximating the preset's sky.
    pub fn sky_color(self) -> [f32; 3] {
        match self {
            EnvironmentPreset::Apartment => [0.82, 0.76, 0.68],
            EnvironmentPreset::City => [0.62, 0.68, 0.76],
            EnvironmentPreset::Dawn => [0.86, 0.62, 0.52],
            EnvironmentPreset::Forest => [0.42, 0.52, 0.38],
            EnvironmentPreset::Lobby => [0.74, 0.70, 0.64],
            EnvironmentPreset::Night => [0.04, 0.05, 0.10],
            EnvironmentPreset::Park => [0.58, 0.72, 0.84],
            EnvironmentPreset::Studio => [0.90, 0.90, 0.90],
            EnvironmentPreset::Sunset => [0.92, 0.54, 0.36],
            EnvironmentPreset::Warehouse => [0.46, 0.44, 0.42],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodAssets {
    pub high: String,
    pub mid: String,
    pub low: String,
}

impl LodAssets {
    pub fn path(&self, lod: Lod) -> &str {
        match lod {
            Lod::High => &self.high,
            Lod::Mid => &self.mid,
            Lod::Low => &self.low,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CallToAction {
    pub label: String,
    /// Opaque navigation target, forwarded untouched.
    pub href: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub id: String,
    pub position: Vec3,
    pub label: String,
    #[serde(default)]
    pub description: String,
    pub cta: Option<CallToAction>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneConfig {
    pub id: String,
    pub label: String,
    pub category: SceneCategory,
    pub assets: LodAssets,
    pub poster: String,
    pub camera: CameraPose,
    #[serde(default)]
    pub environment: EnvironmentPreset,
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
}

#[derive(Debug, Error, PartialEq)]
pub enum SceneConfigError {
    #[error("invalid scene json: {0}")]
    Json(String),
    #[error("scene id must not be empty")]
    EmptyId,
    #[error("scene {scene}: {lod} asset path is empty")]
    EmptyAssetPath { scene: String, lod: &'static str },
    #[error("scene {scene}: poster path is empty")]
    EmptyPoster { scene: String },
    #[error("scene {scene}: duplicate hotspot id {hotspot}")]
    DuplicateHotspot { scene: String, hotspot: String },
    #[error("scene {scene}: non-finite coordinate in {field}")]
    NonFinite { scene: String, field: String },
}

impl SceneConfig {
    pub fn from_json(json: &str) -> Result<Self, SceneConfigError> {
        let config: SceneConfig =
            serde_json::from_str(json).map_err(|e| SceneConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SceneConfigError> {
        if self.id.trim().is_empty() {
            return Err(SceneConfigError::EmptyId);
        }
        for lod in Lod::ALL {
            if self.assets.path(lod).trim().is_empty() {
                return Err(SceneConfigError::EmptyAssetPath {
                    scene: self.id.clone(),
                    lod: lod.as_str(),
                });
            }
        }
        if self.poster.trim().is_empty() {
            return Err(SceneConfigError::EmptyPoster {
                scene: self.id.clone(),
            });
        }
        let non_finite = |field: String| SceneConfigError::NonFinite {
            scene: self.id.clone(),
            field,
        };
        if !self.camera.position.is_finite() {
            return Err(non_finite("camera.position".into()));
        }
        if !self.camera.target.is_finite() {
            return Err(non_finite("camera.target".into()));
        }
        let mut seen: SmallVec<[&str; 8]> = SmallVec::new();
        for h in &self.hotspots {
            if seen.contains(&h.id.as_str()) {
                return Err(SceneConfigError::DuplicateHotspot {
                    scene: self.id.clone(),
                    hotspot: h.id.clone(),
                });
            }
            if !h.position.is_finite() {
                return Err(non_finite(format!("hotspot {}", h.id)));
            }
            seen.push(h.id.as_str());
        }
        Ok(())
    }

    pub fn hotspot(&self, id: &str) -> Option<&Hotspot> {
        self.hotspots.iter().find(|h| h.id == id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Block {
    pub center: Vec3,
    pub size: Vec3,
    pub color: [f32; 3],
}

impl Block {
    const fn new(center: [f32; 3], size: [f32; 3], color: [f32; 3]) -> Self {
        Self {
            center: Vec3::from_array(center),
            size: Vec3::from_array(size),
            color,
        }
    }
}

pub type BlockList = SmallVec<[Block; 8]>;

const GROUND: Block = Block::new([0.0, -0.025, 0.0], [8.0, 0.05, 8.0], [0.55, 0.56, 0.52]);

/// Deterministic stand-in geometry per category, shown while loading and
/// whenever the real asset is unavailable.
pub fn placeholder_for(category: SceneCategory) -> BlockList {
    let mut blocks = BlockList::new();
    blocks.push(GROUND);
    match category {
        SceneCategory::Residential => {
            blocks.push(Block::new([0.0, 0.6, 0.0], [2.0, 1.2, 1.6], [0.86, 0.82, 0.74]));
            blocks.push(Block::new([0.0, 1.35, 0.0], [2.2, 0.3, 1.8], [0.48, 0.28, 0.22]));
            blocks.push(Block::new([1.6, 0.4, 0.2], [1.0, 0.8, 1.2], [0.80, 0.78, 0.72]));
        }
        SceneCategory::Commercial => {
            blocks.push(Block::new([0.0, 0.4, 0.0], [3.0, 0.8, 2.4], [0.70, 0.72, 0.76]));
            blocks.push(Block::new([0.0, 2.0, 0.0], [1.4, 2.4, 1.4], [0.52, 0.62, 0.74]));
        }
        SceneCategory::Office => {
            for row in 0..2 {
                for col in 0..3 {
                    let x = -1.2 + col as f32 * 1.2;
                    let z = -0.6 + row as f32 * 1.2;
                    blocks.push(Block::new([x, 0.375, z], [0.9, 0.05, 0.6], [0.78, 0.66, 0.50]));
                }
            }
            blocks.push(Block::new([0.0, 0.8, -1.6], [4.0, 1.6, 0.1], [0.88, 0.88, 0.86]));
        }
        SceneCategory::Industrial => {
            blocks.push(Block::new([-0.6, 0.9, 0.0], [2.6, 1.8, 2.0], [0.60, 0.60, 0.58]));
            blocks.push(Block::new([1.5, 1.2, 0.0], [0.8, 2.4, 0.8], [0.70, 0.70, 0.72]));
        }
        SceneCategory::Hospitality => {
            blocks.push(Block::new([0.0, 1.0, 0.0], [1.6, 2.0, 1.6], [0.90, 0.86, 0.78]));
            blocks.push(Block::new([-1.6, 0.5, 0.0], [1.6, 1.0, 1.2], [0.86, 0.80, 0.70]));
            blocks.push(Block::new([1.6, 0.5, 0.0], [1.6, 1.0, 1.2], [0.86, 0.80, 0.70]));
        }
    }
    blocks
}

#[derive(Clone, Debug)]
pub enum AssetState {
    Loading,
    Ready(Arc<ModelInfo>),
    Failed(AssetError),
}

/// A load the host must start. Completion is reported with the same request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    pub path: String,
    pub lod: Lod,
    pub generation: u64,
}

#[derive(Clone, Debug)]
pub enum SceneVisual {
    Placeholder(BlockList),
    Model(Arc<ModelInfo>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HotspotEvent {
    Selected(String),
    Cleared,
}

/// A followed call-to-action link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CtaActivation {
    pub hotspot_id: String,
    pub href: String,
}

pub struct SceneContent {
    config: SceneConfig,
    active_hotspot: Option<String>,
    lod: Option<Lod>,
    assets: FnvHashMap<String, AssetState>,
    generation: u64,
}

impl SceneContent {
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            active_hotspot: None,
            lod: None,
            assets: FnvHashMap::default(),
            generation: 0,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn lod(&self) -> Option<Lod> {
        self.lod
    }

    /// Switch to another property/scene. Interaction and asset state reset;
    /// loads still in flight for the old scene will be ignored.
    pub fn switch_scene(&mut self, config: SceneConfig) {
        log::info!("[scene] {} -> {}", self.config.id, config.id);
        self.config = config;
        self.active_hotspot = None;
        self.lod = None;
        self.assets.clear();
        self.generation += 1;
    }

    pub fn sync_lod(&mut self, lod: Lod) -> Option<LoadRequest> {
        self.lod = Some(lod);
        let path = self.config.assets.path(lod).to_string();
        if self.assets.contains_key(&path) {
            return None;
        }
        self.assets.insert(path.clone(), AssetState::Loading);
        log::debug!("[asset] requesting {} for lod {}", path, lod.as_str());
        Some(LoadRequest {
            path,
            lod,
            generation: self.generation,
        })
    }

    /// Apply a finished load. Returns false when the result is stale.
    pub fn complete_load(
        &mut self,
        request: &LoadRequest,
        result: Result<ModelInfo, AssetError>,
    ) -> bool {
        if request.generation != self.generation {
            return false;
        }
        let state = match result {
            Ok(model) => AssetState::Ready(Arc::new(model)),
            Err(e) => {
                log::warn!(
                    "[asset] {} failed ({}), showing {:?} placeholder",
                    request.path,
                    e,
                    self.config.category
                );
                AssetState::Failed(e)
            }
        };
        self.assets.insert(request.path.clone(), state);
        true
    }

    pub fn asset_state(&self, lod: Lod) -> Option<&AssetState> {
        self.assets.get(self.config.assets.path(lod))
    }

    pub fn visual(&self) -> SceneVisual {
        let ready = self
            .lod
            .and_then(|lod| self.asset_state(lod))
            .and_then(|s| match s {
                AssetState::Ready(model) => Some(model.clone()),
                _ => None,
            });
        match ready {
            Some(model) => SceneVisual::Model(model),
            None => SceneVisual::Placeholder(placeholder_for(self.config.category)),
        }
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.config.hotspots
    }

    pub fn active_hotspot(&self) -> Option<&Hotspot> {
        self.active_hotspot
            .as_deref()
            .and_then(|id| self.config.hotspot(id))
    }

    /// Select a hotspot; selecting the active one again clears it. Unknown
    /// ids are ignored.
    pub fn select_hotspot(&mut self, id: &str) -> Option<HotspotEvent> {
        self.config.hotspot(id)?;
        if self.active_hotspot.as_deref() == Some(id) {
            self.active_hotspot = None;
            return Some(HotspotEvent::Cleared);
        }
        self.active_hotspot = Some(id.to_string());
        Some(HotspotEvent::Selected(id.to_string()))
    }

    pub fn clear_selection(&mut self) -> Option<HotspotEvent> {
        self.active_hotspot.take().map(|_| HotspotEvent::Cleared)
    }

    pub fn active_cta_href(&self) -> Option<&str> {
        self.active_hotspot()
            .and_then(|h| h.cta.as_ref())
            .map(|c| c.href.as_str())
    }

    /// The active hotspot's link, if it has one. Selection is kept.
    pub fn activate_cta(&self) -> Option<CtaActivation> {
        let hotspot = self.active_hotspot()?;
        let cta = hotspot.cta.as_ref()?;
        Some(CtaActivation {
            hotspot_id: hotspot.id.clone(),
            href: cta.href.clone(),
        })
    }
}
