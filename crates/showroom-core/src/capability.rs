use crate::constants::*;
use crate::lod::Lod;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceLevel {
    High,
    Standard,
    Low,
}

impl PerformanceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            PerformanceLevel::High => "high",
            PerformanceLevel::Standard => "standard",
            PerformanceLevel::Low => "low",
        }
    }
}

/// Source of raw device signals. `None` means the signal is unavailable or
/// the underlying platform call failed.
pub trait CapabilityProbe {
    fn device_memory_gib(&self) -> Option<f64>;
    fn logical_cores(&self) -> Option<u32>;
    fn supports_modern_graphics_api(&self) -> Option<bool>;
    fn prefers_reduced_motion(&self) -> Option<bool>;
    fn user_agent(&self) -> Option<String>;
    fn viewport_width(&self) -> Option<f64>;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeviceSignals {
    pub device_memory_gib: Option<f64>,
    pub logical_cores: Option<u32>,
    pub supports_modern_graphics_api: Option<bool>,
    pub prefers_reduced_motion: Option<bool>,
    pub user_agent: Option<String>,
    pub viewport_width: Option<f64>,
}

impl DeviceSignals {
    pub fn collect(probe: &dyn CapabilityProbe) -> Self {
        Self {
            device_memory_gib: probe.device_memory_gib(),
            logical_cores: probe.logical_cores(),
            supports_modern_graphics_api: probe.supports_modern_graphics_api(),
            prefers_reduced_motion: probe.prefers_reduced_motion(),
            user_agent: probe.user_agent(),
            viewport_width: probe.viewport_width(),
        }
    }
}

impl CapabilityProbe for DeviceSignals {
    fn device_memory_gib(&self) -> Option<f64> {
        self.device_memory_gib
    }
    fn logical_cores(&self) -> Option<u32> {
        self.logical_cores
    }
    fn supports_modern_graphics_api(&self) -> Option<bool> {
        self.supports_modern_graphics_api
    }
    fn prefers_reduced_motion(&self) -> Option<bool> {
        self.prefers_reduced_motion
    }
    fn user_agent(&self) -> Option<String> {
        self.user_agent.clone()
    }
    fn viewport_width(&self) -> Option<f64> {
        self.viewport_width
    }
}

/// Per-session capability record. Immutable once computed; a changed
/// accessibility signal produces a new value via [`Self::with_reduced_motion`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceCapabilities {
    pub level: PerformanceLevel,
    pub device_memory_gib: f64,
    pub logical_core_count: u32,
    pub supports_modern_graphics_api: bool,
    pub prefers_reduced_motion: bool,
    pub is_mobile_form_factor: bool,
    pub max_pixel_density: f32,
    pub recommended_lod: Lod,
}

impl Default for PerformanceCapabilities {
    /// Values used before any graphics surface can exist (pre-render or a
    /// non-browser host). Never persisted.
    fn default() -> Self {
        Self {
            level: PerformanceLevel::Standard,
            device_memory_gib: DEFAULT_DEVICE_MEMORY_GIB,
            logical_core_count: DEFAULT_LOGICAL_CORES,
            supports_modern_graphics_api: false,
            prefers_reduced_motion: false,
            is_mobile_form_factor: false,
            max_pixel_density: STANDARD_TIER_PIXEL_DENSITY,
            recommended_lod: Lod::Mid,
        }
    }
}

impl PerformanceCapabilities {
    pub fn with_reduced_motion(&self, prefers_reduced_motion: bool) -> Self {
        Self {
            prefers_reduced_motion,
            ..self.clone()
        }
    }
}

pub fn detect(probe: &dyn CapabilityProbe) -> PerformanceCapabilities {
    let caps = classify(&DeviceSignals::collect(probe));
    log::info!(
        "[caps] level={} memory={}GiB cores={} gfx={} mobile={} reduced_motion={}",
        caps.level.as_str(),
        caps.device_memory_gib,
        caps.logical_core_count,
        caps.supports_modern_graphics_api,
        caps.is_mobile_form_factor,
        caps.prefers_reduced_motion
    );
    caps
}

pub fn classify(signals: &DeviceSignals) -> PerformanceCapabilities {
    let memory = signals
        .device_memory_gib
        .filter(|m| m.is_finite() && *m > 0.0)
        .unwrap_or(DEFAULT_DEVICE_MEMORY_GIB);
    let cores = signals
        .logical_cores
        .filter(|c| *c > 0)
        .unwrap_or(DEFAULT_LOGICAL_CORES);
    let gfx = signals.supports_modern_graphics_api.unwrap_or(false);
    let reduced_motion = signals.prefers_reduced_motion.unwrap_or(false);
    let mobile = is_mobile_form_factor(signals.user_agent.as_deref(), signals.viewport_width);

    let level = if memory >= HIGH_TIER_MIN_MEMORY_GIB
        && cores >= HIGH_TIER_MIN_CORES
        && gfx
        && !mobile
    {
        PerformanceLevel::High
    } else if memory < LOW_TIER_MEMORY_BELOW_GIB
        || cores < LOW_TIER_CORES_BELOW
        || !gfx
        || mobile
    {
        PerformanceLevel::Low
    } else {
        PerformanceLevel::Standard
    };

    let (max_pixel_density, recommended_lod) = match level {
        PerformanceLevel::High => (HIGH_TIER_PIXEL_DENSITY, Lod::High),
        PerformanceLevel::Standard => (STANDARD_TIER_PIXEL_DENSITY, Lod::Mid),
        PerformanceLevel::Low => (LOW_TIER_PIXEL_DENSITY, Lod::Low),
    };

    PerformanceCapabilities {
        level,
        device_memory_gib: memory,
        logical_core_count: cores,
        supports_modern_graphics_api: gfx,
        prefers_reduced_motion: reduced_motion,
        is_mobile_form_factor: mobile,
        max_pixel_density,
        recommended_lod,
    }
}

const MOBILE_UA_TOKENS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];

#[inline]
pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    let ua = user_agent.to_ascii_lowercase();
    MOBILE_UA_TOKENS.iter().any(|t| ua.contains(t))
}

pub fn is_mobile_form_factor(user_agent: Option<&str>, viewport_width: Option<f64>) -> bool {
    let ua_mobile = user_agent.map(is_mobile_user_agent).unwrap_or(false);
    let narrow = viewport_width
        .filter(|w| w.is_finite())
        .map(|w| w < MOBILE_MAX_VIEWPORT_WIDTH)
        .unwrap_or(false);
    ua_mobile || narrow
}
