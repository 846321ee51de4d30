use crate::capability::{PerformanceCapabilities, PerformanceLevel};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Static image only; no drawing surface is ever constructed.
    Poster,
    Standard,
    High,
}

/// The user-facing quality toggle. Deliberately has no poster variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityMode {
    #[default]
    Standard,
    High,
}

impl QualityMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Some(QualityMode::Standard),
            "high" => Some(QualityMode::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityMode::Standard => "standard",
            QualityMode::High => "high",
        }
    }
}

impl RenderMode {
    pub fn quality(self) -> Option<QualityMode> {
        match self {
            RenderMode::Poster => None,
            RenderMode::Standard => Some(QualityMode::Standard),
            RenderMode::High => Some(QualityMode::High),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RenderMode::Poster => "poster",
            RenderMode::Standard => "standard",
            RenderMode::High => "high",
        }
    }
}

impl From<QualityMode> for RenderMode {
    fn from(q: QualityMode) -> Self {
        match q {
            QualityMode::Standard => RenderMode::Standard,
            QualityMode::High => RenderMode::High,
        }
    }
}

/// Initial mode for a session. `High` is never chosen here.
pub fn resolve_initial_mode(caps: &PerformanceCapabilities) -> RenderMode {
    if !caps.supports_modern_graphics_api
        || caps.prefers_reduced_motion
        || caps.level == PerformanceLevel::Low
    {
        RenderMode::Poster
    } else {
        RenderMode::Standard
    }
}

/// Re-evaluated on every render: reduced motion suppresses 3D even when the
/// stored mode was left non-poster.
#[inline]
pub fn should_render_3d(mode: RenderMode, caps: &PerformanceCapabilities) -> bool {
    mode != RenderMode::Poster && caps.supports_modern_graphics_api && !caps.prefers_reduced_motion
}

/// Session-scoped render context: the one capability record and the one
/// render mode of a page session. Passed explicitly to every consumer.
#[derive(Clone, Debug)]
pub struct RenderSession {
    capabilities: PerformanceCapabilities,
    mode: RenderMode,
    preferred_quality: QualityMode,
    revision: u64,
}

impl RenderSession {
    pub fn new(capabilities: PerformanceCapabilities) -> Self {
        let mode = resolve_initial_mode(&capabilities);
        log::info!("[mode] initial render mode {}", mode.as_str());
        Self {
            capabilities,
            mode,
            preferred_quality: QualityMode::Standard,
            revision: 0,
        }
    }

    pub fn capabilities(&self) -> &PerformanceCapabilities {
        &self.capabilities
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn quality(&self) -> QualityMode {
        self.mode.quality().unwrap_or(QualityMode::Standard)
    }

    pub fn should_render_3d(&self) -> bool {
        should_render_3d(self.mode, &self.capabilities)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Apply the user's quality toggle. Returns `false` when the toggle cannot
    /// take effect (poster sessions, or `High` on a low-tier device).
    pub fn set_quality(&mut self, quality: QualityMode) -> bool {
        if self.mode == RenderMode::Poster {
            log::debug!("[mode] ignoring quality toggle in poster mode");
            return false;
        }
        if quality == QualityMode::High && self.capabilities.level == PerformanceLevel::Low {
            return false;
        }
        self.preferred_quality = quality;
        let next = RenderMode::from(quality);
        if next != self.mode {
            log::info!("[mode] {} -> {}", self.mode.as_str(), next.as_str());
            self.mode = next;
            self.revision += 1;
        }
        true
    }

    /// Replace the capability record (e.g. the reduced-motion preference
    /// changed). Poster is entered or left only through this path.
    pub fn update_capabilities(&mut self, capabilities: PerformanceCapabilities) {
        let next = match resolve_initial_mode(&capabilities) {
            RenderMode::Poster => RenderMode::Poster,
            _ if self.preferred_quality == QualityMode::High
                && capabilities.level != PerformanceLevel::Low =>
            {
                RenderMode::High
            }
            _ => RenderMode::Standard,
        };
        if next != self.mode || capabilities != self.capabilities {
            if next != self.mode {
                log::info!("[mode] {} -> {} (capabilities changed)", self.mode.as_str(), next.as_str());
            }
            self.mode = next;
            self.capabilities = capabilities;
            self.revision += 1;
        }
    }
}
