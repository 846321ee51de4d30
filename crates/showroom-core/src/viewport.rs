//! Visibility-gated drawing-surface lifecycle for one scene slot.
//!
//! Construction may be asynchronous: `on_visibility` hands out a ticket and
//! `finish_construction` accepts the result only while it is current.

use crate::capability::PerformanceCapabilities;
use crate::constants::*;
use crate::lod::{Lod, LodController, LodState, LodTransition};
use crate::render_mode::{RenderMode, RenderSession};
use crate::tuning::QualityTuning;
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewportId(pub u32);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewportConfig {
    pub label: String,
    pub visibility_threshold: f64,
    pub root_margin_px: u32,
    pub fov_y_degrees: f32,
    pub auto_rotate: bool,
    pub show_hotspots: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self::property_scene()
    }
}

impl ViewportConfig {
    pub fn property_scene() -> Self {
        Self {
            label: "property".to_string(),
            visibility_threshold: VISIBILITY_THRESHOLD,
            root_margin_px: PROPERTY_ROOT_MARGIN_PX,
            fov_y_degrees: DEFAULT_FOV_Y_DEGREES,
            auto_rotate: false,
            show_hotspots: true,
        }
    }

    pub fn office_scene() -> Self {
        Self {
            label: "office".to_string(),
            visibility_threshold: VISIBILITY_THRESHOLD,
            root_margin_px: OFFICE_ROOT_MARGIN_PX,
            fov_y_degrees: 40.0,
            auto_rotate: true,
            show_hotspots: false,
        }
    }

    pub fn variant(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "property" | "scene" => Some(Self::property_scene()),
            "office" => Some(Self::office_scene()),
            _ => None,
        }
    }

    /// Margin string in IntersectionObserver `rootMargin` syntax.
    pub fn root_margin(&self) -> String {
        format!("{}px", self.root_margin_px)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    pub dpr_cap: f32,
    pub shadows: bool,
    pub contact_shadows: bool,
    pub post_processing: bool,
}

impl RenderSettings {
    /// `None` for poster mode, which never gets a surface.
    pub fn for_mode(mode: RenderMode, caps: &PerformanceCapabilities) -> Option<Self> {
        match mode {
            RenderMode::Poster => None,
            RenderMode::Standard => Some(Self {
                dpr_cap: caps.max_pixel_density.min(STANDARD_MODE_DPR_CAP),
                shadows: false,
                contact_shadows: false,
                post_processing: false,
            }),
            RenderMode::High => Some(Self {
                dpr_cap: caps.max_pixel_density.min(HIGH_MODE_DPR_CAP),
                shadows: true,
                contact_shadows: true,
                post_processing: true,
            }),
        }
    }

    /// Device pixel ratio actually used for the canvas backing store.
    pub fn pixel_ratio(&self, device_pixel_ratio: f64) -> f64 {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        dpr.min(self.dpr_cap as f64)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("graphics context unavailable: {0}")]
    ContextUnavailable(String),
    #[error("no compatible graphics adapter")]
    NoAdapter,
    #[error("surface configuration failed: {0}")]
    Configure(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presentation {
    Poster,
    Placeholder,
    Surface,
}

/// Side effect the host must perform after a visibility or session change.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LifecycleAction {
    None,
    /// Start building a surface; report back with the same ticket.
    Construct { ticket: u64, settings: RenderSettings },
    /// The surface (if any) was dropped; stop the frame loop.
    Release,
    ShowPoster,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameOutcome {
    pub lod: Lod,
    pub settings: RenderSettings,
    pub transitioned: Option<LodTransition>,
}

enum Phase<S> {
    Idle,
    Constructing { ticket: u64 },
    Mounted { surface: S, lod: LodController },
    Failed,
}

pub struct ViewportLifecycle<S> {
    id: ViewportId,
    config: ViewportConfig,
    tuning: QualityTuning,
    phase: Phase<S>,
    visible: bool,
    next_ticket: u64,
    session_revision: u64,
    forced_lod: Option<Lod>,
}

impl<S> ViewportLifecycle<S> {
    pub fn new(id: ViewportId, config: ViewportConfig) -> Self {
        Self::with_tuning(id, config, QualityTuning::default())
    }

    pub fn with_tuning(id: ViewportId, config: ViewportConfig, tuning: QualityTuning) -> Self {
        Self {
            id,
            config,
            tuning,
            phase: Phase::Idle,
            visible: false,
            next_ticket: 0,
            session_revision: 0,
            forced_lod: None,
        }
    }

    pub fn id(&self) -> ViewportId {
        self.id
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_mounted(&self) -> bool {
        matches!(self.phase, Phase::Mounted { .. })
    }

    pub fn has_failed(&self) -> bool {
        matches!(self.phase, Phase::Failed)
    }

    pub fn surface(&self) -> Option<&S> {
        match &self.phase {
            Phase::Mounted { surface, .. } => Some(surface),
            _ => None,
        }
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        match &mut self.phase {
            Phase::Mounted { surface, .. } => Some(surface),
            _ => None,
        }
    }

    pub fn lod_state(&self) -> Option<LodState> {
        match &self.phase {
            Phase::Mounted { lod, .. } => Some(lod.state()),
            _ => None,
        }
    }

    pub fn presentation(&self, session: &RenderSession) -> Presentation {
        if !session.should_render_3d() {
            return Presentation::Poster;
        }
        match self.phase {
            Phase::Failed => Presentation::Poster,
            Phase::Mounted { .. } => Presentation::Surface,
            Phase::Idle | Phase::Constructing { .. } => Presentation::Placeholder,
        }
    }

    /// Manual LOD override. Kept across remounts until cleared.
    pub fn set_forced_lod(&mut self, forced: Option<Lod>) {
        self.forced_lod = forced;
        if let Phase::Mounted { lod, .. } = &mut self.phase {
            lod.set_forced_lod(forced);
        }
    }

    pub fn on_visibility(&mut self, visible: bool, session: &RenderSession) -> LifecycleAction {
        self.visible = visible;
        self.reconcile(session)
    }

    /// Bring the phase in line with visibility and the session. Also called
    /// when the session changed (quality toggle, reduced motion).
    pub fn reconcile(&mut self, session: &RenderSession) -> LifecycleAction {
        self.session_revision = session.revision();
        if matches!(self.phase, Phase::Failed) {
            return LifecycleAction::ShowPoster;
        }
        let settings = match RenderSettings::for_mode(session.mode(), session.capabilities()) {
            Some(s) if session.should_render_3d() => s,
            _ => {
                let had_surface = !matches!(self.phase, Phase::Idle);
                self.phase = Phase::Idle;
                if had_surface {
                    log::info!("[viewport] {} released: 3D suppressed", self.config.label);
                }
                return LifecycleAction::ShowPoster;
            }
        };
        match (&mut self.phase, self.visible) {
            (Phase::Idle, true) => {
                self.next_ticket += 1;
                let ticket = self.next_ticket;
                self.phase = Phase::Constructing { ticket };
                log::debug!("[viewport] {} constructing (ticket {})", self.config.label, ticket);
                LifecycleAction::Construct { ticket, settings }
            }
            (Phase::Idle, false) => LifecycleAction::None,
            (Phase::Constructing { .. }, true) => LifecycleAction::None,
            (Phase::Mounted { lod, .. }, true) => {
                lod.sync(session.capabilities(), session.quality());
                LifecycleAction::None
            }
            (Phase::Constructing { .. } | Phase::Mounted { .. }, false) => {
                self.phase = Phase::Idle;
                log::debug!("[viewport] {} left view, surface released", self.config.label);
                LifecycleAction::Release
            }
            (Phase::Failed, _) => LifecycleAction::ShowPoster,
        }
    }

    /// Accept the outcome of a construction started by
    /// [`LifecycleAction::Construct`]. A stale ticket (the viewport left the
    /// screen meanwhile) drops the surface immediately.
    pub fn finish_construction(
        &mut self,
        ticket: u64,
        result: Result<S, SurfaceError>,
        session: &RenderSession,
    ) -> Presentation {
        let current = matches!(self.phase, Phase::Constructing { ticket: t } if t == ticket);
        if !current {
            log::debug!("[viewport] {} discarded stale surface (ticket {})", self.config.label, ticket);
            return self.presentation(session);
        }
        match result {
            Ok(surface) => {
                let mut lod = LodController::with_tuning(
                    session.capabilities(),
                    session.quality(),
                    self.tuning.clone(),
                );
                if self.forced_lod.is_some() {
                    lod.set_forced_lod(self.forced_lod);
                }
                log::info!(
                    "[viewport] {} mounted at lod {}",
                    self.config.label,
                    lod.current_lod().as_str()
                );
                self.phase = Phase::Mounted { surface, lod };
            }
            Err(e) => {
                log::warn!("[viewport] {} falling back to poster: {}", self.config.label, e);
                self.phase = Phase::Failed;
            }
        }
        self.presentation(session)
    }

    pub fn mount_with<F>(&mut self, session: &RenderSession, build: F) -> Presentation
    where
        F: FnOnce(&RenderSettings) -> Result<S, SurfaceError>,
    {
        match self.on_visibility(true, session) {
            LifecycleAction::Construct { ticket, settings } => {
                let result = build(&settings);
                self.finish_construction(ticket, result, session)
            }
            _ => self.presentation(session),
        }
    }

    /// Tear the surface down now, handing it back so the caller controls
    /// when GPU resources are dropped.
    pub fn release(&mut self) -> Option<S> {
        self.visible = false;
        match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Mounted { surface, .. } => Some(surface),
            Phase::Failed => {
                self.phase = Phase::Failed;
                None
            }
            _ => None,
        }
    }

    /// True when the session changed since the last [`Self::reconcile`].
    pub fn needs_reconcile(&self, session: &RenderSession) -> bool {
        session.revision() != self.session_revision
    }

    /// Per-frame monitor callback. Only does work while mounted and in sync
    /// with the session; after a session change the host must reconcile
    /// first and carry out the returned action.
    pub fn on_frame(
        &mut self,
        now_ms: f64,
        delta_sec: f64,
        session: &RenderSession,
    ) -> Option<FrameOutcome> {
        if self.needs_reconcile(session) {
            return None;
        }
        let settings = RenderSettings::for_mode(session.mode(), session.capabilities())?;
        match &mut self.phase {
            Phase::Mounted { lod, .. } => {
                let transitioned = lod.on_frame(now_ms, delta_sec);
                Some(FrameOutcome {
                    lod: lod.current_lod(),
                    settings,
                    transitioned,
                })
            }
            _ => None,
        }
    }
}

pub struct ViewportArena<S> {
    slots: FnvHashMap<ViewportId, ViewportLifecycle<S>>,
    next_id: u32,
}

impl<S> Default for ViewportArena<S> {
    fn default() -> Self {
        Self {
            slots: FnvHashMap::default(),
            next_id: 0,
        }
    }
}

impl<S> ViewportArena<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, config: ViewportConfig) -> ViewportId {
        self.insert_with_tuning(config, QualityTuning::default())
    }

    pub fn insert_with_tuning(&mut self, config: ViewportConfig, tuning: QualityTuning) -> ViewportId {
        self.next_id += 1;
        let id = ViewportId(self.next_id);
        self.slots
            .insert(id, ViewportLifecycle::with_tuning(id, config, tuning));
        id
    }

    pub fn get(&self, id: ViewportId) -> Option<&ViewportLifecycle<S>> {
        self.slots.get(&id)
    }

    pub fn get_mut(&mut self, id: ViewportId) -> Option<&mut ViewportLifecycle<S>> {
        self.slots.get_mut(&id)
    }

    pub fn remove(&mut self, id: ViewportId) -> Option<ViewportLifecycle<S>> {
        self.slots.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn mounted_count(&self) -> usize {
        self.slots.values().filter(|v| v.is_mounted()).count()
    }

    pub fn ids(&self) -> Vec<ViewportId> {
        let mut ids: Vec<_> = self.slots.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Push a session change to every viewport, returning the actions the
    /// host must carry out.
    pub fn reconcile_all(&mut self, session: &RenderSession) -> Vec<(ViewportId, LifecycleAction)> {
        let mut actions: Vec<_> = self
            .slots
            .iter_mut()
            .map(|(id, v)| (*id, v.reconcile(session)))
            .collect();
        actions.sort_by_key(|(id, _)| *id);
        actions
    }
}
