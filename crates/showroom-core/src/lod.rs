//! Level-of-detail hysteresis controller, one per mounted viewport.

use crate::capability::{PerformanceCapabilities, PerformanceLevel};
use crate::render_mode::QualityMode;
use crate::tuning::QualityTuning;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lod {
    High,
    Mid,
    Low,
}

impl Lod {
    pub const ALL: [Lod; 3] = [Lod::High, Lod::Mid, Lod::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Lod::High => "high",
            Lod::Mid => "mid",
            Lod::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Lod::High),
            "mid" | "medium" => Some(Lod::Mid),
            "low" => Some(Lod::Low),
            _ => None,
        }
    }
}

pub fn derive_lod(caps: &PerformanceCapabilities, quality: QualityMode) -> Lod {
    if quality == QualityMode::High && caps.level != PerformanceLevel::Low {
        Lod::High
    } else {
        caps.recommended_lod
    }
}

/// Instantaneous FPS for a frame delta, clamped to `ceiling`.
#[inline]
pub fn instantaneous_fps(delta_sec: f64, ceiling: f64) -> f64 {
    if !(delta_sec.is_finite() && delta_sec > 0.0) {
        return ceiling;
    }
    (1.0 / delta_sec).min(ceiling)
}

#[derive(Clone, Debug)]
pub struct FpsWindow {
    samples: VecDeque<f64>,
    sum: f64,
    capacity: usize,
}

impl FpsWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            sum: 0.0,
            capacity,
        }
    }

    pub fn push(&mut self, fps: f64) {
        if self.samples.len() == self.capacity {
            if let Some(old) = self.samples.pop_front() {
                self.sum -= old;
            }
        }
        self.samples.push_back(fps);
        self.sum += fps;
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.sum / self.samples.len() as f64)
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.sum = 0.0;
    }
}

/// Tracks how long a condition has held without interruption.
#[derive(Clone, Copy, Debug, Default)]
struct Dwell {
    since_ms: Option<f64>,
}

impl Dwell {
    /// Returns true once the condition has held for at least `dwell_ms`.
    /// A sample that breaks the condition resets the timer.
    fn track(&mut self, holds: bool, now_ms: f64, dwell_ms: f64) -> bool {
        if !holds {
            self.since_ms = None;
            return false;
        }
        let since = *self.since_ms.get_or_insert(now_ms);
        now_ms - since >= dwell_ms
    }

    fn reset(&mut self) {
        self.since_ms = None;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LodState {
    pub current: Lod,
    pub forced: Option<Lod>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LodTransition {
    pub from: Lod,
    pub to: Lod,
    pub avg_fps: f64,
}

#[derive(Clone, Debug)]
pub struct LodController {
    current: Lod,
    forced: Option<Lod>,
    derived: Lod,
    level: PerformanceLevel,
    quality: QualityMode,
    window: FpsWindow,
    downgrade: Dwell,
    upgrade: Dwell,
    tuning: QualityTuning,
}

impl LodController {
    pub fn new(caps: &PerformanceCapabilities, quality: QualityMode) -> Self {
        Self::with_tuning(caps, quality, QualityTuning::default())
    }

    pub fn with_tuning(
        caps: &PerformanceCapabilities,
        quality: QualityMode,
        tuning: QualityTuning,
    ) -> Self {
        let derived = derive_lod(caps, quality);
        Self {
            current: derived,
            forced: None,
            derived,
            level: caps.level,
            quality,
            window: FpsWindow::new(tuning.window_samples),
            downgrade: Dwell::default(),
            upgrade: Dwell::default(),
            tuning,
        }
    }

    pub fn current_lod(&self) -> Lod {
        self.current
    }

    pub fn forced_lod(&self) -> Option<Lod> {
        self.forced
    }

    pub fn state(&self) -> LodState {
        LodState {
            current: self.current,
            forced: self.forced,
        }
    }

    pub fn average_fps(&self) -> Option<f64> {
        self.window.mean()
    }

    pub fn sample_count(&self) -> usize {
        self.window.len()
    }

    /// Manual override for QA. `None` resumes auto-derivation from the
    /// current capability and quality inputs.
    pub fn set_forced_lod(&mut self, forced: Option<Lod>) {
        self.forced = forced;
        self.current = forced.unwrap_or(self.derived);
        self.reset_monitor();
        match forced {
            Some(lod) => log::info!("[lod] forced to {}", lod.as_str()),
            None => log::info!("[lod] override cleared, back to {}", self.current.as_str()),
        }
    }

    /// Capability or quality toggle changed. Ignored for `current` while an
    /// override is active, but remembered for when it clears.
    pub fn sync(&mut self, caps: &PerformanceCapabilities, quality: QualityMode) {
        if caps.level == self.level && quality == self.quality {
            return;
        }
        let derived = derive_lod(caps, quality);
        self.derived = derived;
        self.level = caps.level;
        self.quality = quality;
        if self.forced.is_none() {
            self.current = derived;
            self.reset_monitor();
        }
    }

    /// Per-frame monitor. Must be called exactly once per drawn frame, in
    /// order, with a monotonically non-decreasing `now_ms`.
    pub fn on_frame(&mut self, now_ms: f64, delta_sec: f64) -> Option<LodTransition> {
        if self.forced.is_some() {
            return None;
        }
        let fps = instantaneous_fps(delta_sec, self.tuning.fps_ceiling);
        self.window.push(fps);
        let avg = self.window.mean()?;

        let t = &self.tuning;
        let next = match self.current {
            Lod::High => {
                let below = self
                    .downgrade
                    .track(avg < t.high_downgrade_below_fps, now_ms, t.downgrade_dwell_ms);
                below.then_some(Lod::Mid)
            }
            Lod::Mid => {
                let below = self
                    .downgrade
                    .track(avg < t.mid_downgrade_below_fps, now_ms, t.downgrade_dwell_ms);
                let above = self
                    .upgrade
                    .track(avg > t.mid_upgrade_above_fps, now_ms, t.upgrade_dwell_ms);
                if below {
                    Some(Lod::Low)
                } else if above && self.level == PerformanceLevel::High {
                    Some(Lod::High)
                } else {
                    None
                }
            }
            Lod::Low => {
                let above = self
                    .upgrade
                    .track(avg > t.low_upgrade_above_fps, now_ms, t.upgrade_dwell_ms);
                above.then_some(Lod::Mid)
            }
        }?;

        let transition = LodTransition {
            from: self.current,
            to: next,
            avg_fps: avg,
        };
        log::info!(
            "[lod] {} -> {} (avg {:.1} fps)",
            transition.from.as_str(),
            transition.to.as_str(),
            avg
        );
        self.current = next;
        self.reset_monitor();
        Some(transition)
    }

    fn reset_monitor(&mut self) {
        self.window.clear();
        self.downgrade.reset();
        self.upgrade.reset();
    }
}
