use crate::constants::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TuningError {
    #[error("invalid tuning json: {0}")]
    Json(String),
    #[error("{field} must be finite and positive")]
    NotPositive { field: &'static str },
    #[error("rolling window must hold at least one sample")]
    EmptyWindow,
    #[error("dead zone violated: {lower} must stay below {upper}")]
    Overlap {
        lower: &'static str,
        upper: &'static str,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QualityTuning {
    pub fps_ceiling: f64,
    pub window_samples: usize,
    pub high_downgrade_below_fps: f64,
    pub mid_downgrade_below_fps: f64,
    pub mid_upgrade_above_fps: f64,
    pub low_upgrade_above_fps: f64,
    pub downgrade_dwell_ms: f64,
    pub upgrade_dwell_ms: f64,
}

impl Default for QualityTuning {
    fn default() -> Self {
        Self {
            fps_ceiling: FPS_CEILING,
            window_samples: FPS_WINDOW_SAMPLES,
            high_downgrade_below_fps: HIGH_DOWNGRADE_BELOW_FPS,
            mid_downgrade_below_fps: MID_DOWNGRADE_BELOW_FPS,
            mid_upgrade_above_fps: MID_UPGRADE_ABOVE_FPS,
            low_upgrade_above_fps: LOW_UPGRADE_ABOVE_FPS,
            downgrade_dwell_ms: DOWNGRADE_DWELL_MS,
            upgrade_dwell_ms: UPGRADE_DWELL_MS,
        }
    }
}

impl QualityTuning {
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: QualityTuning =
            serde_json::from_str(json).map_err(|e| TuningError::Json(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("fpsCeiling", self.fps_ceiling),
            ("highDowngradeBelowFps", self.high_downgrade_below_fps),
            ("midDowngradeBelowFps", self.mid_downgrade_below_fps),
            ("midUpgradeAboveFps", self.mid_upgrade_above_fps),
            ("lowUpgradeAboveFps", self.low_upgrade_above_fps),
            ("downgradeDwellMs", self.downgrade_dwell_ms),
            ("upgradeDwellMs", self.upgrade_dwell_ms),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TuningError::NotPositive { field });
            }
        }
        if self.window_samples == 0 {
            return Err(TuningError::EmptyWindow);
        }
        // Adjacent states must not immediately re-trigger each other.
        if self.mid_downgrade_below_fps >= self.low_upgrade_above_fps {
            return Err(TuningError::Overlap {
                lower: "midDowngradeBelowFps",
                upper: "lowUpgradeAboveFps",
            });
        }
        if self.high_downgrade_below_fps >= self.mid_upgrade_above_fps {
            return Err(TuningError::Overlap {
                lower: "highDowngradeBelowFps",
                upper: "midUpgradeAboveFps",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(QualityTuning::default().validate(), Ok(()));
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let t = QualityTuning::from_json(r#"{"upgradeDwellMs": 8000}"#).unwrap();
        assert_eq!(t.upgrade_dwell_ms, 8000.0);
        assert_eq!(t.downgrade_dwell_ms, DOWNGRADE_DWELL_MS);
        assert_eq!(t.window_samples, FPS_WINDOW_SAMPLES);
    }

    #[test]
    fn overlapping_thresholds_are_rejected() {
        let err = QualityTuning::from_json(r#"{"midDowngradeBelowFps": 50}"#).unwrap_err();
        assert!(matches!(err, TuningError::Overlap { .. }));
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = QualityTuning::from_json(r#"{"windowSamples": 0}"#).unwrap_err();
        assert_eq!(err, TuningError::EmptyWindow);
    }
}
