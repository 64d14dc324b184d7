//! Adaptive Quality Configuration
//!
//! Tunables for live tier adaptation. Every field has a default so partial
//! JSON documents are accepted.

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, QualityTier};

/// Live tier adaptation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Whether live adaptation runs at all
    pub enabled: bool,
    /// How often the rolling FPS is evaluated, in milliseconds
    pub evaluation_interval_ms: f64,
    /// Average FPS below which the tier steps down
    pub downgrade_below_fps: u32,
    /// Average FPS at or above which the tier steps up
    pub upgrade_above_fps: u32,
    /// Minimum time a tier is held before the next change, in milliseconds
    pub min_dwell_ms: f64,
    /// FPS samples required before a decision is made
    pub min_samples: usize,
    /// Highest tier upgrades may reach
    pub max_tier: QualityTier,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            evaluation_interval_ms: 1000.0,
            downgrade_below_fps: 30,
            upgrade_above_fps: 55,
            min_dwell_ms: 5000.0,
            min_samples: 4,
            max_tier: QualityTier::High,
        }
    }
}

impl AdaptiveConfig {
    /// Configuration that never changes the tier after startup
    pub fn fixed() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Check the thresholds leave a dead band between downgrade and upgrade
    pub fn validate(&self) -> CoreResult<()> {
        if self.downgrade_below_fps >= self.upgrade_above_fps {
            return Err(CoreError::InvalidConfig(format!(
                "downgrade threshold {} must be below upgrade threshold {}",
                self.downgrade_below_fps, self.upgrade_above_fps
            )));
        }
        if !(self.evaluation_interval_ms.is_finite() && self.evaluation_interval_ms > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "evaluation interval must be positive, got {}",
                self.evaluation_interval_ms
            )));
        }
        if !(self.min_dwell_ms.is_finite() && self.min_dwell_ms >= 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "dwell time must be non-negative, got {}",
                self.min_dwell_ms
            )));
        }
        Ok(())
    }
}
