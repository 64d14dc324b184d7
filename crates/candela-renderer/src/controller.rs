//! Tier Controller
//!
//! Steps the quality tier one rung at a time from the rolling FPS average.
//! Hysteresis comes from three rules: a minimum dwell time between changes,
//! a minimum number of FPS samples, and clearing the FPS history after every
//! change so samples from the previous tier never drive the next decision.

use std::fmt;

use serde::Serialize;

use candela_core::{AdaptiveConfig, PerformanceMonitor, QualityTier};
use candela_platform::ScopedTimer;

use crate::context::RenderContext;
use crate::quality::build_render_config;
use crate::{RenderBackend, RendererResult};

/// Why a tier changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TierChangeReason {
    /// Rolling average fell below the downgrade threshold
    LowFps { avg_fps: u32 },
    /// Rolling average reached the upgrade threshold
    HighFps { avg_fps: u32 },
}

impl fmt::Display for TierChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LowFps { avg_fps } => write!(f, "avg {} fps below threshold", avg_fps),
            Self::HighFps { avg_fps } => write!(f, "avg {} fps above threshold", avg_fps),
        }
    }
}

/// A tier change made by [`TierController::evaluate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierChange {
    pub from: QualityTier,
    pub to: QualityTier,
    pub reason: TierChangeReason,
}

/// Live tier adaptation
#[derive(Debug, Clone)]
pub struct TierController {
    config: AdaptiveConfig,
    last_evaluation_ms: f64,
    last_change_ms: f64,
    changes: u32,
}

impl TierController {
    /// Create a controller. Startup counts as the most recent tier change.
    pub fn new(config: AdaptiveConfig, start_ms: f64) -> Self {
        Self {
            config,
            last_evaluation_ms: start_ms,
            last_change_ms: start_ms,
            changes: 0,
        }
    }

    /// Adaptation settings
    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    /// Number of tier changes made by `evaluate`
    pub fn change_count(&self) -> u32 {
        self.changes
    }

    /// Switch `ctx` to `tier`.
    ///
    /// Returns `Ok(false)` without touching the rig when `tier` is already
    /// active. On failure the previous rig and tier stay in place.
    pub fn apply_tier<B: RenderBackend>(&self, ctx: &mut RenderContext<B>, tier: QualityTier) -> RendererResult<bool> {
        if ctx.tier() == tier {
            return Ok(false);
        }

        let from = ctx.tier();
        let _timer = ScopedTimer::traced("tier_switch");
        if let Err(err) = ctx.apply_config(build_render_config(tier)) {
            log::warn!("Tier switch {} -> {} failed, keeping {}: {}", from, tier, from, err);
            return Err(err);
        }

        log::info!("Quality tier: {} -> {}", from, tier);
        Ok(true)
    }

    /// Switch `ctx` to the tier called `name`. Unknown names are rejected.
    pub fn apply_tier_named<B: RenderBackend>(&self, ctx: &mut RenderContext<B>, name: &str) -> RendererResult<bool> {
        let tier: QualityTier = name.parse()?;
        self.apply_tier(ctx, tier)
    }

    /// Run one adaptation step, if one is due.
    ///
    /// Called every frame; does nothing until the evaluation interval has
    /// elapsed. Returns the change made, if any.
    pub fn evaluate<B: RenderBackend>(
        &mut self,
        now_ms: f64,
        monitor: &mut PerformanceMonitor,
        ctx: &mut RenderContext<B>,
    ) -> Option<TierChange> {
        if !self.config.enabled || now_ms - self.last_evaluation_ms < self.config.evaluation_interval_ms {
            return None;
        }
        self.last_evaluation_ms = now_ms;

        if now_ms - self.last_change_ms < self.config.min_dwell_ms {
            return None;
        }
        if monitor.fps_history().len() < self.config.min_samples {
            return None;
        }

        let from = ctx.tier();
        let avg_fps = monitor.average_fps();
        let (to, reason) = if avg_fps < self.config.downgrade_below_fps {
            (from.lower()?, TierChangeReason::LowFps { avg_fps })
        } else if avg_fps >= self.config.upgrade_above_fps && from < self.config.max_tier {
            (from.higher()?, TierChangeReason::HighFps { avg_fps })
        } else {
            return None;
        };

        // A failed switch still restarts the dwell clock so it is not retried every interval
        self.last_change_ms = now_ms;
        match self.apply_tier(ctx, to) {
            Ok(true) => {
                monitor.clear_history();
                self.changes += 1;
                Some(TierChange { from, to, reason })
            }
            Ok(false) | Err(_) => None,
        }
    }
}
