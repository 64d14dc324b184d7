//! # Candela Core
//!
//! Core runtime library for the Candela birthday-card renderer.
//!
//! This crate holds the renderer-independent pieces of the adaptive quality loop:
//! - **Tiers**: the closed [`QualityTier`] ladder (Low < Medium < High)
//! - **History**: fixed-capacity ring buffer for rolling samples
//! - **Monitor**: per-frame FPS / frame-time sampler with a 500ms aggregation window
//! - **Scene Graph**: retained hierarchy of drawables, traversed for scene statistics
//! - **Config**: tunables for the live tier adaptation policy

pub mod config;
pub mod history;
pub mod monitor;
pub mod scene;

pub use config::AdaptiveConfig;
pub use history::RingBuffer;
pub use monitor::{FrameSample, MemoryTelemetry, MetricsSnapshot, PerformanceMonitor, SceneMetrics};
pub use scene::{Geometry, Node, NodeId, SceneGraph};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid quality tier: {0}")]
    InvalidTier(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Rendering quality tier.
///
/// Tiers are totally ordered; adaptation only ever moves one rung at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// No shadows, single key light, no antialiasing
    Low,
    /// Reduced shadow resolution, key + fill lights
    Medium,
    /// Full cinematic lighting with 2048 shadow maps
    High,
}

impl QualityTier {
    /// All tiers, lowest first
    pub const ALL: [QualityTier; 3] = [QualityTier::Low, QualityTier::Medium, QualityTier::High];

    /// Lowercase name of the tier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// The next tier down, if any
    pub fn lower(self) -> Option<Self> {
        match self {
            Self::Low => None,
            Self::Medium => Some(Self::Low),
            Self::High => Some(Self::Medium),
        }
    }

    /// The next tier up, if any
    pub fn higher(self) -> Option<Self> {
        match self {
            Self::Low => Some(Self::Medium),
            Self::Medium => Some(Self::High),
            Self::High => None,
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTier {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "med" | "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(CoreError::InvalidTier(s.to_string())),
        }
    }
}

impl TryFrom<u8> for QualityTier {
    type Error = CoreError;

    fn try_from(value: u8) -> CoreResult<Self> {
        match value {
            0 => Ok(Self::Low),
            1 => Ok(Self::Medium),
            2 => Ok(Self::High),
            other => Err(CoreError::InvalidTier(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(QualityTier::Low < QualityTier::Medium);
        assert!(QualityTier::Medium < QualityTier::High);
        assert_eq!(QualityTier::ALL.iter().max(), Some(&QualityTier::High));
    }

    #[test]
    fn test_tier_steps() {
        assert_eq!(QualityTier::High.lower(), Some(QualityTier::Medium));
        assert_eq!(QualityTier::Low.lower(), None);
        assert_eq!(QualityTier::Low.higher(), Some(QualityTier::Medium));
        assert_eq!(QualityTier::High.higher(), None);
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!("HIGH".parse::<QualityTier>(), Ok(QualityTier::High));
        assert_eq!("med".parse::<QualityTier>(), Ok(QualityTier::Medium));
        assert_eq!(" low ".parse::<QualityTier>(), Ok(QualityTier::Low));
        assert!(matches!("ultra".parse::<QualityTier>(), Err(CoreError::InvalidTier(_))));
    }

    #[test]
    fn test_tier_from_index() {
        assert_eq!(QualityTier::try_from(1u8), Ok(QualityTier::Medium));
        assert_eq!(QualityTier::try_from(7u8), Err(CoreError::InvalidTier("7".into())));
    }

    #[test]
    fn test_tier_serde_names() {
        let json = serde_json::to_string(&QualityTier::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
        let tier: QualityTier = serde_json::from_str("\"high\"").unwrap();
        assert_eq!(tier, QualityTier::High);
    }
}
