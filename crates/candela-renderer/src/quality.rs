//! Quality Policy
//!
//! Maps device profiles to an initial tier and tiers to concrete render
//! parameters. Everything here is pure: no live performance state is read.

use candela_core::QualityTier;
use candela_platform::DeviceProfile;
use serde::Serialize;

/// Fragment shader precision. No tier drops below medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderPrecision {
    Medium,
    High,
}

/// Render parameters derived from a tier.
///
/// Never mutated in place; a tier change produces a new value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderConfig {
    /// Tier this configuration was derived from
    pub tier: QualityTier,
    /// Whether the key light casts shadows
    pub shadows_enabled: bool,
    /// Shadow map resolution, when shadows are enabled
    pub shadow_map_size: Option<u32>,
    /// Number of directional lights (1..=3)
    pub directional_light_count: u8,
    /// Multisample antialiasing
    pub antialias: bool,
    /// Shader precision
    pub precision: ShaderPrecision,
    /// Multiplier applied to the device pixel ratio
    pub pixel_ratio_scale: f32,
}

impl RenderConfig {
    /// Configuration table lookup
    pub const fn for_tier(tier: QualityTier) -> Self {
        match tier {
            QualityTier::High => Self {
                tier,
                shadows_enabled: true,
                shadow_map_size: Some(2048),
                directional_light_count: 3,
                antialias: true,
                precision: ShaderPrecision::High,
                pixel_ratio_scale: 1.0,
            },
            QualityTier::Medium => Self {
                tier,
                shadows_enabled: true,
                shadow_map_size: Some(1024),
                directional_light_count: 2,
                antialias: true,
                precision: ShaderPrecision::Medium,
                pixel_ratio_scale: 0.75,
            },
            QualityTier::Low => Self {
                tier,
                shadows_enabled: false,
                shadow_map_size: None,
                directional_light_count: 1,
                antialias: false,
                precision: ShaderPrecision::Medium,
                pixel_ratio_scale: 1.0,
            },
        }
    }

    /// Renderer pixel ratio for a display of `device_pixel_ratio`.
    ///
    /// Low renders at an absolute ratio of 1.0; other tiers scale the device
    /// ratio. The device ratio is always the upper bound.
    pub fn pixel_ratio(&self, device_pixel_ratio: f32) -> f32 {
        let ratio = match self.tier {
            QualityTier::Low => 1.0,
            QualityTier::Medium | QualityTier::High => device_pixel_ratio * self.pixel_ratio_scale,
        };
        ratio.min(device_pixel_ratio)
    }
}

/// Initial tier for a device: mobile starts Low, everything else High.
///
/// Medium is only reachable through live adaptation.
pub fn select_initial_tier(profile: &DeviceProfile) -> QualityTier {
    if profile.is_mobile {
        QualityTier::Low
    } else {
        QualityTier::High
    }
}

/// Render configuration for a tier
pub fn build_render_config(tier: QualityTier) -> RenderConfig {
    RenderConfig::for_tier(tier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(is_mobile: bool, pixel_ratio: f32) -> DeviceProfile {
        DeviceProfile {
            is_mobile,
            pixel_ratio,
            max_texture_size: 4096,
            max_renderbuffer_size: 4096,
        }
    }

    #[test]
    fn test_initial_tier_is_binary() {
        assert_eq!(select_initial_tier(&profile(true, 3.0)), QualityTier::Low);
        assert_eq!(select_initial_tier(&profile(false, 1.0)), QualityTier::High);
        assert_eq!(select_initial_tier(&profile(false, 2.0)), QualityTier::High);
    }

    #[test]
    fn test_config_is_pure() {
        for tier in QualityTier::ALL {
            assert_eq!(build_render_config(tier), build_render_config(tier));
            assert_eq!(build_render_config(tier).tier, tier);
        }
    }

    #[test]
    fn test_config_table() {
        let high = build_render_config(QualityTier::High);
        assert!(high.shadows_enabled);
        assert_eq!(high.shadow_map_size, Some(2048));
        assert_eq!(high.directional_light_count, 3);
        assert!(high.antialias);
        assert_eq!(high.precision, ShaderPrecision::High);
        assert_eq!(high.pixel_ratio_scale, 1.0);

        let medium = build_render_config(QualityTier::Medium);
        assert!(medium.shadows_enabled);
        assert_eq!(medium.shadow_map_size, Some(1024));
        assert_eq!(medium.directional_light_count, 2);
        assert!(medium.antialias);
        assert_eq!(medium.precision, ShaderPrecision::Medium);
        assert_eq!(medium.pixel_ratio_scale, 0.75);

        let low = build_render_config(QualityTier::Low);
        assert!(!low.shadows_enabled);
        assert_eq!(low.shadow_map_size, None);
        assert_eq!(low.directional_light_count, 1);
        assert!(!low.antialias);
        assert_eq!(low.precision, ShaderPrecision::Medium);
    }

    #[test]
    fn test_mobile_profile_gets_cheap_config() {
        let device = DeviceProfile {
            is_mobile: true,
            pixel_ratio: 2.0,
            max_texture_size: 4096,
            max_renderbuffer_size: 4096,
        };
        let config = build_render_config(select_initial_tier(&device));
        assert_eq!(config.tier, QualityTier::Low);
        assert!(!config.antialias);
        assert!(!config.shadows_enabled);
    }

    #[test]
    fn test_pixel_ratio_resolution() {
        assert_eq!(build_render_config(QualityTier::High).pixel_ratio(2.0), 2.0);
        assert_eq!(build_render_config(QualityTier::Medium).pixel_ratio(2.0), 1.5);
        assert_eq!(build_render_config(QualityTier::Low).pixel_ratio(3.0), 1.0);
    }

    #[test]
    fn test_precision_per_tier() {
        let names: Vec<String> = QualityTier::ALL
            .iter()
            .map(|&tier| serde_json::to_string(&build_render_config(tier).precision).unwrap())
            .collect();
        assert_eq!(names, ["\"medium\"", "\"medium\"", "\"high\""]);
    }

    #[test]
    fn test_pixel_ratio_clamped_to_device() {
        assert_eq!(build_render_config(QualityTier::Low).pixel_ratio(0.5), 0.5);
        for tier in QualityTier::ALL {
            assert!(build_render_config(tier).pixel_ratio(1.25) <= 1.25);
        }
    }
}
