//! Device Capability Probe
//!
//! Queries the environment once at startup and produces an immutable
//! [`DeviceProfile`]. A device without a usable graphics context is rejected
//! with [`PlatformError::UnsupportedDevice`]; there is no degraded fallback.

use serde::Serialize;

use crate::{Platform, PlatformError, PlatformResult};

/// Device capabilities detected at startup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceProfile {
    /// Whether the device is a phone or tablet
    pub is_mobile: bool,
    /// Display pixel ratio (physical pixels per logical pixel)
    pub pixel_ratio: f32,
    /// Maximum 2D texture dimension
    pub max_texture_size: u32,
    /// Maximum render attachment dimension
    pub max_renderbuffer_size: u32,
}

/// Graphics limits reported by a capability source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphicsLimits {
    /// Maximum 2D texture dimension
    pub max_texture_size: u32,
    /// Maximum render attachment dimension
    pub max_renderbuffer_size: u32,
    /// Adapter name, for logging
    pub adapter_name: String,
}

/// Source of graphics limits
pub trait CapabilitySource {
    /// Query the graphics limits, failing when no graphics context exists
    fn graphics_limits(&self) -> PlatformResult<GraphicsLimits>;
}

/// Capability source backed by a wgpu adapter
#[derive(Debug, Clone)]
pub struct WgpuCapabilitySource {
    backends: wgpu::Backends,
    power_preference: wgpu::PowerPreference,
}

impl WgpuCapabilitySource {
    /// Probe the given backends
    pub fn new(backends: wgpu::Backends) -> Self {
        Self {
            backends,
            power_preference: wgpu::PowerPreference::HighPerformance,
        }
    }

    async fn request_limits(&self) -> PlatformResult<GraphicsLimits> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: self.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: self.power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| {
                PlatformError::UnsupportedDevice(format!("no graphics adapter for backends {:?}", self.backends))
            })?;

        let limits = adapter.limits();
        let info = adapter.get_info();

        // Render attachments share the 2D texture limit
        Ok(GraphicsLimits {
            max_texture_size: limits.max_texture_dimension_2d,
            max_renderbuffer_size: limits.max_texture_dimension_2d,
            adapter_name: info.name,
        })
    }
}

impl Default for WgpuCapabilitySource {
    fn default() -> Self {
        Self::new(Platform::current().preferred_backends())
    }
}

impl CapabilitySource for WgpuCapabilitySource {
    fn graphics_limits(&self) -> PlatformResult<GraphicsLimits> {
        let runtime = tokio::runtime::Builder::new_current_thread().build()?;
        runtime.block_on(self.request_limits())
    }
}

/// Capability source with fixed limits
#[derive(Debug, Clone)]
pub struct FixedCapabilities {
    pub max_texture_size: u32,
    pub max_renderbuffer_size: u32,
}

impl FixedCapabilities {
    /// Same limit for textures and render attachments
    pub fn uniform(max_size: u32) -> Self {
        Self {
            max_texture_size: max_size,
            max_renderbuffer_size: max_size,
        }
    }
}

impl CapabilitySource for FixedCapabilities {
    fn graphics_limits(&self) -> PlatformResult<GraphicsLimits> {
        Ok(GraphicsLimits {
            max_texture_size: self.max_texture_size,
            max_renderbuffer_size: self.max_renderbuffer_size,
            adapter_name: String::from("fixed"),
        })
    }
}

/// One-shot device probe
#[derive(Debug, Clone)]
pub struct CapabilityProbe {
    platform: Platform,
    pixel_ratio: f32,
    mobile_override: Option<bool>,
}

impl CapabilityProbe {
    /// Probe for the current platform with a pixel ratio of 1.0
    pub fn new() -> Self {
        Self::for_platform(Platform::current())
    }

    /// Probe as if running on `platform`
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            pixel_ratio: 1.0,
            mobile_override: None,
        }
    }

    /// Display pixel ratio reported by the host window
    pub fn with_pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    /// Force the mobile classification
    pub fn with_mobile(mut self, is_mobile: bool) -> Self {
        self.mobile_override = Some(is_mobile);
        self
    }

    /// Query the environment and build the device profile
    pub fn probe(&self, source: &dyn CapabilitySource) -> PlatformResult<DeviceProfile> {
        if !(self.pixel_ratio.is_finite() && self.pixel_ratio > 0.0) {
            return Err(PlatformError::UnsupportedDevice(format!(
                "invalid display pixel ratio {}",
                self.pixel_ratio
            )));
        }

        let limits = source.graphics_limits()?;
        if limits.max_texture_size == 0 || limits.max_renderbuffer_size == 0 {
            return Err(PlatformError::UnsupportedDevice(format!(
                "adapter '{}' reports no texture capacity",
                limits.adapter_name
            )));
        }

        let profile = DeviceProfile {
            is_mobile: self.mobile_override.unwrap_or_else(|| self.platform.is_mobile()),
            pixel_ratio: self.pixel_ratio,
            max_texture_size: limits.max_texture_size,
            max_renderbuffer_size: limits.max_renderbuffer_size,
        };

        log::debug!(
            "Probed '{}' on {:?}: mobile={} pixel_ratio={} max_tex={} max_rb={}",
            limits.adapter_name,
            self.platform,
            profile.is_mobile,
            profile.pixel_ratio,
            profile.max_texture_size,
            profile.max_renderbuffer_size
        );

        Ok(profile)
    }
}

impl Default for CapabilityProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoAdapter;

    impl CapabilitySource for NoAdapter {
        fn graphics_limits(&self) -> PlatformResult<GraphicsLimits> {
            Err(PlatformError::UnsupportedDevice(String::from("no adapter")))
        }
    }

    #[test]
    fn test_probe_fixed_desktop() {
        let profile = CapabilityProbe::for_platform(Platform::Linux)
            .with_pixel_ratio(1.5)
            .probe(&FixedCapabilities::uniform(8192))
            .unwrap();

        assert!(!profile.is_mobile);
        assert_eq!(profile.pixel_ratio, 1.5);
        assert_eq!(profile.max_texture_size, 8192);
        assert_eq!(profile.max_renderbuffer_size, 8192);
    }

    #[test]
    fn test_probe_mobile_platform() {
        let profile = CapabilityProbe::for_platform(Platform::Android)
            .with_pixel_ratio(2.0)
            .probe(&FixedCapabilities::uniform(4096))
            .unwrap();
        assert!(profile.is_mobile);
    }

    #[test]
    fn test_mobile_override() {
        let profile = CapabilityProbe::for_platform(Platform::Windows)
            .with_mobile(true)
            .probe(&FixedCapabilities::uniform(4096))
            .unwrap();
        assert!(profile.is_mobile);
    }

    #[test]
    fn test_missing_context_is_fatal() {
        let result = CapabilityProbe::new().probe(&NoAdapter);
        assert!(matches!(result, Err(PlatformError::UnsupportedDevice(_))));
    }

    #[test]
    fn test_zero_limits_rejected() {
        let result = CapabilityProbe::new().probe(&FixedCapabilities::uniform(0));
        assert!(matches!(result, Err(PlatformError::UnsupportedDevice(_))));
    }

    #[test]
    fn test_bad_pixel_ratio_rejected() {
        for ratio in [0.0, -1.0, f32::NAN] {
            let result = CapabilityProbe::new()
                .with_pixel_ratio(ratio)
                .probe(&FixedCapabilities::uniform(4096));
            assert!(matches!(result, Err(PlatformError::UnsupportedDevice(_))));
        }
    }
}
