//! # Candela Platform
//!
//! Platform abstraction layer for the Candela renderer.
//!
//! This crate provides:
//! - **Probe**: one-shot device capability probing into a [`DeviceProfile`]
//! - **Telemetry**: process memory usage, where the platform exposes it
//! - **Storage**: key-value persistence (saved camera position)
//! - **Window**: thread-safe queue of resize / close events
//! - **Timers**: high-resolution timers and scoped timing spans

pub mod probe;
pub mod storage;
pub mod telemetry;
pub mod timer;
pub mod window;

pub use probe::{CapabilityProbe, CapabilitySource, DeviceProfile, FixedCapabilities, GraphicsLimits, WgpuCapabilitySource};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use telemetry::ProcessMemory;
pub use timer::{HighResTimer, ScopedTimer};
pub use window::{Window, WindowEvent, WindowState};

use thiserror::Error;

/// Platform-specific errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No usable graphics context; fatal
    #[error("Unsupported device: {0}")]
    UnsupportedDevice(String),

    /// Telemetry not exposed by the environment; callers skip the sample
    #[error("Telemetry unavailable: {0}")]
    MissingTelemetry(String),

    #[error("File I/O error: {0}")]
    FileIO(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Platform identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Android (arm64)
    Android,
    /// iOS (arm64)
    Ios,
    /// Windows (x64)
    Windows,
    /// Linux (x64)
    Linux,
    /// macOS
    MacOs,
    /// Browser (wasm32)
    Web,
    /// Unknown platform
    Unknown,
}

impl Platform {
    /// Get the current platform
    pub fn current() -> Self {
        #[cfg(target_os = "android")]
        return Platform::Android;

        #[cfg(target_os = "ios")]
        return Platform::Ios;

        #[cfg(target_os = "windows")]
        return Platform::Windows;

        #[cfg(target_os = "linux")]
        return Platform::Linux;

        #[cfg(target_os = "macos")]
        return Platform::MacOs;

        #[cfg(target_arch = "wasm32")]
        return Platform::Web;

        #[cfg(not(any(
            target_os = "android",
            target_os = "ios",
            target_os = "windows",
            target_os = "linux",
            target_os = "macos",
            target_arch = "wasm32"
        )))]
        return Platform::Unknown;
    }

    /// Check if this is a mobile platform
    pub fn is_mobile(&self) -> bool {
        matches!(self, Platform::Android | Platform::Ios)
    }

    /// Check if this is a desktop platform
    pub fn is_desktop(&self) -> bool {
        matches!(self, Platform::Windows | Platform::Linux | Platform::MacOs)
    }

    /// Graphics backends worth probing on this platform
    pub fn preferred_backends(&self) -> wgpu::Backends {
        match self {
            Platform::Android => wgpu::Backends::VULKAN | wgpu::Backends::GL,
            Platform::Ios | Platform::MacOs => wgpu::Backends::METAL,
            Platform::Windows => wgpu::Backends::VULKAN | wgpu::Backends::DX12,
            Platform::Linux => wgpu::Backends::VULKAN | wgpu::Backends::GL,
            Platform::Web => wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            Platform::Unknown => wgpu::Backends::all(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_detection() {
        let platform = Platform::current();
        assert!(platform.is_mobile() || platform.is_desktop() || matches!(platform, Platform::Web | Platform::Unknown));
    }

    #[test]
    fn test_platform_characteristics() {
        assert!(Platform::Android.is_mobile());
        assert!(Platform::Ios.is_mobile());
        assert!(!Platform::Web.is_mobile());
        assert!(Platform::Windows.is_desktop());
        assert!(Platform::Linux.is_desktop());
    }

    #[test]
    fn test_preferred_backends() {
        assert!(Platform::Ios.preferred_backends().contains(wgpu::Backends::METAL));
        assert!(Platform::Android.preferred_backends().contains(wgpu::Backends::VULKAN));
        assert_eq!(Platform::Unknown.preferred_backends(), wgpu::Backends::all());
    }
}
