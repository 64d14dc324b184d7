//! # Candela Renderer
//!
//! Adaptive-quality rendering core for the birthday-card scene.
//!
//! ## Features
//! - Quality policy mapping device profiles and tiers to render parameters
//! - Tiered lighting rig with all-or-nothing light swaps
//! - Live tier controller with hysteresis
//! - Persisted camera defaults and a diagnostic check against them
//! - Headless backend for tests and the CLI simulator

pub mod app;
pub mod camera;
pub mod context;
pub mod controller;
pub mod lighting;
pub mod quality;

pub use app::{AppConfig, CardApp, FrameReport};
pub use camera::{Camera, CameraState, DefaultCheck, SavedPosition};
pub use context::{RenderContext, SharedRenderContext};
pub use controller::{TierChange, TierChangeReason, TierController};
pub use lighting::{Light, LightKind, LightSet, LightingRig, ShadowSettings};
pub use quality::{RenderConfig, ShaderPrecision, build_render_config, select_initial_tier};

use ahash::AHashMap;
use glam::UVec2;
use thiserror::Error;

use candela_core::CoreError;
use candela_platform::PlatformError;

/// Renderer errors
#[derive(Error, Debug)]
pub enum RendererError {
    #[error("Graphics context creation failed: {0}")]
    ContextCreation(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Out of light slots (budget {0})")]
    OutOfLightSlots(usize),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Result type for renderer operations
pub type RendererResult<T> = Result<T, RendererError>;

/// Backend-issued handle for an installed light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightHandle(pub u32);

/// Context-creation attributes. Fixed for the lifetime of a backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextAttributes {
    /// Multisample antialiasing
    pub antialias: bool,
    /// Shader precision
    pub precision: ShaderPrecision,
}

impl ContextAttributes {
    /// Attributes requested by a render configuration
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            antialias: config.antialias,
            precision: config.precision,
        }
    }
}

impl Default for ContextAttributes {
    fn default() -> Self {
        Self::from_config(&RenderConfig::for_tier(candela_core::QualityTier::High))
    }
}

/// Operations the adaptive layer needs from a rendering backend
pub trait RenderBackend {
    /// Install a light, returning its handle
    fn add_light(&mut self, light: &Light) -> RendererResult<LightHandle>;

    /// Remove an installed light
    fn remove_light(&mut self, handle: LightHandle) -> RendererResult<()>;

    /// Replace the parameters of an installed light
    fn update_light(&mut self, handle: LightHandle, light: &Light) -> RendererResult<()>;

    /// Resize the shadow map
    fn set_shadow_map_size(&mut self, size: u32);

    /// Toggle shadow map rendering
    fn set_shadows_enabled(&mut self, enabled: bool);

    /// Set the renderer pixel ratio
    fn set_pixel_ratio(&mut self, ratio: f32);

    /// Set the viewport size in logical pixels
    fn set_viewport_size(&mut self, width: u32, height: u32);

    /// Begin a new frame
    fn begin_frame(&mut self) {}

    /// End the current frame
    fn end_frame(&mut self) {}
}

/// Renderer statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RendererStats {
    /// Lights installed over the renderer's lifetime
    pub lights_added: u64,
    /// Lights removed over the renderer's lifetime
    pub lights_removed: u64,
    /// In-place light updates
    pub light_updates: u64,
    /// Completed frames
    pub frames: u64,
}

/// Backend that records state without touching a GPU
#[derive(Debug)]
pub struct HeadlessRenderer {
    attributes: ContextAttributes,
    lights: AHashMap<LightHandle, Light>,
    next_handle: u32,
    light_budget: Option<usize>,
    shadows_enabled: bool,
    shadow_map_size: u32,
    pixel_ratio: f32,
    viewport: UVec2,
    stats: RendererStats,
    frame_number: u64,
}

impl HeadlessRenderer {
    /// Create a headless renderer with the given context attributes
    pub fn new(attributes: ContextAttributes) -> Self {
        log::debug!(
            "Headless context: antialias={} precision={:?}",
            attributes.antialias,
            attributes.precision
        );
        Self {
            attributes,
            lights: AHashMap::new(),
            next_handle: 0,
            light_budget: None,
            shadows_enabled: false,
            shadow_map_size: 0,
            pixel_ratio: 1.0,
            viewport: UVec2::ZERO,
            stats: RendererStats::default(),
            frame_number: 0,
        }
    }

    /// Limit the number of simultaneously installed lights
    pub fn with_light_budget(mut self, budget: usize) -> Self {
        self.light_budget = Some(budget);
        self
    }

    /// Context attributes
    pub fn attributes(&self) -> ContextAttributes {
        self.attributes
    }

    /// Number of installed lights
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Look up an installed light
    pub fn light(&self, handle: LightHandle) -> Option<&Light> {
        self.lights.get(&handle)
    }

    /// Installed lights in handle order
    pub fn lights(&self) -> Vec<(LightHandle, &Light)> {
        let mut lights: Vec<_> = self.lights.iter().map(|(h, l)| (*h, l)).collect();
        lights.sort_by_key(|(handle, _)| *handle);
        lights
    }

    /// Whether the shadow map is rendered
    pub fn shadows_enabled(&self) -> bool {
        self.shadows_enabled
    }

    /// Shadow map resolution
    pub fn shadow_map_size(&self) -> u32 {
        self.shadow_map_size
    }

    /// Current pixel ratio
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Current viewport size
    pub fn viewport(&self) -> UVec2 {
        self.viewport
    }

    /// Get renderer statistics
    pub fn stats(&self) -> &RendererStats {
        &self.stats
    }

    /// Get the current frame number
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new(ContextAttributes::default())
    }
}

impl RenderBackend for HeadlessRenderer {
    fn add_light(&mut self, light: &Light) -> RendererResult<LightHandle> {
        if let Some(budget) = self.light_budget {
            if self.lights.len() >= budget {
                return Err(RendererError::OutOfLightSlots(budget));
            }
        }

        let handle = LightHandle(self.next_handle);
        self.next_handle += 1;
        self.lights.insert(handle, *light);
        self.stats.lights_added += 1;
        Ok(handle)
    }

    fn remove_light(&mut self, handle: LightHandle) -> RendererResult<()> {
        self.lights
            .remove(&handle)
            .ok_or_else(|| RendererError::ResourceNotFound(format!("light {}", handle.0)))?;
        self.stats.lights_removed += 1;
        Ok(())
    }

    fn update_light(&mut self, handle: LightHandle, light: &Light) -> RendererResult<()> {
        let slot = self
            .lights
            .get_mut(&handle)
            .ok_or_else(|| RendererError::ResourceNotFound(format!("light {}", handle.0)))?;
        *slot = *light;
        self.stats.light_updates += 1;
        Ok(())
    }

    fn set_shadow_map_size(&mut self, size: u32) {
        self.shadow_map_size = size;
    }

    fn set_shadows_enabled(&mut self, enabled: bool) {
        self.shadows_enabled = enabled;
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    fn set_viewport_size(&mut self, width: u32, height: u32) {
        self.viewport = UVec2::new(width, height);
    }

    fn begin_frame(&mut self) {
        self.frame_number += 1;
    }

    fn end_frame(&mut self) {
        self.stats.frames += 1;
    }
}
