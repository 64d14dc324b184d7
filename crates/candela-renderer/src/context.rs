//! Render Context
//!
//! Everything a tier switch touches, owned in one place and passed by
//! reference: the backend, the immutable device profile, the camera, the
//! lighting rig and the active configuration.

use std::sync::Arc;

use glam::UVec2;
use parking_lot::{Mutex, MutexGuard};

use candela_core::QualityTier;
use candela_platform::DeviceProfile;

use crate::camera::Camera;
use crate::lighting::LightingRig;
use crate::quality::{RenderConfig, build_render_config};
use crate::{RenderBackend, RendererResult};

/// Render state for one card scene
#[derive(Debug)]
pub struct RenderContext<B: RenderBackend> {
    backend: B,
    profile: DeviceProfile,
    camera: Camera,
    rig: LightingRig,
    config: RenderConfig,
    viewport: UVec2,
}

impl<B: RenderBackend> RenderContext<B> {
    /// Create a context and install the configuration for `tier`
    pub fn new(
        backend: B,
        profile: DeviceProfile,
        mut camera: Camera,
        viewport: UVec2,
        tier: QualityTier,
    ) -> RendererResult<Self> {
        camera.set_aspect(aspect(viewport));

        let mut context = Self {
            backend,
            profile,
            camera,
            rig: LightingRig::new(),
            config: build_render_config(tier),
            viewport,
        };

        let config = context.config;
        context.apply_config(config)?;
        context.backend.set_viewport_size(viewport.x, viewport.y);
        Ok(context)
    }

    /// Swap in a new configuration.
    ///
    /// Lights are replaced first; renderer settings only change once the new
    /// rig is live, so a failed swap leaves the context untouched.
    pub fn apply_config(&mut self, config: RenderConfig) -> RendererResult<()> {
        self.rig.swap(&mut self.backend, &config)?;

        self.backend.set_shadows_enabled(config.shadows_enabled);
        if let Some(size) = config.shadow_map_size {
            self.backend.set_shadow_map_size(size);
        }
        self.backend.set_pixel_ratio(config.pixel_ratio(self.profile.pixel_ratio));
        self.config = config;
        Ok(())
    }

    /// Handle a viewport resize.
    ///
    /// Touches only the camera aspect, renderer size and pixel ratio.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport = UVec2::new(width, height);
        self.camera.set_aspect(aspect(self.viewport));
        self.backend.set_viewport_size(width, height);
        self.backend.set_pixel_ratio(self.config.pixel_ratio(self.profile.pixel_ratio));
        log::debug!("Viewport resized to {}x{}", width, height);
    }

    /// Toggle shadows on the live rig without rebuilding it
    pub fn set_shadows_enabled(&mut self, enabled: bool) -> RendererResult<()> {
        self.rig.set_shadows_enabled(&mut self.backend, enabled)
    }

    /// Active tier
    pub fn tier(&self) -> QualityTier {
        self.config.tier
    }

    /// Active configuration
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Device profile
    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn rig(&self) -> &LightingRig {
        &self.rig
    }

    pub fn viewport(&self) -> UVec2 {
        self.viewport
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

fn aspect(viewport: UVec2) -> f32 {
    viewport.x as f32 / viewport.y.max(1) as f32
}

/// Render context shared between threads.
///
/// Resize handling and tier switches take the same lock, so they never
/// interleave.
#[derive(Debug)]
pub struct SharedRenderContext<B: RenderBackend> {
    inner: Arc<Mutex<RenderContext<B>>>,
}

impl<B: RenderBackend> SharedRenderContext<B> {
    pub fn new(context: RenderContext<B>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(context)),
        }
    }

    /// Lock the context
    pub fn lock(&self) -> MutexGuard<'_, RenderContext<B>> {
        self.inner.lock()
    }
}

impl<B: RenderBackend> Clone for SharedRenderContext<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
