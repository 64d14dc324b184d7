//! Card Application
//!
//! Frame loop wiring: window events, backend frame brackets, the
//! performance monitor and the tier controller, driven one tick at a time by
//! the host.

use serde::{Deserialize, Serialize};

use candela_core::{AdaptiveConfig, FrameSample, MemoryTelemetry, MetricsSnapshot, PerformanceMonitor, SceneGraph};
use candela_platform::{DeviceProfile, KeyValueStore, Window, WindowEvent};

use crate::camera::Camera;
use crate::context::RenderContext;
use crate::controller::{TierChange, TierController};
use crate::quality::select_initial_tier;
use crate::{RenderBackend, RendererResult};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Live tier adaptation
    pub adaptive: AdaptiveConfig,
    /// How often scene statistics are recomputed, in milliseconds
    pub scene_metrics_interval_ms: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            adaptive: AdaptiveConfig::default(),
            scene_metrics_interval_ms: 1000.0,
        }
    }
}

/// Outcome of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub sample: FrameSample,
    pub tier_change: Option<TierChange>,
}

/// Birthday card renderer application
pub struct CardApp<B: RenderBackend> {
    context: RenderContext<B>,
    monitor: PerformanceMonitor,
    controller: TierController,
    window: Window,
    scene: SceneGraph,
    config: AppConfig,
    last_scene_metrics_ms: f64,
}

impl<B: RenderBackend> CardApp<B> {
    /// Start the application at `start_ms`.
    ///
    /// Picks the initial tier from the device profile, reads the camera
    /// start position from `store` and installs the initial configuration.
    pub fn start(
        backend: B,
        profile: DeviceProfile,
        store: &dyn KeyValueStore,
        window: Window,
        scene: SceneGraph,
        config: AppConfig,
        start_ms: f64,
    ) -> RendererResult<Self> {
        config.adaptive.validate()?;

        let tier = select_initial_tier(&profile);
        log::info!(
            "Device capability: {} | Mobile: {} | MaxTexSize: {}",
            tier.as_str().to_uppercase(),
            profile.is_mobile,
            profile.max_texture_size
        );

        let camera = Camera::from_store(store, window.aspect_ratio());
        let context = RenderContext::new(backend, profile, camera, window.size(), tier)?;

        let mut monitor = PerformanceMonitor::new(start_ms);
        monitor.update_scene_metrics(&scene);

        Ok(Self {
            context,
            monitor,
            controller: TierController::new(config.adaptive.clone(), start_ms),
            window,
            scene,
            config,
            last_scene_metrics_ms: start_ms,
        })
    }

    /// Sample process memory on every frame
    pub fn with_telemetry(mut self, telemetry: Box<dyn MemoryTelemetry>) -> Self {
        self.monitor.set_telemetry(telemetry);
        self
    }

    /// Run one frame at `now_ms`
    pub fn tick(&mut self, now_ms: f64) -> FrameReport {
        for event in self.window.poll_events() {
            match event {
                WindowEvent::Resized { width, height } => self.context.resize(width, height),
                WindowEvent::CloseRequested => log::debug!("Close requested"),
            }
        }

        let backend = self.context.backend_mut();
        backend.begin_frame();
        backend.end_frame();

        let sample = self.monitor.on_frame(now_ms);

        if now_ms - self.last_scene_metrics_ms >= self.config.scene_metrics_interval_ms {
            self.monitor.update_scene_metrics(&self.scene);
            self.last_scene_metrics_ms = now_ms;
        }

        let tier_change = self.controller.evaluate(now_ms, &mut self.monitor, &mut self.context);
        if let Some(change) = &tier_change {
            log::info!("Adaptive quality: {} -> {} ({})", change.from, change.to, change.reason);
        }

        FrameReport { sample, tier_change }
    }

    /// Current metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.monitor.metrics()
    }

    /// Whether the host asked to close the window
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    pub fn context(&self) -> &RenderContext<B> {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut RenderContext<B> {
        &mut self.context
    }

    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    pub fn controller(&self) -> &TierController {
        &self.controller
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Mutable scene; statistics refresh on the next metrics interval
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }
}
