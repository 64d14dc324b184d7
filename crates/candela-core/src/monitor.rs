//! Performance Monitor
//!
//! Per-frame sampler with two clocks:
//! - a continuous frame tick recording raw frame time
//! - a 500ms aggregation boundary converting frame counts into FPS samples
//!
//! The boundary is checked opportunistically on each tick, so a window may
//! overrun by up to one frame interval.

use std::fmt;

use serde::Serialize;

use crate::history::RingBuffer;
use crate::scene::SceneGraph;

/// Number of FPS samples kept for the rolling average
pub const FPS_HISTORY_CAPACITY: usize = 120;

/// Length of the FPS aggregation window in milliseconds
pub const FPS_WINDOW_MS: f64 = 500.0;

/// Average reported before any FPS sample exists
pub const BOOTSTRAP_FPS: u32 = 60;

const INITIAL_FRAME_TIME_MS: f64 = 16.67;

/// Source of process memory usage.
///
/// Returns `None` when the environment exposes no usage figures.
pub trait MemoryTelemetry {
    /// Current memory usage in megabytes
    fn used_memory_mb(&self) -> Option<f64>;
}

/// One frame tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    /// Timestamp of the frame in milliseconds
    pub timestamp_ms: f64,
    /// Time since the previous frame in milliseconds
    pub delta_ms: f64,
}

/// Scene statistics gathered by traversal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SceneMetrics {
    /// Draw calls (one per mesh)
    pub draw_calls: u32,
    /// Mesh count
    pub meshes: u32,
    /// Triangle count in thousands, rounded
    pub triangles_k: u32,
    /// Last known memory usage in megabytes
    pub memory_mb: Option<u64>,
}

/// Read-only projection of the monitor state for display
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub fps: u32,
    pub avg_fps: u32,
    pub frame_time_ms: f64,
    pub draw_calls: u32,
    pub meshes: u32,
    pub triangles_k: u32,
    pub memory_mb: Option<u64>,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FPS {} (avg {}) | {:.2} ms | {} draws | {} meshes | {}K tris",
            self.fps, self.avg_fps, self.frame_time_ms, self.draw_calls, self.meshes, self.triangles_k
        )?;
        match self.memory_mb {
            Some(mb) => write!(f, " | {} MB", mb),
            None => f.write_str(" | mem n/a"),
        }
    }
}

/// Frame-rate and scene statistics monitor
pub struct PerformanceMonitor {
    fps: u32,
    fps_history: RingBuffer<u32>,
    frame_count: u32,
    last_frame_time: f64,
    last_fps_update_time: f64,
    frame_time_ms: f64,
    scene: SceneMetrics,
    total_frames: u64,
    telemetry: Option<Box<dyn MemoryTelemetry>>,
}

impl PerformanceMonitor {
    /// Create a monitor whose clocks start at `start_ms`
    pub fn new(start_ms: f64) -> Self {
        Self {
            fps: BOOTSTRAP_FPS,
            fps_history: RingBuffer::new(FPS_HISTORY_CAPACITY),
            frame_count: 0,
            last_frame_time: start_ms,
            last_fps_update_time: start_ms,
            frame_time_ms: INITIAL_FRAME_TIME_MS,
            scene: SceneMetrics::default(),
            total_frames: 0,
            telemetry: None,
        }
    }

    /// Attach a memory usage source sampled on every frame
    pub fn with_telemetry(mut self, telemetry: Box<dyn MemoryTelemetry>) -> Self {
        self.set_telemetry(telemetry);
        self
    }

    /// Replace the memory usage source
    pub fn set_telemetry(&mut self, telemetry: Box<dyn MemoryTelemetry>) {
        self.telemetry = Some(telemetry);
    }

    /// Record a frame drawn at `now_ms`
    pub fn on_frame(&mut self, now_ms: f64) -> FrameSample {
        let delta_ms = now_ms - self.last_frame_time;
        self.last_frame_time = now_ms;
        self.frame_time_ms = delta_ms;

        self.frame_count += 1;
        self.total_frames += 1;

        let window = now_ms - self.last_fps_update_time;
        if window >= FPS_WINDOW_MS {
            self.fps = (self.frame_count as f64 * 1000.0 / window).round() as u32;
            self.fps_history.push(self.fps);
            log::trace!("fps window closed: {} frames in {:.1}ms -> {} fps", self.frame_count, window, self.fps);

            self.frame_count = 0;
            self.last_fps_update_time = now_ms;
        }

        // Missing telemetry keeps the last known value
        if let Some(mb) = self.telemetry.as_ref().and_then(|t| t.used_memory_mb()) {
            self.scene.memory_mb = Some(mb.round() as u64);
        }

        FrameSample {
            timestamp_ms: now_ms,
            delta_ms,
        }
    }

    /// Rounded mean of the FPS history, or [`BOOTSTRAP_FPS`] when empty
    pub fn average_fps(&self) -> u32 {
        if self.fps_history.is_empty() {
            return BOOTSTRAP_FPS;
        }
        let sum: u64 = self.fps_history.iter().map(|&fps| fps as u64).sum();
        (sum as f64 / self.fps_history.len() as f64).round() as u32
    }

    /// Walk the whole scene once and refresh mesh and triangle counts.
    ///
    /// Cost grows with scene size; call it far less often than per frame.
    pub fn update_scene_metrics(&mut self, scene: &SceneGraph) {
        let mut meshes = 0u32;
        let mut triangles = 0.0f64;

        scene.traverse(|node| {
            if let Some(geometry) = &node.geometry {
                meshes += 1;
                triangles += geometry.triangles();
            }
        });

        self.scene.draw_calls = meshes;
        self.scene.meshes = meshes;
        self.scene.triangles_k = (triangles / 1000.0).round() as u32;
    }

    /// Snapshot of the current metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fps: self.fps,
            avg_fps: self.average_fps(),
            frame_time_ms: self.frame_time_ms,
            draw_calls: self.scene.draw_calls,
            meshes: self.scene.meshes,
            triangles_k: self.scene.triangles_k,
            memory_mb: self.scene.memory_mb,
        }
    }

    /// Drop all FPS samples; the next average falls back to the bootstrap value
    pub fn clear_history(&mut self) {
        self.fps_history.clear();
    }

    /// FPS of the last closed window
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// FPS samples, oldest first
    pub fn fps_history(&self) -> &RingBuffer<u32> {
        &self.fps_history
    }

    /// Raw duration of the last frame in milliseconds
    pub fn frame_time_ms(&self) -> f64 {
        self.frame_time_ms
    }

    /// Scene statistics
    pub fn scene_metrics(&self) -> &SceneMetrics {
        &self.scene
    }

    /// Frames recorded since creation
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::scene::Geometry;

    fn run_frames(monitor: &mut PerformanceMonitor, start_ms: f64, frame_ms: f64, count: usize) -> f64 {
        let mut now = start_ms;
        for _ in 0..count {
            now += frame_ms;
            monitor.on_frame(now);
        }
        now
    }

    struct FakeMemory(Rc<Cell<Option<f64>>>);

    impl MemoryTelemetry for FakeMemory {
        fn used_memory_mb(&self) -> Option<f64> {
            self.0.get()
        }
    }

    #[test]
    fn test_initial_state() {
        let monitor = PerformanceMonitor::new(0.0);
        let metrics = monitor.metrics();
        assert_eq!(metrics.fps, 60);
        assert_eq!(metrics.avg_fps, 60);
        assert!((metrics.frame_time_ms - 16.67).abs() < 1e-9);
        assert_eq!(metrics.memory_mb, None);
    }

    #[test]
    fn test_empty_history_average_is_bootstrap() {
        let monitor = PerformanceMonitor::new(1234.0);
        assert!(monitor.fps_history().is_empty());
        assert_eq!(monitor.average_fps(), 60);
    }

    #[test]
    fn test_sixty_frames_in_one_second() {
        let mut monitor = PerformanceMonitor::new(0.0);
        run_frames(&mut monitor, 0.0, 1000.0 / 60.0, 60);
        let fps = monitor.fps() as i64;
        assert!((fps - 60).abs() <= 2, "fps was {}", fps);
    }

    #[test]
    fn test_frame_time_is_raw_delta() {
        let mut monitor = PerformanceMonitor::new(0.0);
        let sample = monitor.on_frame(10.0);
        assert_eq!(sample.delta_ms, 10.0);
        let sample = monitor.on_frame(45.5);
        assert_eq!(sample.delta_ms, 35.5);
        assert_eq!(monitor.frame_time_ms(), 35.5);
        assert_eq!(monitor.total_frames(), 2);
    }

    #[test]
    fn test_window_not_closed_before_500ms() {
        let mut monitor = PerformanceMonitor::new(0.0);
        monitor.on_frame(499.0);
        assert!(monitor.fps_history().is_empty());
        monitor.on_frame(500.0);
        assert_eq!(monitor.fps_history().len(), 1);
        // 2 frames over 500ms
        assert_eq!(monitor.fps(), 4);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut monitor = PerformanceMonitor::new(0.0);
        // 10 minutes at 30fps spans 1200 windows
        run_frames(&mut monitor, 0.0, 1000.0 / 30.0, 30 * 600);
        assert_eq!(monitor.fps_history().len(), FPS_HISTORY_CAPACITY);

        // long stalls close one window per frame
        let mut now = 600_000.0;
        for _ in 0..500 {
            now += 750.0;
            monitor.on_frame(now);
            assert!(monitor.fps_history().len() <= FPS_HISTORY_CAPACITY);
        }
    }

    #[test]
    fn test_average_fps_rounds_mean() {
        let mut monitor = PerformanceMonitor::new(0.0);
        run_frames(&mut monitor, 0.0, 20.0, 100);
        assert_eq!(monitor.average_fps(), 50);

        monitor.clear_history();
        assert_eq!(monitor.average_fps(), BOOTSTRAP_FPS);
    }

    #[test]
    fn test_memory_keeps_last_known_value() {
        let reading = Rc::new(Cell::new(Some(47.6)));
        let mut monitor = PerformanceMonitor::new(0.0).with_telemetry(Box::new(FakeMemory(reading.clone())));

        monitor.on_frame(16.0);
        assert_eq!(monitor.metrics().memory_mb, Some(48));

        reading.set(None);
        monitor.on_frame(32.0);
        assert_eq!(monitor.metrics().memory_mb, Some(48));
    }

    #[test]
    fn test_memory_never_fabricated() {
        let mut monitor = PerformanceMonitor::new(0.0);
        monitor.on_frame(16.0);
        assert_eq!(monitor.metrics().memory_mb, None);
    }

    #[test]
    fn test_scene_metrics_small_indexed_mesh() {
        let mut scene = SceneGraph::new();
        scene.add_mesh("Card", Geometry::indexed(100, 300), None);

        let mut monitor = PerformanceMonitor::new(0.0);
        monitor.update_scene_metrics(&scene);

        let metrics = monitor.metrics();
        assert_eq!(metrics.meshes, 1);
        assert_eq!(metrics.draw_calls, 1);
        assert_eq!(metrics.triangles_k, 0);
    }

    #[test]
    fn test_scene_metrics_mixed_geometry() {
        let mut scene = SceneGraph::new();
        let root = scene.add_group("Root", None);
        scene.add_mesh("Indexed", Geometry::indexed(2_000, 4_500), Some(root));
        scene.add_mesh("Soup", Geometry::non_indexed(3_000), Some(root));
        scene.add_group("Empty", Some(root));

        let mut monitor = PerformanceMonitor::new(0.0);
        monitor.update_scene_metrics(&scene);

        // 1500 + 1000 triangles
        let metrics = monitor.scene_metrics();
        assert_eq!(metrics.meshes, 2);
        assert_eq!(metrics.triangles_k, 3);
    }

    #[test]
    fn test_snapshot_display() {
        let snapshot = MetricsSnapshot {
            fps: 58,
            avg_fps: 59,
            frame_time_ms: 17.2345,
            draw_calls: 4,
            meshes: 4,
            triangles_k: 12,
            memory_mb: Some(64),
        };
        assert_eq!(
            snapshot.to_string(),
            "FPS 58 (avg 59) | 17.23 ms | 4 draws | 4 meshes | 12K tris | 64 MB"
        );
    }
}
