//! Window Events
//!
//! Hosts deliver resize events from their own threads. Events are
//! queued here and drained by the frame loop between frames, so viewport
//! updates never interleave with a tier reconfiguration.

use std::sync::Arc;

use glam::UVec2;
use parking_lot::RwLock;

/// Window events
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    /// Window was resized (logical pixels)
    Resized { width: u32, height: u32 },
    /// Window close was requested
    CloseRequested,
}

/// Window state
#[derive(Debug, Clone, PartialEq)]
pub struct WindowState {
    /// Current width in logical pixels
    pub width: u32,
    /// Current height in logical pixels
    pub height: u32,
    /// Scale factor (device pixel ratio), fixed at creation
    pub scale_factor: f32,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            scale_factor: 1.0,
        }
    }
}

/// Shared window handle; clones refer to the same window
#[derive(Debug, Clone, Default)]
pub struct Window {
    state: Arc<RwLock<WindowState>>,
    events: Arc<RwLock<Vec<WindowEvent>>>,
    should_close: Arc<RwLock<bool>>,
}

impl Window {
    /// Create a window with the given logical size and scale factor
    pub fn new(width: u32, height: u32, scale_factor: f32) -> Self {
        Self {
            state: Arc::new(RwLock::new(WindowState {
                width,
                height,
                scale_factor,
            })),
            ..Self::default()
        }
    }

    /// Get the current window state
    pub fn state(&self) -> WindowState {
        self.state.read().clone()
    }

    /// Get the window size
    pub fn size(&self) -> UVec2 {
        let state = self.state.read();
        UVec2::new(state.width, state.height)
    }

    /// Get the window aspect ratio
    pub fn aspect_ratio(&self) -> f32 {
        let state = self.state.read();
        state.width as f32 / state.height.max(1) as f32
    }

    /// Get the scale factor
    pub fn scale_factor(&self) -> f32 {
        self.state.read().scale_factor
    }

    /// Check if the window should close
    pub fn should_close(&self) -> bool {
        *self.should_close.read()
    }

    /// Push a window event (called by the host, from any thread)
    pub fn push_event(&self, event: WindowEvent) {
        match &event {
            WindowEvent::Resized { width, height } => {
                let mut state = self.state.write();
                state.width = *width;
                state.height = *height;
            }
            WindowEvent::CloseRequested => {
                *self.should_close.write() = true;
            }
        }

        self.events.write().push(event);
    }

    /// Take all pending events
    pub fn poll_events(&self) -> Vec<WindowEvent> {
        let mut events = self.events.write();
        std::mem::take(&mut *events)
    }
}
