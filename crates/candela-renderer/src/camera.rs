//! Camera
//!
//! Perspective camera orbiting the card. The starting position is read once
//! from the key-value store; the defaults double as the contract checked by
//! the diagnostic harness.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use candela_platform::KeyValueStore;
use candela_platform::storage::read_json;

/// Starting position used when nothing valid is stored
pub const DEFAULT_CAMERA_POSITION: Vec3 = Vec3::new(8.6169, 13.9496, -0.2345);

/// Storage key of the persisted starting position
pub const CAMERA_STORAGE_KEY: &str = "startingCameraPos";

/// Tolerance for position and target comparisons
pub const POSITION_TOLERANCE: f32 = 0.001;

/// Tolerance for zoom comparisons
pub const ZOOM_TOLERANCE: f32 = 0.01;

/// Vertical field of view in degrees
pub const DEFAULT_FOV_DEGREES: f32 = 39.0;

const NEAR_PLANE: f32 = 0.1;
const FAR_PLANE: f32 = 1000.0;

/// Persisted camera position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl SavedPosition {
    fn to_vec3(self) -> Option<Vec3> {
        let position = Vec3::new(self.x, self.y, self.z);
        position.is_finite().then_some(position)
    }
}

impl From<Vec3> for SavedPosition {
    fn from(v: Vec3) -> Self {
        Self { x: v.x, y: v.y, z: v.z }
    }
}

/// Perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Field of view in degrees
    pub fov_degrees: f32,
    /// Viewport aspect ratio
    pub aspect: f32,
    /// Near clip plane
    pub near: f32,
    /// Far clip plane
    pub far: f32,
    /// World position
    pub position: Vec3,
    /// Orbit target
    pub target: Vec3,
    /// Zoom factor, narrows the effective field of view
    pub zoom: f32,
}

impl Camera {
    /// Camera at the default starting position
    pub fn new(aspect: f32) -> Self {
        Self {
            fov_degrees: DEFAULT_FOV_DEGREES,
            aspect,
            near: NEAR_PLANE,
            far: FAR_PLANE,
            position: DEFAULT_CAMERA_POSITION,
            target: Vec3::ZERO,
            zoom: 1.0,
        }
    }

    /// Camera at the stored starting position.
    ///
    /// Falls back to the default position when the key is absent, the value
    /// does not decode, or a coordinate is not finite.
    pub fn from_store(store: &dyn KeyValueStore, aspect: f32) -> Self {
        let mut camera = Self::new(aspect);

        match read_json::<SavedPosition>(store, CAMERA_STORAGE_KEY) {
            Ok(Some(saved)) => match saved.to_vec3() {
                Some(position) => {
                    log::debug!("Camera start position from store: {}", position);
                    camera.position = position;
                }
                None => log::warn!("Ignoring non-finite stored camera position {:?}", saved),
            },
            Ok(None) => {}
            Err(err) => log::warn!("Ignoring stored camera position: {}", err),
        }

        camera
    }

    /// Update the aspect ratio
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
    }

    /// Azimuth and polar angle (radians) of the position around the target.
    ///
    /// Azimuth is measured from +Z toward +X, polar from +Y.
    pub fn orbital_angles(&self) -> (f32, f32) {
        let offset = self.position - self.target;
        let radius = offset.length();
        if radius == 0.0 {
            return (0.0, 0.0);
        }
        let azimuth = offset.x.atan2(offset.z);
        let polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
        (azimuth, polar)
    }

    /// Effective vertical field of view in degrees after zoom
    pub fn effective_fov_degrees(&self) -> f32 {
        let half = (self.fov_degrees.to_radians() * 0.5).tan() / self.zoom;
        (2.0 * half.atan()).to_degrees()
    }

    /// View matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    /// Projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.effective_fov_degrees().to_radians(), self.aspect, self.near, self.far)
    }

    /// Snapshot for inspection
    pub fn state(&self) -> CameraState {
        CameraState {
            position: self.position,
            target: self.target,
            zoom: self.zoom,
        }
    }
}

/// Camera snapshot exposed to test harnesses
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraState {
    pub position: Vec3,
    pub target: Vec3,
    pub zoom: f32,
}

/// One comparison against the camera defaults
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultCheck {
    pub name: &'static str,
    pub expected: f32,
    pub actual: f32,
    pub tolerance: f32,
    pub passed: bool,
}

impl DefaultCheck {
    fn new(name: &'static str, expected: f32, actual: f32, tolerance: f32) -> Self {
        Self {
            name,
            expected,
            actual,
            tolerance,
            passed: (actual - expected).abs() < tolerance,
        }
    }
}

impl CameraState {
    /// Compare every field against the defaults
    pub fn check_defaults(&self) -> Vec<DefaultCheck> {
        vec![
            DefaultCheck::new("position.x", DEFAULT_CAMERA_POSITION.x, self.position.x, POSITION_TOLERANCE),
            DefaultCheck::new("position.y", DEFAULT_CAMERA_POSITION.y, self.position.y, POSITION_TOLERANCE),
            DefaultCheck::new("position.z", DEFAULT_CAMERA_POSITION.z, self.position.z, POSITION_TOLERANCE),
            DefaultCheck::new("target.x", 0.0, self.target.x, POSITION_TOLERANCE),
            DefaultCheck::new("target.y", 0.0, self.target.y, POSITION_TOLERANCE),
            DefaultCheck::new("target.z", 0.0, self.target.z, POSITION_TOLERANCE),
            DefaultCheck::new("zoom", 1.0, self.zoom, ZOOM_TOLERANCE),
        ]
    }

    /// Whether the camera sits at its default position, target and zoom
    pub fn matches_defaults(&self) -> bool {
        self.check_defaults().iter().all(|check| check.passed)
    }
}
