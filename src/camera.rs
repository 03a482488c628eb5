//! Orbit camera state shared with the host renderer.
//!
//! The host owns the actual projection and input handling; the choreography
//! only needs the camera distance (to size text and the heart) and, once the
//! heart is up, the zoom position inside the orbit limits (to spread the
//! heart apart when the viewer zooms in).
//!
//! | Host side | Call |
//! |-----------|------|
//! | Drag input | `experience.camera_mut().orbit(dx, dy)` |
//! | Wheel / pinch | `experience.camera_mut().zoom_to(d)` |
//! | Point renderer | `experience.camera().view_matrix()` |

use crate::heart::visible_height;
use glam::{Mat4, Vec3};
use std::f32::consts::FRAC_PI_2;

const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Orbit camera looking at the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraRig {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    /// Whether the viewer may orbit and zoom.
    pub controls_enabled: bool,
}

impl CameraRig {
    /// Camera on the +Z axis at `distance`, user controls off.
    pub fn new(distance: f32, fov_degrees: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance,
            target: Vec3::ZERO,
            fov_degrees,
            min_distance: 90.0,
            max_distance: 380.0,
            controls_enabled: false,
        }
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// World-space height visible at the current distance.
    pub fn visible_height(&self) -> f32 {
        visible_height(self.distance, self.fov_degrees)
    }

    /// Where the distance sits between the orbit limits, 0 (near) to 1 (far).
    pub fn zoom_fraction(&self) -> f32 {
        let span = (self.max_distance - self.min_distance).max(0.001);
        ((self.distance - self.min_distance) / span).clamp(0.0, 1.0)
    }

    /// Move in front of a heart of the given height and enable controls with
    /// limits around that distance.
    pub fn frame_heart(&mut self, heart_height: f32) {
        let distance = (heart_height * 1.35).max(120.0);
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.target = Vec3::ZERO;
        self.distance = distance;
        self.min_distance = distance * 0.55;
        self.max_distance = distance * 1.7;
        self.controls_enabled = true;
    }

    /// Viewer drag, in radians. Pitch stops short of the poles. Ignored
    /// while controls are disabled.
    pub fn orbit(&mut self, d_yaw: f32, d_pitch: f32) {
        if self.controls_enabled {
            self.yaw += d_yaw;
            self.pitch = (self.pitch + d_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        }
    }

    /// Viewer zoom. Ignored while controls are disabled.
    pub fn zoom_to(&mut self, distance: f32) {
        if self.controls_enabled {
            self.distance = distance.clamp(self.min_distance, self.max_distance);
        }
    }
}
