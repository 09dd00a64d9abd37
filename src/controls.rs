use glam::Vec3;
use std::f32::consts::PI;

use crate::camera::PerspectiveCamera;
use crate::core::{Button, Controller};

const POLAR_EPSILON: f32 = 1e-6;
/// Radius multiplier per wheel line at zoom speed 1
const ZOOM_STEP: f32 = 0.95;

/// Orbit the camera around a target: left drag rotates, right drag (or
/// shift/ctrl + left) pans, wheel or middle drag zooms.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enabled: bool,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enabled: true,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
        }
    }

    /// Bind to a camera, orbiting whatever it currently looks at
    pub fn for_camera(camera: &PerspectiveCamera) -> Self {
        Self::new(camera.target)
    }

    /// Consume this frame's pointer input. Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera, input: &dyn Controller, viewport_height: f32) -> bool {
        if !self.enabled || viewport_height <= 0.0 {
            return false;
        }

        let (dx, dy) = input.pointer_delta();
        let wheel = input.wheel_delta();
        let modifier = input.is_down(Button::Shift) || input.is_down(Button::Control);
        let mut moved = false;

        if dx != 0.0 || dy != 0.0 {
            if input.is_down(Button::MouseRight) || (input.is_down(Button::MouseLeft) && modifier) {
                self.pan(camera, dx, dy, viewport_height);
                moved = true;
            } else if input.is_down(Button::MouseLeft) {
                let theta = -2.0 * PI * dx / viewport_height * self.rotate_speed;
                let phi = -2.0 * PI * dy / viewport_height * self.rotate_speed;
                self.rotate(camera, theta, phi);
                moved = true;
            } else if input.is_down(Button::MouseMiddle) && dy != 0.0 {
                // drag down pulls the camera back
                self.dolly(camera, self.zoom_scale().powf(-dy.signum()));
                moved = true;
            }
        }

        if wheel != 0.0 {
            self.dolly(camera, self.zoom_scale().powf(wheel));
            moved = true;
        }

        moved
    }

    fn zoom_scale(&self) -> f32 {
        ZOOM_STEP.powf(self.zoom_speed)
    }

    /// Rotate around the target by azimuth `d_theta` and polar `d_phi` radians
    pub fn rotate(&mut self, camera: &mut PerspectiveCamera, d_theta: f32, d_phi: f32) {
        self.apply(camera, d_theta, d_phi, 1.0);
    }

    /// Scale the distance to the target (< 1 moves closer)
    pub fn dolly(&mut self, camera: &mut PerspectiveCamera, scale: f32) {
        self.apply(camera, 0.0, 0.0, scale);
    }

    /// Move target and camera together in the screen plane by a pixel delta
    pub fn pan(&mut self, camera: &mut PerspectiveCamera, dx: f32, dy: f32, viewport_height: f32) {
        let offset = camera.position - self.target;
        let target_distance = offset.length() * (camera.fov.to_radians() * 0.5).tan();

        let right = camera.right();
        let up = right.cross(camera.forward()).normalize_or_zero();

        let left_amount = 2.0 * dx * target_distance / viewport_height * self.pan_speed;
        let up_amount = 2.0 * dy * target_distance / viewport_height * self.pan_speed;

        let pan_offset = -right * left_amount + up * up_amount;
        self.target += pan_offset;
        camera.position += pan_offset;
        camera.look_at(self.target);
    }

    fn apply(&mut self, camera: &mut PerspectiveCamera, d_theta: f32, d_phi: f32, scale: f32) {
        let offset = camera.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }

        let theta = offset.x.atan2(offset.z) + d_theta;
        let phi = ((offset.y / radius).clamp(-1.0, 1.0).acos() + d_phi).clamp(
            self.min_polar_angle.max(POLAR_EPSILON),
            self.max_polar_angle.min(PI - POLAR_EPSILON),
        );
        let radius = (radius * scale).clamp(self.min_distance, self.max_distance);

        let sin_phi = phi.sin();
        camera.position = self.target
            + Vec3::new(
                radius * sin_phi * theta.sin(),
                radius * phi.cos(),
                radius * sin_phi * theta.cos(),
            );
        camera.look_at(self.target);
    }
}
