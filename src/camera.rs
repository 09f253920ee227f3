//! Camera, its GPU uniform and the orbit controls driving it.
//!
//! [`OrbitControls`] accumulates pointer input between frames and applies it
//! in [`OrbitControls::update`] with damping: each frame a fraction of the
//! pending rotation and pan is applied and the remainder decays, so the
//! camera glides to a stop after the pointer is released.

use std::f32::consts::PI;

use cgmath::{InnerSpace, Point3, Vector3};
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
};

use crate::render::Viewport;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Keeps the polar angle off the poles where the view matrix degenerates.
const POLAR_EPSILON: f32 = 1e-6;

/// A perspective camera looking at a target point.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fovy: cgmath::Deg<f32>,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>>(
        position: P,
        target: P,
        fovy: cgmath::Deg<f32>,
        znear: f32,
        zfar: f32,
    ) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
            up: Vector3::unit_y(),
            fovy,
            aspect: 1.0,
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> cgmath::Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * cgmath::perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }

    pub fn view_proj(&self) -> cgmath::Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).magnitude()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view_proj: cgmath::Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera) {
        self.view_position = camera.position.to_homogeneous().into();
        self.view_proj = camera.view_proj().into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Drag {
    Rotate,
    Pan,
}

/// Orbit, pan and zoom around the camera target.
///
/// Left drag rotates, right or middle drag pans and the wheel zooms.
#[derive(Debug)]
pub struct OrbitControls {
    /// Fraction of the pending motion applied per frame, `0.0` disables damping.
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    // pending azimuth and polar deltas in radians
    theta_delta: f32,
    phi_delta: f32,
    pan_offset: Vector3<f32>,
    pending_pan: (f32, f32),
    scale: f32,
    drag: Option<Drag>,
    cursor: Option<(f64, f64)>,
    viewport_height: f32,
}

impl OrbitControls {
    pub fn new(damping_factor: f32) -> Self {
        Self {
            damping_factor,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            theta_delta: 0.0,
            phi_delta: 0.0,
            pan_offset: Vector3::new(0.0, 0.0, 0.0),
            pending_pan: (0.0, 0.0),
            scale: 1.0,
            drag: None,
            cursor: None,
            viewport_height: 1.0,
        }
    }

    pub fn with_distance_limits(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    /// Rotate by a pointer movement of `dx`, `dy` pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.theta_delta -= 2.0 * PI * dx / self.viewport_height * self.rotate_speed;
        self.phi_delta -= 2.0 * PI * dy / self.viewport_height * self.rotate_speed;
    }

    /// Pan by a pointer movement of `dx`, `dy` pixels. Converted to world
    /// units on the next [`update`](Self::update).
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pending_pan.0 += dx * self.pan_speed;
        self.pending_pan.1 += dy * self.pan_speed;
    }

    /// Positive steps move towards the target.
    pub fn zoom(&mut self, steps: f32) {
        self.scale *= 0.95f32.powf(self.zoom_speed * steps);
    }

    /// Feed a window event; returns whether the controls used it.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let drag = match button {
                    MouseButton::Left => Drag::Rotate,
                    MouseButton::Right | MouseButton::Middle => Drag::Pan,
                    _ => return false,
                };
                match state {
                    ElementState::Pressed => self.drag = Some(drag),
                    ElementState::Released if self.drag == Some(drag) => self.drag = None,
                    ElementState::Released => (),
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x, position.y);
                let moved = match (self.drag, self.cursor) {
                    (Some(drag), Some((last_x, last_y))) => {
                        let (dx, dy) = ((x - last_x) as f32, (y - last_y) as f32);
                        match drag {
                            Drag::Rotate => self.rotate(dx, dy),
                            Drag::Pan => self.pan(dx, dy),
                        }
                        true
                    }
                    _ => false,
                };
                self.cursor = Some((x, y));
                moved
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                false
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    // roughly one line per 50 pixels
                    MouseScrollDelta::PixelDelta(p) => (p.y / 50.0) as f32,
                };
                self.zoom(steps);
                true
            }
            WindowEvent::Resized(PhysicalSize { height, .. }) => {
                self.set_viewport_height(*height);
                false
            }
            _ => false,
        }
    }

    /// Apply the pending motion to `camera`. Called once per frame.
    ///
    /// Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let before = (camera.position, camera.target);
        let offset = camera.position - camera.target;
        let mut radius = offset.magnitude();

        let (mut theta, mut phi) = if radius > 0.0 {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        } else {
            (0.0, PI / 2.0)
        };
        phi = phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

        if self.pending_pan != (0.0, 0.0) {
            // Screen axes from the orbit angles, defined even straight above the target
            let right = Vector3::new(theta.cos(), 0.0, -theta.sin());
            let towards_camera = Vector3::new(
                phi.sin() * theta.sin(),
                phi.cos(),
                phi.sin() * theta.cos(),
            );
            let up = towards_camera.cross(right);
            // world units covered by one pixel at the target distance
            let half_fov = cgmath::Rad::from(camera.fovy).0 / 2.0;
            let per_pixel = 2.0 * radius * half_fov.tan() / self.viewport_height;
            let (dx, dy) = self.pending_pan;
            self.pan_offset += -right * dx * per_pixel + up * dy * per_pixel;
            self.pending_pan = (0.0, 0.0);
        }

        let damped = self.damping_factor > 0.0;
        let applied = if damped { self.damping_factor } else { 1.0 };
        theta += self.theta_delta * applied;
        phi += self.phi_delta * applied;
        phi = phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);

        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        camera.target += self.pan_offset * applied;

        let sin_phi = phi.sin();
        let offset = Vector3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.position = camera.target + offset;

        if damped {
            let decay = 1.0 - self.damping_factor;
            self.theta_delta *= decay;
            self.phi_delta *= decay;
            self.pan_offset *= decay;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            self.pan_offset = Vector3::new(0.0, 0.0, 0.0);
        }
        self.scale = 1.0;

        const EPS: f32 = 1e-6;
        (camera.position - before.0).magnitude2() > EPS || (camera.target - before.1).magnitude2() > EPS
    }
}

/// The camera together with the controls moving it.
#[derive(Debug)]
pub struct ViewportController {
    pub camera: Camera,
    pub controls: OrbitControls,
}

impl ViewportController {
    pub fn new(camera: Camera, controls: OrbitControls) -> Self {
        Self { camera, controls }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.resize(width, height);
        self.controls.set_viewport_height(height);
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        if let WindowEvent::Resized(size) = event {
            self.resize(size.width, size.height);
            return false;
        }
        self.controls.handle_window_event(event)
    }
}

impl Viewport for ViewportController {
    fn update(&mut self) {
        self.controls.update(&mut self.camera);
    }

    fn camera(&self) -> &Camera {
        &self.camera
    }
}
