//! Camera, projection and a damped orbit controller.
//!
//! [`CameraRig`] is the CPU side (where the camera is and how it moves);
//! [`CameraResources`] owns the uniform buffer the shaders read.

use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use wgpu::util::DeviceExt;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

// keeps the orbit away from the poles where the up vector degenerates
const POLAR_EPSILON: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Camera {
    pub fn new<P: Into<Point3<f32>>, T: Into<Point3<f32>>>(position: P, target: T) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, Vector3::unit_y())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: f32, height: f32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: aspect(width, height),
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.aspect = aspect(width, height);
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

fn aspect(width: f32, height: f32) -> f32 {
    if height > 0.0 { width / height } else { 1.0 }
}

/// Orbit controls with exponential damping.
///
/// Input only accumulates rotation into a pending delta; [`update`](Self::update)
/// applies `damping` of the pending delta each frame and keeps the rest for
/// the following frames, so the camera eases out after the pointer stops.
#[derive(Clone, Debug)]
pub struct OrbitController {
    damping: f32,
    rotate_speed: f32,
    zoom_speed: f32,
    min_distance: f32,
    max_distance: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    dragging: bool,
    last_cursor: Option<(f64, f64)>,
    viewport_height: f32,
}

impl OrbitController {
    pub fn new(damping: f32, viewport_height: f32) -> Self {
        Self {
            damping: damping.clamp(0.0, 1.0),
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 1.0,
            max_distance: 50.0,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            dragging: false,
            last_cursor: None,
            viewport_height: viewport_height.max(1.0),
        }
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height.max(1.0);
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => self.begin_drag(),
                ElementState::Released => self.end_drag(),
            },
            WindowEvent::CursorMoved { position, .. } => self.cursor_moved(position.x, position.y),
            WindowEvent::CursorLeft { .. } => self.end_drag(),
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 50.0,
                };
                self.zoom(lines);
            }
            _ => (),
        }
    }

    pub fn begin_drag(&mut self) {
        self.dragging = true;
    }

    pub fn end_drag(&mut self) {
        self.dragging = false;
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        if let (true, Some((last_x, last_y))) = (self.dragging, self.last_cursor) {
            let dx = (x - last_x) as f32;
            let dy = (y - last_y) as f32;
            self.rotate(
                TAU * dx / self.viewport_height * self.rotate_speed,
                TAU * dy / self.viewport_height * self.rotate_speed,
            );
        }
        self.last_cursor = Some((x, y));
    }

    /// Queues a rotation; positive `left` orbits to the left, positive `up`
    /// towards the top pole.
    pub fn rotate(&mut self, left: f32, up: f32) {
        self.delta_theta -= left;
        self.delta_phi -= up;
    }

    /// Positive values move the camera closer.
    pub fn zoom(&mut self, lines: f32) {
        let factor = 0.95f32.powf(self.zoom_speed * lines.abs());
        if lines > 0.0 {
            self.scale *= factor;
        } else if lines < 0.0 {
            self.scale /= factor;
        }
    }

    pub fn is_settled(&self) -> bool {
        self.delta_theta.abs() < 1e-6 && self.delta_phi.abs() < 1e-6 && self.scale == 1.0
    }

    /// Advances the damping state by one frame and moves the camera.
    pub fn update(&mut self, camera: &mut Camera) {
        let offset = camera.position - camera.target;
        let mut radius = offset.magnitude();
        if radius <= f32::EPSILON {
            return;
        }
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

        theta += self.delta_theta * self.damping;
        phi += self.delta_phi * self.damping;
        phi = phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        let sin_phi = phi.sin();
        let offset = Vector3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        camera.position = camera.target + offset;

        self.delta_theta *= 1.0 - self.damping;
        self.delta_phi *= 1.0 - self.damping;
        self.scale = 1.0;
    }
}

/// CPU-side camera state driven by the animation loop.
#[derive(Clone, Debug)]
pub struct CameraRig {
    pub camera: Camera,
    pub projection: Projection,
    pub controller: OrbitController,
}

impl CameraRig {
    pub fn resize(&mut self, width: f32, height: f32) {
        self.projection.resize(width, height);
        self.controller.set_viewport_height(height);
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    view_position: [f32; 4],
    view: [[f32; 4]; 4],
    view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view_position: [0.0; 4],
            view: Matrix4::identity().into(),
            view_proj: Matrix4::identity().into(),
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view_position = camera.position.to_homogeneous().into();
        let view = camera.calc_matrix();
        self.view = view.into();
        self.view_proj = (projection.calc_matrix() * view).into();
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, rig: &CameraRig) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(&rig.camera, &rig.projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, rig: &CameraRig) {
        self.uniform.update_view_proj(&rig.camera, &rig.projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distance(camera: &Camera) -> f32 {
        (camera.position - camera.target).magnitude()
    }

    #[test]
    fn update_without_input_keeps_camera_still() {
        let mut camera = Camera::new((9.0, 5.0, 9.0), (0.0, 0.0, 0.0));
        let mut controller = OrbitController::new(0.05, 600.0);
        let before = camera.position;
        controller.update(&mut camera);
        assert!((camera.position - before).magnitude() < 1e-4);
    }

    #[test]
    fn rotation_eases_out_over_several_frames() {
        let mut camera = Camera::new((9.0, 5.0, 9.0), (0.0, 0.0, 0.0));
        let mut controller = OrbitController::new(0.05, 600.0);
        let radius = distance(&camera);
        controller.rotate(1.0, 0.0);

        let mut last = camera.position;
        let mut steps = Vec::new();
        for _ in 0..5 {
            controller.update(&mut camera);
            steps.push((camera.position - last).magnitude());
            last = camera.position;
        }
        assert!(steps.windows(2).all(|w| w[1] < w[0]));
        assert!((distance(&camera) - radius).abs() < 1e-3);
        assert!(!controller.is_settled());
    }

    #[test]
    fn zoom_moves_closer_within_limits() {
        let mut camera = Camera::new((0.0, 0.0, 10.0), (0.0, 0.0, 0.0));
        let mut controller = OrbitController::new(0.05, 600.0);
        controller.zoom(1.0);
        controller.update(&mut camera);
        assert!(distance(&camera) < 10.0);
        for _ in 0..500 {
            controller.zoom(10.0);
            controller.update(&mut camera);
        }
        assert!((distance(&camera) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn projection_aspect_follows_resize() {
        let mut projection = Projection::new(800.0, 600.0, cgmath::Deg(45.0), 0.1, 100.0);
        projection.resize(1920.0, 1080.0);
        assert!((projection.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
        projection.resize(100.0, 0.0);
        assert_eq!(projection.aspect(), 1.0);
    }
}
