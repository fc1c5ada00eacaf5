use wgpu::util::DeviceExt;

use crate::{
    data_structures::material::{
        Blending, Colour, U_COLOR_END, U_COLOR_START, U_TIME, UniformSet,
    },
    pipelines::basic::{PipelineOptions, blend_state, mk_mesh_pipeline, uniform_entry},
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PortalUniform {
    pub colour_start: [f32; 4],
    pub colour_end: [f32; 4],
    pub time: f32,
    // Uniforms require 16 byte (4 float) spacing
    pub _padding: [f32; 3],
}

impl PortalUniform {
    /// Reads `uTime`, `uColorStart` and `uColorEnd`. Missing values fall
    /// back to zero time and white.
    pub fn from_uniforms(uniforms: &UniformSet) -> Self {
        let colour = |name| {
            let [r, g, b] = uniforms.colour(name).unwrap_or(Colour::WHITE).to_linear();
            [r, g, b, 1.0]
        };
        Self {
            colour_start: colour(U_COLOR_START),
            colour_end: colour(U_COLOR_END),
            time: uniforms.float(U_TIME).unwrap_or_default(),
            _padding: [0.0; 3],
        }
    }
}

pub fn portal_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
        label: Some("portal_bind_group_layout"),
    })
}

pub fn mk_portal_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    blending: Blending,
    layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Portal Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("portal.wgsl").into()),
    };
    mk_mesh_pipeline(
        device,
        color_format,
        layout,
        camera_bind_group_layout,
        shader,
        PipelineOptions {
            label: "Portal Pipeline",
            blend: blend_state(blending),
            cull_mode: Some(wgpu::Face::Back),
            depth_write: true,
        },
    )
}

#[derive(Debug)]
pub struct PortalResources {
    pub uniform: PortalUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl PortalResources {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, uniforms: &UniformSet) -> Self {
        let uniform = PortalUniform::from_uniforms(uniforms);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Portal Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("portal_bind_group"),
        });
        Self {
            uniform,
            buffer,
            bind_group,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, uniforms: &UniformSet) {
        self.uniform = PortalUniform::from_uniforms(uniforms);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
