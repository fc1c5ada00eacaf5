use wgpu::util::DeviceExt;

use crate::data_structures::{
    instance::SpriteRaw,
    material::{ShaderMaterial, U_PIXEL_RATIO, U_SIZE, U_TIME, UniformSet},
    model::Vertex,
    particles::ParticleField,
    texture::Texture,
};

use super::basic::{PipelineOptions, blend_state, mk_render_pipeline, uniform_entry};

/// Vertices emitted per sprite quad.
pub const SPRITE_VERTICES: u32 = 6;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FirefliesUniform {
    pub time: f32,
    pub pixel_ratio: f32,
    pub size: f32,
    pub _padding: f32,
    /// Drawing buffer size in pixels.
    pub resolution: [f32; 2],
    pub _padding2: [f32; 2],
}

impl FirefliesUniform {
    pub fn from_uniforms(uniforms: &UniformSet, resolution: [f32; 2]) -> Self {
        Self {
            time: uniforms.float(U_TIME).unwrap_or_default(),
            pixel_ratio: uniforms.float(U_PIXEL_RATIO).unwrap_or(1.0),
            size: uniforms.float(U_SIZE).unwrap_or_default(),
            _padding: 0.0,
            resolution,
            _padding2: [0.0; 2],
        }
    }
}

pub fn fireflies_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[uniform_entry(
            0,
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        )],
        label: Some("fireflies_bind_group_layout"),
    })
}

/**
 * Sprites are camera-facing quads expanded in the vertex shader from the
 * vertex index, one instance per firefly. They blend additively and test
 * against the depth buffer without writing to it.
 */
pub fn mk_fireflies_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    material: &ShaderMaterial,
    layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Fireflies Pipeline Layout"),
        bind_group_layouts: &[layout, camera_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Fireflies Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("fireflies.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &render_pipeline_layout,
        color_format,
        Some(Texture::DEPTH_FORMAT),
        &[SpriteRaw::desc()],
        shader,
        PipelineOptions {
            label: "Fireflies Pipeline",
            blend: blend_state(material.blending),
            cull_mode: None,
            depth_write: material.depth_write,
        },
    )
}

#[derive(Debug)]
pub struct FirefliesResources {
    pub uniform: FirefliesUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub sprite_buffer: wgpu::Buffer,
    pub count: u32,
}

impl FirefliesResources {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniforms: &UniformSet,
        field: &ParticleField,
        resolution: [f32; 2],
    ) -> Self {
        let uniform = FirefliesUniform::from_uniforms(uniforms, resolution);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Fireflies Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("fireflies_bind_group"),
        });
        let sprites = field.to_raw();
        let sprite_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Fireflies Sprite Buffer"),
            contents: bytemuck::cast_slice(&sprites),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self {
            uniform,
            buffer,
            bind_group,
            sprite_buffer,
            count: sprites.len() as u32,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, uniforms: &UniformSet, resolution: [f32; 2]) {
        self.uniform = FirefliesUniform::from_uniforms(uniforms, resolution);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
