use wgpu::util::DeviceExt;

use crate::{
    data_structures::material::{Blending, Colour},
    pipelines::basic::{PipelineOptions, blend_state, mk_mesh_pipeline, uniform_entry},
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EmissiveUniform {
    pub colour: [f32; 4],
}

impl From<Colour> for EmissiveUniform {
    fn from(colour: Colour) -> Self {
        let [r, g, b] = colour.to_linear();
        Self {
            colour: [r, g, b, 1.0],
        }
    }
}

pub fn emissive_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
        label: Some("emissive_bind_group_layout"),
    })
}

pub fn mk_emissive_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Emissive Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("emissive.wgsl").into()),
    };
    mk_mesh_pipeline(
        device,
        color_format,
        layout,
        camera_bind_group_layout,
        shader,
        PipelineOptions {
            label: "Emissive Pipeline",
            blend: blend_state(Blending::Opaque),
            cull_mode: Some(wgpu::Face::Back),
            depth_write: true,
        },
    )
}

/// Uniform buffer and bind group of one flat-colour material.
#[derive(Debug)]
pub struct EmissiveResources {
    pub uniform: EmissiveUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl EmissiveResources {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        colour: Colour,
        label: &str,
    ) -> Self {
        let uniform = EmissiveUniform::from(colour);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} Emissive Buffer", label)),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some(&format!("{}_emissive_bind_group", label)),
        });
        Self {
            uniform,
            buffer,
            bind_group,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, colour: Colour) {
        let uniform = EmissiveUniform::from(colour);
        if uniform != self.uniform {
            self.uniform = uniform;
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
        }
    }
}
