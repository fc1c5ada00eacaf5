use crate::{
    data_structures::{
        material::{BakedMaterial, Blending},
        texture::{Texture, create_default_sampler},
    },
    pipelines::basic::{PipelineOptions, blend_state, mk_mesh_pipeline},
};

pub fn baked_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            texture_entry(0),
            texture_entry(1),
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("baked_bind_group_layout"),
    })
}

pub fn mk_baked_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    material: &BakedMaterial,
    layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Baked Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("baked.wgsl").into()),
    };
    mk_mesh_pipeline(
        device,
        color_format,
        layout,
        camera_bind_group_layout,
        shader,
        PipelineOptions {
            label: "Baked Pipeline",
            blend: blend_state(material.blending),
            cull_mode: if material.double_sided {
                None
            } else {
                Some(wgpu::Face::Back)
            },
            // transparent surfaces still occlude, like the opaque ones
            depth_write: true,
        },
    )
}

/// Lightmap and alpha mask of the baked material, bound together.
#[derive(Debug)]
pub struct BakedResources {
    pub colour_map: Texture,
    pub alpha_map: Texture,
    pub bind_group: wgpu::BindGroup,
    pub blending: Blending,
}

impl BakedResources {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        material: &BakedMaterial,
        colour_map: Texture,
        alpha_map: Texture,
    ) -> Self {
        let sampler = colour_map
            .sampler
            .clone()
            .unwrap_or_else(|| create_default_sampler(device));
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&colour_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&alpha_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some("baked_bind_group"),
        });
        Self {
            colour_map,
            alpha_map,
            bind_group,
            blending: material.blending,
        }
    }
}
