//! Render composition and pipeline batching.
//!
//! The live scene is turned into a [`Render`] tree every frame. `Render` sorts
//! the draws into one batch per pipeline, and the batches are recorded in a
//! fixed order: flat-colour meshes first, then the alpha-blended baked mesh,
//! the portal, and the additive firefly sprites last.
//!
//! # Key types
//!
//! - [`Render<'a>`] describes what to draw with which material
//! - [`Instanced<'a>`] is a mesh plus its per-node instance buffer
//! - [`Sprites<'a>`] is the instanced sprite buffer of the particle field
//! - [`SceneRenderer`] owns every pipeline and GPU-side material resource
//!

use anyhow::anyhow;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        material::{BakedMaterial, Colour, Material, MaterialHandle, MaterialRegistry, Role, ShaderMaterial},
        model::{DrawMesh, Mesh},
        particles::ParticleField,
        texture::Texture,
    },
    pipelines::{
        baked::{BakedResources, baked_layout, mk_baked_pipeline},
        emissive::{EmissiveResources, emissive_layout, mk_emissive_pipeline},
        fireflies::{FirefliesResources, SPRITE_VERTICES, fireflies_layout, mk_fireflies_pipeline},
        portal::{PortalResources, mk_portal_pipeline, portal_layout},
    },
    scene::LiveScene,
};

/// A mesh drawn with the instance buffer of the node it belongs to.
pub struct Instanced<'a> {
    pub instance: &'a wgpu::Buffer,
    pub mesh: &'a Mesh,
    pub amount: u32,
}

pub struct Sprites<'a> {
    pub sprites: &'a wgpu::Buffer,
    pub amount: u32,
}

/// Specifies how part of the scene should be rendered.
///
/// - `None` renders nothing
/// - `Baked`, `Lamp`, `Paper` and `Portal` draw a mesh with that role's material
/// - `Fireflies` draws the particle field
/// - `Composed(Vec<Render>)` recursively renders a composition of renders
pub enum Render<'a> {
    None,
    Baked(Instanced<'a>),
    Lamp(Instanced<'a>),
    Paper(Instanced<'a>),
    Portal(Instanced<'a>),
    Fireflies(Sprites<'a>),
    Composed(Vec<Render<'a>>),
}

/// Draws collected per pipeline.
#[derive(Default)]
pub struct Batches<'a> {
    pub lamps: Vec<Instanced<'a>>,
    pub papers: Vec<Instanced<'a>>,
    pub baked: Vec<Instanced<'a>>,
    pub portal: Vec<Instanced<'a>>,
    pub fireflies: Vec<Sprites<'a>>,
}

impl<'a> Render<'a> {
    fn instanced(role: Role, instanced: Instanced<'a>) -> Self {
        match role {
            Role::Baked => Render::Baked(instanced),
            Role::Lamp => Render::Lamp(instanced),
            Role::Paper => Render::Paper(instanced),
            Role::Portal => Render::Portal(instanced),
        }
    }

    pub(crate) fn set_pipelines(self, batches: &mut Batches<'a>) {
        match self {
            Render::Baked(instanced) => batches.baked.push(instanced),
            Render::Lamp(instanced) => batches.lamps.push(instanced),
            Render::Paper(instanced) => batches.papers.push(instanced),
            Render::Portal(instanced) => batches.portal.push(instanced),
            Render::Fireflies(sprites) => batches.fireflies.push(sprites),
            Render::Composed(renders) => renders
                .into_iter()
                .for_each(|render| render.set_pipelines(batches)),
            Render::None => (),
        }
    }
}

/// GPU copy of one bound node: its meshes and its world transform.
#[derive(Debug)]
struct GpuNode {
    role: Role,
    instance_buffer: wgpu::Buffer,
    meshes: Vec<Mesh>,
}

#[derive(Debug)]
struct GpuAsset {
    generation: u64,
    nodes: Vec<GpuNode>,
}

#[derive(Debug)]
pub struct SceneRenderer {
    baked_pipeline: wgpu::RenderPipeline,
    emissive_pipeline: wgpu::RenderPipeline,
    portal_pipeline: wgpu::RenderPipeline,
    fireflies_pipeline: wgpu::RenderPipeline,
    baked: BakedResources,
    lamp: EmissiveResources,
    paper: EmissiveResources,
    portal: PortalResources,
    fireflies: FirefliesResources,
    asset: Option<GpuAsset>,
}

fn baked_material(handle: &MaterialHandle) -> anyhow::Result<BakedMaterial> {
    match &*handle.borrow() {
        Material::Baked(baked) => Ok(baked.clone()),
        other => Err(anyhow!("Expected a baked material, found {:?}", other)),
    }
}

fn shader_material(handle: &MaterialHandle) -> anyhow::Result<ShaderMaterial> {
    match &*handle.borrow() {
        Material::Shader(shader) => Ok(shader.clone()),
        other => Err(anyhow!("Expected a shader material, found {:?}", other)),
    }
}

fn emissive_colour(handle: &MaterialHandle) -> Colour {
    match &*handle.borrow() {
        Material::Emissive { colour } => *colour,
        _ => Colour::WHITE,
    }
}

impl SceneRenderer {
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        camera_bind_group_layout: &wgpu::BindGroupLayout,
        registry: &MaterialRegistry,
        colour_map: Texture,
        alpha_map: Texture,
        particles: &ParticleField,
        resolution: [f32; 2],
    ) -> anyhow::Result<Self> {
        let baked = baked_material(registry.baked())?;
        let portal = shader_material(registry.portal())?;
        let fireflies = shader_material(registry.fireflies())?;

        let baked_layout = baked_layout(device);
        let emissive_layout = emissive_layout(device);
        let portal_layout = portal_layout(device);
        let fireflies_layout = fireflies_layout(device);

        Ok(Self {
            baked_pipeline: mk_baked_pipeline(
                device,
                color_format,
                &baked,
                &baked_layout,
                camera_bind_group_layout,
            ),
            emissive_pipeline: mk_emissive_pipeline(
                device,
                color_format,
                &emissive_layout,
                camera_bind_group_layout,
            ),
            portal_pipeline: mk_portal_pipeline(
                device,
                color_format,
                portal.blending,
                &portal_layout,
                camera_bind_group_layout,
            ),
            fireflies_pipeline: mk_fireflies_pipeline(
                device,
                color_format,
                &fireflies,
                &fireflies_layout,
                camera_bind_group_layout,
            ),
            baked: BakedResources::new(device, &baked_layout, &baked, colour_map, alpha_map),
            lamp: EmissiveResources::new(
                device,
                &emissive_layout,
                emissive_colour(registry.lamp()),
                "lamp",
            ),
            paper: EmissiveResources::new(
                device,
                &emissive_layout,
                emissive_colour(registry.paper()),
                "paper",
            ),
            portal: PortalResources::new(device, &portal_layout, &portal.uniforms),
            fireflies: FirefliesResources::new(
                device,
                &fireflies_layout,
                &fireflies.uniforms,
                particles,
                resolution,
            ),
            asset: None,
        })
    }

    /// Uploads the bound asset when the live scene attached a new one.
    pub fn sync_asset(&mut self, device: &wgpu::Device, scene: &LiveScene, registry: &MaterialRegistry) {
        if self.asset.as_ref().map(|a| a.generation) == Some(scene.generation()) {
            return;
        }
        let Some(asset) = scene.asset().asset() else {
            self.asset = None;
            return;
        };

        let nodes: Vec<GpuNode> = asset
            .drawables()
            .into_iter()
            .filter_map(|node| {
                let role = node.material.as_ref().and_then(|m| registry.role_of(m))?;
                let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Instance Buffer", node.name)),
                    contents: bytemuck::cast_slice(&[node.world.to_raw()]),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                Some(GpuNode {
                    role,
                    instance_buffer,
                    meshes: node.meshes.iter().map(|mesh| mesh.upload(device)).collect(),
                })
            })
            .collect();
        log::info!("Uploaded {} bound nodes to the GPU", nodes.len());

        self.asset = Some(GpuAsset {
            generation: scene.generation(),
            nodes,
        });
    }

    /// Copies the current uniform values of every material to the GPU.
    pub fn write_uniforms(&mut self, queue: &wgpu::Queue, registry: &MaterialRegistry, resolution: [f32; 2]) {
        if let Some(uniforms) = registry.portal().borrow().uniforms() {
            self.portal.write(queue, uniforms);
        }
        if let Some(uniforms) = registry.fireflies().borrow().uniforms() {
            self.fireflies.write(queue, uniforms, resolution);
        }
        self.lamp.write(queue, emissive_colour(registry.lamp()));
        self.paper.write(queue, emissive_colour(registry.paper()));
    }

    pub fn on_render(&self) -> Render<'_> {
        let mut renders = Vec::new();
        if let Some(asset) = &self.asset {
            for node in &asset.nodes {
                for mesh in &node.meshes {
                    renders.push(Render::instanced(
                        node.role,
                        Instanced {
                            instance: &node.instance_buffer,
                            mesh,
                            amount: 1,
                        },
                    ));
                }
            }
        }
        renders.push(Render::Fireflies(Sprites {
            sprites: &self.fireflies.sprite_buffer,
            amount: self.fireflies.count,
        }));
        Render::Composed(renders)
    }

    pub fn draw<'pass>(&'pass self, render_pass: &mut wgpu::RenderPass<'pass>, camera_bind_group: &'pass wgpu::BindGroup) {
        let mut batches = Batches::default();
        self.on_render().set_pipelines(&mut batches);

        let meshes = [
            (&self.emissive_pipeline, &self.lamp.bind_group, batches.lamps),
            (&self.emissive_pipeline, &self.paper.bind_group, batches.papers),
            (&self.baked_pipeline, &self.baked.bind_group, batches.baked),
            (&self.portal_pipeline, &self.portal.bind_group, batches.portal),
        ];
        for (pipeline, material, batch) in meshes {
            if batch.is_empty() {
                continue;
            }
            render_pass.set_pipeline(pipeline);
            for instanced in batch {
                if instanced.amount == 0 || instanced.mesh.num_elements == 0 {
                    log::warn!("Skipping {} with nothing to draw", instanced.mesh.name);
                    continue;
                }
                render_pass.set_vertex_buffer(1, instanced.instance.slice(..));
                render_pass.draw_mesh_instanced(
                    instanced.mesh,
                    0..instanced.amount,
                    material,
                    camera_bind_group,
                );
            }
        }

        render_pass.set_pipeline(&self.fireflies_pipeline);
        render_pass.set_bind_group(0, &self.fireflies.bind_group, &[]);
        render_pass.set_bind_group(1, camera_bind_group, &[]);
        for sprites in batches.fireflies {
            if sprites.amount == 0 {
                continue;
            }
            render_pass.set_vertex_buffer(0, sprites.sprites.slice(..));
            render_pass.draw(0..SPRITE_VERTICES, 0..sprites.amount);
        }
    }
}
