//! Scene asset loading.
//!
//! Loading is split in two: [`fetch_scene`] performs all I/O and returns plain
//! bytes (so it can run off the frame thread), [`parse_scene`] turns those
//! bytes into a [`SceneAsset`] on the frame thread.

use anyhow::{Context as _, anyhow, bail};

use crate::{
    data_structures::{
        instance::Instance,
        model::{MeshData, ModelVertex},
        scene_graph::{SceneAsset, SceneNode},
    },
    resources::load_binary,
};

/// Raw bytes of a glTF document and all of its buffers, in buffer order.
#[derive(Clone, Debug, Default)]
pub struct SceneBytes {
    pub file_name: String,
    pub document: Vec<u8>,
    pub buffers: Vec<Vec<u8>>,
}

pub async fn fetch_scene(file_name: &str) -> anyhow::Result<SceneBytes> {
    let document = load_binary(file_name)
        .await
        .with_context(|| format!("Couldn't fetch scene {}", file_name))?;
    let mut gltf = open_document(file_name, &document)?;
    // `None` marks the embedded binary chunk
    let sources: Vec<Option<String>> = gltf
        .buffers()
        .map(|buffer| match buffer.source() {
            gltf::buffer::Source::Bin => None,
            gltf::buffer::Source::Uri(uri) => Some(uri.to_string()),
        })
        .collect();
    let mut blob = gltf.blob.take();
    drop(gltf);

    let mut buffers = Vec::with_capacity(sources.len());
    for source in sources {
        match source {
            None => {
                let bin = blob.take().ok_or_else(|| {
                    anyhow!("{} references a binary chunk it does not have", file_name)
                })?;
                buffers.push(bin);
            }
            Some(uri) => {
                let bin = load_binary(&uri)
                    .await
                    .with_context(|| format!("Couldn't fetch buffer {} of {}", uri, file_name))?;
                buffers.push(bin);
            }
        }
    }

    Ok(SceneBytes {
        file_name: file_name.to_string(),
        document,
        buffers,
    })
}

pub fn parse_scene(bytes: &SceneBytes) -> anyhow::Result<SceneAsset> {
    let gltf = open_document(&bytes.file_name, &bytes.document)?;
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| anyhow!("{} contains no scene", bytes.file_name))?;

    let children = scene
        .nodes()
        .map(|node| to_scene_node(node, &bytes.buffers))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut asset = SceneAsset::new(children);
    asset.update_world_transforms();
    Ok(asset)
}

const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Parses and validates a glTF document. Draco-compressed files get their own
/// error instead of the generic validation failure.
fn open_document(file_name: &str, document: &[u8]) -> anyhow::Result<gltf::Gltf> {
    let unchecked = gltf::Gltf::from_slice_without_validation(document)
        .with_context(|| format!("Couldn't read glTF document {}", file_name))?;
    if unchecked
        .extensions_required()
        .any(|extension| extension == DRACO_EXTENSION)
    {
        bail!(
            "{} uses Draco-compressed primitives ({}), which are not supported; \
             re-export the asset without Draco compression",
            file_name,
            DRACO_EXTENSION
        );
    }
    gltf::Gltf::from_slice(document)
        .with_context(|| format!("Couldn't read glTF document {}", file_name))
}

fn to_scene_node(node: gltf::scene::Node, buffers: &[Vec<u8>]) -> anyhow::Result<SceneNode> {
    let name = node.name().unwrap_or_default().to_string();
    let (translation, rotation, scale) = node.transform().decomposed();
    let mut scene_node = SceneNode::new(name).with_local(Instance {
        position: translation.into(),
        rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
        scale: scale.into(),
    });

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh.name().unwrap_or("unknown_mesh");
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping non-triangle primitive {} of mesh {}",
                    primitive.index(),
                    mesh_name
                );
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

            let mut vertices: Vec<ModelVertex> = reader
                .read_positions()
                .ok_or_else(|| anyhow!("Mesh {} has a primitive without positions", mesh_name))?
                .map(|position| ModelVertex {
                    position,
                    tex_coords: Default::default(),
                })
                .collect();
            if let Some(tex_coords) = reader.read_tex_coords(0) {
                vertices
                    .iter_mut()
                    .zip(tex_coords.into_f32())
                    .for_each(|(vertex, uv)| vertex.tex_coords = uv);
            }

            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..vertices.len() as u32).collect(),
            };

            scene_node.meshes.push(MeshData {
                name: mesh_name.to_string(),
                vertices,
                indices,
            });
        }
    }

    for child in node.children() {
        scene_node.add_child(to_scene_node(child, buffers)?);
    }

    Ok(scene_node)
}
