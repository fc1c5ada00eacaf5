use portal_scene::{
    binder::RoleBindingTable,
    camera::CameraRig,
    config::CameraConfig,
    data_structures::{
        model::{MeshData, ModelVertex},
        particles::ParticleFieldGenerator,
        scene_graph::{SceneAsset, SceneNode},
    },
    scene::LiveScene,
};

/// Names of every node the default binding table expects, in table order.
pub fn expected_names() -> Vec<&'static str> {
    RoleBindingTable::default()
        .entries()
        .iter()
        .map(|(_, name)| *name)
        .collect()
}

/// A unit quad, enough geometry for a node to count as drawable.
pub fn quad(name: &str) -> MeshData {
    let vertex = |x: f32, y: f32| ModelVertex {
        position: [x, y, 0.0],
        tex_coords: [x + 0.5, 0.5 - y],
    };
    MeshData {
        name: name.to_string(),
        vertices: vec![
            vertex(-0.5, -0.5),
            vertex(0.5, -0.5),
            vertex(0.5, 0.5),
            vertex(-0.5, 0.5),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

pub fn mesh_node(name: &str) -> SceneNode {
    SceneNode::new(name).with_mesh(quad(name))
}

/// Builds an asset with one top-level mesh node per name.
pub fn asset_with(names: &[&str]) -> SceneAsset {
    SceneAsset::new(names.iter().map(|name| mesh_node(name)).collect())
}

/// An asset shaped like the exported portal scene: every expected node plus
/// an empty helper node the table does not mention.
pub fn portal_asset() -> SceneAsset {
    let mut asset = asset_with(&expected_names());
    asset.root.children.push(SceneNode::new("Empty"));
    asset
}

/// The portal scene with one expected node left out.
pub fn portal_asset_without(missing: &str) -> SceneAsset {
    let names: Vec<_> = expected_names()
        .into_iter()
        .filter(|name| *name != missing)
        .collect();
    asset_with(&names)
}

pub fn rig(width: f32, height: f32) -> CameraRig {
    CameraConfig::default().rig(width, height)
}

pub fn live_scene() -> LiveScene {
    LiveScene::new(ParticleFieldGenerator::default().generate())
}
