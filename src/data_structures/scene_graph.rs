//! Scene graph of a decoded asset.
//!
//! A [`SceneAsset`] is a container root whose direct children form the flat
//! top-level node list the binder searches by name. Nodes carry their local
//! transform, an optional CPU-side mesh and a material slot that stays empty
//! until the binder fills it.

use log::warn;

use crate::data_structures::{instance::Instance, material::MaterialHandle, model::MeshData};

#[derive(Clone, Debug, Default)]
pub struct SceneNode {
    pub name: String,
    pub local: Instance,
    pub world: Instance,
    pub meshes: Vec<MeshData>,
    pub material: Option<MaterialHandle>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_mesh(mut self, mesh: MeshData) -> Self {
        self.meshes.push(mesh);
        self
    }

    pub fn with_local(mut self, local: Instance) -> Self {
        self.local = local;
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    /// Depth-first, parents before children.
    pub fn traverse<'a>(&'a self, f: &mut dyn FnMut(&'a SceneNode)) {
        f(self);
        for child in &self.children {
            child.traverse(f);
        }
    }

    pub fn traverse_mut(&mut self, f: &mut dyn FnMut(&mut SceneNode)) {
        f(self);
        for child in self.children.iter_mut() {
            child.traverse_mut(f);
        }
    }

    /// Recomputes `world` for this node and its whole subtree.
    pub fn update_world_transforms(&mut self, parent: &Instance) {
        self.world = parent * &self.local;
        let world = self.world;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&world);
        }
    }
}

/// Index of a node in the asset's top-level list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeHandle(pub(crate) usize);

impl NodeHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A loaded scene asset.
#[derive(Clone, Debug, Default)]
pub struct SceneAsset {
    pub root: SceneNode,
}

impl SceneAsset {
    pub fn new(children: Vec<SceneNode>) -> Self {
        let mut root = SceneNode::new("Scene");
        root.children = children;
        Self { root }
    }

    /// First top-level node whose name matches exactly.
    pub fn find(&self, name: &str) -> Option<NodeHandle> {
        self.root
            .children
            .iter()
            .position(|child| child.name == name)
            .map(NodeHandle)
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&SceneNode> {
        self.root.children.get(handle.0)
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut SceneNode> {
        self.root.children.get_mut(handle.0)
    }

    pub fn top_level(&self) -> &[SceneNode] {
        &self.root.children
    }

    pub fn update_world_transforms(&mut self) {
        self.root.update_world_transforms(&Instance::default());
    }

    /// Every node that has geometry to draw, in traversal order.
    pub fn drawables(&self) -> Vec<&SceneNode> {
        let mut nodes = Vec::new();
        self.root.traverse(&mut |node| {
            if !node.meshes.is_empty() {
                nodes.push(node);
            }
        });
        nodes
    }

    /// Warns about meshes that would render without a material. Returns how
    /// many were found.
    pub fn report_unbound(&self) -> usize {
        let mut count = 0;
        self.root.traverse(&mut |node| {
            if !node.meshes.is_empty() && node.material.is_none() {
                warn!(
                    "Node {} has geometry but no material and will not be drawn.",
                    node.name
                );
                count += 1;
            }
        });
        count
    }
}
