//! Binding registry materials to asset nodes by name.
//!
//! The expected node names are fixed configuration in [`RoleBindingTable`].
//! Resolving the table against an asset yields one [`Lookup`] per entry;
//! binding only proceeds when every entry was found, so an asset with a
//! missing node is left untouched and the error names the first gap.

use log::{error, info};

use crate::{
    data_structures::{
        material::{MaterialRegistry, Role},
        scene_graph::{NodeHandle, SceneAsset},
    },
    error::{BindingError, BindingResult},
    scene::LiveScene,
};

/// Vertical position the asset root is placed at so the decoded scene sits
/// on the same ground plane as the particle field.
pub const ASSET_VERTICAL_OFFSET: f32 = -0.5;

const DEFAULT_BINDINGS: [(Role, &str); 13] = [
    (Role::Baked, "baked_Geo"),
    (Role::Lamp, "lampGlass_Geo"),
    (Role::Lamp, "lampGlass001_Geo"),
    (Role::Lamp, "lampGlass002_Geo"),
    (Role::Lamp, "lampGlass003_Geo"),
    (Role::Portal, "portal_Geo"),
    (Role::Paper, "paperLight001_Geo"),
    (Role::Paper, "paperLight002_Geo"),
    (Role::Paper, "paperLight003_Geo"),
    (Role::Paper, "paperLight004_Geo"),
    (Role::Paper, "paperLight005_Geo"),
    (Role::Paper, "paperLight006_Geo"),
    (Role::Paper, "paperLight007_Geo"),
];

/// Role to expected node name pairs, in binding order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleBindingTable {
    entries: Vec<(Role, &'static str)>,
}

impl RoleBindingTable {
    pub fn new(entries: Vec<(Role, &'static str)>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[(Role, &'static str)] {
        &self.entries
    }

    pub fn names_for(&self, role: Role) -> impl Iterator<Item = &'static str> + '_ {
        self.entries
            .iter()
            .filter(move |(r, _)| *r == role)
            .map(|(_, name)| *name)
    }

    pub fn resolve(&self, asset: &SceneAsset) -> Vec<ResolvedEntry> {
        self.entries
            .iter()
            .map(|&(role, expected_name)| ResolvedEntry {
                role,
                lookup: match asset.find(expected_name) {
                    Some(handle) => Lookup::Found(handle),
                    None => Lookup::Missing(expected_name),
                },
            })
            .collect()
    }
}

impl Default for RoleBindingTable {
    fn default() -> Self {
        Self::new(DEFAULT_BINDINGS.to_vec())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    Found(NodeHandle),
    Missing(&'static str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedEntry {
    pub role: Role,
    pub lookup: Lookup,
}

/// A fully resolved table: every role entry points at a node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bindings {
    entries: Vec<(Role, NodeHandle)>,
}

impl Bindings {
    pub fn entries(&self) -> &[(Role, NodeHandle)] {
        &self.entries
    }

    pub fn nodes_for(&self, role: Role) -> impl Iterator<Item = NodeHandle> + '_ {
        self.entries
            .iter()
            .filter(move |(r, _)| *r == role)
            .map(|(_, handle)| *handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Attaches registry materials to the named nodes of a loaded asset.
#[derive(Clone, Debug, Default)]
pub struct AssetBinder {
    table: RoleBindingTable,
}

impl AssetBinder {
    pub fn new(table: RoleBindingTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RoleBindingTable {
        &self.table
    }

    /// Resolves every entry or fails without touching the asset.
    pub fn resolve(&self, asset: &SceneAsset) -> BindingResult<Bindings> {
        let resolved = self.table.resolve(asset);
        let mut first_missing = None;
        let mut entries = Vec::with_capacity(resolved.len());
        for entry in resolved {
            match entry.lookup {
                Lookup::Found(handle) => entries.push((entry.role, handle)),
                Lookup::Missing(expected_name) => {
                    error!(
                        "Asset has no top-level node named {} ({} role).",
                        expected_name, entry.role
                    );
                    first_missing.get_or_insert(BindingError::MissingNode {
                        role: entry.role,
                        expected_name: expected_name.to_string(),
                    });
                }
            }
        }
        match first_missing {
            Some(err) => Err(err),
            None => Ok(Bindings { entries }),
        }
    }

    /// Normalizes the asset's placement and assigns every role's shared
    /// material. Applying it twice leaves the asset in the same state.
    pub fn bind_materials(
        &self,
        asset: &mut SceneAsset,
        registry: &MaterialRegistry,
    ) -> BindingResult<Bindings> {
        let bindings = self.resolve(asset)?;

        asset.root.local.position.y = ASSET_VERTICAL_OFFSET;
        asset.update_world_transforms();

        for &(role, handle) in bindings.entries() {
            if let Some(node) = asset.node_mut(handle) {
                node.material = Some(registry.for_role(role).clone());
            }
        }
        Ok(bindings)
    }

    /// Binds `asset` and attaches it to the live scene. On error the live
    /// scene keeps its previous asset slot.
    pub fn bind(
        &self,
        mut asset: SceneAsset,
        registry: &MaterialRegistry,
        scene: &mut LiveScene,
    ) -> BindingResult<()> {
        let bindings = self.bind_materials(&mut asset, registry)?;
        info!(
            "Bound {} nodes, attaching asset with {} top-level nodes.",
            bindings.len(),
            asset.top_level().len()
        );
        asset.report_unbound();
        scene.attach(asset, bindings);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_every_role() {
        let table = RoleBindingTable::default();
        assert_eq!(table.entries().len(), 13);
        assert_eq!(table.names_for(Role::Baked).count(), 1);
        assert_eq!(table.names_for(Role::Lamp).count(), 4);
        assert_eq!(table.names_for(Role::Portal).count(), 1);
        assert_eq!(table.names_for(Role::Paper).count(), 7);
    }
}
