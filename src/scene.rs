//! The live scene: what the renderer draws each frame.
//!
//! The particle field is present from the first frame. The asset region
//! starts [`AssetSlot::Unbound`] and only switches to [`AssetSlot::Bound`]
//! when the binder attaches a fully bound asset.

use crate::{
    binder::Bindings,
    data_structures::{particles::ParticleField, scene_graph::SceneAsset},
};

#[derive(Debug, Default)]
pub enum AssetSlot {
    #[default]
    Unbound,
    Bound {
        asset: SceneAsset,
        bindings: Bindings,
    },
}

impl AssetSlot {
    pub fn is_bound(&self) -> bool {
        matches!(self, AssetSlot::Bound { .. })
    }

    pub fn asset(&self) -> Option<&SceneAsset> {
        match self {
            AssetSlot::Bound { asset, .. } => Some(asset),
            AssetSlot::Unbound => None,
        }
    }
}

#[derive(Debug)]
pub struct LiveScene {
    particles: ParticleField,
    asset: AssetSlot,
    // bumped on every attach so GPU uploads can tell a new asset apart
    generation: u64,
}

impl LiveScene {
    pub fn new(particles: ParticleField) -> Self {
        Self {
            particles,
            asset: AssetSlot::Unbound,
            generation: 0,
        }
    }

    pub fn particles(&self) -> &ParticleField {
        &self.particles
    }

    pub fn asset(&self) -> &AssetSlot {
        &self.asset
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn attach(&mut self, asset: SceneAsset, bindings: Bindings) {
        self.asset = AssetSlot::Bound { asset, bindings };
        self.generation += 1;
    }
}
