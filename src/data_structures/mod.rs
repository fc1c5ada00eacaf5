//! Scene data structures: materials, meshes, transforms and the particle field.
//!
//! - `material` holds the shared material instances and their uniforms
//! - `model` contains vertex layouts and CPU/GPU mesh types
//! - `texture` wraps GPU textures and their upload options
//! - `instance` holds node transforms and per-instance GPU data
//! - `scene_graph` is the node tree of a decoded asset
//! - `particles` generates the firefly field

pub mod instance;
pub mod material;
pub mod model;
pub mod particles;
pub mod scene_graph;
pub mod texture;
