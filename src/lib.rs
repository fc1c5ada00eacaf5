//! portal-scene
//!
//! A baked portal scene rendered with wgpu on native targets and the web. A
//! glTF asset is loaded in the background and its named nodes are bound to a
//! small set of shared materials: a lightmap-textured material, two flat
//! emissive colours and an animated portal shader. A field of fireflies is
//! drawn as additive sprites, and a per-frame loop advances shader time and
//! the damped orbit camera.
//!
//! High-level modules
//! - `animation`: the frame clock and the per-frame update loop
//! - `binder`: the node name table and material binding of a loaded asset
//! - `camera`: orbit camera, projection and camera uniforms
//! - `config`: the scene configuration read from `assets/scene.json`
//! - `context`: window, surface, device and queue
//! - `data_structures`: materials, meshes, transforms, textures, fireflies
//! - `error`: binding errors
//! - `flow`: the winit event loop that drives everything
//! - `pipelines`: one render pipeline per kind of material
//! - `render`: per-frame draw batching
//! - `resources`: asset, texture and config loading
//! - `scene`: the live scene the renderer draws
//! - `tweaks`: runtime-adjustable scene values
//! - `viewport`: window size and pixel ratio handling
//!

pub mod animation;
pub mod binder;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod scene;
pub mod tweaks;
pub mod viewport;

pub use flow::{Runner, TweakSender, run};
pub use tweaks::Tweak;
