//! Render pipelines, one per kind of material.
//!
//! Every pipeline binds its material at group 0 and the camera at group 1.

pub mod baked;
pub mod basic;
pub mod emissive;
pub mod fireflies;
pub mod portal;
