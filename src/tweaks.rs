//! Externally adjustable scene values.
//!
//! A debug panel (or anything else) changes the scene by sending [`Tweak`]s.
//! Each tweak is a plain overwrite: the last value written wins and takes
//! effect on the next rendered frame.

use crate::data_structures::material::{
    Colour, MaterialRegistry, U_COLOR_END, U_COLOR_START, U_SIZE, UniformValue,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tweak {
    PortalColourStart(Colour),
    PortalColourEnd(Colour),
    ClearColour(Colour),
    FireflySize(f32),
}

/// Current values of everything a tweak can change that is not a material
/// uniform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TweakTargets {
    pub clear_colour: Colour,
}

impl Tweak {
    pub fn apply(self, registry: &MaterialRegistry, targets: &mut TweakTargets) {
        match self {
            Tweak::PortalColourStart(colour) => {
                registry
                    .portal()
                    .set_uniform(U_COLOR_START, UniformValue::Colour(colour));
            }
            Tweak::PortalColourEnd(colour) => {
                registry
                    .portal()
                    .set_uniform(U_COLOR_END, UniformValue::Colour(colour));
            }
            Tweak::ClearColour(colour) => targets.clear_colour = colour,
            Tweak::FireflySize(size) => {
                registry
                    .fireflies()
                    .set_uniform(U_SIZE, UniformValue::Float(size.max(0.0)));
            }
        }
        log::debug!("Applied {:?}", self);
    }
}

/// Converts a colour to the clear colour the render pass expects.
pub fn to_clear_colour(colour: Colour) -> wgpu::Color {
    let [r, g, b] = colour.to_linear();
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: 1.0,
    }
}
