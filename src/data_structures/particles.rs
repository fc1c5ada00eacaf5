//! Procedural firefly field.
//!
//! The field is sampled once and never changes afterwards; all motion comes
//! from the fireflies shader reading `uTime`.

use rand::Rng;
use serde::Deserialize;

use crate::data_structures::instance::SpriteRaw;

/// Sampling parameters for [`ParticleField`].
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParticleFieldGenerator {
    pub count: usize,
    /// Full width of the square the particles are spread over in x and z.
    pub extent_xy: f32,
    pub max_height: f32,
}

impl Default for ParticleFieldGenerator {
    fn default() -> Self {
        Self {
            count: 60,
            extent_xy: 10.0,
            max_height: 5.5,
        }
    }
}

impl ParticleFieldGenerator {
    /// Replaces extents that cannot be sampled (negative, NaN or infinite)
    /// with the defaults.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let check = |name: &str, value: f32, default: f32| {
            if value.is_finite() && value >= 0.0 {
                value
            } else {
                log::warn!("fireflies.{} = {} is unusable, using {}", name, value, default);
                default
            }
        };
        Self {
            count: self.count,
            extent_xy: check("extent_xy", self.extent_xy, defaults.extent_xy),
            max_height: check("max_height", self.max_height, defaults.max_height),
        }
    }

    /// Samples a fresh field from the thread RNG. Every call differs.
    pub fn generate(&self) -> ParticleField {
        self.generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(&self, rng: &mut R) -> ParticleField {
        let half = self.extent_xy * 0.5;
        let mut positions = Vec::with_capacity(self.count);
        let mut scales = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            positions.push([
                sample(rng, -half, half),
                sample(rng, 0.0, self.max_height),
                sample(rng, -half, half),
            ]);
            scales.push(rng.r#gen::<f32>());
        }
        ParticleField { positions, scales }
    }
}

// gen_range panics on an empty or non-finite range
fn sample<R: Rng + ?Sized>(rng: &mut R, low: f32, high: f32) -> f32 {
    if high > low && (high - low).is_finite() {
        rng.gen_range(low..high)
    } else if low.is_finite() {
        low
    } else {
        0.0
    }
}

/// Parallel arrays of particle positions and scales.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleField {
    positions: Vec<[f32; 3]>,
    scales: Vec<f32>,
}

impl ParticleField {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    pub fn to_raw(&self) -> Vec<SpriteRaw> {
        self.positions
            .iter()
            .zip(self.scales.iter())
            .map(|(&position, &scale)| SpriteRaw { position, scale })
            .collect()
    }
}
