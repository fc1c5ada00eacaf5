//! Scene configuration.
//!
//! Everything has a default; `assets/scene.json` may override any subset of
//! fields. The file is fetched through the same loader as the other assets,
//! so it works unchanged on the web.

use serde::Deserialize;

use crate::{
    camera::{Camera, CameraRig, OrbitController, Projection},
    data_structures::{
        material::{Colour, MaterialSettings},
        particles::ParticleFieldGenerator,
    },
    resources,
    viewport::DEFAULT_PIXEL_RATIO_CAP,
};

pub const CONFIG_FILE: &str = "scene.json";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
    /// Fraction of the pending orbit delta applied per frame.
    pub damping: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            position: [9.0, 5.0, 9.0],
            target: [0.0, 0.0, 0.0],
            damping: 0.05,
        }
    }
}

impl CameraConfig {
    /// Camera, projection and orbit controls for a viewport of the given
    /// logical size.
    pub fn rig(&self, width: f32, height: f32) -> CameraRig {
        CameraRig {
            camera: Camera::new(self.position, self.target),
            projection: Projection::new(
                width,
                height,
                cgmath::Deg(self.fov_degrees),
                self.near,
                self.far,
            ),
            controller: OrbitController::new(self.damping, height),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub scene_file: String,
    pub baked_texture: String,
    pub alpha_texture: String,
    pub clear_colour: Colour,
    pub lamp_colour: Colour,
    pub paper_colour: Colour,
    pub portal_colour_start: Colour,
    pub portal_colour_end: Colour,
    pub firefly_size: f32,
    pub fireflies: ParticleFieldGenerator,
    pub pixel_ratio_cap: f32,
    pub camera: CameraConfig,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let materials = MaterialSettings::default();
        Self {
            scene_file: "scene.glb".to_string(),
            baked_texture: materials.baked_texture,
            alpha_texture: materials.alpha_texture,
            clear_colour: Colour::from_hex(0x201919),
            lamp_colour: materials.lamp_colour,
            paper_colour: materials.paper_colour,
            portal_colour_start: materials.portal_colour_start,
            portal_colour_end: materials.portal_colour_end,
            firefly_size: materials.firefly_size,
            fireflies: ParticleFieldGenerator::default(),
            pixel_ratio_cap: DEFAULT_PIXEL_RATIO_CAP,
            camera: CameraConfig::default(),
        }
    }
}

impl SceneConfig {
    /// Parses a configuration document. Values that would stall start-up or
    /// rendering are replaced by their defaults with a warning.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config.sanitized())
    }

    pub fn sanitized(mut self) -> Self {
        self.fireflies = self.fireflies.sanitized();
        if !(self.pixel_ratio_cap.is_finite() && self.pixel_ratio_cap > 0.0) {
            log::warn!(
                "pixel_ratio_cap = {} is unusable, using {}",
                self.pixel_ratio_cap,
                DEFAULT_PIXEL_RATIO_CAP
            );
            self.pixel_ratio_cap = DEFAULT_PIXEL_RATIO_CAP;
        }
        self
    }

    /// Loads [`CONFIG_FILE`], or the defaults when it cannot be read.
    pub async fn load() -> anyhow::Result<Self> {
        match resources::load_string(CONFIG_FILE).await {
            Ok(text) => {
                let config = Self::from_json(&text)?;
                log::info!("Loaded scene configuration from {}", CONFIG_FILE);
                Ok(config)
            }
            Err(e) => {
                log::info!("No {} ({}), using default configuration", CONFIG_FILE, e);
                Ok(Self::default())
            }
        }
    }

    pub fn material_settings(&self, pixel_ratio: f32) -> MaterialSettings {
        MaterialSettings {
            baked_texture: self.baked_texture.clone(),
            alpha_texture: self.alpha_texture.clone(),
            lamp_colour: self.lamp_colour,
            paper_colour: self.paper_colour,
            portal_colour_start: self.portal_colour_start,
            portal_colour_end: self.portal_colour_end,
            firefly_size: self.firefly_size,
            pixel_ratio: pixel_ratio.min(self.pixel_ratio_cap),
        }
    }
}
