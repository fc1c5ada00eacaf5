//! Viewport size and pixel-ratio handling.
//!
//! Sizes are tracked in logical pixels. The drawing buffer is the logical size
//! scaled by the device pixel ratio, capped so high-density displays do not
//! pay for more than twice the fragments.

use crate::{
    camera::CameraRig,
    data_structures::material::{MaterialRegistry, U_PIXEL_RATIO, UniformValue},
};

pub const DEFAULT_PIXEL_RATIO_CAP: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
    pub pixel_ratio_cap: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio,
            pixel_ratio_cap: DEFAULT_PIXEL_RATIO_CAP,
        }
    }

    /// Caps that are not positive and finite fall back to
    /// [`DEFAULT_PIXEL_RATIO_CAP`].
    pub fn with_cap(mut self, cap: f32) -> Self {
        self.pixel_ratio_cap = if cap.is_finite() && cap > 0.0 {
            cap
        } else {
            log::warn!("Ignoring pixel ratio cap {}", cap);
            DEFAULT_PIXEL_RATIO_CAP
        };
        self
    }

    /// Builds a viewport from winit's physical size and scale factor.
    pub fn from_physical(width: u32, height: u32, scale_factor: f64) -> Self {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        Self::new(
            (width as f64 / scale) as f32,
            (height as f64 / scale) as f32,
            scale as f32,
        )
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio.min(self.pixel_ratio_cap)
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Drawing buffer size in physical pixels.
    pub fn buffer_size(&self) -> (u32, u32) {
        let ratio = self.pixel_ratio();
        (
            (self.width * ratio).round() as u32,
            (self.height * ratio).round() as u32,
        )
    }

    pub fn is_empty(&self) -> bool {
        let (width, height) = self.buffer_size();
        width == 0 || height == 0
    }

    /// Pushes the new size into the camera and the pixel-ratio uniform.
    pub fn apply(&self, rig: &mut CameraRig, registry: &MaterialRegistry) {
        rig.resize(self.width, self.height);
        registry
            .fireflies()
            .set_uniform(U_PIXEL_RATIO, UniformValue::Float(self.pixel_ratio()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_capped() {
        assert_eq!(Viewport::new(800.0, 600.0, 1.0).pixel_ratio(), 1.0);
        assert_eq!(Viewport::new(800.0, 600.0, 1.5).pixel_ratio(), 1.5);
        assert_eq!(Viewport::new(800.0, 600.0, 3.0).pixel_ratio(), 2.0);
    }

    #[test]
    fn buffer_size_uses_capped_ratio() {
        let viewport = Viewport::from_physical(2400, 1800, 3.0);
        assert_eq!(viewport.width, 800.0);
        assert_eq!(viewport.buffer_size(), (1600, 1200));
    }
}
