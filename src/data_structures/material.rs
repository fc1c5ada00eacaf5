//! Materials, uniform sets and the material registry.
//!
//! Every material the scene uses is created exactly once by the
//! [`MaterialRegistry`] and handed out as a [`MaterialHandle`]. Handles are
//! shared references: all scene nodes bound to the same [`Role`] point at the
//! identical material, so a uniform write through one handle is seen by every
//! node using it.
//!
//! The types in here are CPU-side descriptions only. The renderer turns them
//! into bind groups and uniform buffers and re-uploads the uniform values
//! every frame.

use std::{
    cell::{Ref, RefCell, RefMut},
    collections::BTreeMap,
    fmt,
    rc::{Rc, Weak},
};

use serde::Deserialize;

/// Name of the elapsed-time uniform shared by both shader materials.
pub const U_TIME: &str = "uTime";
pub const U_COLOR_START: &str = "uColorStart";
pub const U_COLOR_END: &str = "uColorEnd";
pub const U_PIXEL_RATIO: &str = "uPixelRatio";
pub const U_SIZE: &str = "uSize";

/// An sRGB colour with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(from = "String")]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Colour {
    pub const WHITE: Colour = Colour::from_hex(0xffffff);

    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    /// Parses `#rrggbb` or `rrggbb`.
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self::from_hex)
    }

    pub fn to_hex(&self) -> u32 {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (to_u8(self.r) << 16) | (to_u8(self.g) << 8) | to_u8(self.b)
    }

    /// Shaders work in linear space and the surface re-encodes to sRGB.
    pub fn to_linear(&self) -> [f32; 3] {
        let decode = |c: f32| {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        [decode(self.r), decode(self.g), decode(self.b)]
    }
}

impl From<String> for Colour {
    fn from(s: String) -> Self {
        Colour::parse(&s).unwrap_or_else(|| {
            log::warn!("'{}' is not a #rrggbb colour, falling back to white", s);
            Colour::WHITE
        })
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.to_hex())
    }
}

/// A single uniform value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Colour(Colour),
}

/// Uniform name to value mapping owned by a shader material.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UniformSet {
    values: BTreeMap<&'static str, UniformValue>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, value: UniformValue) -> Self {
        self.values.insert(name, value);
        self
    }

    pub fn set(&mut self, name: &'static str, value: UniformValue) {
        self.values.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name) {
            Some(UniformValue::Float(v)) => Some(v),
            _ => None,
        }
    }

    pub fn colour(&self, name: &str) -> Option<Colour> {
        match self.get(name) {
            Some(UniformValue::Colour(c)) => Some(c),
            _ => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.keys().copied()
    }
}

/// Which shader program a [`ShaderMaterial`] runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderProgram {
    Portal,
    Fireflies,
}

/// How fragments are combined with the frame buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blending {
    Opaque,
    Alpha,
    Additive,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BakedMaterial {
    /// Precomputed lightmap, sampled in sRGB.
    pub colour_map: String,
    /// Alpha mask, alpha is read from the green channel.
    pub alpha_map: String,
    pub blending: Blending,
    pub double_sided: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShaderMaterial {
    pub program: ShaderProgram,
    pub uniforms: UniformSet,
    pub blending: Blending,
    pub depth_write: bool,
}

/// A material as seen by the scene: unlit textured, unlit flat colour or
/// shader driven.
#[derive(Clone, Debug, PartialEq)]
pub enum Material {
    Baked(BakedMaterial),
    Emissive { colour: Colour },
    Shader(ShaderMaterial),
}

impl Material {
    pub fn uniforms(&self) -> Option<&UniformSet> {
        match self {
            Material::Shader(shader) => Some(&shader.uniforms),
            _ => None,
        }
    }

    pub fn uniforms_mut(&mut self) -> Option<&mut UniformSet> {
        match self {
            Material::Shader(shader) => Some(&mut shader.uniforms),
            _ => None,
        }
    }
}

/// Shared, mutable reference to a registry material.
///
/// Cloning the handle clones the reference, never the material. Use
/// [`MaterialHandle::ptr_eq`] to compare identity.
#[derive(Clone)]
pub struct MaterialHandle(Rc<RefCell<Material>>);

impl MaterialHandle {
    fn new(material: Material) -> Self {
        Self(Rc::new(RefCell::new(material)))
    }

    pub fn borrow(&self) -> Ref<'_, Material> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Material> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &MaterialHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakMaterial {
        WeakMaterial(Rc::downgrade(&self.0))
    }

    /// Writes a uniform on a shader material. Returns `false` for materials
    /// without uniforms.
    pub fn set_uniform(&self, name: &'static str, value: UniformValue) -> bool {
        match self.0.borrow_mut().uniforms_mut() {
            Some(uniforms) => {
                uniforms.set(name, value);
                true
            }
            None => false,
        }
    }

    pub fn uniform(&self, name: &str) -> Option<UniformValue> {
        self.0.borrow().uniforms().and_then(|u| u.get(name))
    }
}

impl fmt::Debug for MaterialHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MaterialHandle")
            .field(&Rc::as_ptr(&self.0))
            .finish()
    }
}

/// Non-owning material reference held by per-frame updaters.
#[derive(Clone, Debug)]
pub struct WeakMaterial(Weak<RefCell<Material>>);

impl WeakMaterial {
    /// Returns `false` without doing anything when the material is gone.
    pub fn set_uniform(&self, name: &'static str, value: UniformValue) -> bool {
        match self.0.upgrade() {
            Some(material) => MaterialHandle(material).set_uniform(name, value),
            None => false,
        }
    }

    pub fn upgrade(&self) -> Option<MaterialHandle> {
        self.0.upgrade().map(MaterialHandle)
    }
}

/// Logical purpose a scene node is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Baked,
    Lamp,
    Portal,
    Paper,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Baked => "baked",
            Role::Lamp => "lamp",
            Role::Portal => "portal",
            Role::Paper => "paper",
        };
        f.write_str(name)
    }
}

/// Material parameters the registry is built from.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialSettings {
    pub baked_texture: String,
    pub alpha_texture: String,
    pub lamp_colour: Colour,
    pub paper_colour: Colour,
    pub portal_colour_start: Colour,
    pub portal_colour_end: Colour,
    pub firefly_size: f32,
    pub pixel_ratio: f32,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            baked_texture: "baked.png".to_string(),
            alpha_texture: "alpha.png".to_string(),
            lamp_colour: Colour::from_hex(0xfceea7),
            paper_colour: Colour::from_hex(0xffffe5),
            portal_colour_start: Colour::from_hex(0xffffff),
            portal_colour_end: Colour::from_hex(0x7898f5),
            firefly_size: 100.0,
            pixel_ratio: 1.0,
        }
    }
}

/// Owner of every material instance in the scene.
#[derive(Debug)]
pub struct MaterialRegistry {
    baked: MaterialHandle,
    lamp: MaterialHandle,
    portal: MaterialHandle,
    paper: MaterialHandle,
    fireflies: MaterialHandle,
}

impl MaterialRegistry {
    pub fn new(settings: &MaterialSettings) -> Self {
        let baked = Material::Baked(BakedMaterial {
            colour_map: settings.baked_texture.clone(),
            alpha_map: settings.alpha_texture.clone(),
            blending: Blending::Alpha,
            double_sided: true,
        });
        let portal = Material::Shader(ShaderMaterial {
            program: ShaderProgram::Portal,
            uniforms: UniformSet::new()
                .with(U_TIME, UniformValue::Float(0.0))
                .with(U_COLOR_START, UniformValue::Colour(settings.portal_colour_start))
                .with(U_COLOR_END, UniformValue::Colour(settings.portal_colour_end)),
            blending: Blending::Opaque,
            depth_write: true,
        });
        let fireflies = Material::Shader(ShaderMaterial {
            program: ShaderProgram::Fireflies,
            uniforms: UniformSet::new()
                .with(U_TIME, UniformValue::Float(0.0))
                .with(U_PIXEL_RATIO, UniformValue::Float(settings.pixel_ratio))
                .with(U_SIZE, UniformValue::Float(settings.firefly_size)),
            blending: Blending::Additive,
            depth_write: false,
        });

        Self {
            baked: MaterialHandle::new(baked),
            lamp: MaterialHandle::new(Material::Emissive {
                colour: settings.lamp_colour,
            }),
            portal: MaterialHandle::new(portal),
            paper: MaterialHandle::new(Material::Emissive {
                colour: settings.paper_colour,
            }),
            fireflies: MaterialHandle::new(fireflies),
        }
    }

    pub fn for_role(&self, role: Role) -> &MaterialHandle {
        match role {
            Role::Baked => &self.baked,
            Role::Lamp => &self.lamp,
            Role::Portal => &self.portal,
            Role::Paper => &self.paper,
        }
    }

    /// Reverse lookup by identity.
    pub fn role_of(&self, handle: &MaterialHandle) -> Option<Role> {
        [Role::Baked, Role::Lamp, Role::Portal, Role::Paper]
            .into_iter()
            .find(|role| self.for_role(*role).ptr_eq(handle))
    }

    pub fn baked(&self) -> &MaterialHandle {
        &self.baked
    }

    pub fn lamp(&self) -> &MaterialHandle {
        &self.lamp
    }

    pub fn portal(&self) -> &MaterialHandle {
        &self.portal
    }

    pub fn paper(&self) -> &MaterialHandle {
        &self.paper
    }

    pub fn fireflies(&self) -> &MaterialHandle {
        &self.fireflies
    }

    /// Every material carrying a `uTime` uniform.
    pub fn animated(&self) -> [&MaterialHandle; 2] {
        [&self.portal, &self.fireflies]
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        Self::new(&MaterialSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_hex_colours() {
        let c = Colour::parse("#7898f5").unwrap();
        assert_eq!(c.to_hex(), 0x7898f5);
        assert_eq!(c.to_string(), "#7898f5");
        assert_eq!(Colour::parse("7898f5"), Some(c));
        assert_eq!(Colour::parse("#789"), None);
        assert_eq!(Colour::parse("#zzzzzz"), None);
    }

    #[test]
    fn lamp_and_paper_are_distinct_materials() {
        let registry = MaterialRegistry::default();
        assert!(!registry.lamp().ptr_eq(registry.paper()));
        assert_ne!(*registry.lamp().borrow(), *registry.paper().borrow());
    }

    #[test]
    fn emissive_materials_reject_uniform_writes() {
        let registry = MaterialRegistry::default();
        assert!(!registry.lamp().set_uniform(U_TIME, UniformValue::Float(1.0)));
        assert!(registry.portal().set_uniform(U_TIME, UniformValue::Float(1.0)));
    }

    #[test]
    fn weak_material_write_after_drop_is_a_no_op() {
        let weak = {
            let registry = MaterialRegistry::default();
            registry.portal().downgrade()
        };
        assert!(!weak.set_uniform(U_TIME, UniformValue::Float(3.0)));
        assert!(weak.upgrade().is_none());
    }
}
