//! Material instances, named shader parameters and the template store.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use serde::{Deserialize, Serialize};

/// Linear RGBA color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const YELLOW: Self = Self::rgba(1.0, 0.921_568_6, 0.015_686_275, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self { Self { r, g, b, a } }

    pub fn to_vec4(self) -> Vec4 { Vec4::new(self.r, self.g, self.b, self.a) }
}

impl Default for Color {
    fn default() -> Self { Self::WHITE }
}

impl From<Vec4> for Color {
    fn from(v: Vec4) -> Self { Self::rgba(v.x, v.y, v.z, v.w) }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    Float(f32),
    Int(i32),
    Color(Color),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub shader: String,
    #[serde(default)]
    params: BTreeMap<String, ParamValue>,
    #[serde(skip)]
    revision: u64,
}

impl Material {
    pub fn new(name: impl Into<String>, shader: impl Into<String>) -> Self {
        Self { name: name.into(), shader: shader.into(), ..Default::default() }
    }

    pub fn with_param(mut self, key: &str, value: ParamValue) -> Self {
        self.params.insert(key.to_owned(), value);
        self
    }

    fn set(&mut self, key: &str, value: ParamValue) {
        self.params.insert(key.to_owned(), value);
        self.revision += 1;
    }

    pub fn set_float(&mut self, key: &str, v: f32) { self.set(key, ParamValue::Float(v)) }
    pub fn set_int(&mut self, key: &str, v: i32) { self.set(key, ParamValue::Int(v)) }
    pub fn set_color(&mut self, key: &str, v: Color) { self.set(key, ParamValue::Color(v)) }

    pub fn float(&self, key: &str) -> Option<f32> {
        match self.params.get(key) { Some(ParamValue::Float(v)) => Some(*v), _ => None }
    }
    pub fn int(&self, key: &str) -> Option<i32> {
        match self.params.get(key) { Some(ParamValue::Int(v)) => Some(*v), _ => None }
    }
    pub fn color(&self, key: &str) -> Option<Color> {
        match self.params.get(key) { Some(ParamValue::Color(v)) => Some(*v), _ => None }
    }

    /// Number of parameter writes since the instance was created.
    pub fn revision(&self) -> u64 { self.revision }

    /// Copy of a template as a fresh private instance.
    pub fn instantiate(&self, name: impl Into<String>) -> Self {
        Self { name: name.into(), shader: self.shader.clone(), params: self.params.clone(), revision: 0 }
    }
}

slotmap::new_key_type! {
    /// Handle to a live material instance.
    pub struct MaterialId;
}

#[derive(Debug, Default)]
pub struct MaterialStore {
    materials: slotmap::SlotMap<MaterialId, Material>,
}

impl MaterialStore {
    pub fn new() -> Self { Self::default() }
    pub fn insert(&mut self, m: Material) -> MaterialId { self.materials.insert(m) }
    pub fn get(&self, id: MaterialId) -> Option<&Material> { self.materials.get(id) }
    pub fn get_mut(&mut self, id: MaterialId) -> Option<&mut Material> { self.materials.get_mut(id) }
    pub fn remove(&mut self, id: MaterialId) -> Option<Material> { self.materials.remove(id) }
    pub fn contains(&self, id: MaterialId) -> bool { self.materials.contains_key(id) }
    pub fn len(&self) -> usize { self.materials.len() }
    pub fn is_empty(&self) -> bool { self.materials.is_empty() }
}

/// Where material templates come from, addressed by logical path.
pub trait ResourceStore {
    fn load_material(&self, path: &str) -> Option<Material>;
}

/// In-memory template store.
#[derive(Debug, Clone, Default)]
pub struct MaterialLibrary {
    templates: HashMap<String, Material>,
}

impl MaterialLibrary {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, path: impl Into<String>, material: Material) {
        self.templates.insert(path.into(), material);
    }

    pub fn len(&self) -> usize { self.templates.len() }
    pub fn is_empty(&self) -> bool { self.templates.is_empty() }

    /// Library holding the built-in mask and fill templates.
    pub fn with_outline_templates() -> Self {
        use super::outline::{COLOR_PARAM, FILL_TEMPLATE, MASK_TEMPLATE, MODE_PARAM, WIDTH_PARAM};
        let mut lib = Self::new();
        lib.insert(
            MASK_TEMPLATE,
            Material::new("OutlineMask", "Custom/Outline Mask")
                .with_param(WIDTH_PARAM, ParamValue::Float(2.0))
                .with_param(MODE_PARAM, ParamValue::Int(0)),
        );
        lib.insert(
            FILL_TEMPLATE,
            Material::new("OutlineFill", "Custom/Outline Fill")
                .with_param(WIDTH_PARAM, ParamValue::Float(2.0))
                .with_param(COLOR_PARAM, ParamValue::Color(Color::WHITE))
                .with_param(MODE_PARAM, ParamValue::Int(0)),
        );
        lib
    }

    /// Load every `*.yaml` material in `dir` as `Materials/<file stem>`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut lib = Self::new();
        let entries = std::fs::read_dir(dir).with_context(|| format!("reading material dir {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") { continue; }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue; };
            let data = std::fs::read_to_string(&path)?;
            let material: Material =
                serde_yaml::from_str(&data).with_context(|| format!("parsing material {}", path.display()))?;
            log::debug!("loaded material template Materials/{} ({})", stem, material.shader);
            lib.insert(format!("Materials/{}", stem), material);
        }
        Ok(lib)
    }
}

impl ResourceStore for MaterialLibrary {
    fn load_material(&self, path: &str) -> Option<Material> { self.templates.get(path).cloned() }
}
