//! Mask/fill outline pass attached to one object hierarchy.
//!
//! The renderer owns two private material instances. Enabling appends them to
//! every renderer under the owner; the mask pass writes a silhouette, the fill
//! pass draws the mesh expanded along the smoothed normals stored in the
//! smooth-normal UV channel.

use serde::{Deserialize, Serialize};

use crate::bake::{BakeStore, MeshBakeCache};
use crate::error::{OutlineError, Result};
use crate::render::material::{Color, MaterialId, MaterialStore, ResourceStore};
use crate::scene::{ObjectId, Scene};

pub const MASK_TEMPLATE: &str = "Materials/OutlineMask";
pub const FILL_TEMPLATE: &str = "Materials/OutlineFill";

pub const WIDTH_PARAM: &str = "_OutlineWidth";
pub const COLOR_PARAM: &str = "_OutlineColor";
pub const MODE_PARAM: &str = "_OutlineMode";

/// Upper bound of every width-like setting.
pub const MAX_WIDTH: f32 = 10.0;

fn clamp_width(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, MAX_WIDTH) }
}

/// Which parts of the object get outlined; consumed by the shader as `_OutlineMode`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutlineMode {
    #[default]
    OutlineAll,
    OutlineVisible,
    OutlineHidden,
    OutlineAndSilhouette,
    SilhouetteOnly,
}

impl OutlineMode {
    pub fn shader_value(self) -> i32 {
        match self {
            Self::OutlineAll => 0,
            Self::OutlineVisible => 1,
            Self::OutlineHidden => 2,
            Self::OutlineAndSilhouette => 3,
            Self::SilhouetteOnly => 4,
        }
    }
}

/// Pulsing width parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Blink {
    pub enabled: bool,
    pub speed: f32,
    pub min_width: f32,
    pub max_width: f32,
}

impl Default for Blink {
    fn default() -> Self { Self { enabled: false, speed: 3.0, min_width: 0.0, max_width: 4.0 } }
}

impl Blink {
    /// Width at `time` seconds: a sine between min and max, period 2π/speed.
    pub fn width_at(&self, time: f32) -> f32 {
        let t = ((time * self.speed).sin() + 1.0) * 0.5;
        self.min_width + (self.max_width - self.min_width) * t
    }
}

/// Per-target outline settings. Every setter marks the config dirty.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineConfig {
    mode: OutlineMode,
    color: Color,
    width: f32,
    blink: Blink,
    dirty: bool,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self { mode: OutlineMode::OutlineAll, color: Color::WHITE, width: 2.0, blink: Blink::default(), dirty: true }
    }
}

impl OutlineConfig {
    pub fn mode(&self) -> OutlineMode { self.mode }
    pub fn color(&self) -> Color { self.color }
    pub fn width(&self) -> f32 { self.width }
    pub fn blink(&self) -> &Blink { &self.blink }
    pub fn is_dirty(&self) -> bool { self.dirty }
    pub fn mark_dirty(&mut self) { self.dirty = true }

    pub fn set_mode(&mut self, mode: OutlineMode) {
        self.mode = mode;
        self.dirty = true;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
        self.dirty = true;
    }

    pub fn set_width(&mut self, width: f32) {
        self.width = clamp_width(width);
        self.dirty = true;
    }

    pub fn set_blink(&mut self, enabled: bool) {
        self.blink.enabled = enabled;
        self.dirty = true;
    }

    pub fn set_blink_speed(&mut self, speed: f32) {
        self.blink.speed = clamp_width(speed);
        self.dirty = true;
    }

    pub fn set_blink_range(&mut self, min_width: f32, max_width: f32) {
        self.blink.min_width = clamp_width(min_width);
        self.blink.max_width = clamp_width(max_width);
        self.dirty = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupState {
    Uninitialized,
    Ready,
    /// A template was missing; the outline never renders.
    Failed,
}

/// What the renderer needs from its surroundings during setup.
pub struct OutlineContext<'a> {
    pub scene: &'a mut Scene,
    pub resources: &'a dyn ResourceStore,
    pub cache: &'a mut MeshBakeCache,
}

#[derive(Debug)]
pub struct OutlineRenderer {
    owner: ObjectId,
    config: OutlineConfig,
    /// Opt into persisted bake data instead of smoothing at setup.
    pub precompute_outline: bool,
    bake: BakeStore,
    state: SetupState,
    renderers: Vec<ObjectId>,
    mask: Option<MaterialId>,
    fill: Option<MaterialId>,
    enabled: bool,
}

impl OutlineRenderer {
    pub fn new(owner: ObjectId) -> Self {
        Self {
            owner,
            config: OutlineConfig::default(),
            precompute_outline: false,
            bake: BakeStore::new(),
            state: SetupState::Uninitialized,
            renderers: Vec::new(),
            mask: None,
            fill: None,
            enabled: false,
        }
    }

    pub fn owner(&self) -> ObjectId { self.owner }
    pub fn config(&self) -> &OutlineConfig { &self.config }
    pub fn config_mut(&mut self) -> &mut OutlineConfig { &mut self.config }
    pub fn state(&self) -> SetupState { self.state }
    pub fn is_enabled(&self) -> bool { self.enabled }
    pub fn renderers(&self) -> &[ObjectId] { &self.renderers }
    pub fn mask_material(&self) -> Option<MaterialId> { self.mask }
    pub fn fill_material(&self) -> Option<MaterialId> { self.fill }
    pub fn bake_store(&self) -> &BakeStore { &self.bake }

    /// One-time setup: collect renderers, instance both templates, prepare meshes.
    pub fn setup(&mut self, ctx: &mut OutlineContext<'_>) -> Result<()> {
        match self.state {
            SetupState::Ready => return Ok(()),
            SetupState::Failed => {
                return Err(OutlineError::MissingTemplate { path: format!("{} or {}", MASK_TEMPLATE, FILL_TEMPLATE) })
            }
            SetupState::Uninitialized => {}
        }
        if !ctx.scene.contains(self.owner) {
            return Err(OutlineError::UnknownObject);
        }

        let load = |path: &str| {
            ctx.resources.load_material(path).ok_or_else(|| OutlineError::MissingTemplate { path: path.to_owned() })
        };
        let (mask, fill) = match (load(MASK_TEMPLATE), load(FILL_TEMPLATE)) {
            (Ok(mask), Ok(fill)) => (mask, fill),
            (Err(e), _) | (_, Err(e)) => {
                self.state = SetupState::Failed;
                return Err(e);
            }
        };
        self.mask = Some(ctx.scene.materials.insert(mask.instantiate("OutlineMask (Instance)")));
        self.fill = Some(ctx.scene.materials.insert(fill.instantiate("OutlineFill (Instance)")));

        self.renderers = ctx.scene.renderers_in_hierarchy(self.owner);
        let report = ctx.cache.prepare(ctx.scene, &self.renderers, &self.bake);
        log::debug!(
            "outline setup: {} renderers, {} meshes prepared ({} baked, {} shared)",
            self.renderers.len(),
            report.prepared,
            report.from_bake,
            report.skipped
        );

        self.config.mark_dirty();
        self.state = SetupState::Ready;
        Ok(())
    }

    /// Attach the outline materials, running setup first if needed.
    ///
    /// Returns whether the outline is enabled afterwards; a failed setup is
    /// logged and leaves it disabled.
    pub fn enable(&mut self, ctx: &mut OutlineContext<'_>) -> bool {
        if self.enabled {
            return true;
        }
        if let Err(e) = self.setup(ctx) {
            log::error!("outline on {:?} disabled: {}", self.owner, e);
            return false;
        }
        let (Some(mask), Some(fill)) = (self.mask, self.fill) else { return false };
        for id in &self.renderers {
            if let Some(r) = ctx.scene.renderer_mut(*id) {
                r.materials.push(mask);
                r.materials.push(fill);
            }
        }
        self.enabled = true;
        true
    }

    /// Detach the outline materials. Safe to call repeatedly.
    pub fn disable(&mut self, scene: &mut Scene) {
        if !self.enabled {
            return;
        }
        let owned = [self.mask, self.fill];
        for id in &self.renderers {
            if let Some(r) = scene.renderer_mut(*id) {
                r.materials.retain(|m| !owned.contains(&Some(*m)));
            }
        }
        self.enabled = false;
    }

    /// Push shader parameters for this frame.
    ///
    /// Blinking writes every tick; a static outline only writes when dirty.
    pub fn tick(&mut self, materials: &mut MaterialStore, time: f32) {
        if !self.enabled || self.state != SetupState::Ready {
            return;
        }
        let width = if self.config.blink.enabled {
            self.config.blink.width_at(time)
        } else if self.config.dirty {
            self.config.width
        } else {
            return;
        };
        self.config.dirty = false;

        let mode = self.config.mode.shader_value();
        for id in [self.mask, self.fill].into_iter().flatten() {
            let Some(m) = materials.get_mut(id) else { continue };
            m.set_float(WIDTH_PARAM, width);
            m.set_color(COLOR_PARAM, self.config.color);
            m.set_int(MODE_PARAM, mode);
        }
    }

    /// Bake smoothed normals for the hierarchy into the persisted store.
    pub fn bake(&mut self, scene: &Scene) -> usize { self.bake.bake(scene, self.owner) }

    /// Re-check settings after an edit.
    ///
    /// Drops bake data when precomputation is off or keys and values disagree,
    /// and bakes when precomputation is on but nothing is stored.
    pub fn validate(&mut self, scene: &Scene) {
        self.config.mark_dirty();
        if (!self.precompute_outline && !self.bake.is_empty()) || !self.bake.is_consistent() {
            self.bake.clear();
        }
        if self.precompute_outline && self.bake.is_empty() {
            self.bake(scene);
        }
    }

    /// Detach and release both material instances. Safe before setup.
    pub fn teardown(&mut self, scene: &mut Scene) {
        self.disable(scene);
        for id in [self.mask.take(), self.fill.take()].into_iter().flatten() {
            scene.materials.remove(id);
        }
        self.renderers.clear();
        self.state = SetupState::Uninitialized;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives::generate_cube;
    use crate::mesh::SMOOTH_NORMAL_CHANNEL;
    use crate::render::material::{Material, MaterialLibrary};
    use crate::scene::{MeshRenderer, RendererKind};

    struct Fixture {
        scene: Scene,
        library: MaterialLibrary,
        cache: MeshBakeCache,
        root: ObjectId,
        base: MaterialId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut scene = Scene::new();
            let root = scene.spawn("crate");
            let mesh = scene.add_mesh(generate_cube(0.5, false));
            let base = scene.materials.insert(Material::new("Wood", "Standard"));
            scene.set_renderer(root, MeshRenderer::new(RendererKind::Static, mesh, vec![base]));
            Self { scene, library: MaterialLibrary::with_outline_templates(), cache: MeshBakeCache::new(), root, base }
        }

        fn enable(&mut self, outline: &mut OutlineRenderer) -> bool {
            let mut ctx = OutlineContext { scene: &mut self.scene, resources: &self.library, cache: &mut self.cache };
            outline.enable(&mut ctx)
        }

        fn materials(&self) -> Vec<MaterialId> { self.scene.renderer(self.root).unwrap().materials.clone() }
    }

    #[test]
    fn enable_and_disable_are_idempotent() {
        let mut fx = Fixture::new();
        let mut outline = OutlineRenderer::new(fx.root);
        assert!(fx.enable(&mut outline));
        assert!(fx.enable(&mut outline));
        let (mask, fill) = (outline.mask_material().unwrap(), outline.fill_material().unwrap());
        assert_eq!(fx.materials(), vec![fx.base, mask, fill]);

        outline.disable(&mut fx.scene);
        outline.disable(&mut fx.scene);
        assert_eq!(fx.materials(), vec![fx.base]);

        assert!(fx.enable(&mut outline));
        assert_eq!(fx.materials(), vec![fx.base, mask, fill]);
    }

    #[test]
    fn setup_names_instances_and_prepares_meshes() {
        let mut fx = Fixture::new();
        let mut outline = OutlineRenderer::new(fx.root);
        fx.enable(&mut outline);
        assert_eq!(outline.state(), SetupState::Ready);
        let mask = fx.scene.materials.get(outline.mask_material().unwrap()).unwrap();
        assert_eq!(mask.name, "OutlineMask (Instance)");
        let mesh = fx.scene.renderer(fx.root).and_then(|r| r.mesh).unwrap();
        assert_eq!(fx.scene.meshes[mesh].uvs(SMOOTH_NORMAL_CHANNEL).len(), 24);
    }

    #[test]
    fn missing_template_fails_setup_without_panicking() {
        let mut fx = Fixture::new();
        fx.library = MaterialLibrary::new();
        let mut outline = OutlineRenderer::new(fx.root);
        assert!(!fx.enable(&mut outline));
        assert_eq!(outline.state(), SetupState::Failed);
        assert!(!outline.is_enabled());
        assert_eq!(fx.materials(), vec![fx.base]);
        outline.tick(&mut fx.scene.materials, 1.0);
        outline.teardown(&mut fx.scene);
    }

    #[test]
    fn static_width_is_written_once() {
        let mut fx = Fixture::new();
        let mut outline = OutlineRenderer::new(fx.root);
        outline.config_mut().set_width(5.0);
        outline.config_mut().set_color(Color::YELLOW);
        fx.enable(&mut outline);

        outline.tick(&mut fx.scene.materials, 0.0);
        let fill = outline.fill_material().unwrap();
        let rev = fx.scene.materials.get(fill).unwrap().revision();
        for t in 1..10 {
            outline.tick(&mut fx.scene.materials, t as f32);
        }
        let m = fx.scene.materials.get(fill).unwrap();
        assert_eq!(m.revision(), rev);
        assert_eq!(m.float(WIDTH_PARAM), Some(5.0));
        assert_eq!(m.color(COLOR_PARAM), Some(Color::YELLOW));

        outline.config_mut().set_mode(OutlineMode::SilhouetteOnly);
        outline.tick(&mut fx.scene.materials, 10.0);
        let m = fx.scene.materials.get(fill).unwrap();
        assert!(m.revision() > rev);
        assert_eq!(m.int(MODE_PARAM), Some(4));
    }

    #[test]
    fn blink_writes_every_tick() {
        let mut fx = Fixture::new();
        let mut outline = OutlineRenderer::new(fx.root);
        outline.config_mut().set_blink(true);
        outline.config_mut().set_blink_range(1.0, 3.0);
        outline.config_mut().set_blink_speed(2.0);
        fx.enable(&mut outline);

        let mask = outline.mask_material().unwrap();
        let mut last = 0;
        for step in 0..5 {
            let t = step as f32 * 0.25;
            outline.tick(&mut fx.scene.materials, t);
            let m = fx.scene.materials.get(mask).unwrap();
            assert!(m.revision() > last);
            last = m.revision();
            let expected = 1.0 + 2.0 * ((t * 2.0).sin() + 1.0) * 0.5;
            assert!((m.float(WIDTH_PARAM).unwrap() - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn disabled_outline_writes_nothing() {
        let mut fx = Fixture::new();
        let mut outline = OutlineRenderer::new(fx.root);
        fx.enable(&mut outline);
        outline.disable(&mut fx.scene);
        outline.tick(&mut fx.scene.materials, 0.0);
        let mask = fx.scene.materials.get(outline.mask_material().unwrap()).unwrap();
        assert_eq!(mask.revision(), 0);
    }

    #[test]
    fn widths_are_clamped() {
        let mut c = OutlineConfig::default();
        c.set_width(42.0);
        assert_eq!(c.width(), MAX_WIDTH);
        c.set_blink_range(-1.0, 11.0);
        assert_eq!((c.blink().min_width, c.blink().max_width), (0.0, MAX_WIDTH));
    }

    #[test]
    fn blink_wave_spans_range() {
        let b = Blink { enabled: true, speed: 1.0, min_width: 0.0, max_width: 4.0 };
        assert!((b.width_at(0.0) - 2.0).abs() < 1e-6);
        assert!((b.width_at(std::f32::consts::FRAC_PI_2) - 4.0).abs() < 1e-5);
        assert!(b.width_at(3.0 * std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn teardown_releases_materials() {
        let mut fx = Fixture::new();
        let mut outline = OutlineRenderer::new(fx.root);
        let before = fx.scene.materials.len();
        fx.enable(&mut outline);
        assert_eq!(fx.scene.materials.len(), before + 2);
        outline.teardown(&mut fx.scene);
        assert_eq!(fx.scene.materials.len(), before);
        assert_eq!(fx.materials(), vec![fx.base]);
        outline.teardown(&mut fx.scene);
        OutlineRenderer::new(fx.root).teardown(&mut fx.scene);
    }

    #[test]
    fn validate_bakes_and_clears() {
        let fx = Fixture::new();
        let mut outline = OutlineRenderer::new(fx.root);
        outline.precompute_outline = true;
        outline.validate(&fx.scene);
        assert_eq!(outline.bake_store().len(), 1);

        outline.precompute_outline = false;
        outline.validate(&fx.scene);
        assert!(outline.bake_store().is_empty());
    }

    #[test]
    fn baked_normals_skip_smoothing() {
        let mut fx = Fixture::new();
        let mut outline = OutlineRenderer::new(fx.root);
        outline.precompute_outline = true;
        outline.validate(&fx.scene);
        fx.enable(&mut outline);
        assert_eq!(fx.cache.smoothing_runs(), 0);
        assert!(fx.cache.len() == 1);
    }
}
