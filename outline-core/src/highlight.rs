//! Highlight lifecycle: which objects are outlined, and for how long.
//!
//! [`HighlightManager`] is built once by the application and handed to
//! whatever triggers highlights. It owns the outline renderers it creates, the
//! process-wide mesh cache and one optional auto-removal timer per target.
//! Every operation is a no-op on unknown or destroyed targets.

use std::collections::HashMap;

use crate::bake::MeshBakeCache;
use crate::config::HighlightSettings;
use crate::render::material::ResourceStore;
use crate::render::outline::{OutlineContext, OutlineRenderer};
use crate::scene::{ObjectId, Scene};
use crate::timer::{TimerQueue, TimerToken};

pub struct HighlightManager {
    settings: HighlightSettings,
    resources: Box<dyn ResourceStore>,
    cache: MeshBakeCache,
    outlines: HashMap<ObjectId, OutlineRenderer>,
    /// Highlighted targets; `Some` when an auto-removal timer is pending.
    active: HashMap<ObjectId, Option<TimerToken>>,
    timers: TimerQueue<ObjectId>,
    time: f64,
}

impl std::fmt::Debug for HighlightManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightManager")
            .field("active", &self.active.len())
            .field("outlines", &self.outlines.len())
            .field("timers", &self.timers.len())
            .field("time", &self.time)
            .finish_non_exhaustive()
    }
}

impl HighlightManager {
    pub fn new(settings: HighlightSettings, resources: impl ResourceStore + 'static) -> Self {
        Self {
            settings: settings.sanitized(),
            resources: Box::new(resources),
            cache: MeshBakeCache::new(),
            outlines: HashMap::new(),
            active: HashMap::new(),
            timers: TimerQueue::new(),
            time: 0.0,
        }
    }

    pub fn settings(&self) -> &HighlightSettings { &self.settings }
    pub fn settings_mut(&mut self) -> &mut HighlightSettings { &mut self.settings }
    pub fn cache(&self) -> &MeshBakeCache { &self.cache }

    /// Seconds of frame time seen so far.
    pub fn time(&self) -> f64 { self.time }

    /// Highlight `target`, timed by the auto-stop default when that is enabled.
    pub fn highlight(&mut self, scene: &mut Scene, target: ObjectId) {
        if self.settings.use_auto_stop {
            self.highlight_for(scene, target, self.settings.auto_stop_duration);
        } else {
            self.apply(scene, target, None);
        }
    }

    /// Highlight `target` for `duration` seconds, replacing any running timer.
    pub fn highlight_for(&mut self, scene: &mut Scene, target: ObjectId, duration: f32) {
        self.apply(scene, target, Some(duration));
    }

    fn apply(&mut self, scene: &mut Scene, target: ObjectId, duration: Option<f32>) {
        if !scene.contains(target) {
            log::debug!("highlight ignored: {:?} is not in the scene", target);
            return;
        }

        let s = &self.settings;
        let outline = self.outlines.entry(target).or_insert_with(|| OutlineRenderer::new(target));
        let config = outline.config_mut();
        config.set_mode(s.default_mode);
        config.set_color(s.default_color);
        config.set_width(s.default_width);
        config.set_blink_speed(s.blink_speed);
        config.set_blink_range(s.blink_min_width, s.blink_max_width);
        config.set_blink(s.default_blink);

        let mut ctx = OutlineContext { scene, resources: self.resources.as_ref(), cache: &mut self.cache };
        outline.enable(&mut ctx);

        if let Some(Some(previous)) = self.active.remove(&target) {
            self.timers.cancel(previous);
        }
        let token = duration.map(|d| {
            let d = if d.is_nan() { 0.0 } else { d.max(0.0) };
            self.timers.schedule(self.time + f64::from(d), target)
        });
        self.active.insert(target, token);
        log::info!("highlight on {:?} ({})", target, duration.map_or("untimed".to_owned(), |d| format!("{:.2}s", d)));
    }

    /// Stop highlighting `target` now. No-op if it is not highlighted.
    pub fn clear_highlight(&mut self, scene: &mut Scene, target: ObjectId) {
        if let Some(Some(token)) = self.active.remove(&target) {
            self.timers.cancel(token);
        }
        if let Some(outline) = self.outlines.get_mut(&target) {
            outline.config_mut().set_blink(false);
            outline.disable(scene);
        }
    }

    /// Stop every highlight, cancelling all pending auto-removal timers.
    pub fn clear_all_highlights(&mut self, scene: &mut Scene) {
        for (target, token) in self.active.drain() {
            if let Some(token) = token {
                self.timers.cancel(token);
            }
            if let Some(outline) = self.outlines.get_mut(&target) {
                outline.disable(scene);
            }
        }
        log::info!("cleared all highlights");
    }

    /// Advance time by `dt` seconds: drop outlines on objects that left the
    /// scene, fire due timers, then push shader parameters.
    pub fn tick(&mut self, scene: &mut Scene, dt: f32) {
        self.prune_destroyed(scene);
        self.time += f64::from(dt.max(0.0));
        for (token, target) in self.timers.drain_expired(self.time) {
            self.auto_remove(scene, target, token);
        }
        let time = self.time as f32;
        for outline in self.outlines.values_mut() {
            outline.tick(&mut scene.materials, time);
        }
    }

    fn auto_remove(&mut self, scene: &mut Scene, target: ObjectId, token: TimerToken) {
        if let Some(outline) = self.outlines.get_mut(&target) {
            outline.config_mut().set_blink(false);
            outline.disable(scene);
        }
        if self.active.get(&target) == Some(&Some(token)) {
            self.active.remove(&target);
        }
        log::info!("highlight on {:?} expired", target);
    }

    /// Tear down outlines on `target` and its subtree, then remove it from the scene.
    pub fn destroy_object(&mut self, scene: &mut Scene, target: ObjectId) {
        for id in scene.hierarchy(target) {
            self.release(scene, id);
        }
        scene.despawn(target);
    }

    // Objects despawned straight through the scene still own outline state here.
    fn prune_destroyed(&mut self, scene: &mut Scene) {
        let dead: Vec<ObjectId> =
            self.outlines.keys().chain(self.active.keys()).copied().filter(|id| !scene.contains(*id)).collect();
        for id in dead {
            self.release(scene, id);
            log::debug!("released outline state of despawned {:?}", id);
        }
    }

    fn release(&mut self, scene: &mut Scene, id: ObjectId) {
        if let Some(Some(token)) = self.active.remove(&id) {
            self.timers.cancel(token);
        }
        if let Some(mut outline) = self.outlines.remove(&id) {
            outline.teardown(scene);
        }
    }

    /// The outline renderer on `target`, created (but not enabled) if absent.
    pub fn attach_outline(&mut self, scene: &Scene, target: ObjectId) -> Option<&mut OutlineRenderer> {
        if !scene.contains(target) {
            return None;
        }
        Some(self.outlines.entry(target).or_insert_with(|| OutlineRenderer::new(target)))
    }

    pub fn outline(&self, target: ObjectId) -> Option<&OutlineRenderer> { self.outlines.get(&target) }

    pub fn is_highlighted(&self, target: ObjectId) -> bool { self.active.contains_key(&target) }
    pub fn active_count(&self) -> usize { self.active.len() }
    pub fn active_targets(&self) -> impl Iterator<Item = ObjectId> + '_ { self.active.keys().copied() }

    /// Deadline of the pending auto-removal for `target`, in manager time.
    pub fn expires_at(&self, target: ObjectId) -> Option<f64> {
        let token = (*self.active.get(&target)?)?;
        self.timers.deadline(token)
    }

    pub fn pending_timers(&self) -> usize { self.timers.len() }
}
