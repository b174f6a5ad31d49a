//! Smoothed-normal caching.
//!
//! Two registries sit in front of the smoother:
//! - [`BakeStore`]: explicit, persisted bake data owned by one outline
//!   component, stored as parallel key/value sequences.
//! - [`MeshBakeCache`]: the process-wide set of meshes already prepared this
//!   run. A mesh is written to (UV channel, mask submesh) at most once, no
//!   matter how many highlighted objects share it.

use std::collections::HashSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{OutlineError, Result};
use crate::mesh::smooth::{compute_smoothed, SmoothedNormalSet};
use crate::mesh::submesh::ensure_mask_submesh;
use crate::mesh::{Mesh, MeshId, SMOOTH_NORMAL_CHANNEL};
use crate::scene::{ObjectId, RendererKind, Scene};

/// Persisted bake data. `keys[i]` owns `values[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BakeStore {
    keys: Vec<MeshId>,
    values: Vec<SmoothedNormalSet>,
}

impl BakeStore {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.keys.len() }
    pub fn is_empty(&self) -> bool { self.keys.is_empty() && self.values.is_empty() }
    pub fn keys(&self) -> &[MeshId] { &self.keys }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    /// Keys and values line up.
    pub fn is_consistent(&self) -> bool { self.keys.len() == self.values.len() }

    /// Baked normals for `mesh`; nothing is returned from inconsistent data.
    pub fn get(&self, mesh: MeshId) -> Option<&SmoothedNormalSet> {
        if !self.is_consistent() {
            return None;
        }
        let index = self.keys.iter().position(|k| *k == mesh)?;
        self.values.get(index)
    }

    /// Check the store against the distinct static meshes under a hierarchy.
    pub fn check(&self, scene: &Scene, meshes: &[MeshId]) -> Result<()> {
        let stale = OutlineError::StaleBake { keys: self.keys.len(), values: self.values.len(), meshes: meshes.len() };
        if !self.is_consistent() || self.keys != meshes {
            return Err(stale);
        }
        for (key, value) in self.keys.iter().zip(&self.values) {
            match scene.meshes.get(*key) {
                Some(m) if m.vertex_count() == value.len() => {}
                _ => return Err(stale),
            }
        }
        Ok(())
    }

    /// Bake every distinct static mesh under `root`.
    ///
    /// Up-to-date data is left alone. Anything else (length mismatch, a mesh
    /// added, removed or resized) clears the store and recomputes all entries.
    /// Returns the number of meshes smoothed.
    pub fn bake(&mut self, scene: &Scene, root: ObjectId) -> usize {
        let meshes = static_meshes(scene, root);
        match self.check(scene, &meshes) {
            Ok(()) => return 0,
            Err(e) if !self.is_empty() => log::warn!("rebaking outline normals: {}", e),
            Err(_) => {}
        }
        self.clear();
        for id in meshes {
            let Some(mesh) = scene.meshes.get(id) else { continue };
            self.keys.push(id);
            self.values.push(compute_smoothed(mesh.positions(), mesh.normals()));
        }
        log::debug!("baked smoothed normals for {} meshes", self.keys.len());
        self.keys.len()
    }
}

/// Distinct static meshes under `root`, in hierarchy order.
pub fn static_meshes(scene: &Scene, root: ObjectId) -> Vec<MeshId> {
    let mut seen = HashSet::new();
    scene
        .renderers_in_hierarchy(root)
        .into_iter()
        .filter_map(|id| scene.renderer(id))
        .filter(|r| r.kind == RendererKind::Static)
        .filter_map(|r| r.mesh)
        .filter(|m| seen.insert(*m))
        .collect()
}

/// What one preparation pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrepareReport {
    pub prepared: usize,
    /// Meshes already prepared by an earlier pass (or earlier in this one).
    pub skipped: usize,
    pub from_bake: usize,
    pub smoothed: usize,
    pub combined: usize,
}

/// Process-wide registry of meshes already prepared for outlining.
#[derive(Debug, Default)]
pub struct MeshBakeCache {
    loaded: HashSet<MeshId>,
    smoothing_runs: usize,
    bake_hits: usize,
}

impl MeshBakeCache {
    pub fn new() -> Self { Self::default() }

    pub fn is_loaded(&self, mesh: MeshId) -> bool { self.loaded.contains(&mesh) }
    pub fn len(&self) -> usize { self.loaded.len() }
    pub fn is_empty(&self) -> bool { self.loaded.is_empty() }

    /// Number of times the smoother actually ran.
    pub fn smoothing_runs(&self) -> usize { self.smoothing_runs }

    /// Number of meshes served from baked data.
    pub fn bake_hits(&self) -> usize { self.bake_hits }

    /// Mark `mesh` as prepared; false if it already was.
    pub fn mark_loaded(&mut self, mesh: MeshId) -> bool { self.loaded.insert(mesh) }

    /// Smoothed normals for a mesh not yet prepared this run, or `None` if it
    /// was. Baked data wins when it matches the mesh; otherwise the smoother runs.
    pub fn lookup(&mut self, id: MeshId, mesh: &Mesh, bake: &BakeStore) -> Option<SmoothedNormalSet> {
        if !self.mark_loaded(id) {
            return None;
        }
        match bake.get(id) {
            Some(set) if set.len() == mesh.vertex_count() => {
                self.bake_hits += 1;
                return Some(set.clone());
            }
            Some(set) => log::warn!(
                "{}",
                OutlineError::VertexCountMismatch { expected: mesh.vertex_count(), got: set.len() }
            ),
            None => {}
        }
        self.smoothing_runs += 1;
        Some(compute_smoothed(mesh.positions(), mesh.normals()))
    }

    /// Prepare every mesh drawn by `renderers`: write smoothed normals into the
    /// smooth-normal UV channel and add the mask submesh where needed.
    ///
    /// Static meshes go first, then skinned ones, which get a zeroed channel
    /// since their normals are animated. A renderer whose mesh is gone is
    /// skipped without marking the id as prepared.
    pub fn prepare(&mut self, scene: &mut Scene, renderers: &[ObjectId], bake: &BakeStore) -> PrepareReport {
        let mut report = PrepareReport::default();
        let targets: Vec<(RendererKind, MeshId, usize)> = renderers
            .iter()
            .filter_map(|id| scene.renderer(*id))
            .filter_map(|r| r.mesh.map(|m| (r.kind, m, r.materials.len())))
            .collect();
        let ordered = targets
            .iter()
            .filter(|t| t.0 == RendererKind::Static)
            .chain(targets.iter().filter(|t| t.0 == RendererKind::Skinned));

        for &(kind, id, material_count) in ordered {
            if self.is_loaded(id) {
                report.skipped += 1;
                continue;
            }
            let Some(mesh) = scene.meshes.get_mut(id) else {
                log::warn!("renderer references a mesh that is no longer loaded");
                continue;
            };
            let channel = match kind {
                RendererKind::Static => {
                    let hits = self.bake_hits;
                    let Some(set) = self.lookup(id, mesh, bake) else {
                        report.skipped += 1;
                        continue;
                    };
                    if self.bake_hits > hits { report.from_bake += 1 } else { report.smoothed += 1 }
                    set.into_vec()
                }
                RendererKind::Skinned => {
                    self.mark_loaded(id);
                    vec![Vec3::ZERO; mesh.vertex_count()]
                }
            };
            if let Err(e) = mesh.set_uvs(SMOOTH_NORMAL_CHANNEL, channel) {
                log::warn!("mesh `{}`: {}", mesh.name, e);
            }
            if ensure_mask_submesh(mesh, material_count) {
                report.combined += 1;
            }
            report.prepared += 1;
            log::debug!("prepared mesh `{}` ({} vertices, {} submeshes)", mesh.name, mesh.vertex_count(), mesh.submesh_count());
        }
        report
    }
}
