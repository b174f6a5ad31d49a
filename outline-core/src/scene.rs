//! Minimal host scene: an object hierarchy with mesh renderers.
//!
//! The outline code only needs what a host engine would hand it: walk an
//! object's subtree, read and rewrite each renderer's material list, and reach
//! the shared meshes those renderers draw.

use slotmap::SlotMap;

use crate::mesh::{Mesh, MeshId};
use crate::render::material::{MaterialId, MaterialStore};

slotmap::new_key_type! {
    /// Stable identity of an object in the scene.
    pub struct ObjectId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    /// Regular mesh renderer; its mesh gets smoothed normals.
    Static,
    /// Skinned renderer; normals move with the skeleton, so no smoothing.
    Skinned,
}

#[derive(Debug, Clone)]
pub struct MeshRenderer {
    pub kind: RendererKind,
    pub mesh: Option<MeshId>,
    pub materials: Vec<MaterialId>,
}

impl MeshRenderer {
    pub fn new(kind: RendererKind, mesh: MeshId, materials: Vec<MaterialId>) -> Self {
        Self { kind, mesh: Some(mesh), materials }
    }
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    pub renderer: Option<MeshRenderer>,
}

impl SceneObject {
    pub fn parent(&self) -> Option<ObjectId> { self.parent }
    pub fn children(&self) -> &[ObjectId] { &self.children }
}

#[derive(Debug, Default)]
pub struct Scene {
    objects: SlotMap<ObjectId, SceneObject>,
    pub meshes: SlotMap<MeshId, Mesh>,
    pub materials: MaterialStore,
}

impl Scene {
    pub fn new() -> Self { Self::default() }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId { self.meshes.insert(mesh) }

    pub fn spawn(&mut self, name: impl Into<String>) -> ObjectId {
        self.objects.insert(SceneObject { name: name.into(), parent: None, children: Vec::new(), renderer: None })
    }

    /// Spawn under `parent`; a dead parent yields a root object.
    pub fn spawn_child(&mut self, parent: ObjectId, name: impl Into<String>) -> ObjectId {
        let id = self.spawn(name);
        if let Some(p) = self.objects.get_mut(parent) {
            p.children.push(id);
            self.objects[id].parent = Some(parent);
        }
        id
    }

    pub fn set_renderer(&mut self, id: ObjectId, renderer: MeshRenderer) {
        if let Some(obj) = self.objects.get_mut(id) {
            obj.renderer = Some(renderer);
        }
    }

    pub fn contains(&self, id: ObjectId) -> bool { self.objects.contains_key(id) }
    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> { self.objects.get(id) }
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> { self.objects.get_mut(id) }
    pub fn len(&self) -> usize { self.objects.len() }
    pub fn is_empty(&self) -> bool { self.objects.is_empty() }

    pub fn renderer(&self, id: ObjectId) -> Option<&MeshRenderer> {
        self.objects.get(id).and_then(|o| o.renderer.as_ref())
    }

    pub fn renderer_mut(&mut self, id: ObjectId) -> Option<&mut MeshRenderer> {
        self.objects.get_mut(id).and_then(|o| o.renderer.as_mut())
    }

    /// `root` and everything below it, depth first, parents before children.
    pub fn hierarchy(&self, root: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(obj) = self.objects.get(id) else { continue };
            out.push(id);
            stack.extend(obj.children.iter().rev().copied());
        }
        out
    }

    /// Objects under `root` (inclusive) that carry a renderer.
    pub fn renderers_in_hierarchy(&self, root: ObjectId) -> Vec<ObjectId> {
        self.hierarchy(root).into_iter().filter(|id| self.renderer(*id).is_some()).collect()
    }

    /// Remove `id` and its subtree. Returns the removed ids, parents first.
    pub fn despawn(&mut self, id: ObjectId) -> Vec<ObjectId> {
        let removed = self.hierarchy(id);
        if let Some(parent) = self.objects.get(id).and_then(|o| o.parent) {
            if let Some(p) = self.objects.get_mut(parent) {
                p.children.retain(|c| *c != id);
            }
        }
        for r in &removed {
            self.objects.remove(*r);
        }
        removed
    }
}
