//! Mesh resources as seen by the outline passes.
//!
//! A mesh here is the host-owned geometry the outline shaders read: positions,
//! normals, a few vec3 UV channels and a triangle buffer split into submeshes
//! (one per material slot). Meshes live in the scene's mesh store and are shared
//! by reference ([`MeshId`]) between renderers.

pub mod primitives;
pub mod smooth;
pub mod submesh;

use glam::Vec3;

use crate::error::{OutlineError, Result};

slotmap::new_key_type! {
    /// Stable identity of a mesh in the scene's mesh store.
    pub struct MeshId;
}

/// Number of vec3 UV channels a mesh carries.
pub const UV_CHANNEL_COUNT: usize = 4;

/// UV channel the outline fill shader reads its expansion direction from.
pub const SMOOTH_NORMAL_CHANNEL: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub name: String,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: [Vec<Vec3>; UV_CHANNEL_COUNT],
    submeshes: Vec<Vec<u32>>,
    revision: u64,
}

impl Mesh {
    /// Build a mesh with a single submesh covering `indices`.
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, normals: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self::with_submeshes(name, positions, normals, vec![indices])
    }

    pub fn with_submeshes(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        submeshes: Vec<Vec<u32>>,
    ) -> Self {
        Self {
            name: name.into(),
            positions,
            normals,
            uvs: Default::default(),
            submeshes,
            revision: 0,
        }
    }

    pub fn vertex_count(&self) -> usize { self.positions.len() }
    pub fn positions(&self) -> &[Vec3] { &self.positions }
    pub fn normals(&self) -> &[Vec3] { &self.normals }

    pub fn submesh_count(&self) -> usize { self.submeshes.len() }

    pub fn submesh(&self, index: usize) -> Option<&[u32]> {
        self.submeshes.get(index).map(Vec::as_slice)
    }

    /// The whole triangle buffer, submeshes concatenated in order.
    pub fn triangles(&self) -> Vec<u32> {
        self.submeshes.iter().flatten().copied().collect()
    }

    pub fn push_submesh(&mut self, indices: Vec<u32>) {
        self.submeshes.push(indices);
        self.revision += 1;
    }

    /// Contents of a UV channel; empty when the channel was never set.
    pub fn uvs(&self, channel: usize) -> &[Vec3] {
        self.uvs.get(channel).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Raw bytes of a UV channel, laid out for a vertex buffer upload.
    pub fn uv_bytes(&self, channel: usize) -> &[u8] {
        bytemuck::cast_slice(self.uvs(channel))
    }

    /// Replace a UV channel. The data must be parallel to the vertex array.
    pub fn set_uvs(&mut self, channel: usize, data: Vec<Vec3>) -> Result<()> {
        if channel >= UV_CHANNEL_COUNT {
            return Err(OutlineError::UvChannelOutOfRange(channel));
        }
        if data.len() != self.vertex_count() {
            return Err(OutlineError::VertexCountMismatch { expected: self.vertex_count(), got: data.len() });
        }
        self.uvs[channel] = data;
        self.revision += 1;
        Ok(())
    }

    /// Bumped on every in-place mutation (UV writes, appended submeshes).
    pub fn revision(&self) -> u64 { self.revision }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh::with_submeshes(
            "quad",
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(1.0, 1.0, 0.0)],
            vec![Vec3::Z; 4],
            vec![vec![0, 1, 2], vec![2, 1, 3]],
        )
    }

    #[test]
    fn triangles_concatenate_submeshes() {
        assert_eq!(quad().triangles(), vec![0, 1, 2, 2, 1, 3]);
    }

    #[test]
    fn set_uvs_checks_length_and_channel() {
        let mut m = quad();
        assert_eq!(
            m.set_uvs(SMOOTH_NORMAL_CHANNEL, vec![Vec3::Z; 3]),
            Err(OutlineError::VertexCountMismatch { expected: 4, got: 3 })
        );
        assert_eq!(m.set_uvs(UV_CHANNEL_COUNT, vec![Vec3::Z; 4]), Err(OutlineError::UvChannelOutOfRange(4)));
        assert_eq!(m.revision(), 0);

        m.set_uvs(SMOOTH_NORMAL_CHANNEL, vec![Vec3::Z; 4]).unwrap();
        assert_eq!(m.uvs(SMOOTH_NORMAL_CHANNEL).len(), 4);
        assert_eq!(m.uv_bytes(SMOOTH_NORMAL_CHANNEL).len(), 4 * 12);
        assert_eq!(m.revision(), 1);
    }
}
