//! Mask submesh for multi-material meshes.
//!
//! The outline materials are appended after a renderer's own materials. With a
//! single submesh every extra material draws the whole mesh; with several
//! submeshes an extra material only draws the last one. Appending a submesh that
//! repeats the full triangle buffer gives the mask pass the whole mesh again.

use super::Mesh;

/// Append a submesh covering every triangle, unless the mesh does not need one.
///
/// Meshes with zero or one submesh, or with more submeshes than materials
/// (already combined), are left alone. Returns whether the mesh was changed.
///
/// This mutates a shared resource; callers gate it so it runs once per mesh.
pub fn ensure_mask_submesh(mesh: &mut Mesh, material_count: usize) -> bool {
    let count = mesh.submesh_count();
    if count <= 1 || count > material_count {
        return false;
    }
    let all = mesh.triangles();
    mesh.push_submesh(all);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn two_part_mesh() -> Mesh {
        Mesh::with_submeshes(
            "two-part",
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE],
            vec![Vec3::Z; 4],
            vec![vec![0, 1, 2], vec![1, 3, 2]],
        )
    }

    #[test]
    fn single_submesh_is_untouched() {
        let mut m = Mesh::new("tri", vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![Vec3::Z; 3], vec![0, 1, 2]);
        assert!(!ensure_mask_submesh(&mut m, 1));
        assert_eq!(m.submesh_count(), 1);
    }

    #[test]
    fn multi_material_mesh_gets_full_copy() {
        let mut m = two_part_mesh();
        assert!(ensure_mask_submesh(&mut m, 2));
        assert_eq!(m.submesh_count(), 3);
        assert_eq!(m.submesh(2), Some(&[0, 1, 2, 1, 3, 2][..]));
    }

    #[test]
    fn combined_mesh_is_not_combined_again() {
        let mut m = two_part_mesh();
        assert!(ensure_mask_submesh(&mut m, 2));
        assert!(!ensure_mask_submesh(&mut m, 2));
        assert_eq!(m.submesh_count(), 3);
    }

    #[test]
    fn more_submeshes_than_materials_is_untouched() {
        let mut m = two_part_mesh();
        assert!(!ensure_mask_submesh(&mut m, 1));
        assert_eq!(m.revision(), 0);
    }
}
