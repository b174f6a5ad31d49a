//! Smoothed normals for outline expansion.
//!
//! Hard-edged meshes split vertices along creases, so expanding each vertex along
//! its own normal tears the outline open at every edge. Averaging the normals of
//! all vertices that share a position gives one direction per corner and a closed
//! silhouette.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One smoothed normal per vertex, parallel to the mesh's vertex array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SmoothedNormalSet(Vec<Vec3>);

impl SmoothedNormalSet {
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn as_slice(&self) -> &[Vec3] { &self.0 }
    pub fn into_vec(self) -> Vec<Vec3> { self.0 }
}

impl From<Vec<Vec3>> for SmoothedNormalSet {
    fn from(v: Vec<Vec3>) -> Self { Self(v) }
}

/// Exact position key: coincident vertices must match bit for bit.
fn position_key(p: Vec3) -> [u32; 3] {
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

fn group_by_position(positions: &[Vec3]) -> HashMap<[u32; 3], Vec<usize>> {
    let mut groups: HashMap<[u32; 3], Vec<usize>> = HashMap::with_capacity(positions.len());
    for (i, p) in positions.iter().enumerate() {
        groups.entry(position_key(*p)).or_default().push(i);
    }
    groups
}

/// Average the normals of every group of coincident vertices.
///
/// Vertices with a unique position keep their normal. A group whose normals sum
/// to zero (or to something non-finite) has no usable direction; its members keep
/// their own original normals. Missing normals count as zero vectors, so the
/// result always has `positions.len()` entries.
///
/// Positions are compared bit for bit: `-0.0` and `0.0` are different
/// positions, so signed zeros (common on mirrored meshes) are not welded.
pub fn compute_smoothed(positions: &[Vec3], normals: &[Vec3]) -> SmoothedNormalSet {
    let normal_at = |i: usize| normals.get(i).copied().unwrap_or(Vec3::ZERO);
    let mut out: Vec<Vec3> = (0..positions.len()).map(normal_at).collect();

    for members in group_by_position(positions).values() {
        if members.len() < 2 {
            continue;
        }
        let sum = members.iter().fold(Vec3::ZERO, |acc, &i| acc + normal_at(i));
        let Some(smooth) = sum.try_normalize() else { continue };
        for &i in members {
            out[i] = smooth;
        }
    }

    SmoothedNormalSet(out)
}

/// Summary of how much welding the smoother found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmoothingReport {
    pub vertices: usize,
    pub unique_positions: usize,
    /// Positions shared by two or more vertices.
    pub shared_positions: usize,
    /// Shared positions whose normals cancelled out.
    pub degenerate_groups: usize,
}

pub fn analyze(positions: &[Vec3], normals: &[Vec3]) -> SmoothingReport {
    let normal_at = |i: usize| normals.get(i).copied().unwrap_or(Vec3::ZERO);
    let groups = group_by_position(positions);
    let mut report = SmoothingReport { vertices: positions.len(), unique_positions: groups.len(), ..Default::default() };
    for members in groups.values().filter(|m| m.len() > 1) {
        report.shared_positions += 1;
        let sum = members.iter().fold(Vec3::ZERO, |acc, &i| acc + normal_at(i));
        if sum.try_normalize().is_none() {
            report.degenerate_groups += 1;
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_positions_keep_their_normals() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let normals = [Vec3::Y, Vec3::new(0.0, 0.6, 0.8), -Vec3::Z];
        let out = compute_smoothed(&positions, &normals);
        assert_eq!(out.as_slice(), &normals);
    }

    #[test]
    fn coincident_pair_is_averaged() {
        let positions = [Vec3::ZERO, Vec3::ZERO, Vec3::X];
        let normals = [Vec3::Y, Vec3::X, Vec3::Z];
        let out = compute_smoothed(&positions, &normals);
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert!(out.as_slice()[0].abs_diff_eq(expected, 1e-6));
        assert_eq!(out.as_slice()[0], out.as_slice()[1]);
        assert_eq!(out.as_slice()[2], Vec3::Z);
        assert!((out.as_slice()[0].x - 0.70710677).abs() < 1e-6);
    }

    #[test]
    fn signed_zeros_are_distinct_positions() {
        let positions = [Vec3::new(0.0, 1.0, 0.0), Vec3::new(-0.0, 1.0, 0.0)];
        let normals = [Vec3::X, Vec3::Y];
        let out = compute_smoothed(&positions, &normals);
        assert_eq!(out.as_slice(), &normals);
    }

    #[test]
    fn group_members_share_one_normal() {
        let corner = Vec3::new(0.5, 0.5, 0.5);
        let positions = [corner, corner, corner, Vec3::ZERO];
        let normals = [Vec3::X, Vec3::Y, Vec3::Z, Vec3::X];
        let out = compute_smoothed(&positions, &normals);
        let expected = Vec3::ONE.normalize();
        for n in &out.as_slice()[..3] {
            assert!(n.abs_diff_eq(expected, 1e-6));
        }
        assert_eq!(out.as_slice()[3], Vec3::X);
    }

    #[test]
    fn opposing_normals_fall_back_to_originals() {
        let positions = [Vec3::ONE, Vec3::ONE];
        let normals = [Vec3::Y, -Vec3::Y];
        let out = compute_smoothed(&positions, &normals);
        assert_eq!(out.as_slice(), &normals);
        assert_eq!(analyze(&positions, &normals).degenerate_groups, 1);
    }

    #[test]
    fn positions_must_match_exactly() {
        let positions = [Vec3::ZERO, Vec3::new(1e-7, 0.0, 0.0)];
        let normals = [Vec3::Y, Vec3::X];
        let out = compute_smoothed(&positions, &normals);
        assert_eq!(out.as_slice(), &normals);
    }

    #[test]
    fn missing_normals_still_yield_one_entry_per_vertex() {
        let positions = [Vec3::ZERO, Vec3::ZERO, Vec3::X];
        let out = compute_smoothed(&positions, &[Vec3::Y]);
        assert_eq!(out.len(), 3);
        assert_eq!(out.as_slice()[0], Vec3::Y);
        assert_eq!(out.as_slice()[1], Vec3::Y);
        assert_eq!(out.as_slice()[2], Vec3::ZERO);
    }

    #[test]
    fn report_counts_shared_positions() {
        let positions = [Vec3::ZERO, Vec3::ZERO, Vec3::X, Vec3::X, Vec3::Y];
        let normals = [Vec3::Y, Vec3::X, Vec3::Z, Vec3::Y, Vec3::Z];
        let r = analyze(&positions, &normals);
        assert_eq!(r, SmoothingReport { vertices: 5, unique_positions: 3, shared_positions: 2, degenerate_groups: 0 });
    }
}
