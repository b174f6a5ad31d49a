use glam::Vec3;

use super::Mesh;

// Generate a UV sphere centered at origin, scaled by radius.
// stacks: latitude segments (>= 3), slices: longitude segments (>= 3)
// The seam column and both poles repeat positions exactly, which is what the smoother welds.
pub fn generate_uv_sphere(radius: f32, stacks: u32, slices: u32) -> Mesh {
    let stacks = stacks.max(3);
    let slices = slices.max(3);
    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut indices = Vec::new();

    for i in 0..=stacks {
        let v = i as f32 / stacks as f32; // 0..1
        let theta = v * std::f32::consts::PI; // 0..PI
        let (sin_t, cos_t) = theta.sin_cos();
        for j in 0..=slices {
            let u = (j % slices) as f32 / slices as f32; // 0..1, seam wraps to 0
            let phi = u * std::f32::consts::TAU; // 0..2PI
            let (sin_p, cos_p) = phi.sin_cos();

            let n = match i {
                0 => Vec3::Y,
                i if i == stacks => Vec3::NEG_Y,
                _ => Vec3::new(sin_t * cos_p, cos_t, sin_t * sin_p),
            };
            positions.push(n * radius);
            normals.push(n);
        }
    }

    let stride = slices + 1;
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * stride + j;
            let b = a + 1;
            let c = a + stride;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b]);
            indices.extend_from_slice(&[b, c, d]);
        }
    }

    Mesh::new("uv-sphere", positions, normals, indices)
}

// Axis-aligned cube with split (flat) normals: 4 vertices per face, 24 total,
// every corner shared by three faces. One submesh per face when `per_face`.
pub fn generate_cube(half_extent: f32, per_face: bool) -> Mesh {
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::Y, Vec3::Z),
        (Vec3::NEG_X, Vec3::Y, Vec3::NEG_Z),
        (Vec3::Y, Vec3::Z, Vec3::X),
        (Vec3::NEG_Y, Vec3::NEG_Z, Vec3::X),
        (Vec3::Z, Vec3::Y, Vec3::NEG_X),
        (Vec3::NEG_Z, Vec3::Y, Vec3::X),
    ];

    let mut positions = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    let mut submeshes: Vec<Vec<u32>> = Vec::new();

    for (normal, up, right) in FACES {
        let base = positions.len() as u32;
        for (su, sr) in [(-1.0, -1.0), (-1.0, 1.0), (1.0, 1.0), (1.0, -1.0)] {
            positions.push((normal + up * su + right * sr) * half_extent);
            normals.push(normal);
        }
        let quad = [base, base + 1, base + 2, base, base + 2, base + 3];
        if per_face || submeshes.is_empty() {
            submeshes.push(quad.to_vec());
        } else {
            submeshes[0].extend_from_slice(&quad);
        }
    }

    Mesh::with_submeshes("cube", positions, normals, submeshes)
}
