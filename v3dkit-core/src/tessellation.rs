//! Bezier patch tessellation

use crate::mesh::MeshData;
use crate::point::{bounds_of, Point3f, Vector3f};

/// Diagonal of the reference screen used to turn patch extent into a tolerance
const REFERENCE_SCREEN_DIAGONAL: f32 = 2202.907; // hypot(1920, 1080)

/// Turns a 4x4 Bezier control grid into triangles
pub trait PatchTessellator {
    /// Tessellate so that the surface deviates from the triangles by no more than `tolerance`
    fn tessellate(&self, controls: &[Point3f; 16], tolerance: f32) -> MeshData;
}

/// Screen-space error tolerance for a patch, from its projected extent
pub fn screen_tolerance(controls: &[Point3f; 16]) -> f32 {
    let Some((min, max)) = bounds_of(controls) else {
        return 0.0;
    };
    let mut scale = 1.0;
    if max.z != 0.0 {
        let perspective = min.z / max.z;
        if perspective.is_finite() && perspective > 0.0 {
            scale = perspective;
        }
    }
    let extent = nalgebra::Vector2::new(scale * (max.x - min.x), scale * (max.y - min.y));
    extent.norm() / REFERENCE_SCREEN_DIAGONAL
}

/// Uniform subdivision of the parameter domain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformTessellator {
    pub min_subdivisions: u32,
    pub max_subdivisions: u32,
}

impl Default for UniformTessellator {
    fn default() -> Self {
        Self {
            min_subdivisions: 1,
            max_subdivisions: 32,
        }
    }
}

impl UniformTessellator {
    /// Fixed subdivision count per parameter direction
    pub fn fixed(subdivisions: u32) -> Self {
        let n = subdivisions.max(1);
        Self {
            min_subdivisions: n,
            max_subdivisions: n,
        }
    }

    /// Subdivisions per direction needed to meet `tolerance`
    pub fn subdivisions(&self, controls: &[Point3f; 16], tolerance: f32) -> u32 {
        let lo = self.min_subdivisions.max(1);
        let hi = self.max_subdivisions.max(lo);
        let flatness = flatness(controls);
        if flatness <= f32::EPSILON {
            return lo;
        }
        if tolerance <= 0.0 || !tolerance.is_finite() {
            return hi;
        }
        // Uniform subdivision error shrinks with the square of the step count.
        let n = (flatness / tolerance).sqrt().ceil();
        if n >= hi as f32 {
            hi
        } else {
            (n as u32).clamp(lo, hi)
        }
    }
}

impl PatchTessellator for UniformTessellator {
    fn tessellate(&self, controls: &[Point3f; 16], tolerance: f32) -> MeshData {
        let n = self.subdivisions(controls, tolerance);
        let row = n + 1;
        let mut mesh = MeshData::with_capacity((row * row) as usize, (2 * n * n) as usize);

        for i in 0..=n {
            let u = i as f32 / n as f32;
            for j in 0..=n {
                let v = j as f32 / n as f32;
                let (position, normal) = evaluate(controls, u, v);
                mesh.push_vertex(&position, &normal);
            }
        }

        for i in 0..n {
            for j in 0..n {
                let a = i * row + j;
                let b = (i + 1) * row + j;
                let c = b + 1;
                let d = a + 1;
                mesh.indices.extend_from_slice(&[a, b, c, a, c, d]);
            }
        }

        mesh
    }
}

fn bernstein(t: f32) -> [f32; 4] {
    let s = 1.0 - t;
    [s * s * s, 3.0 * t * s * s, 3.0 * t * t * s, t * t * t]
}

fn bernstein_derivative(t: f32) -> [f32; 4] {
    let s = 1.0 - t;
    [
        -3.0 * s * s,
        3.0 * s * s - 6.0 * t * s,
        6.0 * t * s - 3.0 * t * t,
        3.0 * t * t,
    ]
}

/// Position and unit normal at `(u, v)`
pub fn evaluate(controls: &[Point3f; 16], u: f32, v: f32) -> (Point3f, Vector3f) {
    let bu = bernstein(u);
    let bv = bernstein(v);
    let du = bernstein_derivative(u);
    let dv = bernstein_derivative(v);

    let mut position = Vector3f::zeros();
    let mut su = Vector3f::zeros();
    let mut sv = Vector3f::zeros();
    for i in 0..4 {
        for j in 0..4 {
            let p = controls[4 * i + j].coords;
            position += p * (bu[i] * bv[j]);
            su += p * (du[i] * bv[j]);
            sv += p * (bu[i] * dv[j]);
        }
    }

    let normal = su
        .cross(&sv)
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(|| corner_normal(controls));
    (Point3f::from(position), normal)
}

// Collapsed edges make the partials vanish at corners; use the control-net diagonals.
fn corner_normal(controls: &[Point3f; 16]) -> Vector3f {
    let d0 = controls[12] - controls[3];
    let d1 = controls[15] - controls[0];
    d0.cross(&d1)
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3f::z)
}

/// Largest distance of a control point from the bilinear surface through the corners
fn flatness(controls: &[Point3f; 16]) -> f32 {
    let p00 = controls[0].coords;
    let p03 = controls[3].coords;
    let p30 = controls[12].coords;
    let p33 = controls[15].coords;
    let mut worst: f32 = 0.0;
    for i in 0..4 {
        let s = i as f32 / 3.0;
        for j in 0..4 {
            let t = j as f32 / 3.0;
            let bilinear = p00 * ((1.0 - s) * (1.0 - t)) + p03 * ((1.0 - s) * t) + p30 * (s * (1.0 - t)) + p33 * (s * t);
            worst = worst.max((controls[4 * i + j].coords - bilinear).norm());
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_grid() -> [Point3f; 16] {
        std::array::from_fn(|k| Point3f::new((k % 4) as f32, (k / 4) as f32, 0.0))
    }

    fn bumped_grid() -> [Point3f; 16] {
        let mut grid = flat_grid();
        for k in [5, 6, 9, 10] {
            grid[k].z = 2.0;
        }
        grid
    }

    #[test]
    fn test_flat_patch_single_cell() {
        let tess = UniformTessellator::default();
        let mesh = tess.tessellate(&flat_grid(), 0.01);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        for v in mesh.vertices.chunks_exact(6) {
            assert_relative_eq!(v[5].abs(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_curved_patch_refines_with_tolerance() {
        let tess = UniformTessellator::default();
        let coarse = tess.subdivisions(&bumped_grid(), 1.0);
        let fine = tess.subdivisions(&bumped_grid(), 0.001);
        assert!(fine > coarse);
        assert!(fine <= tess.max_subdivisions);
    }

    #[test]
    fn test_fixed_tessellation_counts() {
        let tess = UniformTessellator::fixed(4);
        let mesh = tess.tessellate(&bumped_grid(), 0.5);
        assert_eq!(mesh.vertex_count(), 25);
        assert_eq!(mesh.indices.len(), 6 * 16);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }

    #[test]
    fn test_evaluate_interpolates_corners() {
        let grid = bumped_grid();
        let (p, _) = evaluate(&grid, 0.0, 0.0);
        assert_relative_eq!(p, grid[0]);
        let (p, _) = evaluate(&grid, 1.0, 1.0);
        assert_relative_eq!(p, grid[15]);
    }

    #[test]
    fn test_screen_tolerance_scales_with_extent() {
        let small = flat_grid();
        let large: [Point3f; 16] = std::array::from_fn(|k| small[k] * 10.0);
        assert!(screen_tolerance(&large) > screen_tolerance(&small));
        assert!(screen_tolerance(&small) > 0.0);
    }
}
