//! Geometry records decoded from a scene file
//!
//! Every record carries a `center_index` and a `material_index` that refer
//! into the owning scene's centers and materials tables.

use crate::error::{Error, Result};
use crate::mesh::MeshData;
use crate::point::{Point3f, Rgba, Vector3f};
use crate::tags::RecordTag;
use crate::tessellation::PatchTessellator;

/// Bicubic Bezier patch over a 4x4 control grid, row-major (`4 * i + j`)
#[derive(Debug, Clone, PartialEq)]
pub struct BezierPatch {
    pub controls: [Point3f; 16],
    pub corner_colors: Option<[Rgba; 4]>,
    pub center_index: u32,
    pub material_index: u32,
}

/// Cubic Bezier triangle over 10 control points
#[derive(Debug, Clone, PartialEq)]
pub struct BezierTriangle {
    pub controls: [Point3f; 10],
    pub corner_colors: Option<[Rgba; 3]>,
    pub center_index: u32,
    pub material_index: u32,
}

/// Flat triangle
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub corners: [Point3f; 3],
    pub corner_colors: Option<[Rgba; 3]>,
    pub center_index: u32,
    pub material_index: u32,
}

/// Flat convex quad, triangulated as a fan from the first corner
#[derive(Debug, Clone, PartialEq)]
pub struct Quad {
    pub corners: [Point3f; 4],
    pub corner_colors: Option<[Rgba; 4]>,
    pub center_index: u32,
    pub material_index: u32,
}

/// Indexed triangle mesh with optional normal and color arrays
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriangleGroup {
    pub positions: Vec<Point3f>,
    pub normals: Vec<Vector3f>,
    pub colors: Vec<Rgba>,
    pub position_indices: Vec<[u32; 3]>,
    /// Equal to `position_indices` unless the file carried explicit normal indices
    pub normal_indices: Vec<[u32; 3]>,
    /// Equal to `position_indices` unless the file carried explicit color indices
    pub color_indices: Vec<[u32; 3]>,
    pub explicit_normal_indices: bool,
    pub explicit_color_indices: bool,
    pub center_index: u32,
    pub material_index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub center: Point3f,
    pub radius: f32,
    pub center_index: u32,
    pub material_index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HemiSphere {
    pub center: Point3f,
    pub radius: f32,
    pub polar_angle: f32,
    pub azimuthal_angle: f32,
    pub center_index: u32,
    pub material_index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Disk {
    pub center: Point3f,
    pub radius: f32,
    pub polar_angle: f32,
    pub azimuthal_angle: f32,
    pub center_index: u32,
    pub material_index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    pub center: Point3f,
    pub radius: f32,
    pub height: f32,
    pub polar_angle: f32,
    pub azimuthal_angle: f32,
    pub center_index: u32,
    pub material_index: u32,
}

/// Tube swept along a cubic Bezier curve
#[derive(Debug, Clone, PartialEq)]
pub struct Tube {
    pub controls: [Point3f; 4],
    pub width: f32,
    pub core: bool,
    pub center_index: u32,
    pub material_index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BezierCurve {
    pub controls: [Point3f; 4],
    pub center_index: u32,
    pub material_index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineSegment {
    pub endpoints: [Point3f; 2],
    pub center_index: u32,
    pub material_index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pixel {
    pub position: Point3f,
    pub center_index: u32,
    pub material_index: u32,
}

/// One decoded geometry record
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryRecord {
    BezierPatch(BezierPatch),
    BezierTriangle(BezierTriangle),
    Triangle(Triangle),
    Quad(Quad),
    TriangleGroup(TriangleGroup),
    Sphere(Sphere),
    HemiSphere(HemiSphere),
    Disk(Disk),
    Cylinder(Cylinder),
    Tube(Tube),
    BezierCurve(BezierCurve),
    LineSegment(LineSegment),
    Pixel(Pixel),
}

impl GeometryRecord {
    /// Tag this record is written under
    pub fn tag(&self) -> RecordTag {
        match self {
            GeometryRecord::BezierPatch(p) if p.corner_colors.is_some() => RecordTag::BezierPatchColor,
            GeometryRecord::BezierPatch(_) => RecordTag::BezierPatch,
            GeometryRecord::BezierTriangle(t) if t.corner_colors.is_some() => RecordTag::BezierTriangleColor,
            GeometryRecord::BezierTriangle(_) => RecordTag::BezierTriangle,
            GeometryRecord::Triangle(t) if t.corner_colors.is_some() => RecordTag::TriangleColor,
            GeometryRecord::Triangle(_) => RecordTag::Triangle,
            GeometryRecord::Quad(q) if q.corner_colors.is_some() => RecordTag::QuadColor,
            GeometryRecord::Quad(_) => RecordTag::Quad,
            GeometryRecord::TriangleGroup(_) => RecordTag::Triangles,
            GeometryRecord::Sphere(_) => RecordTag::Sphere,
            GeometryRecord::HemiSphere(_) => RecordTag::HalfSphere,
            GeometryRecord::Disk(_) => RecordTag::Disk,
            GeometryRecord::Cylinder(_) => RecordTag::Cylinder,
            GeometryRecord::Tube(_) => RecordTag::Tube,
            GeometryRecord::BezierCurve(_) => RecordTag::Curve,
            GeometryRecord::LineSegment(_) => RecordTag::Line,
            GeometryRecord::Pixel(_) => RecordTag::Pixel,
        }
    }

    pub fn center_index(&self) -> u32 {
        match self {
            GeometryRecord::BezierPatch(r) => r.center_index,
            GeometryRecord::BezierTriangle(r) => r.center_index,
            GeometryRecord::Triangle(r) => r.center_index,
            GeometryRecord::Quad(r) => r.center_index,
            GeometryRecord::TriangleGroup(r) => r.center_index,
            GeometryRecord::Sphere(r) => r.center_index,
            GeometryRecord::HemiSphere(r) => r.center_index,
            GeometryRecord::Disk(r) => r.center_index,
            GeometryRecord::Cylinder(r) => r.center_index,
            GeometryRecord::Tube(r) => r.center_index,
            GeometryRecord::BezierCurve(r) => r.center_index,
            GeometryRecord::LineSegment(r) => r.center_index,
            GeometryRecord::Pixel(r) => r.center_index,
        }
    }

    pub fn material_index(&self) -> u32 {
        match self {
            GeometryRecord::BezierPatch(r) => r.material_index,
            GeometryRecord::BezierTriangle(r) => r.material_index,
            GeometryRecord::Triangle(r) => r.material_index,
            GeometryRecord::Quad(r) => r.material_index,
            GeometryRecord::TriangleGroup(r) => r.material_index,
            GeometryRecord::Sphere(r) => r.material_index,
            GeometryRecord::HemiSphere(r) => r.material_index,
            GeometryRecord::Disk(r) => r.material_index,
            GeometryRecord::Cylinder(r) => r.material_index,
            GeometryRecord::Tube(r) => r.material_index,
            GeometryRecord::BezierCurve(r) => r.material_index,
            GeometryRecord::LineSegment(r) => r.material_index,
            GeometryRecord::Pixel(r) => r.material_index,
        }
    }

    /// Whether `rasterize` produces triangles for this record
    pub fn is_rasterizable(&self) -> bool {
        matches!(
            self,
            GeometryRecord::Triangle(_)
                | GeometryRecord::Quad(_)
                | GeometryRecord::TriangleGroup(_)
                | GeometryRecord::BezierPatch(BezierPatch { corner_colors: None, .. })
        )
    }

    /// Produce interleaved position+normal vertices and local triangle indices.
    ///
    /// Records without rasterization support return `Error::UnsupportedGeometry`.
    pub fn rasterize(&self, tessellator: &dyn PatchTessellator) -> Result<MeshData> {
        match self {
            GeometryRecord::Triangle(t) => Ok(flat_polygon(&t.corners, &[0, 1, 2])),
            GeometryRecord::Quad(q) => Ok(flat_polygon(&q.corners, &[0, 1, 2, 0, 2, 3])),
            GeometryRecord::TriangleGroup(group) => Ok(group.rasterize()),
            GeometryRecord::BezierPatch(patch) if patch.corner_colors.is_none() => {
                let tolerance = crate::tessellation::screen_tolerance(&patch.controls);
                Ok(tessellator.tessellate(&patch.controls, tolerance))
            }
            GeometryRecord::BezierPatch(_)
            | GeometryRecord::BezierTriangle(_)
            | GeometryRecord::Sphere(_)
            | GeometryRecord::HemiSphere(_)
            | GeometryRecord::Disk(_)
            | GeometryRecord::Cylinder(_)
            | GeometryRecord::Tube(_)
            | GeometryRecord::BezierCurve(_)
            | GeometryRecord::LineSegment(_)
            | GeometryRecord::Pixel(_) => Err(Error::UnsupportedGeometry(self.tag())),
        }
    }
}

/// Unit face normal from the first three corners, zero when degenerate
pub fn face_normal(p0: &Point3f, p1: &Point3f, p2: &Point3f) -> Vector3f {
    (p1 - p0)
        .cross(&(p2 - p0))
        .try_normalize(f32::EPSILON)
        .unwrap_or_else(Vector3f::zeros)
}

fn flat_polygon(corners: &[Point3f], indices: &[u32]) -> MeshData {
    let normal = face_normal(&corners[0], &corners[1], &corners[2]);
    let mut mesh = MeshData::with_capacity(corners.len(), indices.len() / 3);
    for corner in corners {
        mesh.push_vertex(corner, &normal);
    }
    mesh.indices.extend_from_slice(indices);
    mesh
}

impl TriangleGroup {
    /// Slots of `positions` that have no entry in `normals`
    pub fn missing_normal_count(&self) -> usize {
        self.positions.len().saturating_sub(self.normals.len())
    }

    /// Position-aligned vertices, normals taken from the normal array by parallel index.
    ///
    /// Slots beyond the normal array get the averaged face normal of the
    /// triangles touching them.
    fn rasterize(&self) -> MeshData {
        let slot_count = self.positions.len();
        let mut slots = vec![Point3f::origin(); slot_count];
        let mut fallback = vec![Vector3f::zeros(); self.missing_normal_count().min(slot_count)];
        let first_missing = self.normals.len();

        for triangle in &self.position_indices {
            let [a, b, c] = triangle.map(|i| i as usize);
            if a >= slot_count || b >= slot_count || c >= slot_count {
                continue;
            }
            slots[a] = self.positions[a];
            slots[b] = self.positions[b];
            slots[c] = self.positions[c];

            if !fallback.is_empty() {
                let n = face_normal(&self.positions[a], &self.positions[b], &self.positions[c]);
                for slot in [a, b, c] {
                    if slot >= first_missing {
                        fallback[slot - first_missing] += n;
                    }
                }
            }
        }

        let mut mesh = MeshData::with_capacity(slot_count, self.position_indices.len());
        for (i, position) in slots.iter().enumerate() {
            let normal = match self.normals.get(i) {
                Some(n) => *n,
                None => fallback[i - first_missing]
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(Vector3f::zeros),
            };
            mesh.push_vertex(position, &normal);
        }
        for triangle in &self.position_indices {
            if triangle.iter().all(|&i| (i as usize) < slot_count) {
                mesh.indices.extend_from_slice(triangle);
            }
        }
        mesh
    }
}
