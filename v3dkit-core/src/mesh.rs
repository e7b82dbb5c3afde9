//! Interleaved vertex/index buffers and scene flattening

use crate::error::{Error, Result};
use crate::geometry::GeometryRecord;
use crate::point::{Point3f, Vector3f};
use crate::tessellation::PatchTessellator;
use crate::warning::{SceneWarning, WarningKind};
use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Floats per interleaved vertex: position.xyz then normal.xyz
pub const FLOATS_PER_VERTEX: usize = 6;

/// One interleaved vertex as laid out in the vertex buffer
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl MeshVertex {
    /// Byte stride between consecutive vertices
    pub const STRIDE: usize = std::mem::size_of::<MeshVertex>();
}

/// Vertex and local index contribution of a single record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with room for `vertices` vertices and `triangles` triangles
    pub fn with_capacity(vertices: usize, triangles: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices * FLOATS_PER_VERTEX),
            indices: Vec::with_capacity(triangles * 3),
        }
    }

    /// Append one vertex
    pub fn push_vertex(&mut self, position: &Point3f, normal: &Vector3f) {
        self.vertices
            .extend_from_slice(&[position.x, position.y, position.z, normal.x, normal.y, normal.z]);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// All records of a scene concatenated into one vertex and one index buffer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlattenedMesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl FlattenedMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record's contribution, offsetting its indices by the current vertex count
    pub fn append(&mut self, data: &MeshData) {
        let offset = self.vertex_count() as u32;
        self.indices.extend(data.indices.iter().map(|i| i + offset));
        self.vertices.extend_from_slice(&data.vertices);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Vertices viewed as typed structs
    pub fn as_vertices(&self) -> &[MeshVertex] {
        bytemuck::cast_slice(&self.vertices[..self.vertex_count() * FLOATS_PER_VERTEX])
    }

    /// Check the buffer invariants: whole vertices, whole triangles, indices in range
    pub fn validate(&self) -> Result<()> {
        validate_buffers(&self.vertices, &self.indices)
    }

    /// Axis-aligned bounds of the emitted positions
    pub fn bounds(&self) -> Option<(Point3f, Point3f)> {
        let positions: Vec<Point3f> = self
            .as_vertices()
            .iter()
            .map(|v| Point3f::from(v.position))
            .collect();
        crate::point::bounds_of(&positions)
    }
}

/// Check interleaved vertex/index buffers before they reach a device
pub fn validate_buffers(vertices: &[f32], indices: &[u32]) -> Result<()> {
    if vertices.len() % FLOATS_PER_VERTEX != 0 {
        return Err(Error::InvalidData(format!(
            "vertex buffer holds {} floats, not a multiple of {}",
            vertices.len(),
            FLOATS_PER_VERTEX
        )));
    }
    if indices.len() % 3 != 0 {
        return Err(Error::InvalidData(format!(
            "index buffer holds {} indices, not whole triangles",
            indices.len()
        )));
    }
    let vertex_count = vertices.len() / FLOATS_PER_VERTEX;
    if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(Error::InvalidData(format!(
            "index {} out of range for {} vertices",
            bad, vertex_count
        )));
    }
    Ok(())
}

/// Rasterize every record in order and concatenate the results.
///
/// Records without rasterization support contribute nothing and are reported
/// as warnings.
pub fn flatten(
    records: &[GeometryRecord],
    tessellator: &dyn PatchTessellator,
) -> (FlattenedMesh, Vec<SceneWarning>) {
    let mut mesh = FlattenedMesh::new();
    let mut warnings = Vec::new();

    for (index, record) in records.iter().enumerate() {
        if let GeometryRecord::TriangleGroup(group) = record {
            let missing = group.missing_normal_count();
            if missing > 0 {
                warnings.push(SceneWarning::at_record(index, WarningKind::MissingNormals { missing }));
            }
        }

        match record.rasterize(tessellator) {
            Ok(data) => {
                log::debug!(
                    "record {} ({}): {} vertices, {} triangles",
                    index,
                    record.tag(),
                    data.vertex_count(),
                    data.triangle_count()
                );
                mesh.append(&data);
            }
            Err(Error::UnsupportedGeometry(tag)) => {
                log::warn!("record {}: rendering is not supported for {}", index, tag);
                warnings.push(SceneWarning::at_record(index, WarningKind::UnsupportedGeometry(tag)));
            }
            Err(e) => {
                log::warn!("record {}: {}", index, e);
                warnings.push(SceneWarning::at_record(index, WarningKind::Rasterization(e.to_string())));
            }
        }
    }

    (mesh, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Sphere, Triangle};
    use crate::tags::RecordTag;
    use crate::tessellation::UniformTessellator;

    fn local_triangles(count: u32) -> MeshData {
        let mut data = MeshData::new();
        for i in 0..count {
            let base = i * 3;
            for k in 0..3 {
                data.push_vertex(&Point3f::new(k as f32, i as f32, 0.0), &Vector3f::z());
            }
            data.indices.extend_from_slice(&[base, base + 1, base + 2]);
        }
        data
    }

    #[test]
    fn test_append_offsets_second_object() {
        let first = local_triangles(2);
        let second = local_triangles(3);

        let mut mesh = FlattenedMesh::new();
        mesh.append(&first);
        mesh.append(&second);

        let offset = first.vertex_count() as u32;
        assert_eq!(&mesh.indices[..6], &first.indices[..]);
        for (combined, local) in mesh.indices[6..].iter().zip(&second.indices) {
            assert_eq!(*combined, local + offset);
        }
        assert_eq!(mesh.vertex_count(), 15);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_vertex_struct_layout() {
        assert_eq!(MeshVertex::STRIDE, 24);
        let mut mesh = FlattenedMesh::new();
        mesh.append(&local_triangles(1));
        assert_eq!(mesh.as_vertices()[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.as_vertices()[1].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_validate_rejects_bad_buffers() {
        assert!(validate_buffers(&[0.0; 7], &[]).is_err());
        assert!(validate_buffers(&[0.0; 18], &[0, 1]).is_err());
        assert!(validate_buffers(&[0.0; 18], &[0, 1, 3]).is_err());
        assert!(validate_buffers(&[0.0; 18], &[0, 1, 2]).is_ok());
    }

    #[test]
    fn test_flatten_collects_unsupported_warnings() {
        let records = vec![
            GeometryRecord::Sphere(Sphere {
                center: Point3f::origin(),
                radius: 1.0,
                center_index: 0,
                material_index: 0,
            }),
            GeometryRecord::Triangle(Triangle {
                corners: [
                    Point3f::new(0.0, 0.0, 0.0),
                    Point3f::new(1.0, 0.0, 0.0),
                    Point3f::new(0.0, 1.0, 0.0),
                ],
                corner_colors: None,
                center_index: 0,
                material_index: 0,
            }),
        ];

        let (mesh, warnings) = flatten(&records, &UniformTessellator::default());
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices.len(), 18);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].record_index, Some(0));
        assert_eq!(warnings[0].kind, WarningKind::UnsupportedGeometry(RecordTag::Sphere));
    }

    #[test]
    fn test_bounds_of_flattened_mesh() {
        let mut mesh = FlattenedMesh::new();
        assert!(mesh.bounds().is_none());
        mesh.append(&local_triangles(2));
        let (min, max) = mesh.bounds().unwrap();
        assert_eq!(min, Point3f::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3f::new(2.0, 1.0, 0.0));
    }
}
