//! Whole-file decoding into a `SceneFile`

use crate::error::DecodeError;
use crate::records::{decode_record, Record};
use crate::xdr::{Precision, XdrReader};
use std::path::Path;
use v3dkit_core::{
    flatten, FlattenedMesh, GeometryRecord, Material, Point3f, RecordTag, Result, SceneHeader,
    SceneWarning, UniformTessellator, WarningKind,
};

/// What to do when the record stream reaches a tag that cannot be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownTagPolicy {
    /// Abort decoding with an error
    #[default]
    Fail,
    /// Keep everything decoded so far, record a warning and stop
    Stop,
}

/// Decoder configuration
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    pub unknown_tags: UnknownTagPolicy,
    pub tessellator: UniformTessellator,
}

impl DecodeOptions {
    /// Options that stop at the first undecodable tag instead of failing
    pub fn lenient() -> Self {
        Self {
            unknown_tags: UnknownTagPolicy::Stop,
            ..Default::default()
        }
    }
}

/// A decoded scene file with its flattened render buffers
#[derive(Debug, Clone)]
pub struct SceneFile {
    pub version: u32,
    pub precision: Precision,
    pub header: SceneHeader,
    pub materials: Vec<Material>,
    pub centers: Vec<Point3f>,
    pub records: Vec<GeometryRecord>,
    pub mesh: FlattenedMesh,
    pub warnings: Vec<SceneWarning>,
}

impl SceneFile {
    /// Read and decode a scene file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with(path, &DecodeOptions::default())
    }

    /// Read and decode a scene file from disk with explicit options
    pub fn load_with<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        log::debug!("read {} bytes from {}", bytes.len(), path.display());
        Ok(Self::decode(&bytes, options)?)
    }

    /// Decode a scene from an in-memory byte buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::decode(bytes, &DecodeOptions::default())?)
    }

    /// Decode with structured errors
    pub fn decode(bytes: &[u8], options: &DecodeOptions) -> std::result::Result<Self, DecodeError> {
        let mut reader = XdrReader::new(bytes);
        let version = reader.read_u32()?;
        let precision = Precision::from_flag(reader.read_bool()?);
        log::debug!("scene version {} ({:?} precision)", version, precision);

        let mut scene = SceneFile {
            version,
            precision,
            header: SceneHeader::default(),
            materials: Vec::new(),
            centers: Vec::new(),
            records: Vec::new(),
            mesh: FlattenedMesh::new(),
            warnings: Vec::new(),
        };

        while !reader.is_at_end() {
            let offset = reader.position();
            let raw = reader.read_u32()?;
            let tag = match RecordTag::from_u32(raw) {
                Some(tag) if tag.is_storable() => tag,
                Some(tag) => {
                    log::warn!("record {} at offset {} has no storable layout", tag, offset);
                    let err = DecodeError::UnstorableRecord { tag, offset };
                    scene.stop_or_fail(options, raw, offset, err)?;
                    break;
                }
                None => {
                    log::warn!("unknown record tag {} at offset {}", raw, offset);
                    let err = DecodeError::UnknownTag { tag: raw, offset };
                    scene.stop_or_fail(options, raw, offset, err)?;
                    break;
                }
            };

            match decode_record(tag, &mut reader, precision, &scene.header)? {
                Record::Header(header, warnings) => {
                    log::debug!("header: canvas {}x{}", header.canvas_width, header.canvas_height);
                    scene.header = header;
                    scene.warnings.extend(warnings);
                }
                Record::Material(material) => scene.materials.push(material),
                Record::Centers(centers) => scene.centers.extend(centers),
                Record::Geometry(geometry) => {
                    log::trace!("decoded {} at offset {}", tag, offset);
                    scene.records.push(geometry);
                }
            }
        }

        let (mesh, warnings) = flatten(&scene.records, &options.tessellator);
        scene.mesh = mesh;
        scene.warnings.extend(warnings);

        log::debug!(
            "decoded {} records, {} materials: {} vertices, {} triangles, {} warnings",
            scene.records.len(),
            scene.materials.len(),
            scene.vertex_count(),
            scene.triangle_count(),
            scene.warnings.len()
        );
        Ok(scene)
    }

    fn stop_or_fail(
        &mut self,
        options: &DecodeOptions,
        tag: u32,
        offset: usize,
        err: DecodeError,
    ) -> std::result::Result<(), DecodeError> {
        match options.unknown_tags {
            UnknownTagPolicy::Fail => Err(err),
            UnknownTagPolicy::Stop => {
                self.warnings.push(SceneWarning::new(WarningKind::StoppedAtTag { tag, offset }));
                Ok(())
            }
        }
    }

    /// Interleaved position+normal floats, 6 per vertex
    pub fn vertices(&self) -> &[f32] {
        &self.mesh.vertices
    }

    /// Triangle indices into `vertices`
    pub fn indices(&self) -> &[u32] {
        &self.mesh.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    /// Bounds of the rendered geometry, if any was produced
    pub fn bounds(&self) -> Option<(Point3f, Point3f)> {
        self.mesh.bounds()
    }

    /// Material a record refers to, if the index is valid
    pub fn material_for(&self, record: &GeometryRecord) -> Option<&Material> {
        self.materials.get(record.material_index() as usize)
    }

    /// Center a record refers to; index 0 means none
    pub fn center_for(&self, record: &GeometryRecord) -> Option<&Point3f> {
        match record.center_index() {
            0 => None,
            i => self.centers.get(i as usize - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::SceneWriter;
    use v3dkit_core::{Error, Sphere, Triangle};

    fn triangle(offset: f32) -> GeometryRecord {
        GeometryRecord::Triangle(Triangle {
            corners: [
                Point3f::new(offset, 0.0, 0.0),
                Point3f::new(offset + 1.0, 0.0, 0.0),
                Point3f::new(offset, 1.0, 0.0),
            ],
            corner_colors: None,
            center_index: 0,
            material_index: 0,
        })
    }

    #[test]
    fn test_empty_input_is_truncated() {
        match SceneFile::from_bytes(&[]) {
            Err(Error::Decode(message)) => assert!(message.contains("Unexpected end")),
            other => panic!("expected decode error, got {:?}", other.map(|s| s.version)),
        }
    }

    #[test]
    fn test_preamble_only_scene() {
        let bytes = SceneWriter::new(Precision::Single).to_bytes().unwrap();
        let scene = SceneFile::from_bytes(&bytes).unwrap();
        assert_eq!(scene.version, 1);
        assert!(scene.records.is_empty());
        assert!(scene.vertices().is_empty());
        assert_eq!(scene.header, SceneHeader::default());
    }

    #[test]
    fn test_indices_stay_in_range_across_records() {
        let mut writer = SceneWriter::new(Precision::Double);
        writer.push(triangle(0.0));
        writer.push(GeometryRecord::Sphere(Sphere {
            center: Point3f::origin(),
            radius: 2.0,
            center_index: 0,
            material_index: 0,
        }));
        writer.push(triangle(5.0));
        let scene = SceneFile::from_bytes(&writer.to_bytes().unwrap()).unwrap();

        assert_eq!(scene.records.len(), 3);
        assert_eq!(scene.indices(), &[0, 1, 2, 3, 4, 5]);
        assert!(scene.indices().iter().all(|&i| (i as usize) < scene.vertices().len() / 6));
        for tri in scene.indices().chunks_exact(3) {
            assert!(tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2]);
        }
        assert_eq!(scene.warnings.len(), 1);
        assert_eq!(scene.warnings[0].record_index, Some(1));
    }

    #[test]
    fn test_unknown_tag_policy() {
        let mut bytes = SceneWriter::new(Precision::Single).with_record(triangle(0.0)).to_bytes().unwrap();
        bytes.extend_from_slice(&77u32.to_be_bytes());
        bytes.extend_from_slice(&[0u8; 8]);

        let err = SceneFile::decode(&bytes, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownTag { tag: 77, .. }));

        let scene = SceneFile::decode(&bytes, &DecodeOptions::lenient()).unwrap();
        assert_eq!(scene.records.len(), 1);
        assert_eq!(scene.indices(), &[0, 1, 2]);
        assert!(matches!(scene.warnings[0].kind, WarningKind::StoppedAtTag { tag: 77, .. }));
    }

    #[test]
    fn test_truncated_record_fails_even_when_lenient() {
        let mut bytes = SceneWriter::new(Precision::Single).with_record(triangle(0.0)).to_bytes().unwrap();
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(
            SceneFile::decode(&bytes, &DecodeOptions::lenient()),
            Err(DecodeError::Truncated { .. })
        ));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.v3d");
        SceneWriter::new(Precision::Single)
            .with_record(triangle(0.0))
            .save(&path)
            .unwrap();
        let scene = SceneFile::load(&path).unwrap();
        assert_eq!(scene.triangle_count(), 1);

        assert!(matches!(SceneFile::load(dir.path().join("missing.v3d")), Err(Error::Io(_))));
    }
}
