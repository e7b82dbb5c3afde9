//! Per-tag record bodies

use crate::error::DecodeError;
use crate::header::{decode_header, encode_header};
use crate::xdr::{Precision, XdrReader, XdrWriter};
use std::io::Write;
use v3dkit_core::{
    BezierCurve, BezierPatch, BezierTriangle, Cylinder, Disk, GeometryRecord, HemiSphere,
    LineSegment, Material, Pixel, Point3f, Quad, RecordTag, Rgba, SceneHeader, SceneWarning,
    Sphere, Triangle, TriangleGroup, Tube, Vector3f,
};

type Result<T> = std::result::Result<T, DecodeError>;

/// Body of one top-level record
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Header entries applied on top of the previous header state
    Header(SceneHeader, Vec<SceneWarning>),
    Material(Material),
    Centers(Vec<Point3f>),
    Geometry(GeometryRecord),
}

/// Decode the body of a record whose tag has already been read.
///
/// `header` is the state header entries are applied to.
pub fn decode_record(
    tag: RecordTag,
    reader: &mut XdrReader<'_>,
    precision: Precision,
    header: &SceneHeader,
) -> Result<Record> {
    let p = precision;
    let record = match tag {
        RecordTag::Header => {
            let mut next = header.clone();
            let warnings = decode_header(reader, p, &mut next)?;
            Record::Header(next, warnings)
        }
        RecordTag::Material => Record::Material(decode_material(reader)?),
        RecordTag::Centers => {
            let count = reader.read_u32()?;
            reader.ensure_items(count, 3 * p.real_size())?;
            let centers = (0..count)
                .map(|_| reader.read_point(p))
                .collect::<Result<Vec<_>>>()?;
            Record::Centers(centers)
        }
        RecordTag::Transform
        | RecordTag::Element
        | RecordTag::LineColor
        | RecordTag::CurveColor
        | RecordTag::Animation => {
            return Err(DecodeError::UnstorableRecord {
                tag,
                offset: reader.position(),
            })
        }
        RecordTag::BezierPatch | RecordTag::BezierPatchColor => {
            let controls = reader.read_points::<16>(p)?;
            let (center_index, material_index) = read_refs(reader)?;
            let corner_colors = match tag {
                RecordTag::BezierPatchColor => Some(reader.read_colors::<4>()?),
                _ => None,
            };
            Record::Geometry(GeometryRecord::BezierPatch(BezierPatch {
                controls,
                corner_colors,
                center_index,
                material_index,
            }))
        }
        RecordTag::BezierTriangle | RecordTag::BezierTriangleColor => {
            let controls = reader.read_points::<10>(p)?;
            let (center_index, material_index) = read_refs(reader)?;
            let corner_colors = match tag {
                RecordTag::BezierTriangleColor => Some(reader.read_colors::<3>()?),
                _ => None,
            };
            Record::Geometry(GeometryRecord::BezierTriangle(BezierTriangle {
                controls,
                corner_colors,
                center_index,
                material_index,
            }))
        }
        RecordTag::Triangle | RecordTag::TriangleColor => {
            let corners = reader.read_points::<3>(p)?;
            let (center_index, material_index) = read_refs(reader)?;
            let corner_colors = match tag {
                RecordTag::TriangleColor => Some(reader.read_colors::<3>()?),
                _ => None,
            };
            Record::Geometry(GeometryRecord::Triangle(Triangle {
                corners,
                corner_colors,
                center_index,
                material_index,
            }))
        }
        RecordTag::Quad | RecordTag::QuadColor => {
            let corners = reader.read_points::<4>(p)?;
            let (center_index, material_index) = read_refs(reader)?;
            let corner_colors = match tag {
                RecordTag::QuadColor => Some(reader.read_colors::<4>()?),
                _ => None,
            };
            Record::Geometry(GeometryRecord::Quad(Quad {
                corners,
                corner_colors,
                center_index,
                material_index,
            }))
        }
        RecordTag::Triangles => Record::Geometry(GeometryRecord::TriangleGroup(decode_triangle_group(reader, p)?)),
        RecordTag::Sphere => {
            let center = reader.read_point(p)?;
            // single precision regardless of the file flag
            let radius = reader.read_f32()?;
            let (center_index, material_index) = read_refs(reader)?;
            Record::Geometry(GeometryRecord::Sphere(Sphere {
                center,
                radius,
                center_index,
                material_index,
            }))
        }
        RecordTag::HalfSphere => {
            let center = reader.read_point(p)?;
            let radius = reader.read_real(p)?;
            let (center_index, material_index) = read_refs(reader)?;
            Record::Geometry(GeometryRecord::HemiSphere(HemiSphere {
                center,
                radius,
                polar_angle: reader.read_real(p)?,
                azimuthal_angle: reader.read_real(p)?,
                center_index,
                material_index,
            }))
        }
        RecordTag::Disk => {
            let center = reader.read_point(p)?;
            let radius = reader.read_real(p)?;
            let (center_index, material_index) = read_refs(reader)?;
            Record::Geometry(GeometryRecord::Disk(Disk {
                center,
                radius,
                polar_angle: reader.read_real(p)?,
                azimuthal_angle: reader.read_real(p)?,
                center_index,
                material_index,
            }))
        }
        RecordTag::Cylinder => {
            let center = reader.read_point(p)?;
            let radius = reader.read_real(p)?;
            let height = reader.read_real(p)?;
            let (center_index, material_index) = read_refs(reader)?;
            Record::Geometry(GeometryRecord::Cylinder(Cylinder {
                center,
                radius,
                height,
                polar_angle: reader.read_real(p)?,
                azimuthal_angle: reader.read_real(p)?,
                center_index,
                material_index,
            }))
        }
        RecordTag::Tube => {
            let controls = reader.read_points::<4>(p)?;
            let width = reader.read_real(p)?;
            let (center_index, material_index) = read_refs(reader)?;
            Record::Geometry(GeometryRecord::Tube(Tube {
                controls,
                width,
                core: reader.read_bool()?,
                center_index,
                material_index,
            }))
        }
        RecordTag::Curve => {
            let controls = reader.read_points::<4>(p)?;
            let (center_index, material_index) = read_refs(reader)?;
            Record::Geometry(GeometryRecord::BezierCurve(BezierCurve {
                controls,
                center_index,
                material_index,
            }))
        }
        RecordTag::Line => {
            let endpoints = reader.read_points::<2>(p)?;
            let (center_index, material_index) = read_refs(reader)?;
            Record::Geometry(GeometryRecord::LineSegment(LineSegment {
                endpoints,
                center_index,
                material_index,
            }))
        }
        RecordTag::Pixel => {
            let position = reader.read_point(p)?;
            let (center_index, material_index) = read_refs(reader)?;
            Record::Geometry(GeometryRecord::Pixel(Pixel {
                position,
                center_index,
                material_index,
            }))
        }
    };
    Ok(record)
}

fn read_refs(reader: &mut XdrReader<'_>) -> Result<(u32, u32)> {
    Ok((reader.read_u32()?, reader.read_u32()?))
}

fn decode_material(reader: &mut XdrReader<'_>) -> Result<Material> {
    Ok(Material {
        diffuse: reader.read_rgba()?,
        emissive: reader.read_rgba()?,
        specular: reader.read_rgba()?,
        shininess: reader.read_f32()?,
        metallic: reader.read_f32()?,
        fresnel0: reader.read_f32()?,
    })
}

fn read_index_triple(reader: &mut XdrReader<'_>, what: &'static str, len: usize) -> Result<[u32; 3]> {
    let offset = reader.position();
    let triple = [reader.read_u32()?, reader.read_u32()?, reader.read_u32()?];
    if let Some(&index) = triple.iter().find(|&&i| i as usize >= len) {
        return Err(DecodeError::IndexOutOfRange {
            what,
            index,
            len,
            offset,
        });
    }
    Ok(triple)
}

fn decode_triangle_group(reader: &mut XdrReader<'_>, p: Precision) -> Result<TriangleGroup> {
    let triangle_count = reader.read_u32()?;

    let position_count = reader.read_u32()?;
    reader.ensure_items(position_count, 3 * p.real_size())?;
    let positions = (0..position_count)
        .map(|_| reader.read_point(p))
        .collect::<Result<Vec<_>>>()?;

    let normal_count = reader.read_u32()?;
    reader.ensure_items(normal_count, 3 * p.real_size())?;
    let normals = (0..normal_count)
        .map(|_| reader.read_point(p).map(|n| n.coords))
        .collect::<Result<Vec<Vector3f>>>()?;

    let explicit_normal_indices = reader.read_bool()?;

    let color_count = reader.read_u32()?;
    let mut colors = Vec::new();
    let mut explicit_color_indices = false;
    if color_count > 0 {
        reader.ensure_items(color_count, 16)?;
        colors = (0..color_count)
            .map(|_| reader.read_rgba())
            .collect::<Result<Vec<Rgba>>>()?;
        explicit_color_indices = reader.read_bool()?;
    }

    reader.ensure_items(triangle_count, 12)?;
    let mut group = TriangleGroup {
        positions,
        normals,
        colors,
        position_indices: Vec::with_capacity(triangle_count as usize),
        normal_indices: Vec::with_capacity(triangle_count as usize),
        color_indices: Vec::with_capacity(triangle_count as usize),
        explicit_normal_indices,
        explicit_color_indices,
        center_index: 0,
        material_index: 0,
    };

    for _ in 0..triangle_count {
        let pi = read_index_triple(reader, "position", group.positions.len())?;
        let ni = if explicit_normal_indices {
            read_index_triple(reader, "normal", group.normals.len())?
        } else {
            pi
        };
        let ci = if explicit_color_indices {
            read_index_triple(reader, "color", group.colors.len())?
        } else {
            pi
        };
        group.position_indices.push(pi);
        group.normal_indices.push(ni);
        group.color_indices.push(ci);
    }

    let (center_index, material_index) = read_refs(reader)?;
    group.center_index = center_index;
    group.material_index = material_index;
    Ok(group)
}

/// Encode a record body, tag included
pub fn encode_record<W: Write>(writer: &mut XdrWriter<W>, record: &Record) -> std::io::Result<()> {
    match record {
        Record::Header(header, _) => {
            writer.write_u32(RecordTag::Header as u32)?;
            encode_header(writer, header)
        }
        Record::Material(material) => {
            writer.write_u32(RecordTag::Material as u32)?;
            writer.write_colors(&[material.diffuse, material.emissive, material.specular])?;
            writer.write_f32(material.shininess)?;
            writer.write_f32(material.metallic)?;
            writer.write_f32(material.fresnel0)
        }
        Record::Centers(centers) => {
            writer.write_u32(RecordTag::Centers as u32)?;
            writer.write_u32(centers.len() as u32)?;
            writer.write_points(centers)
        }
        Record::Geometry(geometry) => encode_geometry(writer, geometry),
    }
}

fn encode_geometry<W: Write>(writer: &mut XdrWriter<W>, record: &GeometryRecord) -> std::io::Result<()> {
    writer.write_u32(record.tag() as u32)?;
    match record {
        GeometryRecord::BezierPatch(r) => {
            writer.write_points(&r.controls)?;
            write_refs(writer, r.center_index, r.material_index)?;
            r.corner_colors.iter().try_for_each(|c| writer.write_colors(c))
        }
        GeometryRecord::BezierTriangle(r) => {
            writer.write_points(&r.controls)?;
            write_refs(writer, r.center_index, r.material_index)?;
            r.corner_colors.iter().try_for_each(|c| writer.write_colors(c))
        }
        GeometryRecord::Triangle(r) => {
            writer.write_points(&r.corners)?;
            write_refs(writer, r.center_index, r.material_index)?;
            r.corner_colors.iter().try_for_each(|c| writer.write_colors(c))
        }
        GeometryRecord::Quad(r) => {
            writer.write_points(&r.corners)?;
            write_refs(writer, r.center_index, r.material_index)?;
            r.corner_colors.iter().try_for_each(|c| writer.write_colors(c))
        }
        GeometryRecord::TriangleGroup(g) => {
            writer.write_u32(g.position_indices.len() as u32)?;
            writer.write_u32(g.positions.len() as u32)?;
            writer.write_points(&g.positions)?;
            writer.write_u32(g.normals.len() as u32)?;
            for n in &g.normals {
                writer.write_point(&Point3f::from(*n))?;
            }
            writer.write_bool(g.explicit_normal_indices)?;
            writer.write_u32(g.colors.len() as u32)?;
            if !g.colors.is_empty() {
                writer.write_colors(&g.colors)?;
                writer.write_bool(g.explicit_color_indices)?;
            }
            for (i, pi) in g.position_indices.iter().enumerate() {
                pi.iter().try_for_each(|v| writer.write_u32(*v))?;
                if g.explicit_normal_indices {
                    g.normal_indices[i].iter().try_for_each(|v| writer.write_u32(*v))?;
                }
                if !g.colors.is_empty() && g.explicit_color_indices {
                    g.color_indices[i].iter().try_for_each(|v| writer.write_u32(*v))?;
                }
            }
            write_refs(writer, g.center_index, g.material_index)
        }
        GeometryRecord::Sphere(r) => {
            writer.write_point(&r.center)?;
            writer.write_f32(r.radius)?;
            write_refs(writer, r.center_index, r.material_index)
        }
        GeometryRecord::HemiSphere(r) => {
            writer.write_point(&r.center)?;
            writer.write_real(r.radius)?;
            write_refs(writer, r.center_index, r.material_index)?;
            writer.write_real(r.polar_angle)?;
            writer.write_real(r.azimuthal_angle)
        }
        GeometryRecord::Disk(r) => {
            writer.write_point(&r.center)?;
            writer.write_real(r.radius)?;
            write_refs(writer, r.center_index, r.material_index)?;
            writer.write_real(r.polar_angle)?;
            writer.write_real(r.azimuthal_angle)
        }
        GeometryRecord::Cylinder(r) => {
            writer.write_point(&r.center)?;
            writer.write_real(r.radius)?;
            writer.write_real(r.height)?;
            write_refs(writer, r.center_index, r.material_index)?;
            writer.write_real(r.polar_angle)?;
            writer.write_real(r.azimuthal_angle)
        }
        GeometryRecord::Tube(r) => {
            writer.write_points(&r.controls)?;
            writer.write_real(r.width)?;
            write_refs(writer, r.center_index, r.material_index)?;
            writer.write_bool(r.core)
        }
        GeometryRecord::BezierCurve(r) => {
            writer.write_points(&r.controls)?;
            write_refs(writer, r.center_index, r.material_index)
        }
        GeometryRecord::LineSegment(r) => {
            writer.write_points(&r.endpoints)?;
            write_refs(writer, r.center_index, r.material_index)
        }
        GeometryRecord::Pixel(r) => {
            writer.write_point(&r.position)?;
            write_refs(writer, r.center_index, r.material_index)
        }
    }
}

fn write_refs<W: Write>(writer: &mut XdrWriter<W>, center: u32, material: u32) -> std::io::Result<()> {
    writer.write_u32(center)?;
    writer.write_u32(material)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, WriteBytesExt};

    fn decode(tag: RecordTag, bytes: &[u8], precision: Precision) -> Result<Record> {
        let mut reader = XdrReader::new(bytes);
        let record = decode_record(tag, &mut reader, precision, &SceneHeader::default())?;
        assert!(reader.is_at_end(), "record left {} bytes", reader.remaining());
        Ok(record)
    }

    #[test]
    fn test_decode_colored_triangle_reads_colors_after_refs() {
        let mut bytes = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bytes.write_f32::<BigEndian>(v).unwrap();
        }
        bytes.write_u32::<BigEndian>(7).unwrap();
        bytes.write_u32::<BigEndian>(3).unwrap();
        for c in 0..12 {
            bytes.write_f32::<BigEndian>(c as f32 / 12.0).unwrap();
        }

        match decode(RecordTag::TriangleColor, &bytes, Precision::Single).unwrap() {
            Record::Geometry(GeometryRecord::Triangle(t)) => {
                assert_eq!(t.center_index, 7);
                assert_eq!(t.material_index, 3);
                let colors = t.corner_colors.unwrap();
                assert_eq!(colors[1].r, 4.0 / 12.0);
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_decode_sphere_double_precision() {
        let mut bytes = Vec::new();
        for v in [1.0f64, 2.0, 3.0] {
            bytes.write_f64::<BigEndian>(v).unwrap();
        }
        bytes.write_f32::<BigEndian>(0.5).unwrap();
        bytes.write_u32::<BigEndian>(0).unwrap();
        bytes.write_u32::<BigEndian>(1).unwrap();

        match decode(RecordTag::Sphere, &bytes, Precision::Double).unwrap() {
            Record::Geometry(GeometryRecord::Sphere(s)) => {
                assert_eq!(s.center, Point3f::new(1.0, 2.0, 3.0));
                assert_eq!(s.radius, 0.5);
                assert_eq!(s.material_index, 1);
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_double_precision_sphere_keeps_next_record_aligned() {
        let mut bytes = Vec::new();
        for v in [0.0f64, 0.0, 0.0] {
            bytes.write_f64::<BigEndian>(v).unwrap();
        }
        bytes.write_f32::<BigEndian>(2.0).unwrap();
        bytes.write_u32::<BigEndian>(0).unwrap();
        bytes.write_u32::<BigEndian>(0).unwrap();
        bytes.write_u32::<BigEndian>(RecordTag::Line as u32).unwrap();
        for v in [0.0f64, 0.0, 0.0, 1.0, 1.0, 1.0] {
            bytes.write_f64::<BigEndian>(v).unwrap();
        }
        bytes.write_u32::<BigEndian>(0).unwrap();
        bytes.write_u32::<BigEndian>(0).unwrap();

        let header = SceneHeader::default();
        let mut reader = XdrReader::new(&bytes);
        let sphere = decode_record(RecordTag::Sphere, &mut reader, Precision::Double, &header).unwrap();
        assert!(matches!(sphere, Record::Geometry(GeometryRecord::Sphere(Sphere { radius, .. })) if radius == 2.0));

        let tag = RecordTag::from_u32(reader.read_u32().unwrap()).unwrap();
        assert_eq!(tag, RecordTag::Line);
        let line = decode_record(tag, &mut reader, Precision::Double, &header).unwrap();
        match line {
            Record::Geometry(GeometryRecord::LineSegment(l)) => {
                assert_eq!(l.endpoints[1], Point3f::new(1.0, 1.0, 1.0));
            }
            other => panic!("unexpected record {:?}", other),
        }
        assert!(reader.is_at_end());

        let mut writer = XdrWriter::new(Vec::new(), Precision::Double);
        encode_record(&mut writer, &sphere).unwrap();
        assert_eq!(writer.into_inner().len(), 4 + 24 + 4 + 8);
    }

    #[test]
    fn test_decode_triangle_group_with_explicit_indices() {
        let mut bytes = Vec::new();
        bytes.write_u32::<BigEndian>(1).unwrap(); // triangles
        bytes.write_u32::<BigEndian>(3).unwrap(); // positions
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bytes.write_f32::<BigEndian>(v).unwrap();
        }
        bytes.write_u32::<BigEndian>(1).unwrap(); // normals
        for v in [0.0f32, 0.0, 1.0] {
            bytes.write_f32::<BigEndian>(v).unwrap();
        }
        bytes.write_u32::<BigEndian>(1).unwrap(); // explicit normal indices
        bytes.write_u32::<BigEndian>(0).unwrap(); // no colors
        for i in [2u32, 1, 0, 0, 0, 0] {
            bytes.write_u32::<BigEndian>(i).unwrap();
        }
        bytes.write_u32::<BigEndian>(0).unwrap();
        bytes.write_u32::<BigEndian>(0).unwrap();

        match decode(RecordTag::Triangles, &bytes, Precision::Single).unwrap() {
            Record::Geometry(GeometryRecord::TriangleGroup(g)) => {
                assert_eq!(g.position_indices, vec![[2, 1, 0]]);
                assert_eq!(g.normal_indices, vec![[0, 0, 0]]);
                assert_eq!(g.color_indices, vec![[2, 1, 0]]);
                assert!(g.explicit_normal_indices);
                assert!(!g.explicit_color_indices);
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_triangle_group_rejects_out_of_range_index() {
        let mut bytes = Vec::new();
        bytes.write_u32::<BigEndian>(1).unwrap();
        bytes.write_u32::<BigEndian>(1).unwrap();
        for v in [0.0f32, 0.0, 0.0] {
            bytes.write_f32::<BigEndian>(v).unwrap();
        }
        bytes.write_u32::<BigEndian>(0).unwrap();
        bytes.write_u32::<BigEndian>(0).unwrap();
        bytes.write_u32::<BigEndian>(0).unwrap();
        for i in [0u32, 0, 5] {
            bytes.write_u32::<BigEndian>(i).unwrap();
        }
        bytes.write_u32::<BigEndian>(0).unwrap();
        bytes.write_u32::<BigEndian>(0).unwrap();

        let mut reader = XdrReader::new(&bytes);
        let err = decode_record(RecordTag::Triangles, &mut reader, Precision::Single, &SceneHeader::default())
            .unwrap_err();
        assert!(matches!(err, DecodeError::IndexOutOfRange { index: 5, len: 1, .. }));
    }

    #[test]
    fn test_truncated_record_is_an_error() {
        let bytes = [0u8; 20];
        let mut reader = XdrReader::new(&bytes);
        let err = decode_record(RecordTag::Quad, &mut reader, Precision::Single, &SceneHeader::default())
            .unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { .. }));
    }

    #[test]
    fn test_unstorable_tags_are_rejected() {
        let mut reader = XdrReader::new(&[]);
        let err = decode_record(RecordTag::Animation, &mut reader, Precision::Single, &SceneHeader::default())
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnstorableRecord { tag: RecordTag::Animation, .. }));
    }

    #[test]
    fn test_encoded_tube_decodes_to_same_record() {
        let tube = GeometryRecord::Tube(Tube {
            controls: [
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(2.0, 1.0, 0.0),
                Point3f::new(3.0, 1.0, 1.0),
            ],
            width: 0.25,
            core: true,
            center_index: 2,
            material_index: 4,
        });
        let mut writer = XdrWriter::new(Vec::new(), Precision::Single);
        encode_record(&mut writer, &Record::Geometry(tube.clone())).unwrap();
        let bytes = writer.into_inner();

        let mut reader = XdrReader::new(&bytes);
        let tag = RecordTag::from_u32(reader.read_u32().unwrap()).unwrap();
        assert_eq!(tag, RecordTag::Tube);
        let decoded = decode_record(tag, &mut reader, Precision::Single, &SceneHeader::default()).unwrap();
        assert_eq!(decoded, Record::Geometry(tube));
        assert!(reader.is_at_end());
    }
}
