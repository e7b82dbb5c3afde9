//! HEADER record sub-table
//!
//! Each entry is `key:u32`, `length:u32` (in 32-bit words), then the value.

use crate::error::DecodeError;
use crate::xdr::{Precision, XdrReader, XdrWriter};
use std::io::Write;
use v3dkit_core::{HeaderKey, Projection, SceneHeader, SceneWarning, Vector2f, Vector3f, WarningKind};

const WORD: usize = 4;

/// Apply the header entries in `reader` to `header`, returning warnings for skipped keys
pub fn decode_header(
    reader: &mut XdrReader<'_>,
    precision: Precision,
    header: &mut SceneHeader,
) -> Result<Vec<SceneWarning>, DecodeError> {
    let mut warnings = Vec::new();
    let count = reader.read_u32()?;
    reader.ensure_items(count, 2 * WORD)?;

    for _ in 0..count {
        let key = reader.read_u32()?;
        let words = reader.read_u32()?;
        let declared = (words as usize).saturating_mul(WORD);
        reader.ensure(declared)?;
        let start = reader.position();

        let Some(known) = HeaderKey::from_u32(key) else {
            log::warn!("skipping unknown header key {} ({} words)", key, words);
            reader.skip(declared)?;
            warnings.push(SceneWarning::new(WarningKind::UnknownHeaderKey { key, words }));
            continue;
        };

        read_value(known, reader, precision, header)?;

        let consumed = reader.position() - start;
        if consumed > declared {
            return Err(DecodeError::HeaderLength {
                key,
                declared: words,
                consumed: (consumed / WORD) as u32,
            });
        }
        reader.skip(declared - consumed)?;
    }

    Ok(warnings)
}

fn read_value(
    key: HeaderKey,
    reader: &mut XdrReader<'_>,
    p: Precision,
    header: &mut SceneHeader,
) -> Result<(), DecodeError> {
    match key {
        HeaderKey::CanvasWidth => header.canvas_width = reader.read_u32()?,
        HeaderKey::CanvasHeight => header.canvas_height = reader.read_u32()?,
        HeaderKey::Absolute => header.absolute = reader.read_bool()?,
        HeaderKey::MinBound => header.min_bound = reader.read_point(p)?,
        HeaderKey::MaxBound => header.max_bound = reader.read_point(p)?,
        HeaderKey::Orthographic => {
            header.projection = if reader.read_bool()? {
                Projection::Orthographic
            } else {
                Projection::Perspective
            }
        }
        HeaderKey::AngleOfView => header.angle_of_view = reader.read_real(p)?,
        HeaderKey::InitialZoom => header.initial_zoom = reader.read_real(p)?,
        HeaderKey::ViewportShift => header.viewport_shift = read_pair(reader, p)?,
        HeaderKey::ViewportMargin => header.viewport_margin = read_pair(reader, p)?,
        HeaderKey::Light => {
            header.light.direction = reader.read_point(p)?.coords;
            header.light.color = [reader.read_f32()?, reader.read_f32()?, reader.read_f32()?];
        }
        HeaderKey::Background => header.background = reader.read_rgba()?,
        HeaderKey::ZoomFactor => header.zoom_factor = reader.read_real(p)?,
        HeaderKey::ZoomPinchFactor => header.zoom_pinch_factor = reader.read_real(p)?,
        HeaderKey::ZoomPinchCap => header.zoom_pinch_cap = reader.read_real(p)?,
        HeaderKey::ZoomStep => header.zoom_step = reader.read_real(p)?,
        HeaderKey::ShiftHoldDistance => header.shift_hold_distance = reader.read_real(p)?,
        HeaderKey::ShiftWaitTime => header.shift_wait_time = reader.read_real(p)?,
        HeaderKey::VibrateTime => header.vibrate_time = reader.read_real(p)?,
    }
    Ok(())
}

fn read_pair(reader: &mut XdrReader<'_>, p: Precision) -> Result<Vector2f, DecodeError> {
    Ok(Vector2f::new(reader.read_real(p)?, reader.read_real(p)?))
}

/// Size of a key's value in 32-bit words
pub fn value_words(key: HeaderKey, precision: Precision) -> u32 {
    let real = (precision.real_size() / WORD) as u32;
    match key {
        HeaderKey::CanvasWidth | HeaderKey::CanvasHeight | HeaderKey::Absolute | HeaderKey::Orthographic => 1,
        HeaderKey::MinBound | HeaderKey::MaxBound => 3 * real,
        HeaderKey::ViewportShift | HeaderKey::ViewportMargin => 2 * real,
        HeaderKey::Light => 3 * real + 3,
        HeaderKey::Background => 4,
        HeaderKey::AngleOfView
        | HeaderKey::InitialZoom
        | HeaderKey::ZoomFactor
        | HeaderKey::ZoomPinchFactor
        | HeaderKey::ZoomPinchCap
        | HeaderKey::ZoomStep
        | HeaderKey::ShiftHoldDistance
        | HeaderKey::ShiftWaitTime
        | HeaderKey::VibrateTime => real,
    }
}

/// Encode every header key, entry count first
pub fn encode_header<W: Write>(writer: &mut XdrWriter<W>, header: &SceneHeader) -> std::io::Result<()> {
    writer.write_u32(HeaderKey::ALL.len() as u32)?;
    for key in HeaderKey::ALL {
        writer.write_u32(key as u32)?;
        writer.write_u32(value_words(key, writer.precision()))?;
        match key {
            HeaderKey::CanvasWidth => writer.write_u32(header.canvas_width)?,
            HeaderKey::CanvasHeight => writer.write_u32(header.canvas_height)?,
            HeaderKey::Absolute => writer.write_bool(header.absolute)?,
            HeaderKey::MinBound => writer.write_point(&header.min_bound)?,
            HeaderKey::MaxBound => writer.write_point(&header.max_bound)?,
            HeaderKey::Orthographic => writer.write_bool(header.is_orthographic())?,
            HeaderKey::AngleOfView => writer.write_real(header.angle_of_view)?,
            HeaderKey::InitialZoom => writer.write_real(header.initial_zoom)?,
            HeaderKey::ViewportShift => write_pair(writer, &header.viewport_shift)?,
            HeaderKey::ViewportMargin => write_pair(writer, &header.viewport_margin)?,
            HeaderKey::Light => {
                let d: Vector3f = header.light.direction;
                writer.write_point(&d.into())?;
                header.light.color.iter().try_for_each(|c| writer.write_f32(*c))?;
            }
            HeaderKey::Background => writer.write_rgba(&header.background)?,
            HeaderKey::ZoomFactor => writer.write_real(header.zoom_factor)?,
            HeaderKey::ZoomPinchFactor => writer.write_real(header.zoom_pinch_factor)?,
            HeaderKey::ZoomPinchCap => writer.write_real(header.zoom_pinch_cap)?,
            HeaderKey::ZoomStep => writer.write_real(header.zoom_step)?,
            HeaderKey::ShiftHoldDistance => writer.write_real(header.shift_hold_distance)?,
            HeaderKey::ShiftWaitTime => writer.write_real(header.shift_wait_time)?,
            HeaderKey::VibrateTime => writer.write_real(header.vibrate_time)?,
        }
    }
    Ok(())
}

fn write_pair<W: Write>(writer: &mut XdrWriter<W>, v: &Vector2f) -> std::io::Result<()> {
    writer.write_real(v.x)?;
    writer.write_real(v.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{BigEndian, WriteBytesExt};
    use v3dkit_core::Point3f;

    fn entry(bytes: &mut Vec<u8>, key: u32, words: &[u32]) {
        bytes.write_u32::<BigEndian>(key).unwrap();
        bytes.write_u32::<BigEndian>(words.len() as u32).unwrap();
        for w in words {
            bytes.write_u32::<BigEndian>(*w).unwrap();
        }
    }

    #[test]
    fn test_unknown_key_is_skipped_by_declared_length() {
        let mut bytes = Vec::new();
        bytes.write_u32::<BigEndian>(3).unwrap();
        entry(&mut bytes, 1, &[320]);
        entry(&mut bytes, 99, &[0xdead, 0xbeef, 0xcafe]);
        entry(&mut bytes, 2, &[240]);

        let mut header = SceneHeader::default();
        let mut reader = XdrReader::new(&bytes);
        let warnings = decode_header(&mut reader, Precision::Single, &mut header).unwrap();

        assert_eq!(header.canvas_width, 320);
        assert_eq!(header.canvas_height, 240);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::UnknownHeaderKey { key: 99, words: 3 });
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_known_key_with_longer_declared_length_skips_remainder() {
        let mut bytes = Vec::new();
        bytes.write_u32::<BigEndian>(2).unwrap();
        entry(&mut bytes, 6, &[1, 0xffff_ffff]);
        entry(&mut bytes, 1, &[64]);

        let mut header = SceneHeader::default();
        let mut reader = XdrReader::new(&bytes);
        decode_header(&mut reader, Precision::Single, &mut header).unwrap();
        assert!(header.is_orthographic());
        assert_eq!(header.canvas_width, 64);
    }

    #[test]
    fn test_short_declared_length_is_an_error() {
        let mut bytes = Vec::new();
        bytes.write_u32::<BigEndian>(1).unwrap();
        bytes.write_u32::<BigEndian>(4).unwrap(); // min bound
        bytes.write_u32::<BigEndian>(1).unwrap(); // declares one word
        for v in [1.0f32, 2.0, 3.0] {
            bytes.write_f32::<BigEndian>(v).unwrap();
        }
        let mut header = SceneHeader::default();
        let mut reader = XdrReader::new(&bytes);
        let err = decode_header(&mut reader, Precision::Single, &mut header).unwrap_err();
        assert!(matches!(err, DecodeError::HeaderLength { key: 4, declared: 1, consumed: 3 }));
    }

    #[test]
    fn test_encoded_header_decodes_in_double_precision() {
        let header = SceneHeader {
            canvas_width: 800,
            min_bound: Point3f::new(-1.0, -2.0, -3.0),
            projection: Projection::Orthographic,
            zoom_factor: 1.05,
            ..Default::default()
        };
        let mut writer = XdrWriter::new(Vec::new(), Precision::Double);
        encode_header(&mut writer, &header).unwrap();
        let bytes = writer.into_inner();

        let mut decoded = SceneHeader::default();
        let mut reader = XdrReader::new(&bytes);
        let warnings = decode_header(&mut reader, Precision::Double, &mut decoded).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(decoded, header);
    }
}
