//! Big-endian XDR primitives

use crate::error::DecodeError;
use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use std::io::Write;
use v3dkit_core::{Point3f, Rgba};

/// On-disk width of real-valued fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Single,
    Double,
}

impl Precision {
    pub fn from_flag(double: bool) -> Self {
        if double {
            Precision::Double
        } else {
            Precision::Single
        }
    }

    pub fn is_double(self) -> bool {
        self == Precision::Double
    }

    /// Bytes taken by one real
    pub fn real_size(self) -> usize {
        match self {
            Precision::Single => 4,
            Precision::Double => 8,
        }
    }
}

type Result<T> = std::result::Result<T, DecodeError>;

/// Forward-only cursor over an XDR byte buffer
#[derive(Debug, Clone)]
pub struct XdrReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> XdrReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Fail unless at least `len` more bytes are available
    pub fn ensure(&self, len: usize) -> Result<()> {
        if len > self.remaining() {
            return Err(DecodeError::Truncated {
                offset: self.position,
                needed: len,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Fail unless `count` items of `item_size` bytes could still follow
    pub fn ensure_items(&self, count: u32, item_size: usize) -> Result<()> {
        let needed = (count as usize).saturating_mul(item_size);
        self.ensure(needed)
    }

    /// Read a slice of bytes from the current position
    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let slice = &self.data[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    /// Skip ahead by the specified number of bytes
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.read_slice(len).map(|_| ())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(BigEndian::read_u32(self.read_slice(4)?))
    }

    /// Booleans are 32-bit words, non-zero meaning true
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u32()? != 0)
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(BigEndian::read_f32(self.read_slice(4)?))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(BigEndian::read_f64(self.read_slice(8)?))
    }

    /// Read a real of the given on-disk precision, narrowed to f32
    pub fn read_real(&mut self, precision: Precision) -> Result<f32> {
        match precision {
            Precision::Single => self.read_f32(),
            Precision::Double => Ok(self.read_f64()? as f32),
        }
    }

    pub fn read_point(&mut self, precision: Precision) -> Result<Point3f> {
        let x = self.read_real(precision)?;
        let y = self.read_real(precision)?;
        let z = self.read_real(precision)?;
        Ok(Point3f::new(x, y, z))
    }

    /// Read `N` consecutive points
    pub fn read_points<const N: usize>(&mut self, precision: Precision) -> Result<[Point3f; N]> {
        let mut points = [Point3f::origin(); N];
        for p in points.iter_mut() {
            *p = self.read_point(precision)?;
        }
        Ok(points)
    }

    /// Colors are always single precision
    pub fn read_rgba(&mut self) -> Result<Rgba> {
        Ok(Rgba::new(
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
            self.read_f32()?,
        ))
    }

    pub fn read_colors<const N: usize>(&mut self) -> Result<[Rgba; N]> {
        let mut colors = [Rgba::WHITE; N];
        for c in colors.iter_mut() {
            *c = self.read_rgba()?;
        }
        Ok(colors)
    }
}

/// Big-endian XDR encoder over any writer
pub struct XdrWriter<W: Write> {
    inner: W,
    precision: Precision,
}

impl<W: Write> XdrWriter<W> {
    pub fn new(inner: W, precision: Precision) -> Self {
        Self { inner, precision }
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_u32(&mut self, value: u32) -> std::io::Result<()> {
        self.inner.write_u32::<BigEndian>(value)
    }

    pub fn write_bool(&mut self, value: bool) -> std::io::Result<()> {
        self.write_u32(value as u32)
    }

    pub fn write_f32(&mut self, value: f32) -> std::io::Result<()> {
        self.inner.write_f32::<BigEndian>(value)
    }

    pub fn write_real(&mut self, value: f32) -> std::io::Result<()> {
        match self.precision {
            Precision::Single => self.inner.write_f32::<BigEndian>(value),
            Precision::Double => self.inner.write_f64::<BigEndian>(value as f64),
        }
    }

    pub fn write_point(&mut self, point: &Point3f) -> std::io::Result<()> {
        self.write_real(point.x)?;
        self.write_real(point.y)?;
        self.write_real(point.z)
    }

    pub fn write_points(&mut self, points: &[Point3f]) -> std::io::Result<()> {
        points.iter().try_for_each(|p| self.write_point(p))
    }

    pub fn write_rgba(&mut self, color: &Rgba) -> std::io::Result<()> {
        color.to_array().iter().try_for_each(|c| self.write_f32(*c))
    }

    pub fn write_colors(&mut self, colors: &[Rgba]) -> std::io::Result<()> {
        colors.iter().try_for_each(|c| self.write_rgba(c))
    }
}
