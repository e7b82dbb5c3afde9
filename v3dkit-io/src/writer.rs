//! Scene file encoding

use crate::records::{encode_record, Record};
use crate::xdr::{Precision, XdrWriter};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use v3dkit_core::{GeometryRecord, Material, Point3f, Result, SceneHeader};

/// Format version written in the preamble
pub const FORMAT_VERSION: u32 = 1;

/// Builds a scene file record by record
#[derive(Debug, Clone)]
pub struct SceneWriter {
    pub precision: Precision,
    pub version: u32,
    pub header: Option<SceneHeader>,
    pub materials: Vec<Material>,
    pub centers: Vec<Point3f>,
    pub records: Vec<GeometryRecord>,
}

impl SceneWriter {
    pub fn new(precision: Precision) -> Self {
        Self {
            precision,
            version: FORMAT_VERSION,
            header: None,
            materials: Vec::new(),
            centers: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn with_header(mut self, header: SceneHeader) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.materials.push(material);
        self
    }

    pub fn with_record(mut self, record: GeometryRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn push(&mut self, record: GeometryRecord) {
        self.records.push(record);
    }

    /// Encode into any writer
    pub fn write_to<W: Write>(&self, out: W) -> std::io::Result<W> {
        let mut writer = XdrWriter::new(out, self.precision);
        writer.write_u32(self.version)?;
        writer.write_bool(self.precision.is_double())?;

        if let Some(header) = &self.header {
            encode_record(&mut writer, &Record::Header(header.clone(), Vec::new()))?;
        }
        for material in &self.materials {
            encode_record(&mut writer, &Record::Material(*material))?;
        }
        if !self.centers.is_empty() {
            encode_record(&mut writer, &Record::Centers(self.centers.clone()))?;
        }
        for record in &self.records {
            encode_record(&mut writer, &Record::Geometry(record.clone()))?;
        }
        Ok(writer.into_inner())
    }

    /// Encode into a byte vector
    pub fn to_bytes(&self) -> std::io::Result<Vec<u8>> {
        self.write_to(Vec::new())
    }

    /// Encode to a file on disk
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut out = self.write_to(BufWriter::new(file))?;
        out.flush()?;
        log::debug!("wrote {} records to {}", self.records.len(), path.as_ref().display());
        Ok(())
    }
}
