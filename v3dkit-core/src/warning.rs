//! Non-fatal conditions collected while loading a scene

use crate::tags::RecordTag;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What went wrong
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WarningKind {
    /// The record decoded fine but has no vertex/index production
    UnsupportedGeometry(RecordTag),
    /// A triangle group has fewer normals than positions
    MissingNormals { missing: usize },
    /// Header sub-key this decoder does not know, skipped by its declared length
    UnknownHeaderKey { key: u32, words: u32 },
    /// Decoding stopped early at an unknown or unstorable tag
    StoppedAtTag { tag: u32, offset: usize },
    Rasterization(String),
}

/// A warning, optionally tied to the index of a geometry record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneWarning {
    pub record_index: Option<usize>,
    pub kind: WarningKind,
}

impl SceneWarning {
    pub fn new(kind: WarningKind) -> Self {
        Self { record_index: None, kind }
    }

    pub fn at_record(record_index: usize, kind: WarningKind) -> Self {
        Self {
            record_index: Some(record_index),
            kind,
        }
    }
}

impl fmt::Display for SceneWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(index) = self.record_index {
            write!(f, "record {}: ", index)?;
        }
        match &self.kind {
            WarningKind::UnsupportedGeometry(tag) => write!(f, "rendering is not supported for {}", tag),
            WarningKind::MissingNormals { missing } => {
                write!(f, "{} vertices have no normal, using face normals", missing)
            }
            WarningKind::UnknownHeaderKey { key, words } => {
                write!(f, "skipped unknown header key {} ({} words)", key, words)
            }
            WarningKind::StoppedAtTag { tag, offset } => {
                write!(f, "stopped decoding at tag {} (offset {})", tag, offset)
            }
            WarningKind::Rasterization(message) => write!(f, "{}", message),
        }
    }
}
