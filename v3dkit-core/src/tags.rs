//! Registry of top-level record tags
//!
//! The numeric values are part of the file format and must never change.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag preceding every top-level record in a scene file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum RecordTag {
    Material = 1,
    Transform = 2,
    Element = 3,
    Centers = 4,
    Header = 5,
    Line = 64,
    Triangle = 65,
    Quad = 66,
    Curve = 128,
    BezierTriangle = 129,
    BezierPatch = 130,
    LineColor = 192,
    TriangleColor = 193,
    QuadColor = 194,
    CurveColor = 256,
    BezierTriangleColor = 257,
    BezierPatchColor = 258,
    Triangles = 512,
    Disk = 1024,
    Cylinder = 1025,
    Tube = 1026,
    Sphere = 1027,
    HalfSphere = 1028,
    Animation = 2048,
    Pixel = 4096,
}

impl RecordTag {
    /// Look up a tag by its numeric value
    pub fn from_u32(value: u32) -> Option<Self> {
        use RecordTag::*;
        let tag = match value {
            1 => Material,
            2 => Transform,
            3 => Element,
            4 => Centers,
            5 => Header,
            64 => Line,
            65 => Triangle,
            66 => Quad,
            128 => Curve,
            129 => BezierTriangle,
            130 => BezierPatch,
            192 => LineColor,
            193 => TriangleColor,
            194 => QuadColor,
            256 => CurveColor,
            257 => BezierTriangleColor,
            258 => BezierPatchColor,
            512 => Triangles,
            1024 => Disk,
            1025 => Cylinder,
            1026 => Tube,
            1027 => Sphere,
            1028 => HalfSphere,
            2048 => Animation,
            4096 => Pixel,
            _ => return None,
        };
        Some(tag)
    }

    /// Tags whose body layout is not storable; their length cannot be skipped
    pub fn is_storable(self) -> bool {
        !matches!(
            self,
            RecordTag::Transform
                | RecordTag::Element
                | RecordTag::LineColor
                | RecordTag::CurveColor
                | RecordTag::Animation
        )
    }
}

impl fmt::Display for RecordTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, *self as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_values_are_stable() {
        assert_eq!(RecordTag::Material as u32, 1);
        assert_eq!(RecordTag::Header as u32, 5);
        assert_eq!(RecordTag::Triangle as u32, 65);
        assert_eq!(RecordTag::BezierPatch as u32, 130);
        assert_eq!(RecordTag::Triangles as u32, 512);
        assert_eq!(RecordTag::Pixel as u32, 4096);
    }

    #[test]
    fn test_tag_lookup() {
        for value in [1, 2, 3, 4, 5, 64, 65, 66, 128, 129, 130, 192, 193, 194, 256, 257, 258, 512, 1024, 1025, 1026, 1027, 1028, 2048, 4096] {
            let tag = RecordTag::from_u32(value).unwrap();
            assert_eq!(tag as u32, value);
        }
        assert_eq!(RecordTag::from_u32(6), None);
        assert_eq!(RecordTag::from_u32(0), None);
    }

    #[test]
    fn test_unstorable_tags() {
        assert!(!RecordTag::Transform.is_storable());
        assert!(!RecordTag::Animation.is_storable());
        assert!(RecordTag::TriangleColor.is_storable());
        assert!(RecordTag::Sphere.is_storable());
    }
}
