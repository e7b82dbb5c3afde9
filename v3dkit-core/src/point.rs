//! Point, vector and color types

use nalgebra::{Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A 2D vector with floating point components
pub type Vector2f = Vector2<f32>;

/// Linear RGBA color, stored as four 32-bit floats on disk and in memory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);

    /// Create a color from components
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Components as an array in RGBA order
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::WHITE
    }
}

impl From<[f32; 4]> for Rgba {
    fn from(c: [f32; 4]) -> Self {
        Rgba::new(c[0], c[1], c[2], c[3])
    }
}

/// Axis-aligned bounding box of a point set
pub fn bounds_of<'a, I>(points: I) -> Option<(Point3f, Point3f)>
where
    I: IntoIterator<Item = &'a Point3f>,
{
    let mut iter = points.into_iter();
    let first = *iter.next()?;
    Some(iter.fold((first, first), |(min, max), p| {
        (min.inf(p), max.sup(p))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_of_points() {
        let points = [
            Point3f::new(1.0, -2.0, 3.0),
            Point3f::new(-1.0, 4.0, 0.5),
            Point3f::new(0.0, 0.0, 7.0),
        ];
        let (min, max) = bounds_of(&points).unwrap();
        assert_eq!(min, Point3f::new(-1.0, -2.0, 0.5));
        assert_eq!(max, Point3f::new(1.0, 4.0, 7.0));
    }

    #[test]
    fn test_bounds_of_empty() {
        let points: [Point3f; 0] = [];
        assert!(bounds_of(&points).is_none());
    }
}
