//! Arcball rotation between two mouse positions

use nalgebra::{Unit, Vector2, Vector3};

/// Rotation carrying one projected mouse position onto another
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arcball {
    /// Angle in radians, in `[0, pi]`
    pub angle: f32,
    /// `None` when the two projected vectors are parallel
    pub axis: Option<Unit<Vector3<f32>>>,
}

impl Arcball {
    /// Arcball rotation from `last` to `current`, both in `[-1, 1]` with y up
    pub fn new(last: Vector2<f32>, current: Vector2<f32>) -> Self {
        if last == current {
            return Self { angle: 0.0, axis: None };
        }

        let v0 = project_to_sphere(last);
        let v1 = project_to_sphere(current);
        let dot = v0.dot(&v1).clamp(-1.0, 1.0);

        Self {
            angle: dot.acos(),
            axis: Unit::try_new(v0.cross(&v1), f32::EPSILON),
        }
    }
}

/// Lift a 2D position onto the unit hemisphere, clamping it into the unit disk first
pub fn project_to_sphere(v: Vector2<f32>) -> Vector3<f32> {
    let norm = v.x.hypot(v.y);
    let v = if norm > 1.0 { v / norm } else { v };
    Vector3::new(v.x, v.y, (1.0 - v.x * v.x - v.y * v.y).max(0.0).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identical_positions_have_zero_angle() {
        let p = Vector2::new(0.3, -0.2);
        let arcball = Arcball::new(p, p);
        assert_eq!(arcball.angle, 0.0);
        assert!(arcball.axis.is_none());
    }

    #[test]
    fn test_projection_clamps_outside_unit_disk() {
        let v = project_to_sphere(Vector2::new(3.0, 4.0));
        assert_relative_eq!(v, Vector3::new(0.6, 0.8, 0.0), epsilon = 1e-6);

        let center = project_to_sphere(Vector2::zeros());
        assert_relative_eq!(center, Vector3::z(), epsilon = 1e-6);
    }

    #[test]
    fn test_horizontal_drag_rotates_about_y() {
        let arcball = Arcball::new(Vector2::zeros(), Vector2::new(1.0, 0.0));
        assert_relative_eq!(arcball.angle, std::f32::consts::FRAC_PI_2, epsilon = 1e-5);
        let axis = arcball.axis.unwrap();
        assert_relative_eq!(axis.into_inner(), Vector3::y(), epsilon = 1e-5);
    }

    #[test]
    fn test_opposite_rim_points_give_pi() {
        let arcball = Arcball::new(Vector2::new(-1.0, 0.0), Vector2::new(1.0, 0.0));
        assert_relative_eq!(arcball.angle, std::f32::consts::PI, epsilon = 1e-5);
        assert!(arcball.axis.is_none());
    }
}
