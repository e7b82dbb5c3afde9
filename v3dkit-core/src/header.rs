//! Scene header: canvas, bounds, projection and interaction parameters

use crate::point::{Point3f, Rgba, Vector2f, Vector3f};
use serde::{Deserialize, Serialize};

/// Numeric keys of the header sub-table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum HeaderKey {
    CanvasWidth = 1,
    CanvasHeight = 2,
    Absolute = 3,
    MinBound = 4,
    MaxBound = 5,
    Orthographic = 6,
    AngleOfView = 7,
    InitialZoom = 8,
    ViewportShift = 9,
    ViewportMargin = 10,
    Light = 11,
    Background = 12,
    ZoomFactor = 13,
    ZoomPinchFactor = 14,
    ZoomPinchCap = 15,
    ZoomStep = 16,
    ShiftHoldDistance = 17,
    ShiftWaitTime = 18,
    VibrateTime = 19,
}

impl HeaderKey {
    /// Every key, in numeric order
    pub const ALL: [HeaderKey; 19] = [
        HeaderKey::CanvasWidth,
        HeaderKey::CanvasHeight,
        HeaderKey::Absolute,
        HeaderKey::MinBound,
        HeaderKey::MaxBound,
        HeaderKey::Orthographic,
        HeaderKey::AngleOfView,
        HeaderKey::InitialZoom,
        HeaderKey::ViewportShift,
        HeaderKey::ViewportMargin,
        HeaderKey::Light,
        HeaderKey::Background,
        HeaderKey::ZoomFactor,
        HeaderKey::ZoomPinchFactor,
        HeaderKey::ZoomPinchCap,
        HeaderKey::ZoomStep,
        HeaderKey::ShiftHoldDistance,
        HeaderKey::ShiftWaitTime,
        HeaderKey::VibrateTime,
    ];

    /// Look up a key by its numeric value
    pub fn from_u32(value: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| *k as u32 == value)
    }
}

/// Projection mode of a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// Directional light
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub direction: Vector3f,
    pub color: [f32; 3],
}

impl Default for Light {
    fn default() -> Self {
        Self {
            direction: Vector3f::new(0.0, -1.0, 0.0),
            color: [1.0, 1.0, 1.0],
        }
    }
}

/// Scene-wide parameters decoded from the HEADER record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneHeader {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub absolute: bool,
    pub min_bound: Point3f,
    pub max_bound: Point3f,
    pub projection: Projection,
    /// Field of view in radians
    pub angle_of_view: f32,
    pub initial_zoom: f32,
    pub viewport_shift: Vector2f,
    pub viewport_margin: Vector2f,
    pub light: Light,
    pub background: Rgba,
    pub zoom_factor: f32,
    pub zoom_pinch_factor: f32,
    pub zoom_pinch_cap: f32,
    pub zoom_step: f32,
    pub shift_hold_distance: f32,
    pub shift_wait_time: f32,
    pub vibrate_time: f32,
}

impl Default for SceneHeader {
    fn default() -> Self {
        Self {
            canvas_width: 500,
            canvas_height: 500,
            absolute: false,
            min_bound: Point3f::new(0.0, 0.0, 0.0),
            max_bound: Point3f::new(100.0, 100.0, 100.0),
            projection: Projection::Perspective,
            angle_of_view: 45.0_f32.to_radians(),
            initial_zoom: 1.0,
            viewport_shift: Vector2f::zeros(),
            viewport_margin: Vector2f::zeros(),
            light: Light::default(),
            background: Rgba::WHITE,
            zoom_factor: 1.0,
            zoom_pinch_factor: 1.0,
            zoom_pinch_cap: 1.0,
            zoom_step: 1.0,
            shift_hold_distance: 1.0,
            shift_wait_time: 1.0,
            vibrate_time: 1.0,
        }
    }
}

impl SceneHeader {
    /// Whether the scene uses an orthographic projection
    pub fn is_orthographic(&self) -> bool {
        self.projection == Projection::Orthographic
    }

    /// Canvas aspect ratio (width / height)
    pub fn canvas_aspect(&self) -> f32 {
        if self.canvas_height == 0 {
            return 1.0;
        }
        self.canvas_width as f32 / self.canvas_height as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_header_defaults() {
        let header = SceneHeader::default();
        assert_eq!(header.canvas_width, 500);
        assert_eq!(header.canvas_height, 500);
        assert_eq!(header.max_bound, Point3f::new(100.0, 100.0, 100.0));
        assert!(!header.is_orthographic());
        assert_relative_eq!(header.angle_of_view, std::f32::consts::FRAC_PI_4);
        assert_eq!(header.light.direction, Vector3f::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_header_key_lookup() {
        assert_eq!(HeaderKey::from_u32(1), Some(HeaderKey::CanvasWidth));
        assert_eq!(HeaderKey::from_u32(11), Some(HeaderKey::Light));
        assert_eq!(HeaderKey::from_u32(19), Some(HeaderKey::VibrateTime));
        assert_eq!(HeaderKey::from_u32(0), None);
        assert_eq!(HeaderKey::from_u32(20), None);
    }

    #[test]
    fn test_canvas_aspect() {
        let header = SceneHeader {
            canvas_width: 400,
            canvas_height: 300,
            ..SceneHeader::default()
        };
        assert_relative_eq!(header.canvas_aspect(), 4.0 / 3.0);
        let flat = SceneHeader {
            canvas_height: 0,
            ..SceneHeader::default()
        };
        assert_eq!(flat.canvas_aspect(), 1.0);
    }
}
