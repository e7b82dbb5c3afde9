//! Camera and projection state driven by drag gestures

use crate::arcball::Arcball;
use crate::gesture::{DragMode, WheelDirection};
use nalgebra::{Matrix4, Rotation3, Vector2, Vector3};
use serde::{Deserialize, Serialize};
use v3dkit_core::SceneHeader;

/// Frustum (or orthographic box) extents in view space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewBounds {
    pub xmin: f32,
    pub xmax: f32,
    pub ymin: f32,
    pub ymax: f32,
    pub zmin: f32,
    pub zmax: f32,
}

impl ViewBounds {
    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }
}

/// Largest zoom a gesture may reach; the smallest is its reciprocal
pub fn max_zoom() -> f32 {
    f32::MAX.sqrt()
}

pub fn min_zoom() -> f32 {
    1.0 / max_zoom()
}

fn clamp_zoom(zoom: f32) -> f32 {
    zoom.clamp(min_zoom(), max_zoom())
}

/// Camera over a decoded scene: zoom, shift, pan and arcball rotation
///
/// Mouse positions passed to the gesture methods are normalized to `[-1, 1]`
/// across the canvas with y pointing down (see [`CameraModel::normalize_position`]);
/// `viewport` is the canvas size in pixels.
#[derive(Debug, Clone)]
pub struct CameraModel {
    header: SceneHeader,
    /// Half-height of the frustum at zoom 1
    h: f32,
    center: Vector3<f32>,
    zoom: f32,
    /// Viewport shift in pixels
    shift: Vector2<f32>,
    rotation: Matrix4<f32>,
    canvas: Vector2<f32>,
    bounds: ViewBounds,
    projection: Matrix4<f32>,
    view: Matrix4<f32>,
    changed: bool,
}

impl CameraModel {
    /// Camera at the header's initial view, projected for its canvas size
    pub fn new(header: &SceneHeader) -> Self {
        let mut camera = Self {
            header: header.clone(),
            h: 0.0,
            center: Vector3::zeros(),
            zoom: 1.0,
            shift: Vector2::zeros(),
            rotation: Matrix4::identity(),
            canvas: Vector2::new(header.canvas_width as f32, header.canvas_height as f32),
            bounds: ViewBounds::default(),
            projection: Matrix4::identity(),
            view: Matrix4::identity(),
            changed: true,
        };
        camera.init_projection();
        camera.set_projection(header.canvas_width, header.canvas_height);
        camera
    }

    fn init_projection(&mut self) {
        let header = &self.header;
        self.h = -(0.5 * header.angle_of_view).tan() * header.max_bound.z;
        self.center = Vector3::new(0.0, 0.0, 0.5 * (header.min_bound.z + header.max_bound.z));
        self.zoom = clamp_zoom(header.initial_zoom);
        self.shift = Vector2::zeros();
        self.rotation = Matrix4::identity();
        self.bounds.zmin = header.min_bound.z;
        self.bounds.zmax = header.max_bound.z;
    }

    /// Return to the header's initial view, keeping the canvas size
    pub fn reset(&mut self) {
        self.init_projection();
        self.refresh();
    }

    /// Recompute view bounds and matrices for a `width` x `height` canvas
    pub fn set_projection(&mut self, width: u32, height: u32) {
        self.canvas = Vector2::new(width.max(1) as f32, height.max(1) as f32);
        self.refresh();
    }

    fn refresh(&mut self) {
        self.set_dimensions();
        let b = &self.bounds;
        self.projection = if self.header.is_orthographic() {
            ortho_rh_zo(b.xmin, b.xmax, b.ymin, b.ymax, -b.zmax, -b.zmin)
        } else {
            frustum_rh_zo(b.xmin, b.xmax, b.ymin, b.ymax, -b.zmax, -b.zmin)
        };
        self.update_view_matrix();
    }

    fn set_dimensions(&mut self) {
        let (width, height) = (self.canvas.x, self.canvas.y);
        let aspect = width / height;
        let zoom_inv = 1.0 / self.zoom;
        let x_shift = (self.shift.x / width + self.header.viewport_shift.x) * self.zoom;
        let y_shift = (self.shift.y / height + self.header.viewport_shift.y) * self.zoom;

        let b = &mut self.bounds;
        if self.header.is_orthographic() {
            let min = &self.header.min_bound;
            let max = &self.header.max_bound;
            let xsize = max.x - min.x;
            let ysize = max.y - min.y;
            if xsize < ysize * aspect {
                let r = 0.5 * ysize * aspect * zoom_inv;
                let x0 = 2.0 * r * x_shift;
                let y0 = ysize * zoom_inv * y_shift;
                b.xmin = -r - x0;
                b.xmax = r - x0;
                b.ymin = min.y * zoom_inv - y0;
                b.ymax = max.y * zoom_inv - y0;
            } else {
                let r = 0.5 * xsize / (aspect * self.zoom);
                let x0 = xsize * zoom_inv * x_shift;
                let y0 = 2.0 * r * y_shift;
                b.xmin = min.x * zoom_inv - x0;
                b.xmax = max.x * zoom_inv - x0;
                b.ymin = -r - y0;
                b.ymax = r - y0;
            }
        } else {
            let r = self.h * zoom_inv;
            let r_aspect = r * aspect;
            let x0 = 2.0 * r_aspect * x_shift;
            let y0 = 2.0 * r * y_shift;
            b.xmin = -r_aspect - x0;
            b.xmax = r_aspect - x0;
            b.ymin = -r - y0;
            b.ymax = r - y0;
        }
    }

    fn update_view_matrix(&mut self) {
        let to_center = Matrix4::new_translation(&self.center);
        let from_center = Matrix4::new_translation(&-self.center);
        let pan = Matrix4::new_translation(&Vector3::new(self.center.x, self.center.y, 0.0));
        self.view = to_center * self.rotation * from_center * pan;
        self.changed = true;
    }

    /// Apply one drag step from `last` to `current`
    pub fn drag(&mut self, mode: DragMode, current: Vector2<f32>, last: Vector2<f32>, viewport: Vector2<f32>) {
        match mode {
            DragMode::Shift => self.drag_shift(current, last, viewport),
            DragMode::Zoom => self.drag_zoom(current, last, viewport),
            DragMode::Pan => self.drag_pan(current, last, viewport),
            DragMode::Rotate => self.drag_rotate(current, last, viewport),
        }
    }

    /// Translate the viewport by the mouse delta
    pub fn drag_shift(&mut self, current: Vector2<f32>, last: Vector2<f32>, viewport: Vector2<f32>) {
        let zoom_inv = 1.0 / self.zoom;
        self.shift.x += (current.x - last.x) * zoom_inv * 0.5 * viewport.x;
        self.shift.y -= (current.y - last.y) * zoom_inv * 0.5 * viewport.y;
        self.refresh();
    }

    /// Zoom exponentially with vertical mouse travel
    pub fn drag_zoom(&mut self, current: Vector2<f32>, last: Vector2<f32>, viewport: Vector2<f32>) {
        let step_power = self.header.zoom_step * 0.5 * viewport.y * (last.y - current.y);
        let factor = self.header.zoom_factor;
        let limit = (0.1 * f32::MAX).ln() / factor.ln();

        // limit is negative for factors below 1, which disables drag zoom
        if step_power.abs() < limit {
            self.zoom = clamp_zoom(self.zoom * factor.powf(step_power));
            self.refresh();
        }
    }

    /// Shift in orthographic mode, move the center in perspective mode
    pub fn drag_pan(&mut self, current: Vector2<f32>, last: Vector2<f32>, viewport: Vector2<f32>) {
        if self.header.is_orthographic() {
            self.drag_shift(current, last, viewport);
            return;
        }
        // positions span [-1, 1], so half-extents map a full drag onto the frustum
        self.center.x += (current.x - last.x) * 0.5 * self.bounds.width();
        self.center.y -= (current.y - last.y) * 0.5 * self.bounds.height();
        self.refresh();
    }

    /// Arcball rotation, composed in view space
    pub fn drag_rotate(&mut self, current: Vector2<f32>, last: Vector2<f32>, _viewport: Vector2<f32>) {
        if current == last {
            return;
        }
        let arcball = Arcball::new(Vector2::new(last.x, -last.y), Vector2::new(current.x, -current.y));
        let Some(axis) = arcball.axis else { return };

        let angle = 2.0 * arcball.angle / self.zoom;
        self.rotation = Rotation3::from_axis_angle(&axis, angle).to_homogeneous() * self.rotation;
        self.refresh();
    }

    /// Apply one wheel notch
    pub fn wheel(&mut self, direction: WheelDirection) {
        match direction {
            WheelDirection::In => self.zoom_in(),
            WheelDirection::Out => self.zoom_out(),
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom = clamp_zoom(self.zoom * self.header.zoom_factor);
        self.refresh();
    }

    pub fn zoom_out(&mut self) {
        self.zoom = clamp_zoom(self.zoom / self.header.zoom_factor);
        self.refresh();
    }

    /// Map a pixel position on a canvas of `viewport` pixels to `[-1, 1]`, y down
    pub fn normalize_position(pixel: Vector2<f32>, viewport: Vector2<f32>) -> Vector2<f32> {
        Vector2::new(
            2.0 * pixel.x / viewport.x.max(1.0) - 1.0,
            2.0 * pixel.y / viewport.y.max(1.0) - 1.0,
        )
    }

    pub fn header(&self) -> &SceneHeader {
        &self.header
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn center(&self) -> Vector3<f32> {
        self.center
    }

    pub fn shift(&self) -> Vector2<f32> {
        self.shift
    }

    pub fn rotation(&self) -> &Matrix4<f32> {
        &self.rotation
    }

    pub fn view_bounds(&self) -> &ViewBounds {
        &self.bounds
    }

    /// Canvas size the projection was last computed for
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.canvas.x as u32, self.canvas.y as u32)
    }

    pub fn projection_matrix(&self) -> &Matrix4<f32> {
        &self.projection
    }

    pub fn view_matrix(&self) -> &Matrix4<f32> {
        &self.view
    }

    /// Model-view-projection matrix fed to the renderer
    pub fn mvp(&self) -> Matrix4<f32> {
        self.projection * self.view
    }

    /// Whether the view moved since the flag was last taken
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Read and clear the changed flag
    pub fn take_changed(&mut self) -> bool {
        std::mem::replace(&mut self.changed, false)
    }
}

/// Right-handed perspective frustum with depth mapped to `[0, 1]`
pub fn frustum_rh_zo(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Matrix4<f32> {
    let mut m = Matrix4::zeros();
    m[(0, 0)] = 2.0 * near / (right - left);
    m[(1, 1)] = 2.0 * near / (top - bottom);
    m[(0, 2)] = (right + left) / (right - left);
    m[(1, 2)] = (top + bottom) / (top - bottom);
    m[(2, 2)] = far / (near - far);
    m[(3, 2)] = -1.0;
    m[(2, 3)] = -(far * near) / (far - near);
    m
}

/// Right-handed orthographic box with depth mapped to `[0, 1]`
pub fn ortho_rh_zo(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Matrix4<f32> {
    let mut m = Matrix4::identity();
    m[(0, 0)] = 2.0 / (right - left);
    m[(1, 1)] = 2.0 / (top - bottom);
    m[(2, 2)] = -1.0 / (far - near);
    m[(0, 3)] = -(right + left) / (right - left);
    m[(1, 3)] = -(top + bottom) / (top - bottom);
    m[(2, 3)] = -near / (far - near);
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector4};
    use v3dkit_core::Projection;

    fn header(projection: Projection) -> SceneHeader {
        SceneHeader {
            canvas_width: 400,
            canvas_height: 200,
            min_bound: Point3::new(-1.0, -1.0, -20.0),
            max_bound: Point3::new(1.0, 1.0, -5.0),
            projection,
            zoom_factor: 1.05,
            zoom_step: 0.2,
            ..SceneHeader::default()
        }
    }

    fn viewport() -> Vector2<f32> {
        Vector2::new(400.0, 200.0)
    }

    #[test]
    fn test_initial_perspective_bounds() {
        let camera = CameraModel::new(&header(Projection::Perspective));
        let h = (0.5 * camera.header().angle_of_view).tan() * 5.0;
        let b = camera.view_bounds();

        assert_relative_eq!(camera.center(), Vector3::new(0.0, 0.0, -12.5));
        assert_relative_eq!(b.ymax, h, epsilon = 1e-5);
        assert_relative_eq!(b.xmax, 2.0 * h, epsilon = 1e-5);
        assert_relative_eq!(b.xmin, -b.xmax);
        assert!(camera.is_changed());
    }

    #[test]
    fn test_frustum_maps_near_and_far_to_unit_depth() {
        let m = frustum_rh_zo(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0);
        let near = m * Vector4::new(0.0, 0.0, -1.0, 1.0);
        let far = m * Vector4::new(0.0, 0.0, -10.0, 1.0);
        assert_relative_eq!(near.z / near.w, 0.0, epsilon = 1e-6);
        assert_relative_eq!(far.z / far.w, 1.0, epsilon = 1e-6);

        let o = ortho_rh_zo(-2.0, 2.0, -1.0, 1.0, 1.0, 3.0);
        let corner = o * Vector4::new(2.0, 1.0, -3.0, 1.0);
        assert_relative_eq!(corner, Vector4::new(1.0, 1.0, 1.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_zoom_never_leaves_clamp_range() {
        let mut camera = CameraModel::new(&header(Projection::Perspective));
        let top = Vector2::new(0.0, -1.0);
        let bottom = Vector2::new(0.0, 1.0);

        for _ in 0..200 {
            camera.drag_zoom(top, bottom, viewport());
            assert!(camera.zoom() <= max_zoom());
        }
        assert_relative_eq!(camera.zoom(), max_zoom());

        for _ in 0..400 {
            camera.drag_zoom(bottom, top, viewport());
            assert!(camera.zoom() >= min_zoom());
        }
        assert_relative_eq!(camera.zoom(), min_zoom());
    }

    #[test]
    fn test_zoom_step_beyond_overflow_limit_is_ignored() {
        let mut camera = CameraModel::new(&header(Projection::Perspective));
        let limit = (0.1 * f32::MAX).ln() / 1.05f32.ln();
        // step_power = zoom_step * viewport.y / 2 * dy = 20 * dy
        let dy = limit / 20.0 + 1.0;
        camera.take_changed();

        camera.drag_zoom(Vector2::new(0.0, 0.0), Vector2::new(0.0, dy), viewport());
        assert_eq!(camera.zoom(), 1.0);
        assert!(!camera.is_changed());
    }

    #[test]
    fn test_zoom_factor_below_one_disables_drag_zoom() {
        let mut camera = CameraModel::new(&SceneHeader {
            zoom_factor: 0.5,
            ..header(Projection::Perspective)
        });
        camera.take_changed();

        for (current, last) in [(-0.1, 0.1), (0.1, -0.1), (0.0, 0.001)] {
            camera.drag_zoom(Vector2::new(0.0, current), Vector2::new(0.0, last), viewport());
            assert_eq!(camera.zoom(), 1.0);
        }
        assert!(!camera.is_changed());

        camera.zoom_in();
        assert_relative_eq!(camera.zoom(), 0.5);
    }

    #[test]
    fn test_rotate_with_identical_positions_is_noop() {
        let mut camera = CameraModel::new(&header(Projection::Perspective));
        camera.take_changed();
        let p = Vector2::new(0.25, 0.5);

        camera.drag_rotate(p, p, viewport());
        assert_eq!(camera.rotation(), &Matrix4::identity());
        assert!(!camera.is_changed());
    }

    #[test]
    fn test_rotate_composes_into_rotation() {
        let mut camera = CameraModel::new(&header(Projection::Perspective));
        camera.drag_rotate(Vector2::new(0.5, 0.0), Vector2::new(0.0, 0.0), viewport());

        let r = camera.rotation();
        assert_ne!(r, &Matrix4::identity());
        // still orthonormal
        let upper = r.fixed_view::<3, 3>(0, 0).into_owned();
        assert_relative_eq!(upper * upper.transpose(), nalgebra::Matrix3::identity(), epsilon = 1e-5);
        assert!(camera.take_changed());
    }

    #[test]
    fn test_pan_moves_center_in_perspective() {
        let mut camera = CameraModel::new(&header(Projection::Perspective));
        let b = camera.view_bounds();
        let (half_width, half_height) = (0.5 * b.width(), 0.5 * b.height());
        camera.drag_pan(Vector2::new(0.1, 0.2), Vector2::zeros(), viewport());

        assert_relative_eq!(camera.center().x, 0.1 * half_width, epsilon = 1e-5);
        assert_relative_eq!(camera.center().y, -0.2 * half_height, epsilon = 1e-5);
        assert_eq!(camera.shift(), Vector2::zeros());
    }

    #[test]
    fn test_pan_shifts_in_orthographic() {
        let mut camera = CameraModel::new(&header(Projection::Orthographic));
        let center = camera.center();
        camera.drag_pan(Vector2::new(0.1, 0.1), Vector2::zeros(), viewport());

        assert_eq!(camera.center(), center);
        assert_relative_eq!(camera.shift().x, 20.0, epsilon = 1e-4);
        assert_relative_eq!(camera.shift().y, -10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_orthographic_bounds_keep_world_aspect() {
        let camera = CameraModel::new(&header(Projection::Orthographic));
        let b = camera.view_bounds();
        // 2x2 world on a 2:1 canvas: height constrains
        assert_relative_eq!(b.ymin, -1.0, epsilon = 1e-6);
        assert_relative_eq!(b.ymax, 1.0, epsilon = 1e-6);
        assert_relative_eq!(b.width(), 4.0, epsilon = 1e-6);
    }

    #[test]
    fn test_wheel_and_reset() {
        let mut camera = CameraModel::new(&header(Projection::Perspective));
        camera.wheel(WheelDirection::In);
        assert_relative_eq!(camera.zoom(), 1.05);
        camera.wheel(WheelDirection::Out);
        camera.wheel(WheelDirection::Out);
        assert_relative_eq!(camera.zoom(), 1.0 / 1.05, epsilon = 1e-6);

        camera.drag_rotate(Vector2::new(0.3, 0.0), Vector2::zeros(), viewport());
        camera.reset();
        assert_eq!(camera.zoom(), 1.0);
        assert_eq!(camera.rotation(), &Matrix4::identity());
        assert_eq!(camera.canvas_size(), (400, 200));
    }

    #[test]
    fn test_normalize_position() {
        let n = CameraModel::normalize_position(Vector2::new(100.0, 150.0), viewport());
        assert_relative_eq!(n, Vector2::new(-0.5, 0.5));
    }
}
