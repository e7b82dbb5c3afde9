//! # v3dkit View
//!
//! Interactive camera over a decoded V3D scene.
//!
//! [`CameraModel`] turns drag and wheel gestures into a model-view-projection
//! matrix, [`Arcball`] computes the rotation behind the rotate gesture, and
//! [`SceneView`] ties a scene, its camera and an off-screen renderer together.
//!
//! ```rust,no_run
//! use nalgebra::Vector2;
//! use v3dkit_gpu::RendererConfig;
//! use v3dkit_view::{DragMode, SceneView};
//!
//! fn example() -> v3dkit_core::Result<()> {
//!     let mut view = pollster::block_on(SceneView::open("figure.v3d", RendererConfig::default()))?;
//!     let viewport = Vector2::new(640.0, 480.0);
//!     let mode = DragMode::from_modifiers(false, false, false);
//!     view.drag(mode, Vector2::new(0.1, 0.0), Vector2::zeros(), viewport);
//!     let image = view.render_blocking(640, 480)?;
//!     println!("{} bytes", image.pixels.len());
//!     Ok(())
//! }
//! ```

pub mod arcball;
pub mod camera;
pub mod gesture;
pub mod scene_view;

pub use arcball::Arcball;
pub use camera::{CameraModel, ViewBounds};
pub use gesture::{DragMode, WheelDirection};
pub use scene_view::SceneView;
