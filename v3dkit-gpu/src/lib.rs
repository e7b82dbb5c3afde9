//! # v3dkit GPU
//!
//! Headless rendering of flattened V3D meshes using WGPU.
//!
//! A renderer owns one device session and draws an interleaved
//! position+normal mesh into an off-screen color+depth target, then reads
//! the color attachment back into a tightly packed RGBA buffer.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use v3dkit_gpu::{OffscreenRenderer, RendererConfig};
//! use nalgebra::Matrix4;
//!
//! async fn example(vertices: &[f32], indices: &[u32]) -> v3dkit_core::Result<Vec<u8>> {
//!     let mut renderer = OffscreenRenderer::new(RendererConfig::default()).await?;
//!     let image = renderer
//!         .render(vertices, indices, 640, 480, &Matrix4::identity())
//!         .await?;
//!     Ok(image.into_top_down().into_pixels())
//! }
//! ```

pub mod config;
pub mod device;
pub mod pipeline;
pub mod readback;
pub mod renderer;
pub mod shaders;
pub mod target;
pub mod upload;

pub use config::{ColorFormat, RendererConfig, ShaderSource};
pub use device::{DeviceCapabilities, GpuContext};
pub use readback::{RenderedImage, RowOrder};
pub use renderer::OffscreenRenderer;
pub use shaders::{ShaderPair, TransformBinding};
