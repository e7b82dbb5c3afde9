//! Core data structures for v3dkit
//!
//! This crate provides the scene data model decoded from V3D files, the
//! rasterization of geometry records into interleaved vertex/index buffers,
//! and Bezier patch tessellation.

pub mod error;
pub mod geometry;
pub mod header;
pub mod material;
pub mod mesh;
pub mod point;
pub mod tags;
pub mod tessellation;
pub mod warning;

pub use error::*;
pub use geometry::*;
pub use header::*;
pub use material::*;
pub use mesh::*;
pub use point::*;
pub use tags::*;
pub use tessellation::*;
pub use warning::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix4, Point3, Vector2, Vector3};
