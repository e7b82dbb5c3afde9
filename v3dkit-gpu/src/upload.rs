//! Staged upload of mesh buffers into device-local memory

use crate::device::GpuContext;
use v3dkit_core::mesh::FLOATS_PER_VERTEX;

/// Device-local vertex and index buffers of one mesh
pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

impl GpuMesh {
    /// Copy `vertices` and `indices` through host-visible staging buffers and wait for the transfer
    ///
    /// Returns `None` for an empty mesh, which has nothing to draw.
    pub fn upload(ctx: &GpuContext, vertices: &[f32], indices: &[u32]) -> Option<Self> {
        if vertices.is_empty() || indices.is_empty() {
            return None;
        }

        let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(indices);

        let vertex_staging = ctx.create_buffer_init("Vertex Staging Buffer", vertex_bytes, wgpu::BufferUsages::COPY_SRC);
        let index_staging = ctx.create_buffer_init("Index Staging Buffer", index_bytes, wgpu::BufferUsages::COPY_SRC);

        let vertex_buffer = ctx.create_buffer(
            "Mesh Vertex Buffer",
            vertex_bytes.len() as u64,
            wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        );
        let index_buffer = ctx.create_buffer(
            "Mesh Index Buffer",
            index_bytes.len() as u64,
            wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        );

        let mut encoder = ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Mesh Upload Encoder"),
        });
        encoder.copy_buffer_to_buffer(&vertex_staging, 0, &vertex_buffer, 0, vertex_bytes.len() as u64);
        encoder.copy_buffer_to_buffer(&index_staging, 0, &index_buffer, 0, index_bytes.len() as u64);
        let submission = ctx.queue.submit(std::iter::once(encoder.finish()));
        ctx.wait_for(submission);

        log::trace!(
            "uploaded {} vertices and {} indices",
            vertices.len() / FLOATS_PER_VERTEX,
            indices.len()
        );

        Some(Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        })
    }
}
