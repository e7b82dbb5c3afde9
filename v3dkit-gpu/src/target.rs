//! Off-screen color/depth attachments and their readback buffer

use crate::device::GpuContext;
use crate::readback::padded_bytes_per_row;

/// Identifies a reusable set of attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetKey {
    pub width: u32,
    pub height: u32,
    pub color_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
}

/// Color and depth attachments of one size plus a mappable buffer for the color copy
pub struct RenderTarget {
    pub key: TargetKey,
    pub color: wgpu::Texture,
    pub color_view: wgpu::TextureView,
    pub depth: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
    pub readback: wgpu::Buffer,
    pub padded_bytes_per_row: u32,
}

impl RenderTarget {
    pub fn new(ctx: &GpuContext, key: TargetKey) -> Self {
        let color = ctx.create_texture(
            "Offscreen Color Target",
            key.width,
            key.height,
            key.color_format,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        );
        let depth = ctx.create_texture(
            "Offscreen Depth Target",
            key.width,
            key.height,
            key.depth_format,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );

        let padded = padded_bytes_per_row(key.width);
        let readback = ctx.create_buffer(
            "Offscreen Readback Buffer",
            padded as u64 * key.height as u64,
            wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        );

        log::debug!(
            "created {}x{} render target ({} bytes per padded row)",
            key.width,
            key.height,
            padded
        );

        Self {
            key,
            color_view: color.create_view(&wgpu::TextureViewDescriptor::default()),
            depth_view: depth.create_view(&wgpu::TextureViewDescriptor::default()),
            color,
            depth,
            readback,
            padded_bytes_per_row: padded,
        }
    }

    /// Record the copy of the color attachment into the readback buffer
    pub fn copy_to_readback(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.color,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_bytes_per_row),
                    rows_per_image: Some(self.key.height),
                },
            },
            wgpu::Extent3d {
                width: self.key.width,
                height: self.key.height,
                depth_or_array_layers: 1,
            },
        );
    }
}
