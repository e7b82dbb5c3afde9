//! Off-screen mesh renderer

use crate::config::{RendererConfig, ShaderSource};
use crate::device::{DeviceCapabilities, GpuContext};
use crate::pipeline::{MeshPipeline, PipelineKey};
use crate::readback::{pack_rows, padded_bytes_per_row, RenderedImage, RowOrder};
use crate::shaders::{locate_shader_dir, CompiledShaders, ShaderPair, TransformBinding};
use crate::target::{RenderTarget, TargetKey};
use crate::upload::GpuMesh;
use nalgebra::Matrix4;
use std::collections::HashMap;
use v3dkit_core::mesh::validate_buffers;
use v3dkit_core::{Error, Result};

/// Renders interleaved position+normal meshes into an RGBA buffer
///
/// One render runs at a time; `render` takes `&mut self`, so sharing a
/// renderer across threads needs an outer lock.
pub struct OffscreenRenderer {
    ctx: GpuContext,
    config: RendererConfig,
    shaders: ShaderPair,
    modules: CompiledShaders,
    pipelines: HashMap<PipelineKey, MeshPipeline>,
    /// Most recently used first
    targets: Vec<RenderTarget>,
}

impl OffscreenRenderer {
    /// Create a device session and compile the shader pair
    pub async fn new(config: RendererConfig) -> Result<Self> {
        // A missing SPIR-V pair must fail before any device is created
        if let ShaderSource::SearchPaths(paths) = &config.shaders {
            locate_shader_dir(paths)?;
        }
        let ctx = GpuContext::new(&config).await?;
        Self::with_context(ctx, config)
    }

    pub fn new_blocking(config: RendererConfig) -> Result<Self> {
        pollster::block_on(Self::new(config))
    }

    /// Build a renderer on an existing session
    pub fn with_context(ctx: GpuContext, config: RendererConfig) -> Result<Self> {
        ctx.check_alive()?;
        let shaders = ShaderPair::load(&config.shaders, ctx.capabilities.push_constants)?;
        if shaders.binding() == TransformBinding::PushConstants && !ctx.capabilities.push_constants {
            return Err(Error::Unsupported(
                "SPIR-V shaders need push constants, which this adapter does not provide".to_string(),
            ));
        }
        let modules = shaders.create_modules(&ctx.device);

        Ok(Self {
            ctx,
            config,
            shaders,
            modules,
            pipelines: HashMap::new(),
            targets: Vec::new(),
        })
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Row order of images returned by `render`
    pub fn row_order(&self) -> RowOrder {
        self.shaders.row_order()
    }

    pub fn cached_pipelines(&self) -> usize {
        self.pipelines.len()
    }

    pub fn cached_targets(&self) -> usize {
        self.targets.len()
    }

    /// Drop cached pipelines and render targets
    pub fn clear_cache(&mut self) {
        self.pipelines.clear();
        self.targets.clear();
    }

    /// Draw `indices` over `vertices` (6 floats per vertex) with `mvp` into a `width` x `height` image
    ///
    /// The returned pixels are tightly packed RGBA8 in [`Self::row_order`]; call
    /// [`RenderedImage::into_top_down`] for row 0 at the top. Any device error
    /// during the call yields `Error::SessionLost` and poisons the session.
    pub async fn render(
        &mut self,
        vertices: &[f32],
        indices: &[u32],
        width: u32,
        height: u32,
        mvp: &Matrix4<f32>,
    ) -> Result<RenderedImage> {
        self.ctx.check_alive()?;
        validate_buffers(vertices, indices)?;
        check_device_limits(
            &self.ctx.capabilities,
            width,
            height,
            std::mem::size_of_val(vertices) as u64,
            std::mem::size_of_val(indices) as u64,
        )?;

        self.ctx.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.ctx.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let outcome = self.draw_and_read(vertices, indices, width, height, mvp).await;

        let validation = self.ctx.device.pop_error_scope().await;
        let out_of_memory = self.ctx.device.pop_error_scope().await;
        if let Some(err) = validation.or(out_of_memory) {
            let reason = err.to_string();
            self.ctx.mark_lost(&reason);
            self.clear_cache();
            return Err(Error::SessionLost(reason));
        }
        if let Err(Error::SessionLost(reason)) = &outcome {
            self.ctx.mark_lost(reason);
            self.clear_cache();
        }
        outcome
    }

    pub fn render_blocking(
        &mut self,
        vertices: &[f32],
        indices: &[u32],
        width: u32,
        height: u32,
        mvp: &Matrix4<f32>,
    ) -> Result<RenderedImage> {
        pollster::block_on(self.render(vertices, indices, width, height, mvp))
    }

    async fn draw_and_read(
        &mut self,
        vertices: &[f32],
        indices: &[u32],
        width: u32,
        height: u32,
        mvp: &Matrix4<f32>,
    ) -> Result<RenderedImage> {
        let color_format = self.config.color_format.to_wgpu();
        let depth_format = self.ctx.capabilities.depth_format;
        let pipeline_key = PipelineKey {
            color_format,
            depth_format,
            binding: self.shaders.binding(),
        };
        let target_key = TargetKey {
            width,
            height,
            color_format,
            depth_format,
        };

        let mesh = GpuMesh::upload(&self.ctx, vertices, indices);
        self.ensure_pipeline(pipeline_key);
        self.acquire_target(target_key);

        let pipeline = self
            .pipelines
            .get(&pipeline_key)
            .ok_or_else(|| Error::Gpu("pipeline missing from cache".to_string()))?;
        let target = self
            .targets
            .first()
            .ok_or_else(|| Error::Gpu("render target missing from cache".to_string()))?;

        let mut transform = [0.0f32; 16];
        transform.copy_from_slice(mvp.as_slice());
        let [r, g, b, a] = self.config.clear_color;

        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Offscreen Render Encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Offscreen Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &target.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(mesh) = &mesh {
                pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
                pass.set_scissor_rect(0, 0, width, height);
                pipeline.bind(&self.ctx.queue, &mut pass, &transform);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }
        target.copy_to_readback(&mut encoder);

        let submission = self.ctx.queue.submit(std::iter::once(encoder.finish()));

        let slice = target.readback.slice(..);
        let (sender, receiver) = flume::bounded(1);
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        self.ctx.wait_for(submission);

        match receiver.recv_async().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(Error::SessionLost(format!("readback mapping failed: {}", e))),
            Err(_) => return Err(Error::SessionLost("readback mapping was dropped".to_string())),
        }

        let packed = {
            let data = slice.get_mapped_range();
            pack_rows(&data, target.padded_bytes_per_row as usize, width, height)
        };
        target.readback.unmap();

        log::debug!(
            "rendered {} triangles into {}x{}",
            indices.len() / 3,
            width,
            height
        );

        Ok(RenderedImage {
            width,
            height,
            pixels: packed?,
            row_order: self.shaders.row_order(),
        })
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if !self.pipelines.contains_key(&key) {
            let pipeline = MeshPipeline::new(&self.ctx, &self.shaders, &self.modules, key);
            self.pipelines.insert(key, pipeline);
        }
    }

    /// Move the target for `key` to the front of the cache, creating it if needed
    fn acquire_target(&mut self, key: TargetKey) {
        if let Some(pos) = self.targets.iter().position(|t| t.key == key) {
            let target = self.targets.remove(pos);
            self.targets.insert(0, target);
            return;
        }
        self.targets.insert(0, RenderTarget::new(&self.ctx, key));
        self.targets.truncate(self.config.max_cached_targets.max(1));
    }
}

/// Reject sizes the device would refuse, before any GPU work is recorded
fn check_device_limits(
    caps: &DeviceCapabilities,
    width: u32,
    height: u32,
    vertex_bytes: u64,
    index_bytes: u64,
) -> Result<()> {
    let max = caps.max_texture_dimension;
    if width == 0 || height == 0 || width > max || height > max {
        return Err(Error::InvalidData(format!(
            "render size {}x{} outside 1..={}",
            width, height, max
        )));
    }
    let readback_bytes = padded_bytes_per_row(width) as u64 * height as u64;
    for (what, bytes) in [
        ("readback", readback_bytes),
        ("vertex", vertex_bytes),
        ("index", index_bytes),
    ] {
        if bytes > caps.max_buffer_size {
            return Err(Error::InvalidData(format!(
                "{} buffer of {} bytes exceeds the device limit of {}",
                what, bytes, caps.max_buffer_size
            )));
        }
    }
    Ok(())
}
