//! Mesh render pipeline

use crate::device::{GpuContext, TRANSFORM_SIZE};
use crate::shaders::{CompiledShaders, ShaderPair, TransformBinding};
use v3dkit_core::mesh::MeshVertex;

/// Pipelines are rebuilt only when one of these changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub color_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
    pub binding: TransformBinding,
}

const MESH_ATTRIBUTES: [wgpu::VertexAttribute; 2] = [
    // Position
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    },
    // Normal
    wgpu::VertexAttribute {
        offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
        shader_location: 1,
        format: wgpu::VertexFormat::Float32x3,
    },
];

/// Interleaved position+normal layout, 24 bytes per vertex
pub fn mesh_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: MeshVertex::STRIDE as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &MESH_ATTRIBUTES,
    }
}

/// Compiled pipeline plus the transform binding resources it needs
pub struct MeshPipeline {
    pub key: PipelineKey,
    pub pipeline: wgpu::RenderPipeline,
    /// Present only for `TransformBinding::UniformBuffer`
    pub transform_buffer: Option<wgpu::Buffer>,
    pub transform_bind_group: Option<wgpu::BindGroup>,
}

impl MeshPipeline {
    pub fn new(ctx: &GpuContext, shaders: &ShaderPair, modules: &CompiledShaders, key: PipelineKey) -> Self {
        let device = &ctx.device;

        let (bind_group_layout, transform_buffer, transform_bind_group) = match key.binding {
            TransformBinding::PushConstants => (None, None, None),
            TransformBinding::UniformBuffer => {
                let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    entries: &[wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: wgpu::BufferSize::new(TRANSFORM_SIZE as u64),
                        },
                        count: None,
                    }],
                    label: Some("transform_bind_group_layout"),
                });
                let buffer = ctx.create_buffer(
                    "Transform Buffer",
                    TRANSFORM_SIZE as u64,
                    wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                );
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    layout: &layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                    label: Some("transform_bind_group"),
                });
                (Some(layout), Some(buffer), Some(bind_group))
            }
        };

        let push_constant_ranges: &[wgpu::PushConstantRange] = match key.binding {
            TransformBinding::PushConstants => &[wgpu::PushConstantRange {
                stages: wgpu::ShaderStages::VERTEX,
                range: 0..TRANSFORM_SIZE,
            }],
            TransformBinding::UniformBuffer => &[],
        };
        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> = bind_group_layout.iter().collect();

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh Render Pipeline Layout"),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mesh Render Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: modules.vertex(),
                entry_point: shaders.vertex_entry(),
                buffers: &[mesh_vertex_layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: modules.fragment(),
                entry_point: shaders.fragment_entry(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: key.color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Cw,
                cull_mode: None,
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: key.depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        log::debug!("built mesh pipeline {:?}", key);

        Self {
            key,
            pipeline,
            transform_buffer,
            transform_bind_group,
        }
    }

    /// Bind the pipeline and transform for a pass
    pub fn bind<'a>(&'a self, queue: &wgpu::Queue, pass: &mut wgpu::RenderPass<'a>, transform: &[f32; 16]) {
        pass.set_pipeline(&self.pipeline);
        match (&self.transform_buffer, &self.transform_bind_group) {
            (Some(buffer), Some(bind_group)) => {
                queue.write_buffer(buffer, 0, bytemuck::cast_slice(transform));
                pass.set_bind_group(0, bind_group, &[]);
            }
            _ => pass.set_push_constants(wgpu::ShaderStages::VERTEX, 0, bytemuck::cast_slice(transform)),
        }
    }
}
