//! Shader pair loading

use crate::config::ShaderSource;
use crate::readback::RowOrder;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use v3dkit_core::{Error, Result};

pub const VERTEX_SHADER_FILE: &str = "vertex.spv";
pub const FRAGMENT_SHADER_FILE: &str = "fragment.spv";
/// Entry point of both SPIR-V stages
pub const SPIRV_ENTRY_POINT: &str = "main";

const SPIRV_MAGIC: u32 = 0x0723_0203;

/// How the transform matrix reaches the vertex stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformBinding {
    PushConstants,
    UniformBuffer,
}

#[derive(Debug, Clone)]
enum ShaderCode {
    Wgsl(&'static str),
    Spirv { vertex: Vec<u8>, fragment: Vec<u8> },
}

/// A vertex+fragment shader pair ready to be compiled on a device
#[derive(Debug, Clone)]
pub struct ShaderPair {
    code: ShaderCode,
    binding: TransformBinding,
}

impl ShaderPair {
    /// Built-in WGSL pair for the given transform binding
    pub fn builtin(binding: TransformBinding) -> Self {
        let source = match binding {
            TransformBinding::PushConstants => include_str!("shaders/mesh_push.wgsl"),
            TransformBinding::UniformBuffer => include_str!("shaders/mesh_uniform.wgsl"),
        };
        Self {
            code: ShaderCode::Wgsl(source),
            binding,
        }
    }

    /// Locate and read a SPIR-V pair; these always take the transform as a push constant
    pub fn from_search_paths(paths: &[PathBuf]) -> Result<Self> {
        let dir = locate_shader_dir(paths)?;
        let vertex = read_spirv(&dir.join(VERTEX_SHADER_FILE))?;
        let fragment = read_spirv(&dir.join(FRAGMENT_SHADER_FILE))?;
        log::debug!("loaded SPIR-V shaders from {}", dir.display());
        Ok(Self {
            code: ShaderCode::Spirv { vertex, fragment },
            binding: TransformBinding::PushConstants,
        })
    }

    /// Resolve a configured source, choosing the binding for built-in shaders
    pub fn load(source: &ShaderSource, push_constants: bool) -> Result<Self> {
        match source {
            ShaderSource::Builtin if push_constants => Ok(Self::builtin(TransformBinding::PushConstants)),
            ShaderSource::Builtin => Ok(Self::builtin(TransformBinding::UniformBuffer)),
            ShaderSource::SearchPaths(paths) => Self::from_search_paths(paths),
        }
    }

    pub fn binding(&self) -> TransformBinding {
        self.binding
    }

    /// Row order of the color attachment this pair renders
    pub fn row_order(&self) -> RowOrder {
        match self.code {
            ShaderCode::Wgsl(_) => RowOrder::BottomUp,
            ShaderCode::Spirv { .. } => RowOrder::TopDown,
        }
    }

    pub fn vertex_entry(&self) -> &'static str {
        match self.code {
            ShaderCode::Wgsl(_) => "vs_main",
            ShaderCode::Spirv { .. } => SPIRV_ENTRY_POINT,
        }
    }

    pub fn fragment_entry(&self) -> &'static str {
        match self.code {
            ShaderCode::Wgsl(_) => "fs_main",
            ShaderCode::Spirv { .. } => SPIRV_ENTRY_POINT,
        }
    }

    /// Compile the pair on `device`
    pub fn create_modules(&self, device: &wgpu::Device) -> CompiledShaders {
        match &self.code {
            ShaderCode::Wgsl(source) => CompiledShaders {
                vertex: device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("Mesh Shader"),
                    source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(*source)),
                }),
                fragment: None,
            },
            ShaderCode::Spirv { vertex, fragment } => {
                let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("Mesh Vertex Shader"),
                    source: wgpu::util::make_spirv(vertex),
                });
                let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("Mesh Fragment Shader"),
                    source: wgpu::util::make_spirv(fragment),
                });
                CompiledShaders {
                    vertex,
                    fragment: Some(fragment),
                }
            }
        }
    }
}

/// Shader modules of a compiled pair; single-module sources share one module
pub struct CompiledShaders {
    vertex: wgpu::ShaderModule,
    fragment: Option<wgpu::ShaderModule>,
}

impl CompiledShaders {
    pub fn vertex(&self) -> &wgpu::ShaderModule {
        &self.vertex
    }

    pub fn fragment(&self) -> &wgpu::ShaderModule {
        self.fragment.as_ref().unwrap_or(&self.vertex)
    }
}

/// First directory holding both SPIR-V stages
pub fn locate_shader_dir(paths: &[PathBuf]) -> Result<PathBuf> {
    paths
        .iter()
        .find(|dir| dir.join(VERTEX_SHADER_FILE).is_file() && dir.join(FRAGMENT_SHADER_FILE).is_file())
        .cloned()
        .ok_or_else(|| {
            let searched: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
            Error::ResourceNotFound(format!(
                "{} and {} not found in [{}]",
                VERTEX_SHADER_FILE,
                FRAGMENT_SHADER_FILE,
                searched.join(", ")
            ))
        })
}

fn read_spirv(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path)?;
    if bytes.len() < 4 || bytes.len() % 4 != 0 {
        return Err(Error::InvalidData(format!(
            "{} is not a SPIR-V binary ({} bytes)",
            path.display(),
            bytes.len()
        )));
    }
    let magic = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if magic != SPIRV_MAGIC {
        return Err(Error::InvalidData(format!(
            "{} has SPIR-V magic {:#010x}",
            path.display(),
            magic
        )));
    }
    Ok(bytes)
}
