//! Renderer configuration

use std::path::PathBuf;

/// Where the vertex/fragment shader pair comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ShaderSource {
    /// WGSL pair compiled into the crate
    #[default]
    Builtin,
    /// Directories searched in order for `vertex.spv` and `fragment.spv`
    SearchPaths(Vec<PathBuf>),
}

/// Color attachment format; both are four bytes per pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorFormat {
    #[default]
    Rgba8Unorm,
    Rgba8UnormSrgb,
}

impl ColorFormat {
    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            ColorFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            ColorFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        }
    }
}

/// Off-screen renderer configuration
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Enable backend validation layers
    pub validation: bool,
    pub power_preference: wgpu::PowerPreference,
    pub force_fallback_adapter: bool,
    pub shaders: ShaderSource,
    pub color_format: ColorFormat,
    pub clear_color: [f64; 4],
    /// Use push constants for the transform when the adapter supports them
    pub prefer_push_constants: bool,
    /// Distinct render target sizes kept alive between calls
    pub max_cached_targets: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            validation: cfg!(debug_assertions),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            shaders: ShaderSource::Builtin,
            color_format: ColorFormat::Rgba8Unorm,
            clear_color: [1.0, 1.0, 1.0, 1.0],
            prefer_push_constants: true,
            max_cached_targets: 4,
        }
    }
}

impl RendererConfig {
    /// Load the SPIR-V pair from the given directories
    pub fn with_shader_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.shaders = ShaderSource::SearchPaths(dirs.into_iter().map(Into::into).collect());
        self
    }
}
