//! GPU device management

use crate::config::RendererConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use v3dkit_core::{Error, Result};
use wgpu::util::DeviceExt;

/// Size in bytes of the 4x4 transform matrix
pub const TRANSFORM_SIZE: u32 = 64;

const DEPTH_FORMATS: [wgpu::TextureFormat; 4] = [
    wgpu::TextureFormat::Depth32Float,
    wgpu::TextureFormat::Depth32FloatStencil8,
    wgpu::TextureFormat::Depth24PlusStencil8,
    wgpu::TextureFormat::Depth24Plus,
];

/// What the device session negotiated with the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub push_constants: bool,
    pub depth_format: wgpu::TextureFormat,
    pub max_texture_dimension: u32,
    /// Largest buffer the device accepts, in bytes
    pub max_buffer_size: u64,
}

/// GPU context for off-screen rendering
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter: wgpu::Adapter,
    pub capabilities: DeviceCapabilities,
    lost: Arc<AtomicBool>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl GpuContext {
    /// Create a new GPU context
    pub async fn new(config: &RendererConfig) -> Result<Self> {
        let flags = if config.validation {
            wgpu::InstanceFlags::DEBUG | wgpu::InstanceFlags::VALIDATION
        } else {
            wgpu::InstanceFlags::empty()
        };
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: None,
                force_fallback_adapter: config.force_fallback_adapter,
            })
            .await
            .ok_or_else(|| Error::Gpu("Failed to find suitable adapter".to_string()))?;

        let info = adapter.get_info();
        let push_constants = config.prefer_push_constants
            && adapter.features().contains(wgpu::Features::PUSH_CONSTANTS)
            && adapter.limits().max_push_constant_size >= TRANSFORM_SIZE;

        let mut required_features = wgpu::Features::empty();
        let adapter_limits = adapter.limits();
        let mut required_limits = wgpu::Limits::downlevel_defaults().using_resolution(adapter_limits.clone());
        required_limits.max_buffer_size = adapter_limits.max_buffer_size;
        if push_constants {
            required_features |= wgpu::Features::PUSH_CONSTANTS;
            required_limits.max_push_constant_size = TRANSFORM_SIZE;
        }

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("v3dkit Render Device"),
                    required_features,
                    required_limits,
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| Error::Gpu(format!("Failed to create device: {}", e)))?;

        let lost = Arc::new(AtomicBool::new(false));
        let last_error = Arc::new(Mutex::new(None));
        {
            let lost = Arc::clone(&lost);
            let last_error = Arc::clone(&last_error);
            device.on_uncaptured_error(Box::new(move |e| {
                log::error!("uncaptured GPU error: {}", e);
                lost.store(true, Ordering::SeqCst);
                if let Ok(mut slot) = last_error.lock() {
                    *slot = Some(e.to_string());
                }
            }));
        }

        let depth_format = select_depth_format(&adapter, device.features())?;
        let limits = device.limits();
        let capabilities = DeviceCapabilities {
            push_constants,
            depth_format,
            max_texture_dimension: limits.max_texture_dimension_2d,
            max_buffer_size: limits.max_buffer_size,
        };

        log::info!(
            "GPU session on {} ({:?}), depth {:?}, push constants: {}",
            info.name,
            info.backend,
            depth_format,
            push_constants
        );

        Ok(Self {
            device,
            queue,
            adapter,
            capabilities,
            lost,
            last_error,
        })
    }

    /// Whether an uncaptured device error has made the session unusable
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }

    /// Mark the session unusable
    pub fn mark_lost(&self, reason: &str) {
        log::error!("GPU session marked unusable: {}", reason);
        self.lost.store(true, Ordering::SeqCst);
        if let Ok(mut slot) = self.last_error.lock() {
            slot.get_or_insert_with(|| reason.to_string());
        }
    }

    /// `Error::SessionLost` if the session can no longer be used
    pub fn check_alive(&self) -> Result<()> {
        if !self.is_lost() {
            return Ok(());
        }
        let reason = self
            .last_error
            .lock()
            .ok()
            .and_then(|slot| slot.clone())
            .unwrap_or_else(|| "device error".to_string());
        Err(Error::SessionLost(reason))
    }

    /// Block until the given submission has finished executing
    pub fn wait_for(&self, submission: wgpu::SubmissionIndex) {
        let _ = self.device.poll(wgpu::Maintain::wait_for(submission));
    }

    /// Create a buffer from data
    pub fn create_buffer_init<T: bytemuck::Pod>(&self, label: &str, data: &[T], usage: wgpu::BufferUsages) -> wgpu::Buffer {
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(data),
            usage,
        })
    }

    /// Create an empty buffer
    pub fn create_buffer(&self, label: &str, size: u64, usage: wgpu::BufferUsages) -> wgpu::Buffer {
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage,
            mapped_at_creation: false,
        })
    }

    /// Create a 2D texture with a single mip level
    pub fn create_texture(
        &self,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
    ) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        })
    }
}

/// First depth format the adapter can render to with the enabled features
fn select_depth_format(adapter: &wgpu::Adapter, features: wgpu::Features) -> Result<wgpu::TextureFormat> {
    DEPTH_FORMATS
        .iter()
        .copied()
        .find(|format| {
            features.contains(format.required_features())
                && adapter
                    .get_texture_format_features(*format)
                    .allowed_usages
                    .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
        })
        .ok_or_else(|| Error::Gpu("No supported depth attachment format".to_string()))
}
