//! Decoded scene, camera and renderer tied together

use crate::camera::CameraModel;
use crate::gesture::{DragMode, WheelDirection};
use nalgebra::Vector2;
use std::path::Path;
use v3dkit_core::{Error, Result};
use v3dkit_gpu::{OffscreenRenderer, RenderedImage, RendererConfig};
use v3dkit_io::SceneFile;

/// Interactive view over one scene file
///
/// Renders are cached: `render` only goes to the device when the camera
/// moved or the requested size changed since the last image.
pub struct SceneView {
    scene: SceneFile,
    camera: CameraModel,
    renderer: OffscreenRenderer,
    last_size: Option<(u32, u32)>,
    last_image: Option<RenderedImage>,
}

impl SceneView {
    pub fn new(scene: SceneFile, renderer: OffscreenRenderer) -> Self {
        let camera = CameraModel::new(&scene.header);
        Self {
            scene,
            camera,
            renderer,
            last_size: None,
            last_image: None,
        }
    }

    /// Decode `path` and open a renderer for it
    pub async fn open<P: AsRef<Path>>(path: P, config: RendererConfig) -> Result<Self> {
        let scene = SceneFile::load(path)?;
        for warning in &scene.warnings {
            log::warn!("{}", warning);
        }
        let renderer = OffscreenRenderer::new(config).await?;
        Ok(Self::new(scene, renderer))
    }

    pub fn scene(&self) -> &SceneFile {
        &self.scene
    }

    pub fn camera(&self) -> &CameraModel {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraModel {
        &mut self.camera
    }

    pub fn renderer(&self) -> &OffscreenRenderer {
        &self.renderer
    }

    /// Swap in a fresh renderer, e.g. after `Error::SessionLost`
    pub fn replace_renderer(&mut self, renderer: OffscreenRenderer) {
        self.renderer = renderer;
        self.last_image = None;
    }

    /// Forward a drag step to the camera
    pub fn drag(&mut self, mode: DragMode, current: Vector2<f32>, last: Vector2<f32>, viewport: Vector2<f32>) {
        self.camera.drag(mode, current, last, viewport);
    }

    pub fn wheel(&mut self, direction: WheelDirection) {
        self.camera.wheel(direction);
    }

    /// Whether `render(width, height)` would draw a new image
    pub fn needs_render(&self, width: u32, height: u32) -> bool {
        self.last_image.is_none() || self.last_size != Some((width, height)) || self.camera.is_changed()
    }

    /// Top-to-bottom RGBA of the scene at `width` x `height`
    pub async fn render(&mut self, width: u32, height: u32) -> Result<&RenderedImage> {
        let size = Some((width, height));
        if self.last_size != size {
            self.camera.set_projection(width, height);
        }
        let changed = self.camera.take_changed();

        if changed || self.last_image.is_none() || self.last_size != size {
            let mvp = self.camera.mvp();
            let rendered = self
                .renderer
                .render(self.scene.vertices(), self.scene.indices(), width, height, &mvp)
                .await;
            match rendered {
                Ok(image) => {
                    self.last_image = Some(image.into_top_down());
                    self.last_size = size;
                }
                Err(e) => {
                    self.last_image = None;
                    self.last_size = None;
                    return Err(e);
                }
            }
        } else {
            log::trace!("reusing cached {}x{} image", width, height);
        }

        self.last_image
            .as_ref()
            .ok_or_else(|| Error::Gpu("no rendered image available".to_string()))
    }

    pub fn render_blocking(&mut self, width: u32, height: u32) -> Result<&RenderedImage> {
        pollster::block_on(self.render(width, height))
    }
}
