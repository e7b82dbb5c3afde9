//! Surface materials

use crate::point::Rgba;
use serde::{Deserialize, Serialize};

/// Material record; stored for lookup by `material_index`, not used for shading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub diffuse: Rgba,
    pub emissive: Rgba,
    pub specular: Rgba,
    pub shininess: f32,
    pub metallic: f32,
    pub fresnel0: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: Rgba::new(0.8, 0.8, 0.8, 1.0),
            emissive: Rgba::BLACK,
            specular: Rgba::new(0.04, 0.04, 0.04, 1.0),
            shininess: 0.25,
            metallic: 0.0,
            fresnel0: 0.04,
        }
    }
}
