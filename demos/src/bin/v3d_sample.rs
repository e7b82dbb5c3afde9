//! Write a small sample scene file exercising the renderable record types

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use v3dkit_core::{
    BezierPatch, GeometryRecord, Material, Point3f, Projection, Quad, Rgba, SceneHeader, Sphere,
    TriangleGroup, Vector3f,
};
use v3dkit_demos::{init_logging, LoggingConfig};
use v3dkit_io::{Precision, SceneWriter};

#[derive(Parser, Debug)]
#[command(name = "v3d-sample")]
#[command(about = "Write a sample V3D scene file", long_about = None)]
struct Cli {
    /// Where to write the scene
    #[arg(default_value = "sample.v3d")]
    output: PathBuf,

    /// Store reals as 64-bit floats
    #[arg(long)]
    double: bool,

    /// Repeat for more log output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Square pyramid with normals pointing away from its centroid
fn pyramid() -> TriangleGroup {
    let positions = vec![
        Point3f::new(-0.6, -0.6, -9.6),
        Point3f::new(0.6, -0.6, -9.6),
        Point3f::new(0.6, -0.6, -8.4),
        Point3f::new(-0.6, -0.6, -8.4),
        Point3f::new(0.0, 0.6, -9.0),
    ];
    let centroid = positions.iter().fold(Vector3f::zeros(), |acc, p| acc + p.coords) / positions.len() as f32;
    let normals = positions.iter().map(|p| (p.coords - centroid).normalize()).collect();
    let position_indices = vec![[0, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4], [0, 2, 1], [0, 3, 2]];

    TriangleGroup {
        positions,
        normals,
        normal_indices: position_indices.clone(),
        color_indices: position_indices.clone(),
        position_indices,
        material_index: 1,
        ..TriangleGroup::default()
    }
}

fn floor() -> Quad {
    Quad {
        corners: [
            Point3f::new(-1.5, -0.7, -10.5),
            Point3f::new(1.5, -0.7, -10.5),
            Point3f::new(1.5, -0.7, -7.5),
            Point3f::new(-1.5, -0.7, -7.5),
        ],
        corner_colors: None,
        center_index: 0,
        material_index: 0,
    }
}

/// Saddle-shaped patch hovering behind the pyramid
fn saddle() -> BezierPatch {
    let mut controls = [Point3f::origin(); 16];
    for (i, control) in controls.iter_mut().enumerate() {
        let u = (i / 4) as f32 / 3.0;
        let v = (i % 4) as f32 / 3.0;
        let height = 0.4 * (u - 0.5) * (v - 0.5) * 4.0;
        *control = Point3f::new(-1.2 + 2.4 * u, 0.9 + height, -10.4 + 0.8 * v);
    }
    BezierPatch {
        controls,
        corner_colors: None,
        center_index: 0,
        material_index: 0,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_verbosity(cli.verbose));

    let header = SceneHeader {
        canvas_width: 400,
        canvas_height: 300,
        min_bound: Point3f::new(-1.5, -1.5, -11.0),
        max_bound: Point3f::new(1.5, 1.5, -7.0),
        projection: Projection::Perspective,
        zoom_factor: 1.05,
        zoom_step: 0.2,
        ..SceneHeader::default()
    };
    let precision = if cli.double { Precision::Double } else { Precision::Single };

    let writer = SceneWriter::new(precision)
        .with_header(header)
        .with_material(Material::default())
        .with_material(Material {
            diffuse: Rgba::new(0.8, 0.3, 0.2, 1.0),
            ..Material::default()
        })
        .with_record(GeometryRecord::Quad(floor()))
        .with_record(GeometryRecord::TriangleGroup(pyramid()))
        .with_record(GeometryRecord::BezierPatch(saddle()))
        // not rasterized; shows up as a decode warning
        .with_record(GeometryRecord::Sphere(Sphere {
            center: Point3f::new(1.0, 0.5, -9.0),
            radius: 0.3,
            center_index: 0,
            material_index: 0,
        }));

    writer
        .save(&cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    log::info!("wrote sample scene to {}", cli.output.display());
    println!("wrote {}", cli.output.display());
    Ok(())
}
