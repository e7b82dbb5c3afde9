//! Decode a V3D scene file, print a summary and render it to PNG

use anyhow::{bail, Context, Result};
use clap::Parser;
use nalgebra::Vector2;
use std::path::PathBuf;
use v3dkit_core::SceneHeader;
use v3dkit_demos::{init_logging, LoggingConfig};
use v3dkit_gpu::{OffscreenRenderer, RendererConfig};
use v3dkit_io::{DecodeOptions, SceneFile};
use v3dkit_view::{DragMode, SceneView, WheelDirection};

#[derive(Parser, Debug)]
#[command(name = "v3d-render")]
#[command(about = "Render a V3D scene file off-screen", long_about = None)]
struct Cli {
    /// Scene file to decode
    input: PathBuf,

    /// PNG to write; defaults to the input path with a .png extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Image width; defaults to the header canvas width, or follows the canvas aspect when only --height is given
    #[arg(long)]
    width: Option<u32>,

    /// Image height; defaults to the header canvas height, or follows the canvas aspect when only --width is given
    #[arg(long)]
    height: Option<u32>,

    /// Stop at the first undecodable record instead of failing
    #[arg(long)]
    lenient: bool,

    /// Directory holding vertex.spv and fragment.spv; may be repeated
    #[arg(long = "shader-dir")]
    shader_dirs: Vec<PathBuf>,

    /// Wheel notches to apply before rendering; negative zooms out
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    zoom: i32,

    /// Rotate drag from the canvas center to this normalized position, as "x,y"
    #[arg(long, value_parser = parse_position, allow_hyphen_values = true)]
    rotate: Option<(f32, f32)>,

    /// Print the summary without rendering
    #[arg(long)]
    summary_only: bool,

    /// Repeat for more log output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_position(s: &str) -> std::result::Result<(f32, f32), String> {
    let (x, y) = s.split_once(',').ok_or_else(|| format!("expected x,y but got {s:?}"))?;
    let x = x.trim().parse::<f32>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f32>().map_err(|e| e.to_string())?;
    Ok((x, y))
}

/// Output size from the optional overrides, keeping the canvas aspect when only one is set
fn output_size(width: Option<u32>, height: Option<u32>, header: &SceneHeader) -> (u32, u32) {
    let aspect = header.canvas_aspect();
    match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, (w as f32 / aspect).round().max(1.0) as u32),
        (None, Some(h)) => ((h as f32 * aspect).round().max(1.0) as u32, h),
        (None, None) => (header.canvas_width, header.canvas_height),
    }
}

fn print_summary(scene: &SceneFile) {
    let header = &scene.header;
    println!("version:    {}", scene.version);
    println!("precision:  {:?}", scene.precision);
    println!("canvas:     {}x{}", header.canvas_width, header.canvas_height);
    println!("projection: {:?}", header.projection);
    println!("materials:  {}", scene.materials.len());
    println!("records:    {}", scene.records.len());
    println!("vertices:   {}", scene.vertex_count());
    println!("triangles:  {}", scene.triangle_count());
    if let Some((min, max)) = scene.bounds() {
        println!(
            "bounds:     ({:.3}, {:.3}, {:.3}) - ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }
    for warning in &scene.warnings {
        println!("warning:    {}", warning);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LoggingConfig::from_verbosity(cli.verbose));

    let options = if cli.lenient {
        DecodeOptions::lenient()
    } else {
        DecodeOptions::default()
    };
    let scene = SceneFile::load_with(&cli.input, &options)
        .with_context(|| format!("failed to decode {}", cli.input.display()))?;
    print_summary(&scene);

    if cli.summary_only {
        return Ok(());
    }

    let (width, height) = output_size(cli.width, cli.height, &scene.header);
    if width == 0 || height == 0 {
        bail!("cannot render a {}x{} image", width, height);
    }

    let mut config = RendererConfig::default();
    if !cli.shader_dirs.is_empty() {
        config = config.with_shader_dirs(cli.shader_dirs.iter().cloned());
    }
    let renderer = OffscreenRenderer::new_blocking(config.clone()).context("failed to start the renderer")?;

    let mut view = SceneView::new(scene, renderer);
    view.camera_mut().set_projection(width, height);
    let direction = if cli.zoom < 0 { WheelDirection::Out } else { WheelDirection::In };
    for _ in 0..cli.zoom.unsigned_abs() {
        view.wheel(direction);
    }
    if let Some((x, y)) = cli.rotate {
        let viewport = Vector2::new(width as f32, height as f32);
        view.drag(DragMode::Rotate, Vector2::new(x, y), Vector2::zeros(), viewport);
    }

    let image = match view.render_blocking(width, height).cloned() {
        Err(e) if e.is_session_lost() => {
            log::warn!("render session lost ({}), retrying on a fresh device", e);
            let renderer = OffscreenRenderer::new_blocking(config).context("failed to restart the renderer")?;
            view.replace_renderer(renderer);
            view.render_blocking(width, height).cloned().context("render failed")?
        }
        other => other.context("render failed")?,
    };
    let output = cli.output.unwrap_or_else(|| cli.input.with_extension("png"));
    let buffer = image::RgbaImage::from_raw(image.width, image.height, image.pixels)
        .context("rendered buffer does not match its dimensions")?;
    buffer
        .save(&output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    log::info!("wrote {}x{} image to {}", width, height, output.display());
    println!("wrote {}", output.display());
    Ok(())
}
