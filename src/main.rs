use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use declscene::{document, Format, HeadlessBackend};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Auto,
    Markup,
    Json,
}

impl From<FormatArg> for Option<Format> {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Auto => None,
            FormatArg::Markup => Some(Format::Markup),
            FormatArg::Json => Some(Format::Json),
        }
    }
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scene document to load
    path: PathBuf,

    /// Document syntax
    #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
    format: FormatArg,

    /// Print the flattened vertex and index buffers
    #[arg(long)]
    dump: bool,

    /// Override the aspect ratio of a perspective camera
    #[arg(long)]
    camera_aspect: Option<f32>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let Some(mut scene) = document::load_with_format(&args.path, args.format.into()) else {
        bail!("Could not load scene {}", args.path.display());
    };

    if let (Some(aspect), Some(camera)) = (args.camera_aspect, scene.camera_mut()) {
        camera.set_aspect(aspect);
    }

    scene.update();
    let mut backend = HeadlessBackend::new();
    scene.draw(&mut backend);

    println!("meshes:   {}", scene.meshes.len());
    for mesh in &scene.meshes {
        println!(
            "  {:<10} {} vertices x {} floats, {} triangles",
            mesh.name,
            mesh.vertex_count(),
            mesh.vertex_size(),
            mesh.indices().len() / 3
        );
    }
    println!("floats:   {}", scene.vertices().len());
    println!("indices:  {}", scene.indices().len());
    match scene.shader() {
        Some(shader) => println!(
            "shader:   stride {}, {} uniforms, {}",
            shader.attribute_size(),
            shader.layout().uniforms().len(),
            if shader.program().is_some() { "compiled" } else { "not compiled" }
        ),
        None => println!("shader:   none (nothing drawn)"),
    }
    if let Some(camera) = scene.camera() {
        println!("camera:   {:?}", camera.projection);
    }
    println!("draws:    {}", backend.draws.len());

    if args.dump {
        let stride = scene.meshes.first().map_or(1, |m| m.vertex_size().max(1));
        println!("vertices:");
        for vertex in scene.vertices().chunks(stride) {
            println!("  {:?}", vertex);
        }
        println!("triangles:");
        for triangle in scene.indices().chunks(3) {
            println!("  {:?}", triangle);
        }
    }

    scene.release(&mut backend);
    Ok(())
}
