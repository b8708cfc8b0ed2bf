use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use neoleon_assets::GltfLoader;
use neoleon_common::SceneConfig;
use neoleon_material::{GridMaterial, MaterialAdapter, ripple_color, ripple_height, ripple_opacity};
use neoleon_render::{RenderView, Renderer, SummaryRenderer};
use neoleon_scene::{CityLayout, Scene};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "neoleon-cli", about = "Headless tool for the neoleon scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene configuration file (YAML); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Validate a configuration and print the effective values as YAML
    CheckConfig,
    /// Generate a city layout and print it as JSON
    Layout {
        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
    /// Evaluate the CPU reference of a shader at a given time
    Sample {
        #[arg(value_enum)]
        shader: SampleShader,
        /// Material time in seconds
        #[arg(short, long, default_value = "0")]
        time: f32,
    },
    /// Build the scene, run some frames, and print a text summary
    Describe {
        /// glTF model holding the terrain node
        #[arg(short, long)]
        model: Option<PathBuf>,
        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Frames to simulate
        #[arg(short, long, default_value = "0")]
        frames: u32,
        /// Seconds per frame
        #[arg(long, default_value = "0.016")]
        dt: f32,
        /// List every city block
        #[arg(long)]
        blocks: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SampleShader {
    Grid,
    Ground,
}

#[derive(Serialize)]
struct GridSample {
    z: f32,
    moveable: f32,
    fixed: f32,
}

#[derive(Serialize)]
struct GroundSample {
    x: f32,
    y: f32,
    height: f32,
    opacity: f32,
    color: [f32; 3],
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info => {
            println!("neoleon-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", neoleon_assets::crate_info());
            println!("render: {}", neoleon_render::crate_info());
            println!(
                "scene: boundary={} blocks/side={}",
                config.boundary,
                neoleon_scene::BUILDINGS_PER_SIDE
            );
        }
        Commands::CheckConfig => {
            config.validate()?;
            print!("{}", config.to_yaml_string()?);
            tracing::info!("configuration is valid");
        }
        Commands::Layout { seed } => {
            let mut rng = StdRng::seed_from_u64(seed);
            let layout = CityLayout::generate(&mut rng, config.boundary)?;
            println!("{}", serde_json::to_string_pretty(&layout)?);
        }
        Commands::Sample { shader, time } => match shader {
            SampleShader::Grid => {
                let mut grid =
                    GridMaterial::new(-config.boundary, config.boundary, config.grid.speed)?;
                grid.set_time(time);
                let step = 2.0 * config.boundary / 8.0;
                let samples: Vec<GridSample> = (0..=8)
                    .map(|i| {
                        let z = -config.boundary + i as f32 * step;
                        GridSample {
                            z,
                            moveable: grid.vertex_z(z, true),
                            fixed: grid.vertex_z(z, false),
                        }
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&samples)?);
            }
            SampleShader::Ground => {
                let half = config.ground.size / 2.0;
                let samples: Vec<GroundSample> = [0.0, 0.25, 0.5, 0.75, 1.0]
                    .iter()
                    .map(|f| {
                        let (x, y) = (f * half, f * half * 0.5);
                        let color = ripple_color(glam::Vec3::new(x, y, 0.0), time);
                        GroundSample {
                            x,
                            y,
                            height: ripple_height(x, y, time),
                            opacity: ripple_opacity(glam::Vec2::new(x, y), time),
                            color: color.to_array(),
                        }
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&samples)?);
            }
        },
        Commands::Describe {
            model,
            seed,
            frames,
            dt,
            blocks,
        } => {
            let nodes = model
                .as_deref()
                .map(|path| GltfLoader::load_path(path))
                .transpose()
                .context("loading terrain model")?;
            let view = RenderView::from(&config.camera);
            let mut rng = StdRng::seed_from_u64(seed);
            let mut scene = Scene::build(config, &mut rng, nodes.as_ref())?;
            for _ in 0..frames {
                scene.tick(dt);
            }
            let renderer = if blocks {
                SummaryRenderer::new().with_blocks()
            } else {
                SummaryRenderer::new()
            };
            print!("{}", renderer.render(&scene, &view));
        }
    }

    Ok(())
}
