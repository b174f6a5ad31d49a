use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand, ValueEnum};
use outline_core::config::{self, HighlightSettings};
use outline_core::mesh::primitives::{generate_cube, generate_uv_sphere};
use outline_core::mesh::{smooth, Mesh};
use outline_core::render::material::{Material, MaterialLibrary};
use outline_core::render::outline::{OutlineRenderer, WIDTH_PARAM};
use outline_core::scene::{MeshRenderer, ObjectId, RendererKind, Scene};
use outline_core::{HighlightManager, VERSION};

#[derive(Parser, Debug)]
#[command(name = "outline", version = VERSION, about = "Outline highlight tools")]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Shape {
    Sphere,
    Cube,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and print highlight settings from YAML
    Inspect { path: String },
    /// Report how many vertices the normal smoother welds on a primitive
    Smooth {
        #[arg(value_enum, default_value_t = Shape::Cube)]
        shape: Shape,
        #[arg(long, default_value_t = 16)]
        stacks: u32,
        #[arg(long, default_value_t = 32)]
        slices: u32,
    },
    /// Bake smoothed normals for the demo scene and print them as JSON
    Bake {
        #[arg(long)]
        pretty: bool,
    },
    /// Run the demo scene for a number of frames and log outline widths
    Simulate {
        #[arg(long, default_value_t = 240)]
        frames: u32,
        #[arg(long, default_value_t = 1.0 / 60.0)]
        dt: f32,
        /// Timed highlight on the second crate, in seconds
        #[arg(long, default_value_t = 2.0)]
        duration: f32,
        /// Highlight settings YAML
        #[arg(long)]
        settings: Option<String>,
        /// Directory of material template YAML files
        #[arg(long)]
        templates: Option<String>,
    },
}

fn primitive(shape: Shape, stacks: u32, slices: u32) -> Mesh {
    match shape {
        Shape::Sphere => generate_uv_sphere(1.0, stacks, slices),
        Shape::Cube => generate_cube(0.5, false),
    }
}

struct Demo {
    scene: Scene,
    root: ObjectId,
    crates: [ObjectId; 2],
}

// Two crates sharing one multi-material cube, plus a sphere under the first.
fn demo_scene() -> Demo {
    let mut scene = Scene::new();
    let cube = scene.add_mesh(generate_cube(0.5, true));
    let sphere = scene.add_mesh(generate_uv_sphere(0.25, 8, 16));
    let root = scene.spawn("demo");

    let mut crates = [root; 2];
    for (i, slot) in crates.iter_mut().enumerate() {
        let id = scene.spawn_child(root, format!("crate-{}", i));
        let mats = (0..6).map(|f| scene.materials.insert(Material::new(format!("crate-{}-face-{}", i, f), "Standard"))).collect();
        scene.set_renderer(id, MeshRenderer::new(RendererKind::Static, cube, mats));
        *slot = id;
    }
    let ball = scene.spawn_child(crates[0], "ball");
    let ball_mat = scene.materials.insert(Material::new("ball", "Standard"));
    scene.set_renderer(ball, MeshRenderer::new(RendererKind::Static, sphere, vec![ball_mat]));

    Demo { scene, root, crates }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    env_logger::Builder::new().filter_level(level).parse_default_env().init();

    match cli.cmd {
        Command::Inspect { path } => {
            let s = config::load_from_path(&path)?;
            println!("Loaded settings: {}", path);
            let c = s.default_color;
            println!("  color: ({:.3}, {:.3}, {:.3}, {:.3})", c.r, c.g, c.b, c.a);
            println!("  width: {:.2}, mode: {:?}", s.default_width, s.default_mode);
            println!("  blink: {} (speed={:.2}, {:.2}..{:.2})", s.default_blink, s.blink_speed, s.blink_min_width, s.blink_max_width);
            println!("  auto stop: {} ({:.2}s)", s.use_auto_stop, s.auto_stop_duration);
        }
        Command::Smooth { shape, stacks, slices } => {
            let mesh = primitive(shape, stacks, slices);
            let r = smooth::analyze(mesh.positions(), mesh.normals());
            println!("{:?}: {} vertices, {} unique positions", shape, r.vertices, r.unique_positions);
            println!("  shared positions: {}, degenerate groups: {}", r.shared_positions, r.degenerate_groups);
        }
        Command::Bake { pretty } => {
            let demo = demo_scene();
            let mut outline = OutlineRenderer::new(demo.root);
            outline.precompute_outline = true;
            outline.validate(&demo.scene);
            log::info!("baked {} meshes", outline.bake_store().len());
            let json = if pretty {
                serde_json::to_string_pretty(outline.bake_store())?
            } else {
                serde_json::to_string(outline.bake_store())?
            };
            println!("{}", json);
        }
        Command::Simulate { frames, dt, duration, settings, templates } => {
            let settings = match settings {
                Some(path) => config::load_from_path(path)?,
                None => HighlightSettings::default(),
            };
            let library = match templates {
                Some(dir) => MaterialLibrary::from_dir(dir)?,
                None => MaterialLibrary::with_outline_templates(),
            };
            let Demo { mut scene, crates, .. } = demo_scene();
            let mut manager = HighlightManager::new(settings, library);

            manager.highlight(&mut scene, crates[0]);
            manager.highlight_for(&mut scene, crates[1], duration);

            for frame in 0..frames {
                manager.tick(&mut scene, dt);
                if frame % 30 != 0 { continue; }
                let widths: Vec<String> = crates
                    .iter()
                    .map(|id| {
                        manager
                            .outline(*id)
                            .filter(|o| o.is_enabled())
                            .and_then(|o| o.fill_material())
                            .and_then(|m| scene.materials.get(m))
                            .and_then(|m| m.float(WIDTH_PARAM))
                            .map_or("off".to_owned(), |w| format!("{:.2}", w))
                    })
                    .collect();
                println!("t={:>6.2}s  active={}  widths=[{}]", manager.time(), manager.active_count(), widths.join(", "));
            }

            manager.clear_all_highlights(&mut scene);
            if manager.active_count() != 0 {
                return Err(anyhow!("highlights still active after clear"));
            }
            println!("mesh preparations: {} smoothing runs", manager.cache().smoothing_runs());
        }
    }
    Ok(())
}
