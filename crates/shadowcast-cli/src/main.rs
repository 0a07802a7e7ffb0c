//! shadowcast CLI - visibility queries against a JSON world
//!
//! Loads a world, builds the trace engine and runs one query per
//! invocation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use shadowcast_math::{Point3, Vec3};
use shadowcast_trace::{HitType, TraceEngine, TraceSettings};
use shadowcast_world::{ModelId, World, WorldTextureSampler};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "shadowcast")]
#[command(about = "Visibility and shadow queries over a static polygon world", long_about = None)]
struct Cli {
    /// TOML file with trace settings
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display occlusion class sizes and models of a world
    Info {
        /// Path to the world JSON file
        world: PathBuf,
    },
    /// Test whether one point is visible from another
    Light {
        /// Path to the world JSON file
        world: PathBuf,
        /// Sample point, as x,y,z
        #[arg(long, value_parser = parse_vec3)]
        from: Vec3,
        /// Light position, as x,y,z
        #[arg(long, value_parser = parse_vec3)]
        to: Vec3,
        /// Model casting the light
        #[arg(long)]
        source: Option<ModelId>,
    },
    /// Test whether a direction reaches the sky
    Sky {
        /// Path to the world JSON file
        world: PathBuf,
        /// Sample point, as x,y,z
        #[arg(long, value_parser = parse_vec3)]
        from: Vec3,
        /// Direction toward the sun, as x,y,z
        #[arg(long, value_parser = parse_vec3)]
        dir: Vec3,
        /// Model casting the light
        #[arg(long)]
        source: Option<ModelId>,
    },
    /// Find the nearest surface along a direction
    Dirt {
        /// Path to the world JSON file
        world: PathBuf,
        /// Ray origin, as x,y,z
        #[arg(long, value_parser = parse_vec3)]
        from: Vec3,
        /// Ray direction, as x,y,z
        #[arg(long, value_parser = parse_vec3)]
        dir: Vec3,
        /// Maximum distance
        #[arg(long, default_value_t = 128.0)]
        dist: f64,
        /// Model casting the ray
        #[arg(long)]
        source: Option<ModelId>,
    },
    /// Cast rays in all directions and summarize what they hit
    Sweep {
        /// Path to the world JSON file
        world: PathBuf,
        /// Ray origin, as x,y,z
        #[arg(long, value_parser = parse_vec3)]
        from: Vec3,
        /// Number of directions
        #[arg(long, default_value_t = 1024)]
        samples: usize,
        /// Maximum distance per ray
        #[arg(long, default_value_t = 128.0)]
        dist: f64,
        /// Model casting the rays
        #[arg(long)]
        source: Option<ModelId>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .ok();

    let cli = Cli::parse();
    let settings = match &cli.settings {
        Some(path) => TraceSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => TraceSettings::default(),
    };

    match cli.command {
        Commands::Info { world } => show_info(&world, settings),
        Commands::Light {
            world,
            from,
            to,
            source,
        } => {
            let engine = load_engine(&world, settings, source)?;
            let result = engine.test_light(&Point3::from(from), &Point3::from(to), source);
            println!("visible: {}", result.visible);
            if result.visible && result.dynamic_style != 0 {
                println!("dynamic style: {}", result.dynamic_style);
            }
            Ok(())
        }
        Commands::Sky {
            world,
            from,
            dir,
            source,
        } => {
            let engine = load_engine(&world, settings, source)?;
            let result = engine.test_sky(&Point3::from(from), &dir, source);
            println!("hit sky: {}", result.hit_sky);
            if let Some(face) = result.face {
                println!("sky face: {}", face);
            }
            if result.dynamic_style != 0 {
                println!("dynamic style: {}", result.dynamic_style);
            }
            Ok(())
        }
        Commands::Dirt {
            world,
            from,
            dir,
            dist,
            source,
        } => {
            let engine = load_engine(&world, settings, source)?;
            let result = engine.dirt_trace(&Point3::from(from), &dir, dist, source);
            match result.hit {
                None => println!("no hit within {}", dist),
                Some(hit) => {
                    println!("hit: {:?}", result.hit_type);
                    println!("  Distance: {:.3}", hit.distance);
                    println!(
                        "  Plane: ({:.3}, {:.3}, {:.3}) {:.3}",
                        hit.plane.normal.x, hit.plane.normal.y, hit.plane.normal.z, hit.plane.dist
                    );
                    match hit.face {
                        Some(face) => println!("  Face: {}", face),
                        None => println!("  Face: none (brush volume)"),
                    }
                }
            }
            Ok(())
        }
        Commands::Sweep {
            world,
            from,
            samples,
            dist,
            source,
        } => {
            let engine = load_engine(&world, settings, source)?;
            sweep(&engine, &Point3::from(from), samples, dist, source);
            Ok(())
        }
    }
}

fn load_world(path: &Path) -> Result<World> {
    World::load(path).with_context(|| format!("loading world from {}", path.display()))
}

fn load_engine(path: &Path, settings: TraceSettings, source: Option<ModelId>) -> Result<TraceEngine> {
    let world = load_world(path)?;
    if let Some(model) = source {
        if model >= world.models.len() {
            anyhow::bail!(
                "source model {} does not exist ({} models)",
                model,
                world.models.len()
            );
        }
    }
    Ok(TraceEngine::initialize(
        world,
        Box::new(WorldTextureSampler),
        settings,
    )?)
}

fn show_info(path: &Path, settings: TraceSettings) -> Result<()> {
    let engine = load_engine(path, settings, None)?;
    let world = engine.world();
    let stats = engine.stats();

    println!("shadowcast world: {}", path.display());
    println!("  Format: {:?}", world.format);
    let unowned = world.face_owners().iter().filter(|o| o.is_none()).count();
    if unowned > 0 {
        println!("  Faces: {} ({} outside every model, never traced)", world.faces.len(), unowned);
    } else {
        println!("  Faces: {}", world.faces.len());
    }
    println!("  Textures: {}", world.textures.len());
    println!("  Models: {}", world.models.len());

    println!("\nOcclusion classes:");
    println!("  Sky: {} faces, {} triangles", stats.sizes.sky, stats.sky_triangles);
    println!(
        "  Solid: {} faces, {} triangles",
        stats.sizes.solid, stats.solid_triangles
    );
    println!(
        "  Filtered: {} faces, {} triangles",
        stats.sizes.filtered, stats.filtered_triangles
    );
    println!(
        "  Skip: {} windings, {} triangles",
        stats.sizes.skip, stats.skip_triangles
    );

    if !world.models.is_empty() {
        println!("\nModels:");
        for (i, model) in world.models.iter().enumerate() {
            let info = &model.info;
            let mut policy = Vec::new();
            if info.is_world {
                policy.push("world".to_string());
            }
            if info.shadow {
                policy.push("shadow".to_string());
            }
            if info.shadow_self {
                policy.push("shadow_self".to_string());
            }
            if info.shadow_world_only {
                policy.push("shadow_world_only".to_string());
            }
            if info.switchable_shadow {
                policy.push(format!("switchable({})", info.switch_shadow_style));
            }
            if info.alpha < 1.0 {
                policy.push(format!("alpha {:.2}", info.alpha));
            }
            let policy = if policy.is_empty() {
                "no shadow".to_string()
            } else {
                policy.join(", ")
            };
            println!("  {}: {} faces ({})", i, model.num_faces, policy);
        }
    }

    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
struct SweepTotals {
    none: usize,
    sky: usize,
    solid: usize,
    solid_dist: f64,
}

impl SweepTotals {
    fn merge(self, other: Self) -> Self {
        Self {
            none: self.none + other.none,
            sky: self.sky + other.sky,
            solid: self.solid + other.solid,
            solid_dist: self.solid_dist + other.solid_dist,
        }
    }
}

fn sweep(engine: &TraceEngine, origin: &Point3, samples: usize, dist: f64, source: Option<ModelId>) {
    let directions = fibonacci_sphere(samples);
    let chunk = engine.settings().batch_capacity;

    let totals = directions
        .par_chunks(chunk)
        .map(|dirs| {
            let mut batch = engine.ray_batch();
            for (i, dir) in dirs.iter().enumerate() {
                batch.push(i, origin, dir, dist, None, None);
            }
            batch.trace_intersection(engine, source);

            let mut totals = SweepTotals::default();
            for slot in 0..batch.len() {
                match batch.hit_type(slot) {
                    HitType::None => totals.none += 1,
                    HitType::Sky => totals.sky += 1,
                    HitType::Solid => {
                        totals.solid += 1;
                        totals.solid_dist += batch.hit_dist(slot);
                    }
                }
            }
            totals
        })
        .reduce(SweepTotals::default, SweepTotals::merge);

    let pct = |n: usize| 100.0 * n as f64 / samples.max(1) as f64;
    println!("sweep: {} rays from ({}, {}, {})", samples, origin.x, origin.y, origin.z);
    println!("  Sky: {} ({:.1}%)", totals.sky, pct(totals.sky));
    println!("  Solid: {} ({:.1}%)", totals.solid, pct(totals.solid));
    println!("  Open: {} ({:.1}%)", totals.none, pct(totals.none));
    if totals.solid > 0 {
        println!(
            "  Mean solid distance: {:.3}",
            totals.solid_dist / totals.solid as f64
        );
    }
}

/// Evenly spread unit directions.
fn fibonacci_sphere(n: usize) -> Vec<Vec3> {
    let golden = std::f64::consts::PI * (3.0 - 5f64.sqrt());
    (0..n)
        .map(|i| {
            let z = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
            let r = (1.0 - z * z).sqrt();
            let theta = golden * i as f64;
            Vec3::new(r * theta.cos(), r * theta.sin(), z)
        })
        .collect()
}

fn parse_vec3(s: &str) -> std::result::Result<Vec3, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z but got '{}'", s));
    }
    let mut v = [0.0; 3];
    for (slot, part) in v.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|e| format!("bad component '{}': {}", part, e))?;
    }
    Ok(Vec3::new(v[0], v[1], v[2]))
}
