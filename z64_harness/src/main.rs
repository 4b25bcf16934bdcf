//! Headless demo host for the z64 actor runtime.
//!
//! Registers the demo categories, loads a pair of fake object banks, steps
//! the update/draw loop for a fixed number of frames against a recording
//! backend, and optionally dumps per-frame records and a final stats
//! snapshot as JSON.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use z64_formats::segment::{RamAddr, Segment};
use z64_runtime::{
    ActorCategory, Pose, RecordingBackend, Registry, ResourceLoader, Vec3f, World,
};

mod actors;

use actors::{BOUNCER_ID, GULL_ID, GULL_OBJECT, KEEP_OBJECT};

#[derive(Parser, Debug)]
#[command(about = "Headless host that steps the actor runtime demo scene", version)]
struct Args {
    /// Number of frames to simulate
    #[arg(long, default_value_t = 120)]
    frames: u32,

    /// Seed for spawn-parameter randomness
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Number of gulls to spawn
    #[arg(long, default_value_t = 3)]
    gulls: u32,

    /// Path to write per-frame records as JSON
    #[arg(long)]
    event_log_json: Option<PathBuf>,

    /// Path to write the final stats snapshot as JSON
    #[arg(long)]
    stats_json: Option<PathBuf>,

    /// Print a line per simulated frame
    #[arg(long)]
    verbose: bool,
}

#[derive(Serialize)]
struct FrameRecord {
    frame: u32,
    live_actors: usize,
    draw_commands: usize,
}

#[derive(Serialize)]
struct StatsReport {
    frames: u32,
    live_actors: usize,
    npc_count: usize,
    misc_count: usize,
    total_draw_commands: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    run(args)
}

fn run(args: Args) -> Result<()> {
    let mut registry = Registry::with_capacity(64);
    actors::register_all(&mut registry).context("registering demo categories")?;

    let mut loader = ResourceLoader::new();
    loader
        .set_base(Segment::Scene, RamAddr(0x8020_0000))
        .context("assigning scene bank")?;
    loader
        .set_base(Segment::GlobalKeep, RamAddr(0x8011_0000))
        .context("assigning keep bank")?;
    loader.load_object(GULL_OBJECT, RamAddr(0x8050_0000));
    loader.load_object(KEEP_OBJECT, RamAddr(0x8040_0000));

    let mut world = World::new();
    let mut rng = StdRng::seed_from_u64(args.seed);

    for _ in 0..args.gulls {
        let variable = actors::pack_gull_variable(
            rng.gen_range(0..16),
            rng.gen_range(0..16),
            rng.gen_bool(0.5),
            rng.gen_range(0..8),
        );
        let home = Pose::at(Vec3f::new(
            rng.gen_range(-500.0..500.0),
            rng.gen_range(40.0..120.0),
            rng.gen_range(-500.0..500.0),
        ));
        registry
            .spawn(&mut world, &mut loader, GULL_ID, home, variable)
            .context("spawning gull")?;
    }
    // The bouncer retires itself halfway through the run.
    registry
        .spawn(
            &mut world,
            &mut loader,
            BOUNCER_ID,
            Pose::default(),
            (args.frames / 2) as u16,
        )
        .context("spawning bouncer")?;

    eprintln!(
        "[z64_harness] spawned {} actors ({} gulls + shadows + bouncer)",
        registry.len(),
        args.gulls
    );

    let mut backend = RecordingBackend::new();
    let mut records: Vec<FrameRecord> = Vec::with_capacity(args.frames as usize);
    let mut total_draw_commands = 0usize;

    for _ in 0..args.frames {
        registry.update_all(&mut world, &mut loader);
        backend.clear();
        registry.draw_all(&world, &mut loader, &mut backend);
        total_draw_commands += backend.commands().len();
        if args.verbose {
            eprintln!(
                "[z64_harness] frame {:>4}: {} live, {} draw commands",
                world.frame,
                registry.len(),
                backend.commands().len()
            );
        }
        records.push(FrameRecord {
            frame: world.frame,
            live_actors: registry.len(),
            draw_commands: backend.commands().len(),
        });
    }

    let stats = StatsReport {
        frames: world.frame,
        live_actors: registry.len(),
        npc_count: registry.count(ActorCategory::Npc),
        misc_count: registry.count(ActorCategory::Misc),
        total_draw_commands,
    };
    println!(
        "Simulated {} frames: {} actors live, {} draw commands total",
        stats.frames, stats.live_actors, stats.total_draw_commands
    );

    if let Some(path) = args.event_log_json.as_ref() {
        let json = serde_json::to_string_pretty(&records).context("serializing frame records")?;
        fs::write(path, &json)
            .with_context(|| format!("writing frame records to {}", path.display()))?;
        println!("Saved frame records to {}", path.display());
    }
    if let Some(path) = args.stats_json.as_ref() {
        let json = serde_json::to_string_pretty(&stats).context("serializing stats snapshot")?;
        fs::write(path, &json)
            .with_context(|| format!("writing stats snapshot to {}", path.display()))?;
        println!("Saved stats snapshot to {}", path.display());
    }

    registry.teardown_all(&mut world);
    Ok(())
}
