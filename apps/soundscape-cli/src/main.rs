use std::path::PathBuf;

use clap::{Parser, Subcommand};
use soundscape_audio::{NullAudioEngine, RecordingAudioEngine};
use soundscape_common::{
    EffectShape, EffectType, GridCoord, GridId, MovementType, SoundObjectType, Vec3,
};
use soundscape_engine::{EngineConfig, WorldEngine};
use soundscape_persist::{FileStateSource, PersistOutcome};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "soundscape", about = "CLI for the soundscape world engine")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Engine config file (.yaml, .yml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and effective settings
    Info,
    /// Run the reference scenarios against a recording audio engine
    Demo,
    /// Print the trajectory of one mobile object
    Simulate {
        /// Movement pattern
        #[arg(short, long, default_value = "circular")]
        movement: MovementType,
        /// Number of frames to simulate
        #[arg(short, long, default_value = "10")]
        frames: usize,
        /// Seconds per frame
        #[arg(long, default_value = "0.1")]
        dt: f32,
    },
    /// Create a world and print its export document
    ExportWorld {
        #[arg(short, long)]
        name: String,
    },
    /// Import a global state snapshot (JSON) and print the resulting stats
    LoadGlobal {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Print the effective config as YAML
    Config,
}

fn check(label: &str, ok: bool) {
    println!("  {label}: {}", if ok { "OK" } else { "FAILED" });
}

fn run_demo(config: EngineConfig) {
    let recorder = RecordingAudioEngine::new();
    let mut engine = WorldEngine::new(config, Box::new(recorder.clone()));
    let grid_size = engine.config().grid_size;

    println!("Scenario A: add cube at origin");
    let cube = engine.add_object(SoundObjectType::Cube, Vec3::ZERO);
    if let Some(object) = engine.find_object_by_id(cube) {
        check(
            "frequency 220, volume 0.6, continuous off",
            object.audio_params.number("frequency") == Some(220.0)
                && object.audio_params.number("volume") == Some(0.6)
                && !object.audio_enabled,
        );
    }

    println!("Scenario B: load origin twice");
    let before = engine.grid_store().len();
    engine.load_grid(GridCoord::ORIGIN);
    engine.load_grid(GridCoord::ORIGIN);
    check("chunk count unchanged", engine.grid_store().len() == before);

    println!("Scenario C: move to unloaded chunk 1,0,0");
    let target = GridCoord::new(1, 0, 0);
    engine.move_to_grid(target);
    let position = engine
        .grid_store()
        .get(GridId::Chunk(target))
        .map(|g| g.transform.position);
    check(
        "chunk created at grid size and current",
        position == Some(Vec3::new(grid_size, 0.0, 0.0))
            && engine.current_grid_coordinates() == target,
    );

    println!("Scenario D: create grid at 40,0,0 size 20");
    let custom = engine.create_grid(Vec3::new(40.0, 0.0, 0.0), 20.0);
    let coords = custom.and_then(|id| engine.grid_store().get(id).map(|g| g.coordinates));
    check("coordinates 2,0,0", coords == Some(GridCoord::new(2, 0, 0)));

    println!("Scenario E: select A then B");
    let a = engine.add_object(SoundObjectType::Sphere, Vec3::new(3.0, 0.0, 0.0));
    let b = engine.add_object(SoundObjectType::Torus, Vec3::new(-3.0, 0.0, 0.0));
    engine.select_entity(Some(a));
    engine.select_entity(Some(b));
    let a_selected = engine.find_object_by_id(a).is_some_and(|o| o.is_selected);
    let b_selected = engine.find_object_by_id(b).is_some_and(|o| o.is_selected);
    check(
        "only B selected",
        !a_selected && b_selected && engine.selected_entity_id() == Some(b),
    );

    println!("Mobile pass: circular orbit near the sphere");
    engine.add_mobile_object(Vec3::new(3.0, 0.0, 0.0), MovementType::Circular);
    engine.add_effect_zone(EffectType::Reverb, Vec3::ZERO, EffectShape::Sphere);
    let triggered: usize = (0..60).map(|_| engine.tick(0.1).triggered.len()).sum();
    println!("  proximity triggers: {triggered}");

    let (loaded, unloaded) = engine.stream_around_current();
    println!("  stream pass: {loaded} loaded, {unloaded} unloaded");

    println!("\n{}", engine.get_system_stats());
    println!("audio commands recorded: {}", recorder.received().len());
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::default(),
    };
    tracing::debug!(?config, "effective config");

    match cli.command {
        Commands::Info => {
            println!("soundscape v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "grid size {}, render distance {}",
                config.grid_size, config.render_distance
            );
            println!(
                "object types: {}",
                SoundObjectType::ALL
                    .iter()
                    .map(|t| format!("{t} ({})", t.synth_archetype()))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!("effect types: {}", EffectType::ALL.len());
            println!(
                "movement types: {}",
                MovementType::ALL
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Commands::Demo => run_demo(config),
        Commands::Simulate {
            movement,
            frames,
            dt,
        } => {
            let mut engine = WorldEngine::new(config, Box::new(NullAudioEngine));
            let id = engine.add_mobile_object(Vec3::ZERO, movement);
            println!("Simulating {movement} for {frames} frames at dt={dt}s");
            for frame in 0..frames {
                engine.tick(dt);
                if let Some(mobile) = engine.find_mobile_object_by_id(id) {
                    let p = mobile.transform.position;
                    println!(
                        "{frame:>5} t={:>8.3} [{:>8.3}, {:>8.3}, {:>8.3}]",
                        engine.sim_time().seconds(),
                        p.x,
                        p.y,
                        p.z
                    );
                }
            }
        }
        Commands::ExportWorld { name } => {
            let mut engine = WorldEngine::new(config, Box::new(NullAudioEngine));
            let id = engine
                .create_world(&name)
                .ok_or_else(|| anyhow::anyhow!("could not create world {name:?}"))?;
            let doc = engine
                .export_world(&id)
                .ok_or_else(|| anyhow::anyhow!("could not export world {id}"))?;
            println!("{doc}");
        }
        Commands::LoadGlobal { file } => {
            let mut engine = WorldEngine::new(config, Box::new(NullAudioEngine));
            let mut source = FileStateSource::new(file);
            match engine.load_global_state(&mut source) {
                PersistOutcome::Success(added) => {
                    let stats = engine.get_system_stats();
                    println!(
                        "imported {added} entities from {} ({} in engine)",
                        source.path().display(),
                        stats.total_entities()
                    );
                    println!("\n{stats}");
                }
                PersistOutcome::RetryableError(e) => {
                    anyhow::bail!("global state temporarily unavailable, try again: {e}")
                }
                PersistOutcome::FatalError(e) => anyhow::bail!("global state unusable: {e}"),
            }
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}
