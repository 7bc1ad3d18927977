//! Navigation Sandbox
//!
//! A headless sandbox that exercises the navigation core: one agent
//! patrols a waypoint graph over undulating terrain, hunts down randomly
//! placed targets, and detours back onto its route after each tag.

use bevy_ecs::prelude::*;
use clap::Parser;
use nav_core::{GridPos, Navigator, Path, PathMode};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

mod agent;
mod config;
mod systems;
mod terrain;
mod world;

use agent::{AgentPose, Locomotion, NavControl};
use config::Config;
use systems::{
    detect_targets, drive_agents, report_status, NavGraphRes, SimState, Targets, TerrainRes,
    Tuning,
};
use terrain::{build_obstacles, Terrain};
use world::{build_nav_graph, place_targets};

/// Command line arguments for the sandbox
#[derive(Parser, Debug)]
#[command(name = "nav_sandbox")]
#[command(about = "A headless navigation sandbox")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 5000)]
    ticks: u64,

    /// Interval between navigator status reports (in ticks)
    #[arg(long, default_value_t = 100)]
    report_interval: u64,

    /// Path to the tuning file
    #[arg(long, default_value_t = config::DEFAULT_TUNING_PATH.to_string())]
    config: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    println!("Navigation Sandbox");
    println!("==================");
    println!("Seed: {}", args.seed);
    println!("Ticks: {}", args.ticks);
    println!();

    // A missing default tuning file falls back to built-in values; an
    // explicitly named file must exist.
    let config = if args.config == config::DEFAULT_TUNING_PATH {
        Config::load_or_default()
    } else {
        Config::load(&args.config)?
    };

    // Build the static world.
    println!("Building world...");
    let terrain = Terrain::new(&config);
    let obstacles = build_obstacles(&config.world.obstacles, &terrain);
    let graph = build_nav_graph(&config, &terrain, &obstacles);
    println!("  {} waypoints, {} obstacles", graph.len(), obstacles.len());

    let mut rng = SmallRng::seed_from_u64(args.seed);
    let targets = place_targets(&graph, &mut rng, config.targets.count);
    println!("  Placed {} targets", targets.len());

    // The patrol route and the navigator that walks it.
    let route: Vec<(i32, i32)> = config.agent.route.iter().map(|&[x, z]| (x, z)).collect();
    let fixed_path = Path::from_grid_route(&graph, &route, PathMode::Loop)?;
    let navigator = Navigator::new(fixed_path, config.snap_radius(), config.targets.tag_radius)?;
    let start = terrain.world_pos(GridPos::new(route[0].0, route[0].1));

    // Initialize the ECS world.
    let mut world = World::new();
    world.insert_resource(SimState {
        current_tick: 0,
        max_ticks: args.ticks,
        report_interval: args.report_interval,
    });
    world.insert_resource(NavGraphRes(graph));
    world.insert_resource(TerrainRes(terrain));
    world.insert_resource(Targets(targets));

    world.spawn((
        AgentPose::new(start),
        Locomotion {
            step: config.agent.step,
            step_size: config.agent.step_size,
            turn_rate: config.agent.turn_rate,
        },
        NavControl { navigator },
    ));
    world.insert_resource(Tuning(config));

    let mut schedule = Schedule::default();
    schedule.add_systems((detect_targets, drive_agents, report_status).chain());

    println!();
    println!("Starting simulation...");
    println!();

    for tick in 0..args.ticks {
        world.resource_mut::<SimState>().current_tick = tick;
        schedule.run(&mut world);

        if tick > 0 && tick % 1000 == 0 {
            println!("Tick {} / {}", tick, args.ticks);
        }
    }

    println!();
    let found = world
        .resource::<Targets>()
        .0
        .iter()
        .filter(|t| t.found)
        .count();
    let total = world.resource::<Targets>().0.len();
    let mut query = world.query::<&NavControl>();
    let control = query.single(&world);
    println!(
        "Simulation complete. Ran {} ticks, tagged {} of {} targets, ending {:?}.",
        args.ticks,
        found,
        total,
        control.navigator.mode()
    );
    Ok(())
}
