//! # engine_app — demo driver
//!
//! Builds a [`World`], fills it with demo particles, installs the demo
//! systems, and runs the fixed-timestep tick loop.

mod demo;
mod tick;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine_world::{InvalidationPolicy, World, WorldConfig};
use tick::{TickConfig, TickLoop};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Invalidation {
    Global,
    PerType,
}

impl From<Invalidation> for InvalidationPolicy {
    fn from(value: Invalidation) -> Self {
        match value {
            Invalidation::Global => InvalidationPolicy::Global,
            Invalidation::PerType => InvalidationPolicy::PerType,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "engine_app", about = "Run the demo simulation on the ECS world")]
struct Args {
    /// Target ticks per second
    #[arg(long, default_value_t = 60.0)]
    tick_rate: f64,

    /// Stop after this many ticks (0 = run forever)
    #[arg(long, default_value_t = 600)]
    max_ticks: u64,

    /// Number of particles to spawn
    #[arg(long, default_value_t = 100)]
    entities: usize,

    /// Query cache eviction strategy
    #[arg(long, value_enum, default_value_t = Invalidation::PerType)]
    invalidation: Invalidation,

    /// Recompute every query instead of caching results
    #[arg(long)]
    no_cache: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("engine_app=info".parse()?))
        .init();

    let args = Args::parse();
    anyhow::ensure!(args.tick_rate > 0.0, "--tick-rate must be positive");

    let config = WorldConfig::new()
        .with_cache_queries(!args.no_cache)
        .with_invalidation(args.invalidation.into());
    info!(?config, "engine starting");

    let mut tick_loop = TickLoop::new(
        TickConfig {
            tick_rate: args.tick_rate,
            max_ticks: args.max_ticks,
        },
        World::with_config(config),
    );
    demo::populate(tick_loop.world_mut(), args.entities)?;
    demo::install(tick_loop.world_mut());
    tick_loop.run();

    let stats = tick_loop.world().stats();
    info!(
        ticks = tick_loop.tick_id(),
        stats = %serde_json::to_string(&stats)?,
        "engine shut down"
    );
    Ok(())
}
