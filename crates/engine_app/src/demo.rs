//! Demo simulation: particles that drift, age, and expire.
//!
//! Uses the typed component layer on top of the world's string-keyed store.

use anyhow::Result;
use engine_component::{Component, EntityId};
use engine_world::{World, system_fn};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Component for Position {
    fn type_name() -> &'static str {
        "Position"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

impl Component for Velocity {
    fn type_name() -> &'static str {
        "Velocity"
    }
}

/// Seconds left before the entity is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lifetime {
    pub remaining: f64,
}

impl Component for Lifetime {
    fn type_name() -> &'static str {
        "Lifetime"
    }
}

/// Spawn `count` particles with spread-out velocities and lifetimes.
pub fn populate(world: &mut World, count: usize) -> Result<Vec<EntityId>> {
    let mut spawned = Vec::with_capacity(count);
    for i in 0..count {
        let e = world.create_entity(&[]);
        let angle = i as f64 * 0.618_033_988_75 * std::f64::consts::TAU;
        world.insert_typed(e, &Position { x: 0.0, y: 0.0 })?;
        world.insert_typed(
            e,
            &Velocity {
                x: angle.cos(),
                y: angle.sin(),
            },
        )?;
        world.insert_typed(
            e,
            &Lifetime {
                remaining: 1.0 + (i % 10) as f64 * 0.5,
            },
        )?;
        spawned.push(e);
    }
    info!(count, "particles spawned");
    Ok(spawned)
}

/// Register the demo systems in the order they must run.
pub fn install(world: &mut World) {
    world.add_system(system_fn("movement", movement), Some(0));
    world.add_system(system_fn("aging", aging), Some(10));
    world.add_system(system_fn("census", census()), Some(100));
}

fn movement(world: &mut World, dt: f64) -> Result<()> {
    let moving = world.query(&[Position::type_name(), Velocity::type_name()]);
    for e in moving.iter().copied() {
        let pos = world.get_typed::<Position>(e)?;
        let vel = world.get_typed::<Velocity>(e)?;
        let (Some(pos), Some(vel)) = (pos, vel) else {
            continue;
        };
        world.update_typed(
            e,
            &Position {
                x: pos.x + vel.x * dt,
                y: pos.y + vel.y * dt,
            },
        )?;
    }
    Ok(())
}

fn aging(world: &mut World, dt: f64) -> Result<()> {
    let aging = world.query(&[Lifetime::type_name()]);
    for e in aging.iter().copied() {
        let Some(life) = world.get_typed::<Lifetime>(e)? else {
            continue;
        };
        let remaining = life.remaining - dt;
        if remaining <= 0.0 {
            world.destroy_entity(e)?;
            debug!(entity = %e, "particle expired");
        } else {
            world.update_typed(e, &Lifetime { remaining })?;
        }
    }
    Ok(())
}

/// Log world stats once per simulated second.
fn census() -> impl FnMut(&mut World, f64) -> Result<()> {
    let mut elapsed = 0.0;
    move |world: &mut World, dt: f64| {
        elapsed += dt;
        if elapsed >= 1.0 {
            elapsed -= 1.0;
            let stats = world.stats();
            info!(
                frame = world.frame(),
                entities = stats.entities,
                components = stats.components,
                cached_queries = stats.cached_queries,
                cache_hits = stats.cache_hits,
                "census"
            );
        }
        Ok(())
    }
}
