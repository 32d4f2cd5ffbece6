//! Fixed-timestep driving loop.
//!
//! The world itself has no notion of time passing; this loop calls
//! [`World::update`] once per tick with a constant `dt` and sleeps off the
//! rest of the tick budget.

use std::time::{Duration, Instant};

use engine_world::World;
use tracing::{debug, info, warn};

/// Configuration for the tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

/// Owns the world and advances it at a fixed rate.
#[derive(Debug)]
pub struct TickLoop {
    /// Number of ticks run so far.
    tick_id: u64,
    config: TickConfig,
    world: World,
}

impl TickLoop {
    #[must_use]
    pub fn new(config: TickConfig, world: World) -> Self {
        Self {
            tick_id: 0,
            config,
            world,
        }
    }

    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Fixed step derived from the tick rate, in seconds.
    #[must_use]
    pub fn dt(&self) -> f64 {
        1.0 / self.config.tick_rate
    }

    /// Advance the world by `dt` and return how long the frame took.
    pub fn tick(&mut self, dt: f64) -> Duration {
        let started = Instant::now();
        self.tick_id += 1;
        self.world.update(dt);
        let took = started.elapsed();
        debug!(
            tick_id = self.tick_id,
            entities = self.world.entity_count(),
            took_us = took.as_micros() as u64,
            "tick"
        );
        took
    }

    /// `true` once `max_ticks` ticks have run. Never, when `max_ticks` is 0.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.config.max_ticks != 0 && self.tick_id >= self.config.max_ticks
    }

    /// Tick until [`finished`](Self::finished), pacing frames to the tick
    /// rate. A frame that overruns its budget is logged and the next one
    /// starts immediately.
    pub fn run(&mut self) {
        let budget = Duration::from_secs_f64(self.dt());
        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            "tick loop running"
        );

        while !self.finished() {
            let took = self.tick(budget.as_secs_f64());
            match budget.checked_sub(took) {
                Some(slack) if !self.finished() => std::thread::sleep(slack),
                Some(_) => {}
                None => warn!(
                    tick_id = self.tick_id,
                    overrun_us = (took - budget).as_micros() as u64,
                    "frame overran its budget"
                ),
            }
        }
        info!(ticks = self.tick_id, frame = self.world.frame(), "tick loop finished");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_tick_advances_counter_and_world() {
        let mut tick_loop = TickLoop::new(TickConfig::default(), World::new());
        tick_loop.tick(1.0 / 60.0);
        tick_loop.tick(1.0 / 60.0);
        assert_eq!(tick_loop.tick_id(), 2);
        assert_eq!(tick_loop.world().frame(), 2);
    }

    #[test]
    fn test_run_limited_ticks_passes_fixed_dt() {
        let config = TickConfig {
            tick_rate: 1000.0, // fast for testing
            max_ticks: 5,
        };
        let mut tick_loop = TickLoop::new(config, World::new());
        let total = Rc::new(Cell::new(0.0));
        let total_in = Rc::clone(&total);
        tick_loop.world_mut().add_system_fn("clock", move |_, dt| {
            total_in.set(total_in.get() + dt);
            Ok(())
        });

        tick_loop.run();
        assert_eq!(tick_loop.tick_id(), 5);
        assert!(tick_loop.finished());
        assert!((total.get() - 0.005).abs() < 1e-9);
    }

    #[test]
    fn test_unlimited_loop_is_never_finished() {
        let mut tick_loop = TickLoop::new(TickConfig::default(), World::new());
        for _ in 0..3 {
            tick_loop.tick(tick_loop.dt());
        }
        assert!(!tick_loop.finished());
    }
}
