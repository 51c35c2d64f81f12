//! Fixed-timestep simulation driver.
//!
//! The [`Simulation`] owns the [`World`], the map source and the input
//! router, and runs the registered systems once per tick in registration
//! order. A system is scheduled either every tick or on an interval: interval
//! systems accumulate elapsed time and run once per whole period that has
//! passed, so the action queue steps at its own fixed rate whatever the main
//! tick rate is.
//!
//! The default schedule is:
//!
//! 1. `input`: resolve gestures (every tick);
//! 2. `actions`: step action queues (every `event_interval`);
//! 3. `map`: apply pending maps (every tick).
//!
//! # Example
//!
//! ```
//! use cassini_engine::prelude::*;
//!
//! let mut sim = Simulation::new(SimConfig::default(), InMemoryMapSource::new());
//! sim.run_ticks(10);
//! assert_eq!(sim.tick_count(), 10);
//! assert_eq!(sim.system_names(), vec!["input", "actions", "map"]);
//! ```

use std::time::{Duration, Instant};

use cassini_ecs::world::World;

use crate::config::SimConfig;
use crate::error::EngineResult;
use crate::events::run_action_system;
use crate::input::{run_input_system, InputRouter, InputSignal};
use crate::map::{run_map_system, MapSource};

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing diagnostics for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    /// Wall-clock time per system run, in order of execution. An interval
    /// system appears once per run, or not at all if it did not fire.
    pub system_times: Vec<(String, Duration)>,
    pub total_time: Duration,
    /// Systems that returned an error, with the error text.
    pub failures: Vec<(String, String)>,
}

// ---------------------------------------------------------------------------
// SystemFn
// ---------------------------------------------------------------------------

/// Everything a system may touch during one run.
pub struct SystemContext<'a> {
    pub world: &'a mut World,
    pub maps: &'a mut dyn MapSource,
    pub config: &'a SimConfig,
    /// Seconds covered by this run: the tick delta, or the period for
    /// interval systems.
    pub delta: f64,
}

pub type SystemFn = fn(&mut SystemContext<'_>) -> EngineResult<()>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Schedule {
    EveryTick,
    Interval { period: f64, accumulator: f64 },
}

struct RegisteredSystem {
    name: String,
    func: SystemFn,
    schedule: Schedule,
}

// ---------------------------------------------------------------------------
// Built-in systems
// ---------------------------------------------------------------------------

pub fn input_system(ctx: &mut SystemContext<'_>) -> EngineResult<()> {
    run_input_system(ctx.world, ctx.config, ctx.delta as f32);
    Ok(())
}

pub fn action_system(ctx: &mut SystemContext<'_>) -> EngineResult<()> {
    run_action_system(ctx.world)?;
    Ok(())
}

pub fn map_system(ctx: &mut SystemContext<'_>) -> EngineResult<()> {
    run_map_system(ctx.world, ctx.maps)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

pub struct Simulation<M: MapSource> {
    world: World,
    maps: M,
    config: SimConfig,
    router: InputRouter,
    systems: Vec<RegisteredSystem>,
    tick_counter: u64,
    last_diagnostics: TickDiagnostics,
}

impl<M: MapSource> Simulation<M> {
    /// A simulation over a fresh world seeded from `config.uuid_seed`, with
    /// the default systems registered.
    ///
    /// # Panics
    ///
    /// Panics if `fixed_dt` or `event_interval` is not positive and finite.
    pub fn new(config: SimConfig, maps: M) -> Self {
        let world = World::with_seed(config.uuid_seed);
        Self::with_world(world, config, maps)
    }

    /// Like [`new`](Self::new), over an existing world.
    pub fn with_world(mut world: World, config: SimConfig, maps: M) -> Self {
        assert!(
            config.fixed_dt > 0.0 && config.fixed_dt.is_finite(),
            "fixed_dt must be positive and finite, got {}",
            config.fixed_dt
        );
        assert!(
            config.event_interval > 0.0 && config.event_interval.is_finite(),
            "event_interval must be positive and finite, got {}",
            config.event_interval
        );
        world.set_screen_size(config.screen_width, config.screen_height);

        let mut sim = Self {
            world,
            maps,
            router: InputRouter::new(&config),
            systems: Vec::new(),
            tick_counter: 0,
            last_diagnostics: TickDiagnostics::default(),
            config,
        };
        sim.add_system("input", input_system);
        sim.add_interval_system("actions", sim.config.event_interval, action_system);
        sim.add_system("map", map_system);
        sim
    }

    /// Register a system that runs every tick, after those already registered.
    ///
    /// # Panics
    ///
    /// Panics if a system with the same name is already registered.
    pub fn add_system(&mut self, name: &str, func: SystemFn) {
        self.register(name, func, Schedule::EveryTick);
    }

    /// Register a system that runs once per elapsed `period` seconds.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate name or a period that is not positive and finite.
    pub fn add_interval_system(&mut self, name: &str, period: f64, func: SystemFn) {
        assert!(
            period > 0.0 && period.is_finite(),
            "interval of system {name:?} must be positive and finite, got {period}"
        );
        self.register(
            name,
            func,
            Schedule::Interval {
                period,
                accumulator: 0.0,
            },
        );
    }

    fn register(&mut self, name: &str, func: SystemFn, schedule: Schedule) {
        assert!(
            !self.systems.iter().any(|s| s.name == name),
            "duplicate system name: {name:?}"
        );
        self.systems.push(RegisteredSystem {
            name: name.to_owned(),
            func,
            schedule,
        });
    }

    /// Execute one tick of `fixed_dt` seconds.
    pub fn tick(&mut self) {
        self.tick_with_delta(self.config.fixed_dt);
    }

    /// Execute one tick covering `dt` seconds.
    ///
    /// Every-tick systems always run. Interval systems run once per whole
    /// period accumulated, so a zero `dt` fires none of them.
    pub fn tick_with_delta(&mut self, dt: f64) {
        let tick_start = Instant::now();
        let mut system_times = Vec::with_capacity(self.systems.len());
        let mut failures = Vec::new();

        for system in &mut self.systems {
            let (runs, delta) = match &mut system.schedule {
                Schedule::EveryTick => (1, dt),
                Schedule::Interval {
                    period,
                    accumulator,
                } => {
                    *accumulator += dt;
                    let mut runs = 0u32;
                    while *accumulator >= *period {
                        *accumulator -= *period;
                        runs += 1;
                    }
                    (runs, *period)
                }
            };

            for _ in 0..runs {
                let sys_start = Instant::now();
                let mut ctx = SystemContext {
                    world: &mut self.world,
                    maps: &mut self.maps,
                    config: &self.config,
                    delta,
                };
                if let Err(err) = (system.func)(&mut ctx) {
                    tracing::error!(system = %system.name, error = %err, "system failed");
                    failures.push((system.name.clone(), err.to_string()));
                }
                system_times.push((system.name.clone(), sys_start.elapsed()));
            }
        }

        self.tick_counter += 1;
        self.last_diagnostics = TickDiagnostics {
            system_times,
            total_time: tick_start.elapsed(),
            failures,
        };
    }

    pub fn run_ticks(&mut self, count: u64) {
        for _ in 0..count {
            self.tick();
        }
    }

    /// Hand an input signal to the router. Returns whether any agent took it.
    pub fn dispatch_input(&mut self, signal: InputSignal) -> bool {
        self.router.dispatch(&mut self.world, signal)
    }

    // -- accessors ----------------------------------------------------------

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for setup and tests.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn maps(&self) -> &M {
        &self.maps
    }

    pub fn maps_mut(&mut self) -> &mut M {
        &mut self.maps
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn router(&self) -> &InputRouter {
        &self.router
    }

    /// The names of all registered systems, in execution order.
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }

    /// Whether any agent is still waiting for its map to load.
    pub fn loading_required(&self) -> bool {
        crate::map::loading_required(&self.world)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
