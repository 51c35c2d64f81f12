//! Cassini Engine -- simulation driver for the rover world.
//!
//! This crate builds on [`cassini_ecs`] to provide the pieces that make the
//! world move: a fixed-timestep [`Simulation`](tick::Simulation) with an
//! interval sub-rate for action queues, the action-queue state machine, the
//! pointer/keyboard gesture system, map loading behind a
//! [`MapSource`](map::MapSource) seam, the entity factory and engine-level
//! persistence.
//!
//! # Quick Start
//!
//! ```
//! use cassini_engine::prelude::*;
//!
//! let mut maps = InMemoryMapSource::new();
//! maps.insert("maps/test.tmx", MapData::new(8, 6));
//!
//! let mut sim = Simulation::new(SimConfig::default(), maps);
//! let players = sim.new_game().unwrap();
//! assert_eq!(players.len(), 4);
//!
//! // The map loads on the first tick after it was requested.
//! sim.tick();
//! assert!(!sim.loading_required());
//! assert_eq!(sim.world().viewport_grid().capacity(), 4);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod events;
pub mod factory;
pub mod input;
pub mod map;
pub mod persistence;
pub mod tick;

/// Re-export the ECS crate for convenience.
pub use cassini_ecs;

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Meant for binaries and tests; the library itself never installs one.
/// Calling it again after a subscriber is set is harmless.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    pub use cassini_ecs::prelude::*;

    pub use crate::config::SimConfig;
    pub use crate::error::{EngineError, EngineResult};
    pub use crate::events::{run_action_system, scan_cells, step_agent, SCAN_RADIUS};
    pub use crate::factory::{
        create_local_player, create_map_item, create_map_mask, create_remote_player, mask_group,
        ALL_PLAYERS_GROUP, BASE_TAG, LOCAL_PLAYERS_GROUP, MASK_GROUP, PLAYER_TAG,
        REMOTE_PLAYERS_GROUP, SPRITE_GROUP, WIDGET_GROUP,
    };
    pub use crate::input::{InputRouter, InputSignal, Key};
    pub use crate::map::{InMemoryMapSource, MapData, MapLayer, MapSource, TileCell};
    pub use crate::tick::{Simulation, SystemContext, SystemFn, TickDiagnostics};
    pub use crate::init_tracing;
}
