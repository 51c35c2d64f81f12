//! Cassini ECS -- entity/component store with synchronous index managers.
//!
//! Entities are generational integer handles into per-kind component tables.
//! The component set is closed ([`component::Component`]), which gives every
//! kind a stable persisted name. Index managers (groups, ownership groups,
//! tags and types, the live registry, viewport slots) are owned by the
//! [`world::World`] and updated synchronously whenever a live entity is
//! added, changed or deleted.
//!
//! # Quick Start
//!
//! ```
//! use cassini_ecs::prelude::*;
//!
//! let mut world = World::new();
//! let rover = world.create_entity();
//! world.insert(rover, Sprite::named("rover_north")).unwrap();
//! world.add_to_group(rover, "sprites").unwrap();
//! world.set_tag(rover, "PLAYER_1").unwrap();
//!
//! // Pending entities are invisible to the indexes until added.
//! assert!(world.entities_in_group("sprites").is_empty());
//! world.add_to_world(rover).unwrap();
//! assert!(world.entities_in_group("sprites").contains(&rover));
//! assert_eq!(world.entity_by_tag("PLAYER_1"), Some(rover));
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod components;
pub mod entity;
pub mod geometry;
pub mod group;
pub mod live;
pub mod owner;
pub mod snapshot;
pub mod storage;
pub mod tag;
pub mod viewport;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {entity:?} does not exist (stale or never allocated)")]
    StaleEntity { entity: entity::EntityId },

    /// A persisted component names a kind outside the closed set.
    #[error("component kind '{name}' not registered. Registered kinds: [{registered}]")]
    UnknownComponent { name: String, registered: String },

    /// A known component kind carried fields that do not parse.
    #[error("failed to deserialize component '{component}': {details}")]
    ComponentDeserializationError { component: String, details: String },

    #[error("failed to serialize component '{component}': {details}")]
    ComponentSerializationError { component: String, details: String },

    /// A component entry is not a single-key `{kind: {...}}` object.
    #[error("malformed component entry: {details}")]
    MalformedComponent { details: String },

    /// The save document envelope itself is unreadable.
    #[error("malformed save document: {details}")]
    MalformedDocument { details: String },
}

pub type EcsResult<T> = Result<T, EcsError>;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{Component, ComponentData, ComponentKind, Remap};
    pub use crate::components::actions::{
        Action, ActionQueue, Direction, FULL_TURN, LOOK_DURATION, MOVE_COOLDOWN, ROTATE_COOLDOWN,
        WAIT_FOREVER,
    };
    pub use crate::components::property::{ItemColor, ItemShape, ItemSize, ItemType, Property};
    pub use crate::components::{
        Camera, Groups, InputState, Location, OrthoCamera, Owner, Sprite, TileMap, Tint, Viewport,
    };
    pub use crate::entity::EntityId;
    pub use crate::geometry::{GridBounds, GridPos, LevelBounds, Vec2, Vec3};
    pub use crate::snapshot::{EntityRecord, RestoreReport, SaveDocument, FORMAT_VERSION};
    pub use crate::viewport::GridShape;
    pub use crate::world::World;
    pub use crate::{EcsError, EcsResult};
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
