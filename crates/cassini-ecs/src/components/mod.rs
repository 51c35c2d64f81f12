//! The closed set of component kinds.
//!
//! Larger components live in their own modules. The small ones (sprite,
//! map state, groups, ownership, input, viewport) are defined here.

pub mod actions;
pub mod camera;
pub mod location;
pub mod property;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::Vec3;

pub use actions::{Action, ActionQueue, Direction};
pub use camera::{Camera, OrthoCamera};
pub use location::Location;
pub use property::{ItemType, Property};

/// Implements serde for a component whose state is entirely transient: it is
/// written as `{}` and read back as its default.
macro_rules! persist_as_empty {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                use serde::ser::SerializeMap;
                serializer.serialize_map(Some(0))?.end()
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                serde::de::IgnoredAny::deserialize(deserializer)?;
                Ok(Self::default())
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Sprite
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tint {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Default for Tint {
    fn default() -> Self {
        Self {
            r: 1.0,
            g: 1.0,
            b: 1.0,
            a: 1.0,
        }
    }
}

/// What the renderer draws for an entity: a named sprite or a map tile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sprite {
    pub name: String,
    pub tint: Tint,
    pub tile_id: Option<u32>,
}

impl Sprite {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn tile(tile_id: u32) -> Self {
        Self {
            tile_id: Some(tile_id),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// TileMap
// ---------------------------------------------------------------------------

pub const DEFAULT_TILE_SIZE: i32 = 32;

/// Which map an agent is on and what is known about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileMap {
    pub level_filename: Option<String>,
    pub map_filename: String,
    pub width: i32,
    pub height: i32,
    pub tile_width: i32,
    pub tile_height: i32,
    pub background_layers: Vec<usize>,
    pub foreground_layers: Vec<usize>,
    /// Maps on which this agent's fog masks have already been created.
    pub maps_loaded: Vec<String>,
    /// Set once the map system has applied the map's metadata.
    #[serde(skip)]
    pub loaded: bool,
}

impl Default for TileMap {
    fn default() -> Self {
        Self {
            level_filename: None,
            map_filename: String::new(),
            width: 0,
            height: 0,
            tile_width: DEFAULT_TILE_SIZE,
            tile_height: DEFAULT_TILE_SIZE,
            background_layers: Vec::new(),
            foreground_layers: Vec::new(),
            maps_loaded: Vec::new(),
            loaded: false,
        }
    }
}

impl TileMap {
    pub fn for_map(map_filename: impl Into<String>) -> Self {
        Self {
            map_filename: map_filename.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// Named groups an entity belongs to, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Groups {
    pub groups: Vec<String>,
}

impl Groups {
    pub fn with(names: &[&str]) -> Self {
        let mut g = Self::default();
        for name in names {
            g.add(name);
        }
        g
    }

    /// Returns `false` if already present.
    pub fn add(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.groups.push(name.to_owned());
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g != name);
        before != self.groups.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.groups.iter().any(|g| g == name)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Owner
// ---------------------------------------------------------------------------

/// Binds an entity to another entity's private group
/// (`group_prefix + owner_uuid`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(rename = "my.uuid")]
    pub my_uuid: Option<Uuid>,
    #[serde(rename = "owner.uuid")]
    pub owner_uuid: Uuid,
    #[serde(rename = "groupPrefix")]
    pub group_prefix: String,
    #[serde(skip)]
    pub my_old_uuid: Option<Uuid>,
    #[serde(skip)]
    pub owner_old_uuid: Option<Uuid>,
}

impl Owner {
    pub fn new(owner_uuid: Uuid, group_prefix: impl Into<String>) -> Self {
        Self {
            my_uuid: None,
            owner_uuid,
            group_prefix: group_prefix.into(),
            my_old_uuid: None,
            owner_old_uuid: None,
        }
    }

    pub fn effective_group(&self) -> String {
        format!("{}{}", self.group_prefix, self.owner_uuid)
    }

    /// Group name this entity held before its owner uuid was remapped.
    pub fn previous_group(&self) -> Option<String> {
        self.owner_old_uuid
            .map(|old| format!("{}{}", self.group_prefix, old))
    }

    pub fn remap_uuids(&mut self, uuids: &HashMap<Uuid, Uuid>) {
        if let Some(mine) = self.my_uuid {
            if let Some(&new) = uuids.get(&mine) {
                self.my_old_uuid = Some(mine);
                self.my_uuid = Some(new);
            }
        }
        if let Some(&new) = uuids.get(&self.owner_uuid) {
            self.owner_old_uuid = Some(self.owner_uuid);
            self.owner_uuid = new;
        }
    }
}

// ---------------------------------------------------------------------------
// InputState
// ---------------------------------------------------------------------------

/// Debounced, device-independent input signals routed to one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct InputState {
    pub key_up: bool,
    pub key_down: bool,
    pub key_left: bool,
    pub key_right: bool,
    pub key_center: bool,
    pub key_plus: bool,
    pub key_minus: bool,
    pub key_zero: bool,
    pub key_repeat: bool,
    pub key_repeat_force: bool,
    pub key_repeat_accumulator: f32,
    pub key_repeat_interval: f32,
    /// A keyboard gesture (centre key) is in progress.
    pub new_key_down: bool,
    pub new_down: bool,
    pub new_up: bool,
    pub new_drag: bool,
    pub new_zoom: bool,
    pub zoom_value: i32,
    pub last_down_pos: Vec3,
    pub last_drag_pos: Vec3,
    pub last_drag_delta: Vec3,
    pub last_up_pos: Vec3,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            key_up: false,
            key_down: false,
            key_left: false,
            key_right: false,
            key_center: false,
            key_plus: false,
            key_minus: false,
            key_zero: false,
            key_repeat: false,
            key_repeat_force: false,
            key_repeat_accumulator: 0.0,
            key_repeat_interval: 0.125,
            new_key_down: false,
            new_down: false,
            new_up: false,
            new_drag: false,
            new_zoom: false,
            zoom_value: 0,
            last_down_pos: Vec3::default(),
            last_drag_pos: Vec3::default(),
            last_drag_delta: Vec3::default(),
            last_up_pos: Vec3::default(),
        }
    }
}

impl InputState {
    pub fn any_arrow(&self) -> bool {
        self.key_left || self.key_right || self.key_up || self.key_down
    }
}

persist_as_empty!(InputState);

// ---------------------------------------------------------------------------
// Viewport
// ---------------------------------------------------------------------------

/// Screen rectangle assigned to an agent, y-up from the bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    /// Whether a y-down screen point falls inside this rectangle.
    pub fn contains(&self, screen_x: i32, screen_y: i32, screen_height: u32) -> bool {
        let h = screen_height as i32;
        screen_x >= self.x
            && screen_x < self.x + self.width
            && screen_y >= h - (self.y + self.height)
            && screen_y < h - self.y
    }
}

persist_as_empty!(Viewport);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_add_is_idempotent() {
        let mut g = Groups::default();
        assert!(g.add("sprites"));
        assert!(!g.add("sprites"));
        assert_eq!(g.groups, vec!["sprites".to_string()]);
        assert!(g.remove("sprites"));
        assert!(!g.remove("sprites"));
    }

    #[test]
    fn owner_remap_remembers_old_group() {
        let old = Uuid::from_u128(1);
        let new = Uuid::from_u128(2);
        let mut owner = Owner::new(old, "map_mask");
        let map: HashMap<Uuid, Uuid> = [(old, new)].into_iter().collect();
        owner.remap_uuids(&map);
        assert_eq!(owner.owner_uuid, new);
        assert_eq!(owner.previous_group(), Some(format!("map_mask{old}")));
        assert_eq!(owner.effective_group(), format!("map_mask{new}"));
    }

    #[test]
    fn transient_components_persist_as_empty_objects() {
        let mut input = InputState::default();
        input.key_left = true;
        assert_eq!(serde_json::to_string(&input).unwrap(), "{}");
        let back: InputState = serde_json::from_str(r#"{"stale": 1}"#).unwrap();
        assert_eq!(back, InputState::default());

        let vp = Viewport {
            x: 1,
            y: 2,
            width: 3,
            height: 4,
        };
        assert_eq!(serde_json::to_string(&vp).unwrap(), "{}");
    }

    #[test]
    fn viewport_contains_uses_flipped_y() {
        // Top-left quadrant of an 800x480 screen.
        let vp = Viewport {
            x: 0,
            y: 240,
            width: 400,
            height: 240,
        };
        assert!(vp.contains(10, 10, 480));
        assert!(!vp.contains(10, 300, 480));
        assert!(!vp.contains(410, 10, 480));
    }
}
