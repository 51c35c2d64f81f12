//! Tile maps and the map system.
//!
//! Map files are loaded by a collaborator behind the [`MapSource`] trait. The
//! map system watches every agent's [`TileMap`] component. When an agent is on
//! a map that has not been applied yet, the system applies the map's metadata
//! to the agent. It then creates the map's items once per world and the
//! agent's fog masks once per agent.

use std::collections::{BTreeMap, HashMap, HashSet};

use cassini_ecs::components::DEFAULT_TILE_SIZE;
use cassini_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::factory::{base_tag, create_map_item, create_map_mask};

/// Layer property marking a layer as drawn above sprites.
pub const LAYER_FOREGROUND: &str = "foreground";
/// Layer property marking a layer whose tiles are items.
pub const LAYER_ITEMS: &str = "items";

// ---------------------------------------------------------------------------
// Map data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TileCell {
    pub x: i32,
    pub y: i32,
    pub tile_id: u32,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MapLayer {
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub cells: Vec<TileCell>,
}

impl MapLayer {
    /// Whether `key` is set to `"true"` (any case).
    pub fn flag(&self, key: &str) -> bool {
        self.properties
            .get(key)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    pub width: i32,
    pub height: i32,
    pub tile_width: i32,
    pub tile_height: i32,
    #[serde(default)]
    pub layers: Vec<MapLayer>,
}

impl MapData {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            tile_width: DEFAULT_TILE_SIZE,
            tile_height: DEFAULT_TILE_SIZE,
            layers: Vec::new(),
        }
    }

    pub fn with_layer(mut self, layer: MapLayer) -> Self {
        self.layers.push(layer);
        self
    }
}

// ---------------------------------------------------------------------------
// MapSource
// ---------------------------------------------------------------------------

/// Where map files come from.
///
/// Loading may be asynchronous: a source reports a map as loaded only once
/// it can be handed out, and the map system simply asks again next tick.
pub trait MapSource {
    fn is_loaded(&self, name: &str) -> bool;
    fn request_load(&mut self, name: &str);
    fn map(&self, name: &str) -> Option<&MapData>;
}

/// A [`MapSource`] over maps held in memory.
///
/// Maps added with [`insert`](Self::insert) become loaded only after a load
/// has been requested, which models a loader that completes between ticks.
#[derive(Debug, Default)]
pub struct InMemoryMapSource {
    available: HashMap<String, MapData>,
    loaded: HashSet<String>,
    requests: Vec<String>,
}

impl InMemoryMapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, map: MapData) {
        self.available.insert(name.into(), map);
    }

    /// Add a map that can be handed out immediately.
    pub fn insert_loaded(&mut self, name: impl Into<String>, map: MapData) {
        let name = name.into();
        self.loaded.insert(name.clone());
        self.available.insert(name, map);
    }

    /// Every load request received, in order.
    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

impl MapSource for InMemoryMapSource {
    fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains(name)
    }

    fn request_load(&mut self, name: &str) {
        self.requests.push(name.to_owned());
        if self.available.contains_key(name) {
            self.loaded.insert(name.to_owned());
        } else {
            tracing::warn!(map = %name, "requested map is not available");
        }
    }

    fn map(&self, name: &str) -> Option<&MapData> {
        if self.loaded.contains(name) {
            self.available.get(name)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Map system
// ---------------------------------------------------------------------------

/// Whether any agent is still waiting for its map.
pub fn loading_required(world: &World) -> bool {
    world
        .query(&[ComponentKind::Map])
        .into_iter()
        .any(|e| world.get::<TileMap>(e).is_some_and(|m| !m.loaded))
}

/// Apply pending maps to every agent carrying Location + Map + Property.
pub fn run_map_system(world: &mut World, maps: &mut dyn MapSource) -> EcsResult<()> {
    let aspect = [
        ComponentKind::Location,
        ComponentKind::Map,
        ComponentKind::Property,
    ];
    for entity in world.query(&aspect) {
        // Earlier agents may have deleted or replaced things this tick.
        if !world.is_live(entity) {
            continue;
        }
        let (Some(map), Some(location)) = (
            world.get::<TileMap>(entity).cloned(),
            world.get::<Location>(entity).cloned(),
        ) else {
            continue;
        };

        let same_map = map.map_filename.eq_ignore_ascii_case(location.map_name());
        if map.loaded && same_map {
            continue;
        }

        if !maps.is_loaded(&map.map_filename) {
            maps.request_load(&map.map_filename);
            continue;
        }
        let Some(data) = maps.map(&map.map_filename) else {
            continue;
        };
        apply_map(world, entity, map, location, data)?;
    }
    Ok(())
}

fn apply_map(
    world: &mut World,
    entity: EntityId,
    mut map: TileMap,
    mut location: Location,
    data: &MapData,
) -> EcsResult<()> {
    let name = map.map_filename.clone();

    // 1. Map metadata and the agent's coordinate frame.
    map.width = data.width;
    map.height = data.height;
    map.tile_width = data.tile_width;
    map.tile_height = data.tile_height;
    map.background_layers.clear();
    map.foreground_layers.clear();
    for (index, layer) in data.layers.iter().enumerate() {
        if layer.flag(LAYER_FOREGROUND) {
            map.foreground_layers.push(index);
        } else {
            map.background_layers.push(index);
        }
    }
    map.loaded = true;

    location.set_cell(data.tile_width as f32, data.tile_height as f32);
    location.set_grid_bounds(GridBounds::new(0, 0, data.width, data.height));
    location.set_map_name(name.clone());

    // 2. Items, once per world.
    if world.mark_map_populated(&name) {
        let mut created = 0usize;
        for layer in data.layers.iter().filter(|l| l.flag(LAYER_ITEMS)) {
            for cell in &layer.cells {
                let item_location = Location::on_same_map(&location, cell.x, cell.y);
                let item = create_map_item(world, item_location, cell.tile_id, &cell.properties)?;
                world.add_to_world(item)?;
                created += 1;
            }
        }
        tracing::debug!(map = %name, items = created, "populated map items");
    }

    // 3. Base placement and fog masks, once per agent.
    let first_visit = !map.maps_loaded.iter().any(|m| m == &name);
    let mut camera_focus = None;
    if first_visit {
        let player_id = world.get::<Property>(entity).map_or(0, |p| p.player_id);
        let base = world
            .entity_by_tag(&base_tag(player_id))
            .and_then(|b| world.get::<Location>(b))
            .map(Location::grid);
        match base {
            Some(cell) => {
                location.set_grid(cell.x, cell.y);
                let level = location.level();
                camera_focus = Some((level.x, level.y));
            }
            None => tracing::warn!(
                entity = ?entity,
                player_id,
                map = %name,
                "no base found for player, keeping current cell"
            ),
        }
        map.maps_loaded.push(name.clone());
    }

    // Write the agent back before creating masks so they copy its frame.
    let own_cell = location.grid();
    if let Some(slot) = world.get_mut::<TileMap>(entity) {
        *slot = map;
    }
    if let Some(slot) = world.get_mut::<Location>(entity) {
        *slot = location.clone();
    }
    if let (Some((x, y)), Some(camera)) = (camera_focus, world.get_mut::<Camera>(entity)) {
        camera.set_world_position(x, y);
    }

    if first_visit {
        if let Some(owner) = world.uuid(entity) {
            let mut masks = Vec::with_capacity((data.width * data.height).max(0) as usize);
            for y in 0..data.height {
                for x in 0..data.width {
                    if GridPos::new(x, y) == own_cell {
                        continue;
                    }
                    let mask = create_map_mask(world, Location::on_same_map(&location, x, y), owner)?;
                    masks.push(mask);
                }
            }
            world.add_batch(&masks)?;
            tracing::debug!(entity = ?entity, map = %name, masks = masks.len(), "created fog masks");
        }
    }
    Ok(())
}
