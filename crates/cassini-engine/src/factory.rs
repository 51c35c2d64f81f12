//! Entity factory: players, map items and fog masks.
//!
//! Every constructor returns a *pending* entity. The caller adds it (alone or
//! as part of a batch) once it is ready for the index managers to see.

use std::collections::BTreeMap;

use cassini_ecs::prelude::*;
use uuid::Uuid;

use crate::config::SimConfig;

// ---------------------------------------------------------------------------
// Group and tag names
// ---------------------------------------------------------------------------

pub const ALL_PLAYERS_GROUP: &str = "all_players";
pub const LOCAL_PLAYERS_GROUP: &str = "local_players";
pub const REMOTE_PLAYERS_GROUP: &str = "remote_players";
pub const MASK_GROUP: &str = "map_mask";
pub const SPRITE_GROUP: &str = "sprites";
pub const WIDGET_GROUP: &str = "widgets";

/// Prefix of the tag marking a player's starting base, followed by the player id.
pub const BASE_TAG: &str = "BASE_";
pub const PLAYER_TAG: &str = "PLAYER_";

/// Name of the group holding the fog masks `owner` has on the map described
/// by `context` (see [`Location::context_tag`]).
pub fn mask_group(context: &str, owner: Uuid) -> String {
    format!("{MASK_GROUP}{context}{owner}")
}

pub fn base_tag(player_id: u32) -> String {
    format!("{BASE_TAG}{player_id}")
}

pub fn player_tag(player_id: u32) -> String {
    format!("{PLAYER_TAG}{player_id}")
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A rover controlled on this machine.
pub fn create_local_player(
    world: &mut World,
    config: &SimConfig,
    player_id: u32,
) -> EcsResult<EntityId> {
    create_player(world, config, player_id, LOCAL_PLAYERS_GROUP)
}

/// A rover whose actions arrive from elsewhere.
pub fn create_remote_player(
    world: &mut World,
    config: &SimConfig,
    player_id: u32,
) -> EcsResult<EntityId> {
    create_player(world, config, player_id, REMOTE_PLAYERS_GROUP)
}

fn create_player(
    world: &mut World,
    config: &SimConfig,
    player_id: u32,
    side: &str,
) -> EcsResult<EntityId> {
    let entity = world.create_entity();
    let tag = player_tag(player_id);

    world.insert(entity, Location::new())?;
    world.insert(entity, Sprite::named(Direction::North.sprite_name()))?;
    world.insert(
        entity,
        Camera::new(config.screen_width as f32, config.screen_height as f32),
    )?;
    world.insert(entity, ActionQueue::default())?;
    world.insert(entity, TileMap::for_map(config.default_map.clone()))?;
    world.insert(
        entity,
        InputState {
            key_repeat_interval: config.key_repeat_interval,
            ..InputState::default()
        },
    )?;
    world.insert(entity, Viewport::default())?;
    world.insert(
        entity,
        Property {
            player_id,
            tile_id: 0,
            name: tag.clone(),
            tag,
            item_type: ItemType::Rover,
            color: ItemColor::Gray,
            mass: 1000.0,
            volume: 1000.0,
            shape: ItemShape::Rectangular,
            size: ItemSize::Large,
            worth: 0,
            ..Property::default()
        },
    )?;
    world.insert(entity, Groups::with(&[SPRITE_GROUP, ALL_PLAYERS_GROUP, side]))?;

    tracing::debug!(entity = ?entity, player_id, side, "created player");
    Ok(entity)
}

// ---------------------------------------------------------------------------
// Map contents
// ---------------------------------------------------------------------------

/// An item placed on a map tile, described by the tile's properties.
pub fn create_map_item(
    world: &mut World,
    location: Location,
    tile_id: u32,
    properties: &BTreeMap<String, String>,
) -> EcsResult<EntityId> {
    let entity = world.create_entity();
    world.insert(entity, location)?;
    world.insert(entity, Sprite::tile(tile_id))?;
    world.insert(entity, Groups::with(&[SPRITE_GROUP]))?;
    world.insert(entity, Property::from_tile(tile_id, properties))?;
    Ok(entity)
}

/// One unexplored cell of `owner`'s fog of war.
///
/// The mask joins `map_mask + context + owner` through its [`Owner`]
/// component once it is added to the world.
pub fn create_map_mask(world: &mut World, location: Location, owner: Uuid) -> EcsResult<EntityId> {
    let entity = world.create_entity();
    let prefix = format!("{MASK_GROUP}{}", location.context_tag());
    world.insert(entity, location)?;
    world.insert(entity, Owner::new(owner, prefix))?;
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- players ---------------------------------------------------------------

    #[test]
    fn local_player_is_fully_equipped() {
        let mut world = World::new();
        let config = SimConfig::default();
        let e = create_local_player(&mut world, &config, 1).unwrap();
        world.add_to_world(e).unwrap();

        for kind in [
            ComponentKind::Location,
            ComponentKind::Sprite,
            ComponentKind::Camera,
            ComponentKind::Actions,
            ComponentKind::Map,
            ComponentKind::Input,
            ComponentKind::Viewport,
            ComponentKind::Property,
        ] {
            assert!(world.has_kind(e, kind), "missing {kind:?}");
        }
        assert_eq!(world.entity_by_tag("PLAYER_1"), Some(e));
        assert!(world.is_in_group(e, LOCAL_PLAYERS_GROUP));
        assert!(world.is_in_group(e, ALL_PLAYERS_GROUP));
        assert!(world.is_in_group(e, SPRITE_GROUP));
        assert!(world.entities_of_type(ItemType::Rover).contains(&e));
        assert_eq!(
            world.get::<TileMap>(e).map(|m| m.map_filename.as_str()),
            Some("maps/test.tmx")
        );
        assert_eq!(world.viewport_slot(e), Some(1));
    }

    #[test]
    fn remote_player_joins_remote_group() {
        let mut world = World::new();
        let e = create_remote_player(&mut world, &SimConfig::default(), 3).unwrap();
        world.add_to_world(e).unwrap();
        assert!(world.is_in_group(e, REMOTE_PLAYERS_GROUP));
        assert!(!world.is_in_group(e, LOCAL_PLAYERS_GROUP));
        let property = world.get::<Property>(e).unwrap();
        assert_eq!(property.player_id, 3);
        assert_eq!(property.color, ItemColor::Gray);
        assert_eq!(property.mass, 1000.0);
    }

    // -- masks -----------------------------------------------------------------

    #[test]
    fn mask_lands_in_owner_context_group() {
        let mut world = World::new();
        let owner = Uuid::from_u128(42);
        let mut template = Location::new();
        template.set_map_name("maps/test.tmx");
        template.set_grid_bounds(GridBounds::new(0, 0, 4, 4));
        let location = Location::on_same_map(&template, 2, 3);
        let context = location.context_tag();

        let mask = create_map_mask(&mut world, location, owner).unwrap();
        world.add_to_world(mask).unwrap();
        assert!(world
            .entities_in_group(&mask_group(&context, owner))
            .contains(&mask));
    }

    #[test]
    fn map_item_takes_tile_properties() {
        let mut world = World::new();
        let props: BTreeMap<String, String> = [("itemtag", "BASE_1"), ("itemtype", "Base")]
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        let item = create_map_item(&mut world, Location::new(), 17, &props).unwrap();
        world.add_to_world(item).unwrap();
        assert_eq!(world.entity_by_tag("BASE_1"), Some(item));
        assert_eq!(world.get::<Sprite>(item).and_then(|s| s.tile_id), Some(17));
    }
}
