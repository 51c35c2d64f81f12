//! The [`World`] is the top-level container of the simulation state. It owns
//! the entity allocator, the UUID source, the component store and every index
//! manager.
//!
//! Entities are *pending* after [`World::create_entity`] and become *live*
//! once added with [`World::add_to_world`] or [`World::add_batch`]. Index
//! managers only observe live entities. Every add, change and delete of a live
//! entity is dispatched synchronously to the managers in a fixed order:
//! groups, ownership, tags, live registry, viewports.

use std::collections::{BTreeSet, HashMap};

use uuid::Uuid;

use crate::component::{Component, ComponentData, ComponentKind, ComponentStore};
use crate::components::{Groups, ItemType, Property, Viewport};
use crate::entity::{EntityAllocator, EntityId, UuidSource};
use crate::group::GroupIndex;
use crate::live::LiveRegistry;
use crate::owner::OwnerIndex;
use crate::tag::TagIndex;
use crate::viewport::{GridShape, ViewportAllocator};
use crate::{EcsError, EcsResult};

/// Default screen size the viewport allocator partitions.
pub const DEFAULT_SCREEN_WIDTH: u32 = 800;
pub const DEFAULT_SCREEN_HEIGHT: u32 = 480;

#[derive(Debug)]
pub struct World {
    entities: EntityAllocator,
    uuid_source: UuidSource,
    uuids: HashMap<EntityId, Uuid>,
    by_uuid: HashMap<Uuid, EntityId>,
    pub(crate) store: ComponentStore,
    groups: GroupIndex,
    owners: OwnerIndex,
    tags: TagIndex,
    live: LiveRegistry,
    viewports: ViewportAllocator,
    screen_width: u32,
    screen_height: u32,
    populated_maps: BTreeSet<String>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// A world whose entity UUIDs come from a generator seeded with `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            entities: EntityAllocator::new(),
            uuid_source: UuidSource::from_seed(seed),
            uuids: HashMap::new(),
            by_uuid: HashMap::new(),
            store: ComponentStore::default(),
            groups: GroupIndex::new(),
            owners: OwnerIndex::new(),
            tags: TagIndex::new(),
            live: LiveRegistry::new(),
            viewports: ViewportAllocator::new(),
            screen_width: DEFAULT_SCREEN_WIDTH,
            screen_height: DEFAULT_SCREEN_HEIGHT,
            populated_maps: BTreeSet::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Entity lifecycle
    // -----------------------------------------------------------------------

    /// Allocate a pending entity with a fresh UUID.
    pub fn create_entity(&mut self) -> EntityId {
        let entity = self.entities.allocate();
        let uuid = self.uuid_source.next_uuid();
        self.uuids.insert(entity, uuid);
        self.by_uuid.insert(uuid, entity);
        entity
    }

    /// Make a pending entity live and let every manager observe it.
    /// Adding an entity that is already live is a no-op.
    pub fn add_to_world(&mut self, entity: EntityId) -> EcsResult<()> {
        self.ensure_alive(entity)?;
        if self.live.contains(entity) {
            return Ok(());
        }
        self.notify_added(entity);
        Ok(())
    }

    /// Add several pending entities, in order.
    pub fn add_batch(&mut self, entities: &[EntityId]) -> EcsResult<()> {
        for &entity in entities {
            self.add_to_world(entity)?;
        }
        Ok(())
    }

    /// Destroy an entity, live or pending, and drop all of its index entries.
    pub fn delete_entity(&mut self, entity: EntityId) -> EcsResult<()> {
        self.ensure_alive(entity)?;
        if self.live.contains(entity) {
            self.notify_deleted(entity);
        }
        self.store.clear_entity(entity);
        if let Some(uuid) = self.uuids.remove(&entity) {
            self.by_uuid.remove(&uuid);
        }
        self.entities.deallocate(entity);
        Ok(())
    }

    /// Delete every live entity. Returns how many were removed.
    pub fn remove_all_live(&mut self) -> usize {
        let doomed = self.live.to_vec();
        for &entity in &doomed {
            // Every live entity is alive, so this cannot fail.
            let _ = self.delete_entity(entity);
        }
        doomed.len()
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity)
    }

    pub fn is_live(&self, entity: EntityId) -> bool {
        self.live.contains(entity)
    }

    /// Live entities in the order they were added.
    pub fn live_entities(&self) -> Vec<EntityId> {
        self.live.to_vec()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of allocated entities, pending included.
    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    pub fn uuid(&self, entity: EntityId) -> Option<Uuid> {
        self.uuids.get(&entity).copied()
    }

    pub fn entity_by_uuid(&self, uuid: Uuid) -> Option<EntityId> {
        self.by_uuid.get(&uuid).copied()
    }

    // -----------------------------------------------------------------------
    // Components
    // -----------------------------------------------------------------------

    /// Attach or replace a component. Live entities notify the managers.
    pub fn insert<T: ComponentData>(&mut self, entity: EntityId, value: T) -> EcsResult<Option<T>> {
        self.ensure_alive(entity)?;
        let previous = self.store.insert(entity, value);
        self.changed(entity);
        Ok(previous)
    }

    pub fn insert_component(&mut self, entity: EntityId, component: Component) -> EcsResult<()> {
        self.ensure_alive(entity)?;
        self.store.insert_component(entity, component);
        self.changed(entity);
        Ok(())
    }

    pub fn remove<T: ComponentData>(&mut self, entity: EntityId) -> EcsResult<Option<T>> {
        self.ensure_alive(entity)?;
        let removed = self.store.remove::<T>(entity);
        if removed.is_some() {
            self.changed(entity);
        }
        Ok(removed)
    }

    pub fn get<T: ComponentData>(&self, entity: EntityId) -> Option<&T> {
        self.store.get(entity)
    }

    /// In-place access. Edits that affect indexing (groups, owner, property,
    /// viewport presence) must be followed by [`World::changed`].
    pub fn get_mut<T: ComponentData>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.store.get_mut(entity)
    }

    pub fn has<T: ComponentData>(&self, entity: EntityId) -> bool {
        self.store.has::<T>(entity)
    }

    pub fn has_kind(&self, entity: EntityId, kind: ComponentKind) -> bool {
        self.store.has_kind(entity, kind)
    }

    /// Tell the managers a live entity's components changed.
    pub fn changed(&mut self, entity: EntityId) {
        if self.live.contains(entity) {
            self.notify_changed(entity);
        }
    }

    pub fn components_of(&self, entity: EntityId) -> Vec<Component> {
        self.store.components_of(entity)
    }

    /// Live entities carrying every kind in `aspect`, in live order.
    pub fn query(&self, aspect: &[ComponentKind]) -> Vec<EntityId> {
        self.live
            .iter()
            .filter(|&e| aspect.iter().all(|&kind| self.store.has_kind(e, kind)))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    /// Put `entity` in `group`, creating its group component if missing.
    /// Pending entities only record the name; it is indexed when they go live.
    pub fn add_to_group(&mut self, entity: EntityId, group: &str) -> EcsResult<()> {
        self.ensure_alive(entity)?;
        if self.live.contains(entity) {
            self.groups.add(&mut self.store, entity, group);
        } else {
            match self.store.get_mut::<Groups>(entity) {
                Some(component) => {
                    component.add(group);
                }
                None => {
                    self.store.insert(entity, Groups::with(&[group]));
                }
            }
        }
        Ok(())
    }

    pub fn remove_from_group(&mut self, entity: EntityId, group: &str) -> EcsResult<()> {
        self.ensure_alive(entity)?;
        if self.live.contains(entity) {
            self.groups.remove(&mut self.store, entity, group);
        } else if let Some(component) = self.store.get_mut::<Groups>(entity) {
            component.remove(group);
        }
        Ok(())
    }

    pub fn entities_in_group(&self, group: &str) -> &BTreeSet<EntityId> {
        self.groups.entities(group)
    }

    pub fn groups_of(&self, entity: EntityId) -> &BTreeSet<String> {
        self.groups.groups_of(entity)
    }

    pub fn is_in_group(&self, entity: EntityId, group: &str) -> bool {
        self.groups.is_in_group(entity, group)
    }

    pub fn group_index(&self) -> &GroupIndex {
        &self.groups
    }

    /// The ownership group `entity` was last placed in.
    pub fn owner_group_of(&self, entity: EntityId) -> Option<&str> {
        self.owners.group_of(entity)
    }

    // -----------------------------------------------------------------------
    // Tags and types
    // -----------------------------------------------------------------------

    /// Register `entity` under `tag` by writing its property component.
    pub fn set_tag(&mut self, entity: EntityId, tag: &str) -> EcsResult<()> {
        self.edit_property(entity, |p| p.tag = tag.to_owned())
    }

    pub fn set_type(&mut self, entity: EntityId, item_type: ItemType) -> EcsResult<()> {
        self.edit_property(entity, |p| p.item_type = item_type)
    }

    pub fn entity_by_tag(&self, tag: &str) -> Option<EntityId> {
        self.tags.entity_by_tag(tag)
    }

    pub fn entities_of_type(&self, item_type: ItemType) -> &BTreeSet<EntityId> {
        self.tags.entities_of_type(item_type)
    }

    fn edit_property(&mut self, entity: EntityId, edit: impl FnOnce(&mut Property)) -> EcsResult<()> {
        self.ensure_alive(entity)?;
        match self.store.get_mut::<Property>(entity) {
            Some(property) => edit(property),
            None => {
                let mut property = Property::default();
                edit(&mut property);
                self.store.insert(entity, property);
            }
        }
        self.changed(entity);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Viewports
    // -----------------------------------------------------------------------

    pub fn viewport_slot(&self, entity: EntityId) -> Option<u32> {
        self.viewports.slot_of(entity)
    }

    pub fn viewport_grid(&self) -> GridShape {
        self.viewports.grid()
    }

    pub fn viewport_allocator(&self) -> &ViewportAllocator {
        &self.viewports
    }

    pub fn screen_size(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    /// Resize the partitioned screen and lay every slot out again.
    pub fn set_screen_size(&mut self, width: u32, height: u32) {
        self.screen_width = width;
        self.screen_height = height;
        self.recompute_layout();
    }

    pub fn recompute_layout(&mut self) {
        self.viewports
            .recompute_layout(&mut self.store, self.screen_width, self.screen_height);
    }

    // -----------------------------------------------------------------------
    // Map bookkeeping
    // -----------------------------------------------------------------------

    /// Record that `map`'s items were created. Returns false if they already were.
    pub fn mark_map_populated(&mut self, map: &str) -> bool {
        self.populated_maps.insert(map.to_owned())
    }

    pub fn is_map_populated(&self, map: &str) -> bool {
        self.populated_maps.contains(map)
    }

    pub fn populated_maps(&self) -> &BTreeSet<String> {
        &self.populated_maps
    }

    pub(crate) fn set_populated_maps(&mut self, maps: BTreeSet<String>) {
        self.populated_maps = maps;
    }

    /// Forget which maps were populated, so a new game recreates their items.
    pub fn clear_populated_maps(&mut self) {
        self.populated_maps.clear();
    }

    // -----------------------------------------------------------------------
    // Manager dispatch
    // -----------------------------------------------------------------------

    fn ensure_alive(&self, entity: EntityId) -> EcsResult<()> {
        if self.entities.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::StaleEntity { entity })
        }
    }

    fn notify_added(&mut self, entity: EntityId) {
        let uuid = self.uuid(entity);
        self.groups.on_added(&mut self.store, entity);
        self.owners
            .on_added(&mut self.store, &mut self.groups, entity, uuid);
        self.tags.on_added(&self.store, entity);
        self.live.insert(entity);
        if self.store.has::<Viewport>(entity) {
            self.viewports.on_agent_added(entity);
            self.recompute_layout();
        }
    }

    fn notify_changed(&mut self, entity: EntityId) {
        let uuid = self.uuid(entity);
        self.groups.on_changed(&mut self.store, entity);
        self.owners
            .on_changed(&mut self.store, &mut self.groups, entity, uuid);
        self.tags.on_changed(&self.store, entity);
        let wants_slot = self.store.has::<Viewport>(entity);
        let has_slot = self.viewports.slot_of(entity).is_some();
        if wants_slot != has_slot {
            if wants_slot {
                self.viewports.on_agent_added(entity);
            } else {
                self.viewports.on_agent_removed(entity);
            }
            self.recompute_layout();
        }
    }

    fn notify_deleted(&mut self, entity: EntityId) {
        self.groups.on_deleted(&mut self.store, entity);
        self.owners.on_deleted(entity);
        self.tags.on_deleted(entity);
        self.live.remove(entity);
        if self.viewports.on_agent_removed(entity) {
            self.recompute_layout();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Camera, Owner};

    fn agent(world: &mut World) -> EntityId {
        let e = world.create_entity();
        world.insert(e, Camera::new(800.0, 480.0)).unwrap();
        world.insert(e, Viewport::default()).unwrap();
        e
    }

    // -- lifecycle --

    #[test]
    fn pending_entities_are_not_indexed() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_to_group(e, "sprites").unwrap();
        assert!(world.entities_in_group("sprites").is_empty());
        assert_eq!(world.get::<Groups>(e), Some(&Groups::with(&["sprites"])));

        world.add_to_world(e).unwrap();
        assert!(world.entities_in_group("sprites").contains(&e));
        assert!(world.is_live(e));
    }

    #[test]
    fn delete_cascades_to_every_index() {
        let mut world = World::new();
        let e = agent(&mut world);
        world.set_tag(e, "PLAYER_1").unwrap();
        world.add_to_group(e, "all_players").unwrap();
        world.add_to_world(e).unwrap();
        assert_eq!(world.viewport_slot(e), Some(1));

        world.delete_entity(e).unwrap();
        assert!(!world.is_alive(e));
        assert!(world.entities_in_group("all_players").is_empty());
        assert_eq!(world.entity_by_tag("PLAYER_1"), None);
        assert_eq!(world.viewport_slot(e), None);
        assert_eq!(world.live_count(), 0);
        assert!(matches!(
            world.delete_entity(e),
            Err(EcsError::StaleEntity { .. })
        ));
    }

    #[test]
    fn same_seed_gives_same_uuids() {
        let mut a = World::with_seed(7);
        let mut b = World::with_seed(7);
        let ea = a.create_entity();
        let eb = b.create_entity();
        assert_eq!(a.uuid(ea), b.uuid(eb));
        assert_eq!(a.entity_by_uuid(a.uuid(ea).unwrap()), Some(ea));
    }

    #[test]
    fn remove_all_live_keeps_pending() {
        let mut world = World::new();
        let live = world.create_entity();
        let pending = world.create_entity();
        world.add_to_world(live).unwrap();
        assert_eq!(world.remove_all_live(), 1);
        assert!(!world.is_alive(live));
        assert!(world.is_alive(pending));
    }

    // -- queries --

    #[test]
    fn query_matches_full_aspect_in_live_order() {
        let mut world = World::new();
        let b = agent(&mut world);
        let plain = world.create_entity();
        world.insert(plain, Camera::default()).unwrap();
        let a = agent(&mut world);
        world.add_batch(&[a, plain, b]).unwrap();
        let hits = world.query(&[ComponentKind::Camera, ComponentKind::Viewport]);
        assert_eq!(hits, vec![a, b]);
    }

    // -- manager dispatch --

    #[test]
    fn owner_group_follows_owner_changes() {
        let mut world = World::new();
        let owner_a = Uuid::from_u128(1);
        let owner_b = Uuid::from_u128(2);
        let mask = world.create_entity();
        world.insert(mask, Owner::new(owner_a, "map_mask")).unwrap();
        world.add_to_world(mask).unwrap();
        assert!(world.is_in_group(mask, &format!("map_mask{owner_a}")));
        assert_eq!(
            world.get::<Owner>(mask).and_then(|o| o.my_uuid),
            world.uuid(mask)
        );

        if let Some(owner) = world.get_mut::<Owner>(mask) {
            owner.owner_uuid = owner_b;
        }
        world.changed(mask);
        assert!(!world.is_in_group(mask, &format!("map_mask{owner_a}")));
        assert!(world.is_in_group(mask, &format!("map_mask{owner_b}")));
    }

    #[test]
    fn retyping_moves_type_bucket() {
        let mut world = World::new();
        let e = world.create_entity();
        world.add_to_world(e).unwrap();
        world.set_type(e, ItemType::Gem).unwrap();
        world.set_type(e, ItemType::Rock).unwrap();
        assert!(world.entities_of_type(ItemType::Gem).is_empty());
        assert!(world.entities_of_type(ItemType::Rock).contains(&e));
    }

    #[test]
    fn viewports_follow_agents() {
        let mut world = World::new();
        let agents: Vec<_> = (0..3).map(|_| agent(&mut world)).collect();
        world.add_batch(&agents).unwrap();
        assert_eq!(world.viewport_grid(), GridShape { columns: 2, rows: 2 });
        assert_eq!(
            world.get::<Viewport>(agents[2]),
            Some(&Viewport { x: 0, y: 0, width: 400, height: 240 })
        );

        world.remove::<Viewport>(agents[0]).unwrap();
        world.delete_entity(agents[1]).unwrap();
        assert_eq!(world.viewport_grid(), GridShape { columns: 1, rows: 1 });
        assert_eq!(world.viewport_slot(agents[2]), Some(1));
        assert_eq!(
            world.get::<Viewport>(agents[2]),
            Some(&Viewport { x: 0, y: 0, width: 800, height: 480 })
        );
    }

    #[test]
    fn screen_resize_relays_out() {
        let mut world = World::new();
        let e = agent(&mut world);
        world.add_to_world(e).unwrap();
        world.set_screen_size(1024, 768);
        assert_eq!(
            world.get::<Viewport>(e),
            Some(&Viewport { x: 0, y: 0, width: 1024, height: 768 })
        );
    }
}
