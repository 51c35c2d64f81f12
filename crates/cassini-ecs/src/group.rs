//! Group index: many-to-many membership between entities and named groups.
//!
//! The index keeps two maps, group to entities and entity to groups, and
//! updates both on every operation so they stay exact inverses. An entity's
//! [`Groups`] component mirrors its membership: adding an entity to a group
//! creates the component if it is missing.

use std::collections::{BTreeSet, HashMap};

use crate::component::ComponentStore;
use crate::components::Groups;
use crate::entity::EntityId;

static NO_ENTITIES: BTreeSet<EntityId> = BTreeSet::new();
static NO_GROUPS: BTreeSet<String> = BTreeSet::new();

#[derive(Debug, Default)]
pub struct GroupIndex {
    entities_by_group: HashMap<String, BTreeSet<EntityId>>,
    groups_by_entity: HashMap<EntityId, BTreeSet<String>>,
}

impl GroupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `entity` in `group`. Idempotent.
    pub fn add(&mut self, store: &mut ComponentStore, entity: EntityId, group: &str) {
        match store.get_mut::<Groups>(entity) {
            Some(component) => {
                component.add(group);
            }
            None => {
                store.insert(entity, Groups::with(&[group]));
            }
        }
        self.groups_by_entity
            .entry(entity)
            .or_default()
            .insert(group.to_owned());
        self.entities_by_group
            .entry(group.to_owned())
            .or_default()
            .insert(entity);
    }

    /// Take `entity` out of `group`. A no-op if it is not a member.
    pub fn remove(&mut self, store: &mut ComponentStore, entity: EntityId, group: &str) {
        if let Some(component) = store.get_mut::<Groups>(entity) {
            component.remove(group);
        }
        self.unlink(entity, group);
    }

    /// Add `entity` to every group its [`Groups`] component lists.
    pub fn add_from_component(&mut self, store: &mut ComponentStore, entity: EntityId) {
        let names = match store.get::<Groups>(entity) {
            Some(component) => component.groups.clone(),
            None => return,
        };
        for name in &names {
            self.add(store, entity, name);
        }
    }

    /// Drop every membership of `entity`.
    pub fn remove_all(&mut self, store: &mut ComponentStore, entity: EntityId) {
        let names: Vec<String> = self.groups_of(entity).iter().cloned().collect();
        for name in &names {
            self.remove(store, entity, name);
        }
        self.groups_by_entity.remove(&entity);
    }

    pub fn entities(&self, group: &str) -> &BTreeSet<EntityId> {
        self.entities_by_group.get(group).unwrap_or(&NO_ENTITIES)
    }

    pub fn groups_of(&self, entity: EntityId) -> &BTreeSet<String> {
        self.groups_by_entity.get(&entity).unwrap_or(&NO_GROUPS)
    }

    pub fn is_in_group(&self, entity: EntityId, group: &str) -> bool {
        self.groups_of(entity).contains(group)
    }

    pub fn is_in_any_group(&self, entity: EntityId) -> bool {
        !self.groups_of(entity).is_empty()
    }

    /// True when the two maps are exact inverses of each other.
    pub fn is_consistent(&self) -> bool {
        let forward = self.entities_by_group.iter().all(|(group, entities)| {
            !entities.is_empty()
                && entities
                    .iter()
                    .all(|e| self.groups_of(*e).contains(group.as_str()))
        });
        let backward = self.groups_by_entity.iter().all(|(entity, groups)| {
            !groups.is_empty() && groups.iter().all(|g| self.entities(g).contains(entity))
        });
        forward && backward
    }

    // -- lifecycle -------------------------------------------------------------

    pub(crate) fn on_added(&mut self, store: &mut ComponentStore, entity: EntityId) {
        self.add_from_component(store, entity);
    }

    /// Bring the index in line with the entity's component.
    pub(crate) fn on_changed(&mut self, store: &mut ComponentStore, entity: EntityId) {
        match store.get::<Groups>(entity) {
            Some(component) => {
                let wanted: BTreeSet<String> = component.groups.iter().cloned().collect();
                let stale: Vec<String> = self
                    .groups_of(entity)
                    .iter()
                    .filter(|g| !wanted.contains(*g))
                    .cloned()
                    .collect();
                for name in &stale {
                    self.unlink(entity, name);
                }
                self.add_from_component(store, entity);
            }
            None => {
                let names: Vec<String> = self.groups_of(entity).iter().cloned().collect();
                for name in &names {
                    self.unlink(entity, name);
                }
            }
        }
    }

    pub(crate) fn on_deleted(&mut self, store: &mut ComponentStore, entity: EntityId) {
        self.remove_all(store, entity);
    }

    fn unlink(&mut self, entity: EntityId, group: &str) {
        if let Some(entities) = self.entities_by_group.get_mut(group) {
            entities.remove(&entity);
            if entities.is_empty() {
                self.entities_by_group.remove(group);
            }
        }
        if let Some(groups) = self.groups_by_entity.get_mut(&entity) {
            groups.remove(group);
            if groups.is_empty() {
                self.groups_by_entity.remove(&entity);
            }
        }
    }
}
