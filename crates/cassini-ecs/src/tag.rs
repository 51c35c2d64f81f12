//! Tag and type index over [`Property`] components.
//!
//! A tag names at most one entity (last registration wins). An entity sits in
//! exactly one type bucket at a time, the one matching its property's
//! [`ItemType`].

use std::collections::{BTreeSet, HashMap};

use crate::component::ComponentStore;
use crate::components::{ItemType, Property};
use crate::entity::EntityId;

static NO_ENTITIES: BTreeSet<EntityId> = BTreeSet::new();

#[derive(Debug, Default)]
pub struct TagIndex {
    by_tag: HashMap<String, EntityId>,
    tag_of: HashMap<EntityId, String>,
    by_type: HashMap<ItemType, BTreeSet<EntityId>>,
    type_of: HashMap<EntityId, ItemType>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `entity` under `tag`, taking the tag from any previous holder
    /// and releasing the entity's previous tag. An empty tag clears it.
    pub fn set_tag(&mut self, entity: EntityId, tag: &str) {
        if tag.is_empty() {
            self.clear_tag(entity);
            return;
        }
        if self.tag_of.get(&entity).is_some_and(|t| t == tag) {
            return;
        }
        self.clear_tag(entity);
        if let Some(previous) = self.by_tag.insert(tag.to_owned(), entity) {
            self.tag_of.remove(&previous);
        }
        self.tag_of.insert(entity, tag.to_owned());
    }

    pub fn entity_by_tag(&self, tag: &str) -> Option<EntityId> {
        self.by_tag.get(tag).copied()
    }

    pub fn tag_of(&self, entity: EntityId) -> Option<&str> {
        self.tag_of.get(&entity).map(String::as_str)
    }

    pub fn set_type(&mut self, entity: EntityId, item_type: ItemType) {
        if let Some(old) = self.type_of.insert(entity, item_type) {
            if old == item_type {
                return;
            }
            self.unlink_type(entity, old);
        }
        self.by_type.entry(item_type).or_default().insert(entity);
    }

    pub fn entities_of_type(&self, item_type: ItemType) -> &BTreeSet<EntityId> {
        self.by_type.get(&item_type).unwrap_or(&NO_ENTITIES)
    }

    pub fn type_of(&self, entity: EntityId) -> Option<ItemType> {
        self.type_of.get(&entity).copied()
    }

    /// Forget every tag and type registration of `entity`.
    pub fn forget(&mut self, entity: EntityId) {
        self.clear_tag(entity);
        if let Some(old) = self.type_of.remove(&entity) {
            self.unlink_type(entity, old);
        }
    }

    // -- lifecycle -------------------------------------------------------------

    pub(crate) fn on_added(&mut self, store: &ComponentStore, entity: EntityId) {
        self.sync(store, entity);
    }

    pub(crate) fn on_changed(&mut self, store: &ComponentStore, entity: EntityId) {
        self.sync(store, entity);
    }

    pub(crate) fn on_deleted(&mut self, entity: EntityId) {
        self.forget(entity);
    }

    fn sync(&mut self, store: &ComponentStore, entity: EntityId) {
        match store.get::<Property>(entity) {
            Some(property) => {
                self.set_tag(entity, &property.tag);
                self.set_type(entity, property.item_type);
            }
            None => self.forget(entity),
        }
    }

    fn clear_tag(&mut self, entity: EntityId) {
        if let Some(tag) = self.tag_of.remove(&entity) {
            if self.by_tag.get(&tag) == Some(&entity) {
                self.by_tag.remove(&tag);
            }
        }
    }

    fn unlink_type(&mut self, entity: EntityId, item_type: ItemType) {
        if let Some(bucket) = self.by_type.get_mut(&item_type) {
            bucket.remove(&entity);
            if bucket.is_empty() {
                self.by_type.remove(&item_type);
            }
        }
    }
}
