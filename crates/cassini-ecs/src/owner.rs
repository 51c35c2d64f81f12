//! Ownership index: keeps an owned entity in its owner's private group.
//!
//! An [`Owner`] component names an owner by UUID and a group prefix; the
//! entity belongs to `prefix + owner_uuid`. Whenever the component is added
//! or changes, the entity leaves the group it was previously placed in
//! (including the pre-restore name built from the remembered old UUID) and
//! joins the current one.

use std::collections::HashMap;

use uuid::Uuid;

use crate::component::ComponentStore;
use crate::components::Owner;
use crate::entity::EntityId;
use crate::group::GroupIndex;

#[derive(Debug, Default)]
pub struct OwnerIndex {
    effective: HashMap<EntityId, String>,
}

impl OwnerIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// The ownership group `entity` is currently placed in.
    pub fn group_of(&self, entity: EntityId) -> Option<&str> {
        self.effective.get(&entity).map(String::as_str)
    }

    pub(crate) fn on_added(
        &mut self,
        store: &mut ComponentStore,
        groups: &mut GroupIndex,
        entity: EntityId,
        uuid: Option<Uuid>,
    ) {
        self.sync(store, groups, entity, uuid);
    }

    pub(crate) fn on_changed(
        &mut self,
        store: &mut ComponentStore,
        groups: &mut GroupIndex,
        entity: EntityId,
        uuid: Option<Uuid>,
    ) {
        self.sync(store, groups, entity, uuid);
    }

    pub(crate) fn on_deleted(&mut self, entity: EntityId) {
        self.effective.remove(&entity);
    }

    fn sync(
        &mut self,
        store: &mut ComponentStore,
        groups: &mut GroupIndex,
        entity: EntityId,
        uuid: Option<Uuid>,
    ) {
        let Some(owner) = store.get_mut::<Owner>(entity) else {
            // Ownership was removed; leave the group it implied.
            if let Some(old) = self.effective.remove(&entity) {
                groups.remove(store, entity, &old);
            }
            return;
        };

        if uuid.is_some() {
            owner.my_uuid = uuid;
        }
        let current = owner.effective_group();
        let mut stale: Vec<String> = owner.previous_group().into_iter().collect();
        if let Some(old) = self.effective.get(&entity) {
            stale.push(old.clone());
        }

        for name in stale.iter().filter(|name| **name != current) {
            groups.remove(store, entity, name);
        }
        groups.add(store, entity, &current);
        self.effective.insert(entity, current);
    }
}
