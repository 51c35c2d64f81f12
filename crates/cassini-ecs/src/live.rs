//! Registry of entities that are in the simulated world.
//!
//! Iteration order is insertion order, so aspect queries and saves visit
//! entities deterministically.

use std::collections::HashSet;

use crate::entity::EntityId;

#[derive(Debug, Default, Clone)]
pub struct LiveRegistry {
    order: Vec<EntityId>,
    members: HashSet<EntityId>,
}

impl LiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the entity was already live.
    pub fn insert(&mut self, entity: EntityId) -> bool {
        if !self.members.insert(entity) {
            return false;
        }
        self.order.push(entity);
        true
    }

    pub fn remove(&mut self, entity: EntityId) -> bool {
        if !self.members.remove(&entity) {
            return false;
        }
        self.order.retain(|e| *e != entity);
        true
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.members.contains(&entity)
    }

    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.order.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn to_vec(&self) -> Vec<EntityId> {
        self.order.clone()
    }
}
