//! Arena-style storage for one component type.
//!
//! A [`ComponentTable`] is a dense `Vec` indexed by [`EntityId::index`]. Each
//! occupied slot remembers the generation it was written for, so a stale
//! handle reads as "no component" instead of seeing a recycled entity's data.

use crate::entity::EntityId;

#[derive(Debug, Clone)]
pub struct ComponentTable<T> {
    slots: Vec<Option<(u32, T)>>,
    len: usize,
}

impl<T> Default for ComponentTable<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
        }
    }
}

impl<T> ComponentTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` for `entity`, returning the value it replaced.
    pub fn insert(&mut self, entity: EntityId, value: T) -> Option<T> {
        let idx = entity.index() as usize;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        let previous = self.slots[idx].replace((entity.generation(), value));
        match previous {
            Some((generation, old)) if generation == entity.generation() => Some(old),
            Some(_) => None,
            None => {
                self.len += 1;
                None
            }
        }
    }

    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        let slot = self.slots.get_mut(entity.index() as usize)?;
        match slot {
            Some((generation, _)) if *generation == entity.generation() => {
                self.len -= 1;
                slot.take().map(|(_, value)| value)
            }
            _ => None,
        }
    }

    pub fn get(&self, entity: EntityId) -> Option<&T> {
        match self.slots.get(entity.index() as usize)? {
            Some((generation, value)) if *generation == entity.generation() => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        match self.slots.get_mut(entity.index() as usize)? {
            Some((generation, value)) if *generation == entity.generation() => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.get(entity).is_some()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
