//! Entity identifiers, allocation and UUID assignment.
//!
//! An [`EntityId`] is a 64-bit handle that packs a *generation* counter in the
//! high 32 bits and an *index* in the low 32 bits. The generation is bumped
//! every time an index is recycled, so a handle kept past deletion is detected
//! as stale instead of silently aliasing a newer entity.
//!
//! Every entity also carries a [`Uuid`] drawn from a seeded [`UuidSource`].
//! UUIDs are the identity that survives persistence (entity ids are renumbered
//! on restore), and ownership-scoped group names are built from them.

use std::collections::VecDeque;
use std::fmt;

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A generational entity identifier.
///
/// Layout: `[generation: u32 | index: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    #[inline]
    pub fn new(index: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | index as u64)
    }

    /// The index portion (low 32 bits). Component tables are keyed by it.
    #[inline]
    pub fn index(self) -> u32 {
        self.0 as u32
    }

    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Raw `u64` representation, as written to save documents (`oldId`).
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    generation: u32,
    occupied: bool,
}

/// Hands out [`EntityId`]s and recycles the indices of deleted entities.
///
/// Released indices are reused oldest first.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    slots: Vec<Slot>,
    released: VecDeque<u32>,
    occupied: usize,
}

impl EntityAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> EntityId {
        self.occupied += 1;
        match self.released.pop_front() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.occupied = true;
                EntityId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    occupied: true,
                });
                EntityId::new(index, 0)
            }
        }
    }

    /// Free `id`'s index for reuse under the next generation. Returns false
    /// for a handle that is stale or already freed.
    pub fn deallocate(&mut self, id: EntityId) -> bool {
        if !self.is_alive(id) {
            return false;
        }
        let slot = &mut self.slots[id.index() as usize];
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.released.push_back(id.index());
        self.occupied -= 1;
        true
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slots
            .get(id.index() as usize)
            .is_some_and(|slot| slot.occupied && slot.generation == id.generation())
    }

    pub fn alive_count(&self) -> usize {
        self.occupied
    }
}

// ---------------------------------------------------------------------------
// UuidSource
// ---------------------------------------------------------------------------

/// Deterministic UUID generator.
///
/// Produces RFC 4122 version-4 UUIDs from a seeded PCG stream, so two worlds
/// built from the same seed hand out identical UUID sequences.
#[derive(Debug, Clone)]
pub struct UuidSource {
    rng: Pcg64,
}

impl UuidSource {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    pub fn next_uuid(&mut self) -> Uuid {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}

impl Default for UuidSource {
    fn default() -> Self {
        Self::from_seed(0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- allocator -----------------------------------------------------------

    #[test]
    fn fresh_ids_use_new_indices() {
        let mut alloc = EntityAllocator::new();
        let ids: Vec<EntityId> = (0..5).map(|_| alloc.allocate()).collect();
        assert_eq!(
            ids.iter().map(|id| id.index()).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        assert!(ids.iter().all(|id| id.generation() == 0));
        assert_eq!(alloc.alive_count(), 5);
    }

    #[test]
    fn reused_index_gets_next_generation() {
        let mut alloc = EntityAllocator::new();
        let mask = alloc.allocate();
        assert!(alloc.deallocate(mask));
        let next = alloc.allocate();
        assert_eq!((next.index(), next.generation()), (mask.index(), 1));
        assert!(!alloc.is_alive(mask));
        assert!(alloc.is_alive(next));
    }

    #[test]
    fn released_indices_are_reused_oldest_first() {
        let mut alloc = EntityAllocator::new();
        let first = alloc.allocate();
        let second = alloc.allocate();
        alloc.deallocate(second);
        alloc.deallocate(first);
        assert_eq!(alloc.allocate().index(), second.index());
        assert_eq!(alloc.allocate().index(), first.index());
    }

    #[test]
    fn freeing_twice_is_rejected() {
        let mut alloc = EntityAllocator::new();
        let e = alloc.allocate();
        assert!(alloc.deallocate(e));
        assert!(!alloc.deallocate(e));
        assert!(!alloc.deallocate(EntityId::new(99, 0)));
        assert_eq!(alloc.alive_count(), 0);
    }

    #[test]
    fn raw_form_keeps_both_halves() {
        let id = EntityId::new(42, 7);
        assert_eq!(EntityId::from_raw(id.to_raw()), id);
        assert_eq!(id.to_raw(), (7u64 << 32) | 42);
        assert_eq!(format!("{id:?}"), "EntityId(42v7)");
    }

    // -- uuid source ----------------------------------------------------------

    #[test]
    fn same_seed_same_uuids() {
        let mut a = UuidSource::from_seed(99);
        let mut b = UuidSource::from_seed(99);
        for _ in 0..10 {
            assert_eq!(a.next_uuid(), b.next_uuid());
        }
    }

    #[test]
    fn uuids_are_version_4_and_distinct() {
        let mut src = UuidSource::from_seed(1);
        let a = src.next_uuid();
        let b = src.next_uuid();
        assert_ne!(a, b);
        assert_eq!(a.get_version_num(), 4);
    }
}
