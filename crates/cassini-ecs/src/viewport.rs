//! Screen partitioning among camera-bearing agents.
//!
//! Agents get dense integer slots starting at 1. The screen is split into a
//! `columns x rows` grid that grows one dimension at a time as agents join
//! (columns first, then rows to match) and shrinks, largest dimension first,
//! once the agent count falls to the capacity of the next smaller shape.
//!
//! Two watermarks gate reshaping: `next_size` is the capacity of the current
//! grid and `prev_size` the capacity of the shape one step smaller. Slot `n`
//! sits at column `(n-1) % columns`, counted in rows from the top.

use std::collections::{BTreeMap, HashMap};

use crate::component::ComponentStore;
use crate::components::{Camera, Viewport};
use crate::entity::EntityId;

/// Current grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub columns: u32,
    pub rows: u32,
}

impl GridShape {
    pub fn capacity(self) -> u32 {
        self.columns * self.rows
    }
}

#[derive(Debug, Clone)]
pub struct ViewportAllocator {
    size_x: u32,
    size_y: u32,
    prev_size: u32,
    next_size: u32,
    slots: BTreeMap<u32, EntityId>,
    slot_of: HashMap<EntityId, u32>,
}

impl Default for ViewportAllocator {
    fn default() -> Self {
        Self {
            size_x: 1,
            size_y: 1,
            prev_size: 0,
            next_size: 1,
            slots: BTreeMap::new(),
            slot_of: HashMap::new(),
        }
    }
}

impl ViewportAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `entity` the first free slot and grow the grid if needed.
    /// Returns the entity's slot; re-adding an entity keeps its slot.
    pub fn on_agent_added(&mut self, entity: EntityId) -> u32 {
        if let Some(&slot) = self.slot_of.get(&entity) {
            return slot;
        }
        let slot = self.find_free_slot();
        self.slots.insert(slot, entity);
        self.slot_of.insert(entity, slot);
        self.rebalance();
        self.slot_of.get(&entity).copied().unwrap_or(slot)
    }

    /// Release `entity`'s slot and shrink the grid if needed.
    pub fn on_agent_removed(&mut self, entity: EntityId) -> bool {
        let Some(slot) = self.slot_of.remove(&entity) else {
            return false;
        };
        self.slots.remove(&slot);
        self.rebalance();
        true
    }

    pub fn slot_of(&self, entity: EntityId) -> Option<u32> {
        self.slot_of.get(&entity).copied()
    }

    pub fn entity_in_slot(&self, slot: u32) -> Option<EntityId> {
        self.slots.get(&slot).copied()
    }

    pub fn grid(&self) -> GridShape {
        GridShape {
            columns: self.size_x,
            rows: self.size_y,
        }
    }

    pub fn prev_size(&self) -> u32 {
        self.prev_size
    }

    pub fn next_size(&self) -> u32 {
        self.next_size
    }

    pub fn agent_count(&self) -> usize {
        self.slots.len()
    }

    /// Screen rectangle of `slot` on a `width x height` screen, y-up.
    pub fn rect(&self, slot: u32, screen_width: u32, screen_height: u32) -> Viewport {
        let width = (screen_width / self.size_x) as i32;
        let height = (screen_height / self.size_y) as i32;
        let n = slot.max(1) - 1;
        let column = (n % self.size_x) as i32;
        let row = self.size_y as i32 - 1 - (n / self.size_x) as i32;
        Viewport {
            x: column * width,
            y: row * height,
            width,
            height,
        }
    }

    /// Write every slotted agent's viewport rectangle and refit its cameras
    /// to the new size, keeping their focus.
    pub fn recompute_layout(&self, store: &mut ComponentStore, screen_width: u32, screen_height: u32) {
        for (&slot, &entity) in &self.slots {
            let rect = self.rect(slot, screen_width, screen_height);
            if let Some(viewport) = store.get_mut::<Viewport>(entity) {
                *viewport = rect;
            }
            if let Some(camera) = store.get_mut::<Camera>(entity) {
                camera.fit(rect.width as f32, rect.height as f32);
            }
        }
    }

    fn find_free_slot(&self) -> u32 {
        let len = self.slots.len() as u32;
        (1..=len)
            .find(|slot| !self.slots.contains_key(slot))
            .unwrap_or(len + 1)
    }

    fn rebalance(&mut self) {
        let count = self.slots.len() as u32;

        let mut shrunk = false;
        while self.prev_size > 0 && count <= self.prev_size {
            self.next_size = self.prev_size;
            if self.size_x > self.size_y {
                self.size_x -= 1;
                self.prev_size = self.size_x * (self.size_y - 1);
            } else {
                self.size_y -= 1;
                self.prev_size = self.size_y * (self.size_x - 1);
            }
            shrunk = true;
        }

        while count > self.next_size {
            if self.size_x == self.size_y {
                self.size_x += 1;
            } else {
                self.size_y += 1;
            }
            self.prev_size = self.next_size;
            self.next_size = self.size_x * self.size_y;
            tracing::debug!(
                columns = self.size_x,
                rows = self.size_y,
                agents = count,
                "viewport grid grew"
            );
        }

        if shrunk {
            tracing::debug!(
                columns = self.size_x,
                rows = self.size_y,
                agents = count,
                "viewport grid shrank"
            );
            self.renumber();
        }

        debug_assert_eq!(self.next_size, self.size_x * self.size_y);
        debug_assert!(self.next_size >= count);
    }

    /// Pack slots densely from 1, keeping their relative order.
    fn renumber(&mut self) {
        let ordered: Vec<EntityId> = self.slots.values().copied().collect();
        self.slots.clear();
        for (i, entity) in ordered.into_iter().enumerate() {
            let slot = i as u32 + 1;
            self.slots.insert(slot, entity);
            self.slot_of.insert(entity, slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(i: u32) -> EntityId {
        EntityId::new(i, 0)
    }

    fn shape(alloc: &ViewportAllocator) -> (u32, u32) {
        (alloc.grid().columns, alloc.grid().rows)
    }

    #[test]
    fn single_agent_fills_screen() {
        let mut alloc = ViewportAllocator::new();
        assert_eq!(alloc.on_agent_added(e(0)), 1);
        assert_eq!(shape(&alloc), (1, 1));
        assert_eq!(
            alloc.rect(1, 800, 480),
            Viewport { x: 0, y: 0, width: 800, height: 480 }
        );
    }

    #[test]
    fn grows_columns_then_rows() {
        let mut alloc = ViewportAllocator::new();
        let mut shapes = Vec::new();
        for i in 0..4 {
            alloc.on_agent_added(e(i));
            shapes.push(shape(&alloc));
        }
        assert_eq!(shapes, vec![(1, 1), (2, 1), (2, 2), (2, 2)]);
        assert_eq!((alloc.prev_size(), alloc.next_size()), (2, 4));
        assert_eq!(alloc.slot_of(e(3)), Some(4));
    }

    #[test]
    fn shrink_waits_for_prev_watermark() {
        let mut alloc = ViewportAllocator::new();
        for i in 0..4 {
            alloc.on_agent_added(e(i));
        }
        alloc.on_agent_removed(e(0));
        assert_eq!(shape(&alloc), (2, 2));
        alloc.on_agent_removed(e(1));
        assert_eq!(shape(&alloc), (2, 1));
        // Remaining agents are packed into slots 1 and 2, order kept.
        assert_eq!(alloc.slot_of(e(2)), Some(1));
        assert_eq!(alloc.slot_of(e(3)), Some(2));
        alloc.on_agent_removed(e(2));
        alloc.on_agent_removed(e(3));
        assert_eq!(shape(&alloc), (1, 1));
        assert_eq!(alloc.prev_size(), 0);
    }

    #[test]
    fn freed_slot_is_reused_first() {
        let mut alloc = ViewportAllocator::new();
        for i in 0..4 {
            alloc.on_agent_added(e(i));
        }
        alloc.on_agent_removed(e(1));
        assert_eq!(alloc.on_agent_added(e(9)), 2);
    }

    #[test]
    fn slot_rect_counts_rows_from_top() {
        let mut alloc = ViewportAllocator::new();
        for i in 0..4 {
            alloc.on_agent_added(e(i));
        }
        assert_eq!(
            alloc.rect(1, 800, 480),
            Viewport { x: 0, y: 240, width: 400, height: 240 }
        );
        assert_eq!(
            alloc.rect(4, 800, 480),
            Viewport { x: 400, y: 0, width: 400, height: 240 }
        );
    }

    #[test]
    fn layout_refits_cameras_keeping_focus() {
        let mut store = ComponentStore::default();
        let mut alloc = ViewportAllocator::new();
        for i in 0..2 {
            let mut camera = Camera::new(800.0, 480.0);
            camera.set_world_position(50.0, 60.0);
            store.insert(e(i), camera);
            store.insert(e(i), Viewport::default());
            alloc.on_agent_added(e(i));
        }
        alloc.recompute_layout(&mut store, 800, 480);
        let vp = store.get::<Viewport>(e(1)).copied();
        assert_eq!(vp, Some(Viewport { x: 400, y: 0, width: 400, height: 480 }));
        let cam = store.get::<Camera>(e(1)).map(|c| c.world.clone());
        assert_eq!(cam.as_ref().map(|c| c.viewport_width), Some(400.0));
        assert_eq!(cam.map(|c| (c.position.x, c.position.y)), Some((50.0, 60.0)));
    }
}
