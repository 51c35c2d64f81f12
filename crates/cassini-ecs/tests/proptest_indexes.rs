//! Property tests for the index managers.
//!
//! Random sequences of group edits and agent joins/leaves must leave the
//! group index and the viewport grid in a consistent state after every step.

use std::collections::{BTreeSet, HashMap};

use cassini_ecs::component::ComponentStore;
use cassini_ecs::group::GroupIndex;
use cassini_ecs::prelude::*;
use cassini_ecs::viewport::ViewportAllocator;
use proptest::prelude::*;

const GROUPS: [&str; 4] = ["sprites", "all_players", "local_players", "map_mask"];

#[derive(Debug, Clone)]
enum GroupOp {
    Add(u32, usize),
    Remove(u32, usize),
    RemoveAll(u32),
}

fn group_op_strategy() -> impl Strategy<Value = GroupOp> {
    prop_oneof![
        4 => (0..16u32, 0..GROUPS.len()).prop_map(|(e, g)| GroupOp::Add(e, g)),
        3 => (0..16u32, 0..GROUPS.len()).prop_map(|(e, g)| GroupOp::Remove(e, g)),
        1 => (0..16u32).prop_map(GroupOp::RemoveAll),
    ]
}

#[derive(Debug, Clone)]
enum AgentOp {
    Join,
    Leave(usize),
}

fn agent_op_strategy() -> impl Strategy<Value = AgentOp> {
    prop_oneof![
        Just(AgentOp::Join),
        (0..32usize).prop_map(AgentOp::Leave),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn group_maps_stay_inverse(ops in prop::collection::vec(group_op_strategy(), 1..80)) {
        let mut store = ComponentStore::default();
        let mut index = GroupIndex::new();
        let mut model: HashMap<u32, BTreeSet<&str>> = HashMap::new();

        for op in ops {
            match op {
                GroupOp::Add(e, g) => {
                    index.add(&mut store, EntityId::new(e, 0), GROUPS[g]);
                    model.entry(e).or_default().insert(GROUPS[g]);
                }
                GroupOp::Remove(e, g) => {
                    index.remove(&mut store, EntityId::new(e, 0), GROUPS[g]);
                    if let Some(groups) = model.get_mut(&e) {
                        groups.remove(GROUPS[g]);
                    }
                }
                GroupOp::RemoveAll(e) => {
                    index.remove_all(&mut store, EntityId::new(e, 0));
                    model.remove(&e);
                }
            }
            prop_assert!(index.is_consistent());
        }

        for e in 0..16u32 {
            let expected: BTreeSet<String> = model
                .get(&e)
                .map(|gs| gs.iter().map(|g| g.to_string()).collect())
                .unwrap_or_default();
            prop_assert_eq!(index.groups_of(EntityId::new(e, 0)), &expected);
            // The component mirrors the index.
            let component: BTreeSet<String> = store
                .get::<Groups>(EntityId::new(e, 0))
                .map(|c| c.groups.iter().cloned().collect())
                .unwrap_or_default();
            prop_assert_eq!(component, expected);
        }
    }

    #[test]
    fn viewport_grid_always_fits_agents(ops in prop::collection::vec(agent_op_strategy(), 1..120)) {
        let mut alloc = ViewportAllocator::new();
        let mut agents: Vec<EntityId> = Vec::new();
        let mut next = 0u32;

        for op in ops {
            let before = alloc.prev_size();
            let shape_before = alloc.grid();
            match op {
                AgentOp::Join => {
                    let e = EntityId::new(next, 0);
                    next += 1;
                    alloc.on_agent_added(e);
                    agents.push(e);
                }
                AgentOp::Leave(i) => {
                    if agents.is_empty() {
                        continue;
                    }
                    let e = agents.remove(i % agents.len());
                    alloc.on_agent_removed(e);
                    // A leave only reshapes once the count reaches the lower watermark.
                    if alloc.grid() != shape_before {
                        prop_assert!(agents.len() as u32 <= before);
                    }
                }
            }

            let shape = alloc.grid();
            prop_assert!(shape.capacity() as usize >= agents.len());
            prop_assert_eq!(alloc.next_size(), shape.capacity());
            prop_assert!(alloc.prev_size() < alloc.next_size());
            prop_assert!(shape.columns == shape.rows || shape.columns == shape.rows + 1);

            let mut slots: Vec<u32> = agents.iter().filter_map(|&e| alloc.slot_of(e)).collect();
            prop_assert_eq!(slots.len(), agents.len());
            slots.sort_unstable();
            slots.dedup();
            prop_assert_eq!(slots.len(), agents.len());
            prop_assert!(slots.iter().all(|&s| s >= 1 && s <= shape.capacity()));
        }
    }

    #[test]
    fn turning_takes_the_short_arc(c in 0..8i32, t in 0..8i32) {
        let target = Direction::from_index(t).unwrap();
        let mut current = Direction::from_index(c).unwrap();
        let arc = ((t - c).rem_euclid(8)).min((c - t).rem_euclid(8));
        let mut steps = 0;
        while current != target {
            current = current.step_toward(target);
            steps += 1;
            prop_assert!(steps <= 4);
        }
        prop_assert_eq!(steps, arc);
    }

    #[test]
    fn opposite_turn_steps_to_the_next_index(c in 0..8i32) {
        let current = Direction::from_index(c).unwrap();
        let opposite = Direction::from_index((c + 4) % 8).unwrap();
        prop_assert_eq!(
            current.step_toward(opposite),
            Direction::from_index((c + 1) % 8).unwrap()
        );
    }
}
