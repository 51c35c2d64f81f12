//! The action-queue state machine.
//!
//! Each scheduled step, every agent carrying Actions + Location + Sprite
//! does exactly one of the following:
//!
//! 1. counts its cooldown down (advancing the scan sweep while looking);
//! 2. finishes a scan by revealing the diamond of cells around it;
//! 3. pops and executes the next queued action.
//!
//! Moves that do not match the agent's facing are split: the move goes back
//! to the front of the queue behind a single rotation step toward it.

use std::collections::{BTreeSet, HashMap};

use cassini_ecs::prelude::*;

use crate::factory::mask_group;

/// Ring radius of the area revealed when a scan completes.
pub const SCAN_RADIUS: i32 = 5;

pub const ACTION_ASPECT: [ComponentKind; 3] = [
    ComponentKind::Actions,
    ComponentKind::Location,
    ComponentKind::Sprite,
];

/// Step every agent's action queue once.
pub fn run_action_system(world: &mut World) -> EcsResult<()> {
    for entity in world.query(&ACTION_ASPECT) {
        if world.is_live(entity) {
            step_agent(world, entity)?;
        }
    }
    Ok(())
}

/// One scheduled step for one agent.
pub fn step_agent(world: &mut World, entity: EntityId) -> EcsResult<()> {
    let Some(mut queue) = world.get::<ActionQueue>(entity).cloned() else {
        return Ok(());
    };

    if queue.cooldown > 0 {
        queue.cooldown -= 1;
        if queue.scan_in_progress {
            queue.scan_angle -= queue.scan_angle_step;
        }
    } else if queue.scan_in_progress {
        let revealed = reveal_diamond(world, entity)?;
        tracing::debug!(entity = ?entity, revealed, "scan complete");
        queue.scan_in_progress = false;
    } else if let Some(action) = queue.actions.pop_front() {
        execute(world, entity, &mut queue, action)?;
    }

    if let Some(slot) = world.get_mut::<ActionQueue>(entity) {
        *slot = queue;
    }
    Ok(())
}

fn execute(
    world: &mut World,
    entity: EntityId,
    queue: &mut ActionQueue,
    action: Action,
) -> EcsResult<()> {
    match action {
        Action::Wait(duration) => queue.cooldown = duration,
        Action::Look(duration) => {
            queue.scan_in_progress = true;
            queue.scan_angle = FULL_TURN;
            queue.scan_angle_step = if duration > 0 {
                FULL_TURN / duration as f32
            } else {
                FULL_TURN
            };
            queue.cooldown = duration;
        }
        Action::Rotate(direction) => {
            face(world, entity, queue, direction);
            queue.cooldown = ROTATE_COOLDOWN;
        }
        Action::Move(direction) if direction != queue.direction => {
            queue.actions.push_front(Action::Move(direction));
            queue
                .actions
                .push_front(Action::Rotate(queue.direction.step_toward(direction)));
        }
        Action::Move(direction) => {
            face(world, entity, queue, direction);
            queue.cooldown = MOVE_COOLDOWN;
            let (dx, dy) = direction.unit();
            let cell = match world.get_mut::<Location>(entity) {
                Some(location) => {
                    location.add_grid(dx, dy);
                    location.grid()
                }
                None => return Ok(()),
            };
            reveal_cells(world, entity, &BTreeSet::from([cell]))?;
        }
        Action::Grab(_)
        | Action::Drop(_)
        | Action::Shoot(_)
        | Action::Tweak(_)
        | Action::Deliver(_) => {
            tracing::warn!(entity = ?entity, action = ?action, "unhandled action");
        }
        Action::Unknown { id, target } => {
            tracing::warn!(entity = ?entity, id, target, "discarding unknown action");
        }
    }
    Ok(())
}

fn face(world: &mut World, entity: EntityId, queue: &mut ActionQueue, direction: Direction) {
    queue.direction = direction;
    if let Some(sprite) = world.get_mut::<Sprite>(entity) {
        sprite.name = direction.sprite_name().to_owned();
    }
}

// ---------------------------------------------------------------------------
// Fog of war
// ---------------------------------------------------------------------------

/// Cells uncovered by a completed scan centred on `center`.
pub fn scan_cells(center: GridPos) -> BTreeSet<GridPos> {
    let mut cells = BTreeSet::new();
    for z in 0..=SCAN_RADIUS {
        let half_width = SCAN_RADIUS - z;
        for x in center.x - half_width..=center.x + half_width {
            for y in center.y - z..=center.y + z {
                cells.insert(GridPos::new(x, y));
            }
        }
    }
    cells
}

fn reveal_diamond(world: &mut World, entity: EntityId) -> EcsResult<usize> {
    let Some(center) = world.get::<Location>(entity).map(Location::grid) else {
        return Ok(0);
    };
    reveal_cells(world, entity, &scan_cells(center))
}

/// Delete `entity`'s fog masks on `cells`. Returns how many were removed.
pub fn reveal_cells(
    world: &mut World,
    entity: EntityId,
    cells: &BTreeSet<GridPos>,
) -> EcsResult<usize> {
    let (Some(location), Some(owner)) = (world.get::<Location>(entity), world.uuid(entity)) else {
        return Ok(0);
    };
    let group = mask_group(&location.context_tag(), owner);

    let mut by_cell: HashMap<GridPos, Vec<EntityId>> = HashMap::new();
    for &mask in world.entities_in_group(&group) {
        if let Some(mask_location) = world.get::<Location>(mask) {
            by_cell.entry(mask_location.grid()).or_default().push(mask);
        }
    }

    let doomed: Vec<EntityId> = cells
        .iter()
        .filter_map(|cell| by_cell.remove(cell))
        .flatten()
        .collect();
    for &mask in &doomed {
        world.delete_entity(mask)?;
    }
    Ok(doomed.len())
}
