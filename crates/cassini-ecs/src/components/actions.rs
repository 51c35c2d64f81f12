//! Per-agent action queue: the data side of the action state machine.
//!
//! The queue holds discrete [`Action`]s plus the agent's facing, a cooldown
//! counted in scheduled ticks, the scan state of an in-progress look and the
//! path accumulated by a drag gesture. The machine that consumes it lives in
//! the engine crate.

use std::collections::{HashMap, VecDeque};
use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::entity::EntityId;
use crate::geometry::GridPos;

/// One full scan revolution, in radians.
pub const FULL_TURN: f32 = TAU;

/// Cooldown applied after a single rotation step.
pub const ROTATE_COOLDOWN: i32 = 2;
/// Cooldown applied after a move.
pub const MOVE_COOLDOWN: i32 = 5;
/// Duration of the scan started by tapping an agent.
pub const LOOK_DURATION: i32 = 360;
/// A wait with this duration never times out on its own.
pub const WAIT_FOREVER: i32 = -1;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Eight compass directions, numbered counter-clockwise from east.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum Direction {
    East = 0,
    NorthEast = 1,
    #[default]
    North = 2,
    NorthWest = 3,
    West = 4,
    SouthWest = 5,
    South = 6,
    SouthEast = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::East,
        Direction::NorthEast,
        Direction::North,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::South,
        Direction::SouthEast,
    ];

    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn index(self) -> i32 {
        self as i32
    }

    /// Grid step for one move in this direction.
    pub fn unit(self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::NorthEast => (1, 1),
            Direction::North => (0, 1),
            Direction::NorthWest => (-1, 1),
            Direction::West => (-1, 0),
            Direction::SouthWest => (-1, -1),
            Direction::South => (0, -1),
            Direction::SouthEast => (1, -1),
        }
    }

    /// Direction of the step from `from` to an adjacent `to`, if they differ.
    pub fn between(from: GridPos, to: GridPos) -> Option<Self> {
        let dx = (to.x - from.x).signum();
        let dy = (to.y - from.y).signum();
        Self::ALL.into_iter().find(|d| d.unit() == (dx, dy))
    }

    /// One rotation step from `self` toward `target`, along the shorter arc.
    ///
    /// `delta = -(((8 - c) + t) mod 8)`; a delta in `[-4, 0)` steps to
    /// `c + 1`, so the exactly-opposite tie turns clockwise. Anything else
    /// steps to `c - 1`.
    pub fn step_toward(self, target: Direction) -> Direction {
        let c = self.index();
        let t = target.index();
        let delta = -(((8 - c) + t) % 8);
        let next = if delta < 0 && delta > -5 {
            (c + 1) % 8
        } else {
            (c + 7) % 8
        };
        Self::ALL[next as usize]
    }

    /// Sprite shown for an agent facing this way.
    pub fn sprite_name(self) -> &'static str {
        match self {
            Direction::East => "rover_east",
            Direction::NorthEast => "rover_north_east",
            Direction::North => "rover_north",
            Direction::NorthWest => "rover_north_west",
            Direction::West => "rover_west",
            Direction::SouthWest => "rover_south_west",
            Direction::South => "rover_south",
            Direction::SouthEast => "rover_south_east",
        }
    }
}

impl From<Direction> for i32 {
    fn from(d: Direction) -> i32 {
        d.index()
    }
}

impl TryFrom<i32> for Direction {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Direction::from_index(value).ok_or_else(|| format!("invalid direction {value}"))
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Numeric action ids used by the persisted `{id, target}` record.
pub mod action_id {
    pub const WAIT: i32 = 0;
    pub const LOOK: i32 = 1;
    pub const ROTATE: i32 = 2;
    pub const MOVE: i32 = 3;
    pub const GRAB: i32 = 4;
    pub const DROP: i32 = 5;
    pub const SHOOT: i32 = 6;
    pub const TWEAK: i32 = 7;
    pub const DELIVER: i32 = 8;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ActionRecord", from = "ActionRecord")]
pub enum Action {
    /// Wait this many scheduled ticks.
    Wait(i32),
    /// Scan the surroundings for this many ticks, then reveal.
    Look(i32),
    Rotate(Direction),
    Move(Direction),
    Grab(EntityId),
    Drop(EntityId),
    Shoot(EntityId),
    Tweak(EntityId),
    Deliver(EntityId),
    /// A record whose id (or target) is not understood. Kept so that it can
    /// be reported and discarded by the machine rather than lost on load.
    Unknown { id: i32, target: i64 },
}

/// Wire form of an [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: i32,
    pub target: i64,
}

impl From<ActionRecord> for Action {
    fn from(rec: ActionRecord) -> Self {
        use action_id::*;
        let item = || EntityId::from_raw(rec.target as u64);
        let duration = i32::try_from(rec.target).ok();
        let direction = i32::try_from(rec.target).ok().and_then(Direction::from_index);
        match (rec.id, duration, direction) {
            (WAIT, Some(d), _) => Action::Wait(d),
            (LOOK, Some(d), _) => Action::Look(d),
            (ROTATE, _, Some(dir)) => Action::Rotate(dir),
            (MOVE, _, Some(dir)) => Action::Move(dir),
            (GRAB, ..) => Action::Grab(item()),
            (DROP, ..) => Action::Drop(item()),
            (SHOOT, ..) => Action::Shoot(item()),
            (TWEAK, ..) => Action::Tweak(item()),
            (DELIVER, ..) => Action::Deliver(item()),
            _ => Action::Unknown {
                id: rec.id,
                target: rec.target,
            },
        }
    }
}

impl From<Action> for ActionRecord {
    fn from(action: Action) -> Self {
        use action_id::*;
        let (id, target) = match action {
            Action::Wait(d) => (WAIT, d as i64),
            Action::Look(d) => (LOOK, d as i64),
            Action::Rotate(dir) => (ROTATE, dir.index() as i64),
            Action::Move(dir) => (MOVE, dir.index() as i64),
            Action::Grab(e) => (GRAB, e.to_raw() as i64),
            Action::Drop(e) => (DROP, e.to_raw() as i64),
            Action::Shoot(e) => (SHOOT, e.to_raw() as i64),
            Action::Tweak(e) => (TWEAK, e.to_raw() as i64),
            Action::Deliver(e) => (DELIVER, e.to_raw() as i64),
            Action::Unknown { id, target } => (id, target),
        };
        ActionRecord { id, target }
    }
}

impl Action {
    /// The entity this action refers to, for item actions.
    pub fn item_mut(&mut self) -> Option<&mut EntityId> {
        match self {
            Action::Grab(e)
            | Action::Drop(e)
            | Action::Shoot(e)
            | Action::Tweak(e)
            | Action::Deliver(e) => Some(e),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ActionQueue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActionQueue {
    #[serde(rename = "events")]
    pub actions: VecDeque<Action>,
    pub direction: Direction,
    /// Scheduled ticks before the next action may run.
    #[serde(rename = "nextEvent")]
    pub cooldown: i32,
    pub scan_in_progress: bool,
    pub scan_angle: f32,
    pub scan_angle_step: f32,
    pub move_path: Vec<GridPos>,
}

impl Default for ActionQueue {
    fn default() -> Self {
        Self {
            actions: VecDeque::new(),
            direction: Direction::North,
            cooldown: 0,
            scan_in_progress: false,
            scan_angle: FULL_TURN,
            scan_angle_step: 0.0,
            move_path: Vec::new(),
        }
    }
}

impl ActionQueue {
    pub fn push(&mut self, action: Action) {
        self.actions.push_back(action);
    }

    pub fn is_idle(&self) -> bool {
        self.cooldown == 0 && !self.scan_in_progress
    }

    /// Rewrite item references after a restore.
    pub fn remap_items(&mut self, ids: &HashMap<u64, EntityId>) {
        for action in &mut self.actions {
            if let Some(item) = action.item_mut() {
                if let Some(&new_id) = ids.get(&item.to_raw()) {
                    *item = new_id;
                }
            }
        }
    }

    /// Convert the accumulated move path into one move per consecutive pair
    /// and clear the path. Repeated cells produce no move.
    pub fn commit_path(&mut self) -> usize {
        let mut added = 0;
        for pair in self.move_path.windows(2) {
            if let Some(dir) = Direction::between(pair[0], pair[1]) {
                self.actions.push_back(Action::Move(dir));
                added += 1;
            }
        }
        self.move_path.clear();
        added
    }
}
