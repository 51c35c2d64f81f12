//! Pointer and keyboard gestures.
//!
//! Input arrives in two halves. The [`InputRouter`] receives normalized
//! device signals between ticks and records them on the [`InputState`] of
//! every agent whose viewport contains the pointer. The input system then
//! turns the recorded state into camera pans, zooms and queued actions once
//! per tick:
//!
//! - a tap on the agent's own cell queues a look;
//! - a drag that starts on the agent traces a path of adjacent cells, and
//!   releasing it queues one move per step;
//! - any other drag pans the camera.
//!
//! The keyboard drives the same gestures: the centre key starts and
//! finishes a path at the agent and the arrow keys extend it one cell per
//! key repeat. Outside a gesture the arrow keys pan.

use cassini_ecs::prelude::*;

use crate::config::SimConfig;

/// Components an agent needs to take part in gestures.
pub const INPUT_ASPECT: [ComponentKind; 5] = [
    ComponentKind::Camera,
    ComponentKind::Actions,
    ComponentKind::Location,
    ComponentKind::Input,
    ComponentKind::Viewport,
];

/// Two cells are adjacent (orthogonally or diagonally) below this distance.
const ADJACENT_DISTANCE: f32 = 1.42;

// ---------------------------------------------------------------------------
// Signals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    /// Starts or finishes a keyboard path.
    Center,
    /// Zoom in.
    Plus,
    /// Zoom out.
    Minus,
    /// Zoom reset.
    Zero,
}

/// A normalized input event. Pointer coordinates are y-down screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSignal {
    KeyDown(Key),
    KeyUp(Key),
    TouchDown { x: i32, y: i32 },
    TouchUp { x: i32, y: i32 },
    TouchDragged { x: i32, y: i32 },
    MouseMoved { x: i32, y: i32 },
    Scrolled(i32),
}

// ---------------------------------------------------------------------------
// InputRouter
// ---------------------------------------------------------------------------

/// Routes signals to the agents under the pointer.
#[derive(Debug, Clone)]
pub struct InputRouter {
    last_move: (i32, i32),
    drag_limit: f32,
}

impl InputRouter {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            last_move: (0, 0),
            drag_limit: config.drag_limit,
        }
    }

    /// Last known pointer position.
    pub fn pointer(&self) -> (i32, i32) {
        self.last_move
    }

    /// Record `signal` on every agent it concerns. Returns whether any agent
    /// took it.
    pub fn dispatch(&mut self, world: &mut World, signal: InputSignal) -> bool {
        let (_, screen_height) = world.screen_size();
        let point = match signal {
            InputSignal::TouchDown { x, y }
            | InputSignal::TouchUp { x, y }
            | InputSignal::TouchDragged { x, y } => (x, y),
            InputSignal::MouseMoved { x, y } => {
                self.last_move = (x, y);
                return false;
            }
            InputSignal::KeyDown(_) | InputSignal::KeyUp(_) | InputSignal::Scrolled(_) => {
                self.last_move
            }
        };

        let mut consumed = false;
        for entity in world.query(&INPUT_ASPECT) {
            let Some(viewport) = world.get::<Viewport>(entity).copied() else {
                continue;
            };
            if !viewport.contains(point.0, point.1, screen_height) {
                continue;
            }
            let camera = world.get::<Camera>(entity).map(|c| c.world.clone());
            let Some(input) = world.get_mut::<InputState>(entity) else {
                continue;
            };
            self.record(input, signal, camera.as_ref(), &viewport, screen_height);
            consumed = true;
        }

        if let InputSignal::TouchDown { x, y }
        | InputSignal::TouchUp { x, y }
        | InputSignal::TouchDragged { x, y } = signal
        {
            self.last_move = (x, y);
        }
        consumed
    }

    fn record(
        &self,
        input: &mut InputState,
        signal: InputSignal,
        camera: Option<&OrthoCamera>,
        viewport: &Viewport,
        screen_height: u32,
    ) {
        match signal {
            InputSignal::KeyDown(key) => match key {
                Key::Left => {
                    input.key_repeat_force = !input.key_left;
                    input.key_left = true;
                }
                Key::Right => {
                    input.key_repeat_force = !input.key_right;
                    input.key_right = true;
                }
                Key::Up => {
                    input.key_repeat_force = !input.key_up;
                    input.key_up = true;
                }
                Key::Down => {
                    input.key_repeat_force = !input.key_down;
                    input.key_down = true;
                }
                // The centre key acts on release.
                Key::Center => input.key_center = false,
                Key::Plus => input.key_plus = true,
                Key::Minus => input.key_minus = true,
                Key::Zero => input.key_zero = true,
            },
            InputSignal::KeyUp(key) => match key {
                Key::Left => input.key_left = false,
                Key::Right => input.key_right = false,
                Key::Up => input.key_up = false,
                Key::Down => input.key_down = false,
                Key::Center => input.key_center = true,
                Key::Plus => input.key_plus = false,
                Key::Minus => input.key_minus = false,
                Key::Zero => input.key_zero = false,
            },
            InputSignal::TouchDown { x, y } => {
                if !input.new_down && !input.new_drag {
                    input.last_down_pos = Vec3::new(x as f32, y as f32, 0.0);
                    input.new_down = true;
                }
            }
            InputSignal::TouchUp { x, y } => {
                if !input.new_up && !input.new_key_down {
                    input.last_up_pos = Vec3::new(x as f32, y as f32, 0.0);
                    input.new_up = true;
                }
            }
            InputSignal::TouchDragged { x, y } => {
                if !input.new_drag && !input.new_key_down {
                    let limit = self.drag_limit;
                    // Horizontal delta is reversed so the world follows the finger.
                    input.last_drag_delta = Vec3::new(
                        (self.last_move.0 - x) as f32,
                        (y - self.last_move.1) as f32,
                        0.0,
                    );
                    input.last_drag_delta.x = input.last_drag_delta.x.clamp(-limit, limit);
                    input.last_drag_delta.y = input.last_drag_delta.y.clamp(-limit, limit);
                    let screen = Vec3::new(x as f32, y as f32, 0.0);
                    input.last_drag_pos = match camera {
                        Some(camera) => camera.unproject(screen, viewport, screen_height),
                        None => screen,
                    };
                    input.new_drag = true;
                }
            }
            InputSignal::Scrolled(amount) => {
                input.zoom_value = amount;
                input.new_zoom = true;
            }
            InputSignal::MouseMoved { .. } => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Input system
// ---------------------------------------------------------------------------

/// Resolve the recorded input of every agent. `delta` is the tick length in
/// seconds and drives key repeat.
pub fn run_input_system(world: &mut World, config: &SimConfig, delta: f32) {
    let (_, screen_height) = world.screen_size();
    for entity in world.query(&INPUT_ASPECT) {
        let (Some(camera), Some(queue), Some(location), Some(input), Some(viewport)) = (
            world.get::<Camera>(entity).cloned(),
            world.get::<ActionQueue>(entity).cloned(),
            world.get::<Location>(entity).cloned(),
            world.get::<InputState>(entity).cloned(),
            world.get::<Viewport>(entity).copied(),
        ) else {
            continue;
        };

        let mut gesture = Gesture {
            entity,
            camera,
            queue,
            location,
            input,
            viewport,
            screen_height,
        };
        gesture.process(config, delta);

        let Gesture {
            camera,
            queue,
            input,
            ..
        } = gesture;
        if let Some(slot) = world.get_mut::<Camera>(entity) {
            *slot = camera;
        }
        if let Some(slot) = world.get_mut::<ActionQueue>(entity) {
            *slot = queue;
        }
        if let Some(slot) = world.get_mut::<InputState>(entity) {
            *slot = input;
        }
    }
}

/// Working copy of one agent's input-related components.
struct Gesture {
    entity: EntityId,
    camera: Camera,
    queue: ActionQueue,
    location: Location,
    input: InputState,
    viewport: Viewport,
    screen_height: u32,
}

impl Gesture {
    fn process(&mut self, config: &SimConfig, delta: f32) {
        self.handle_keyboard(config, delta);

        // A press that traced a path is never a tap, even when the camera
        // followed it back onto the starting point.
        let input = &self.input;
        if input.new_down
            && input.new_up
            && self.queue.move_path.len() <= 1
            && input
                .last_down_pos
                .approx_eq_2d(input.last_up_pos, config.touch_sensitivity)
        {
            self.handle_tap();
            self.end_press();
        } else if input.new_drag && !input.new_up {
            self.handle_drag();
            self.input.new_drag = false;
        } else if input.new_up {
            self.handle_up();
            self.end_press();
        }

        if self.input.new_zoom {
            self.handle_zoom(config);
            self.input.new_zoom = false;
        }
    }

    fn end_press(&mut self) {
        self.input.new_key_down = false;
        self.input.new_down = false;
        self.input.new_up = false;
    }

    /// Centre of the agent's own cell in world units.
    fn own_center(&self) -> Vec3 {
        self.cell_center(self.location.grid())
    }

    fn cell_center(&self, cell: GridPos) -> Vec3 {
        let level = self.location.grid_to_level(cell);
        let offset = self.location.offset_center();
        Vec3::new(level.x + offset.x, level.y + offset.y, 0.0)
    }

    fn project(&self, world: Vec3) -> Vec3 {
        self.camera
            .world
            .project(world, &self.viewport, self.screen_height)
    }

    fn unproject(&self, screen: Vec3) -> Vec3 {
        self.camera
            .world
            .unproject(screen, &self.viewport, self.screen_height)
    }

    fn handle_keyboard(&mut self, config: &SimConfig, delta: f32) {
        // 1. Key repeat timing.
        let input = &mut self.input;
        input.key_repeat_accumulator += delta;
        if input.key_repeat_accumulator >= input.key_repeat_interval || input.key_repeat_force {
            input.key_repeat_accumulator -= input.key_repeat_interval;
            input.key_repeat = true;
            input.key_repeat_force = false;
        } else {
            input.key_repeat = false;
        }

        // 2. Centre key starts or finishes a keyboard path.
        if self.input.key_center {
            if !self.input.new_down && !self.input.new_key_down && self.queue.actions.is_empty() {
                let center = self.own_center();
                self.camera.set_world_position(center.x, center.y);
                self.input.last_down_pos = self.project(center);
                self.input.new_down = true;
                self.input.new_key_down = true;
            } else if self.input.new_down && self.input.new_key_down {
                let end = match self.queue.move_path.last() {
                    Some(&last) if self.queue.move_path.len() > 1 => self.cell_center(last),
                    _ => self.own_center(),
                };
                self.input.last_up_pos = self.project(end);
                self.input.new_up = true;
                self.input.new_key_down = false;
            }
            self.input.key_center = false;
        }

        // 3. Arrows extend the path during a keyboard gesture, pan otherwise.
        if self.input.any_arrow() && self.input.new_key_down {
            self.extend_keyboard_path();
            self.input.new_drag = true;
        } else if self.input.any_arrow() && !self.input.new_down {
            let step = config.keyboard_pan_step;
            let input = &mut self.input;
            let delta = &mut input.last_drag_delta;
            if input.key_left {
                delta.x = -step;
            } else if delta.x < 0.0 {
                delta.x = 0.0;
            }
            if input.key_right {
                delta.x = step;
            } else if delta.x > 0.0 {
                delta.x = 0.0;
            }
            if input.key_up {
                delta.y = step;
            } else if delta.y > 0.0 {
                delta.y = 0.0;
            }
            if input.key_down {
                delta.y = -step;
            } else if delta.y < 0.0 {
                delta.y = 0.0;
            }
            input.new_drag = true;
        }

        // 4. Zoom keys.
        for (held, value) in [
            (self.input.key_plus, -1),
            (self.input.key_minus, 1),
            (self.input.key_zero, 0),
        ] {
            if held && !self.input.new_zoom {
                self.input.zoom_value = value;
                self.input.new_zoom = true;
            }
        }
    }

    fn extend_keyboard_path(&mut self) {
        let Some(&last) = self.queue.move_path.last() else {
            self.input.last_drag_pos = self.own_center();
            self.input.last_drag_delta = Vec3::default();
            self.input.key_repeat_force = true;
            return;
        };
        if !self.input.key_repeat {
            return;
        }

        let cell = self.location.cell();
        let mut pos = self.cell_center(last);
        let mut delta = Vec3::default();
        if self.input.key_left {
            pos.x -= cell.x;
            delta = Vec3::new(-cell.x, 0.0, 0.0);
        }
        if self.input.key_right {
            pos.x += cell.x;
            delta = Vec3::new(cell.x, 0.0, 0.0);
        }
        if self.input.key_up {
            pos.y += cell.y;
            delta = Vec3::new(0.0, cell.y, 0.0);
        }
        if self.input.key_down {
            pos.y -= cell.y;
            delta = Vec3::new(0.0, -cell.y, 0.0);
        }
        self.input.last_drag_pos = pos;
        self.input.last_drag_delta = delta;
    }

    fn handle_tap(&mut self) {
        let down = self.unproject(self.input.last_down_pos);
        let up = self.unproject(self.input.last_up_pos);
        let cell = self.location.level_to_grid(up.x, up.y);
        tracing::debug!(
            entity = ?self.entity,
            down = ?(down.x, down.y),
            up = ?(up.x, up.y),
            cell = ?cell,
            "tap"
        );
        self.queue.move_path.clear();
        if cell == self.location.grid() && !self.queue.scan_in_progress {
            self.queue.push(Action::Look(LOOK_DURATION));
        }
    }

    fn handle_drag(&mut self) {
        let current = self.location.grid();
        let target = self
            .location
            .level_to_grid(self.input.last_drag_pos.x, self.input.last_drag_pos.y);
        let delta = self.input.last_drag_delta;
        let path = &mut self.queue.move_path;

        if path.is_empty()
            && (target != current || !self.input.new_down || !self.queue.actions.is_empty())
        {
            self.camera.world.translate(delta.x, delta.y);
            return;
        }

        let extends = match path.last() {
            None => target == current,
            Some(&last) => target.distance(last) < ADJACENT_DISTANCE && target != last,
        };
        if extends {
            path.push(target);
            tracing::debug!(entity = ?self.entity, cell = ?target, len = path.len(), "path extended");
            if self.input.new_key_down {
                self.camera.world.translate(delta.x, delta.y);
            }
        }
    }

    fn handle_up(&mut self) {
        let moves = self.queue.commit_path();
        tracing::debug!(entity = ?self.entity, moves, "gesture released");
    }

    fn handle_zoom(&mut self, config: &SimConfig) {
        let camera = &mut self.camera.world;
        camera.zoom = match self.input.zoom_value {
            v if v > 0 => (camera.zoom + config.zoom_step).min(config.zoom_max),
            v if v < 0 => (camera.zoom - config.zoom_step).max(config.zoom_min),
            _ => 1.0,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gesture() -> Gesture {
        let mut location = Location::new();
        location.set_cell(32.0, 32.0);
        location.set_grid_bounds(GridBounds::new(0, 0, 10, 10));
        location.set_grid(4, 4);
        let viewport = Viewport {
            x: 0,
            y: 0,
            width: 800,
            height: 480,
        };
        let mut camera = Camera::new(800.0, 480.0);
        camera.set_world_position(144.0, 144.0);
        Gesture {
            entity: EntityId::new(0, 0),
            camera,
            queue: ActionQueue::default(),
            location,
            input: InputState::default(),
            viewport,
            screen_height: 480,
        }
    }

    // -- zoom ------------------------------------------------------------------

    #[test]
    fn zoom_steps_and_clamps() {
        let config = SimConfig::default();
        let mut g = gesture();
        g.input.zoom_value = 1;
        g.handle_zoom(&config);
        assert!((g.camera.world.zoom - 1.05).abs() < 1e-6);

        g.camera.world.zoom = config.zoom_min;
        g.input.zoom_value = -3;
        g.handle_zoom(&config);
        assert_eq!(g.camera.world.zoom, config.zoom_min);

        g.input.zoom_value = 0;
        g.handle_zoom(&config);
        assert_eq!(g.camera.world.zoom, 1.0);
    }

    // -- drag ------------------------------------------------------------------

    #[test]
    fn drag_away_from_agent_pans() {
        let mut g = gesture();
        g.input.new_down = true;
        g.input.last_drag_pos = g.cell_center(GridPos::new(7, 7));
        g.input.last_drag_delta = Vec3::new(5.0, -3.0, 0.0);
        g.handle_drag();
        assert!(g.queue.move_path.is_empty());
        assert_eq!(g.camera.world.position, Vec3::new(149.0, 141.0, 0.0));
    }

    #[test]
    fn drag_from_agent_traces_adjacent_cells() {
        let mut g = gesture();
        g.input.new_down = true;
        for cell in [(4, 4), (5, 5), (7, 5), (6, 5), (6, 5)] {
            g.input.last_drag_pos = g.cell_center(GridPos::new(cell.0, cell.1));
            g.handle_drag();
        }
        assert_eq!(
            g.queue.move_path,
            vec![GridPos::new(4, 4), GridPos::new(5, 5), GridPos::new(6, 5)]
        );
    }

    #[test]
    fn drag_with_queued_actions_only_pans() {
        let mut g = gesture();
        g.input.new_down = true;
        g.queue.push(Action::Wait(1));
        g.input.last_drag_pos = g.own_center();
        g.handle_drag();
        assert!(g.queue.move_path.is_empty());
    }

    // -- keyboard --------------------------------------------------------------

    #[test]
    fn key_repeat_fires_on_interval() {
        let config = SimConfig::default();
        let mut g = gesture();
        g.handle_keyboard(&config, 0.1);
        assert!(!g.input.key_repeat);
        g.handle_keyboard(&config, 0.05);
        assert!(g.input.key_repeat);
        assert!((g.input.key_repeat_accumulator - 0.025).abs() < 1e-6);
    }

    #[test]
    fn arrows_outside_gesture_pan_by_step() {
        let config = SimConfig::default();
        let mut g = gesture();
        g.input.key_left = true;
        g.input.key_up = true;
        g.handle_keyboard(&config, 0.0);
        assert!(g.input.new_drag);
        assert_eq!(g.input.last_drag_delta, Vec3::new(-4.0, 4.0, 0.0));
    }

    #[test]
    fn zoom_keys_map_to_values() {
        let config = SimConfig::default();
        let mut g = gesture();
        g.input.key_plus = true;
        g.handle_keyboard(&config, 0.0);
        assert!(g.input.new_zoom);
        assert_eq!(g.input.zoom_value, -1);
    }

    // -- router ----------------------------------------------------------------

    #[test]
    fn drag_delta_is_clamped() {
        let router = InputRouter {
            last_move: (0, 0),
            drag_limit: 20.0,
        };
        let mut input = InputState::default();
        let viewport = Viewport {
            x: 0,
            y: 0,
            width: 800,
            height: 480,
        };
        router.record(
            &mut input,
            InputSignal::TouchDragged { x: 100, y: -50 },
            None,
            &viewport,
            480,
        );
        assert_eq!(input.last_drag_delta, Vec3::new(-20.0, -20.0, 0.0));
        assert!(input.new_drag);
    }

    #[test]
    fn centre_key_acts_on_release() {
        let router = InputRouter::new(&SimConfig::default());
        let mut input = InputState::default();
        let viewport = Viewport::default();
        router.record(&mut input, InputSignal::KeyDown(Key::Center), None, &viewport, 480);
        assert!(!input.key_center);
        router.record(&mut input, InputSignal::KeyUp(Key::Center), None, &viewport, 480);
        assert!(input.key_center);
    }
}
