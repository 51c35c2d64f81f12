//! Orthographic cameras attached to agents.
//!
//! Screen coordinates are y-down with the origin at the top-left of the
//! display, the form pointer events arrive in. Viewport rectangles are
//! y-up from the bottom-left, the form the viewport allocator produces.

use serde::{Deserialize, Serialize};

use crate::components::Viewport;
use crate::geometry::Vec3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrthoCamera {
    pub position: Vec3,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub zoom: f32,
}

impl Default for OrthoCamera {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl OrthoCamera {
    pub fn new(viewport_width: f32, viewport_height: f32) -> Self {
        Self {
            position: Vec3::default(),
            viewport_width,
            viewport_height,
            zoom: 1.0,
        }
    }

    /// Resize the view and centre it on the lower-left quadrant origin.
    pub fn set_to_ortho(&mut self, width: f32, height: f32) {
        self.viewport_width = width;
        self.viewport_height = height;
        self.position = Vec3::new(self.zoom * width / 2.0, self.zoom * height / 2.0, 0.0);
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.position.x += dx;
        self.position.y += dy;
    }

    /// Resize the view while keeping the current focus point.
    pub fn resize(&mut self, width: f32, height: f32) {
        let old = self.position;
        self.set_to_ortho(width, height);
        self.translate(old.x - self.position.x, old.y - self.position.y);
    }

    /// World units per screen pixel along x and y for a viewport.
    fn scale(&self, viewport: &Viewport) -> (f32, f32) {
        let sx = if viewport.width > 0 {
            self.viewport_width * self.zoom / viewport.width as f32
        } else {
            self.zoom
        };
        let sy = if viewport.height > 0 {
            self.viewport_height * self.zoom / viewport.height as f32
        } else {
            self.zoom
        };
        (sx, sy)
    }

    /// World point to y-down screen coordinates.
    pub fn project(&self, world: Vec3, viewport: &Viewport, screen_height: u32) -> Vec3 {
        let (sx, sy) = self.scale(viewport);
        let win_x = viewport.x as f32 + viewport.width as f32 / 2.0 + (world.x - self.position.x) / sx;
        let win_y = viewport.y as f32 + viewport.height as f32 / 2.0 + (world.y - self.position.y) / sy;
        Vec3::new(win_x, screen_height as f32 - win_y, 0.0)
    }

    /// Y-down screen coordinates to a world point.
    pub fn unproject(&self, screen: Vec3, viewport: &Viewport, screen_height: u32) -> Vec3 {
        let (sx, sy) = self.scale(viewport);
        let win_y = screen_height as f32 - screen.y;
        let x = self.position.x + (screen.x - viewport.x as f32 - viewport.width as f32 / 2.0) * sx;
        let y = self.position.y + (win_y - viewport.y as f32 - viewport.height as f32 / 2.0) * sy;
        Vec3::new(x, y, self.position.z)
    }
}

/// World and HUD cameras of an agent. Only the world camera is persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Camera {
    pub world: OrthoCamera,
    #[serde(skip)]
    pub hud: OrthoCamera,
}

impl Camera {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            world: OrthoCamera::new(width, height),
            hud: OrthoCamera::new(width, height),
        }
    }

    pub fn set_world_position(&mut self, x: f32, y: f32) {
        self.world.position = Vec3::new(x, y, 0.0);
    }

    /// Fit both cameras to a new viewport size without moving their focus.
    pub fn fit(&mut self, width: f32, height: f32) {
        self.hud.resize(width, height);
        self.world.resize(width, height);
    }
}
