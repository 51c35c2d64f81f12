//! Small value types shared by components: grid cells, world-space vectors
//! and the bounds used to clamp them.

use serde::{Deserialize, Serialize};

/// A cell on the map grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance between two cells.
    pub fn distance(self, other: GridPos) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// True when both planar components are within `epsilon` of `other`.
    pub fn approx_eq_2d(self, other: Vec3, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Grid rectangle `(x, y, width, height)`.
///
/// A rectangle with a non-positive width or height is treated as "no bounds
/// yet" and does not clamp; that is the state of a location before its map
/// has been loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridBounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl GridBounds {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        !self.is_empty()
            && pos.x >= self.x
            && pos.x < self.x + self.width
            && pos.y >= self.y
            && pos.y < self.y + self.height
    }

    pub fn clamp(&self, pos: GridPos) -> GridPos {
        if self.is_empty() {
            return pos;
        }
        GridPos::new(
            pos.x.clamp(self.x, self.x + self.width - 1),
            pos.y.clamp(self.y, self.y + self.height - 1),
        )
    }
}

/// World-space rectangle, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl LevelBounds {
    /// Level bounds covering `grid` at the given cell size, one unit short
    /// of the far edge.
    pub fn from_grid(grid: &GridBounds, cell: Vec2) -> Self {
        Self {
            min_x: grid.x as f32 * cell.x,
            min_y: grid.y as f32 * cell.y,
            max_x: (grid.x + grid.width) as f32 * cell.x - 1.0,
            max_y: (grid.y + grid.height) as f32 * cell.y - 1.0,
        }
    }

    pub fn clamp(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x.max(self.min_x).min(self.max_x),
            y.max(self.min_y).min(self.max_y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bounds_do_not_clamp() {
        let b = GridBounds::default();
        assert_eq!(b.clamp(GridPos::new(-5, 99)), GridPos::new(-5, 99));
    }

    #[test]
    fn clamp_is_inclusive_of_last_cell() {
        let b = GridBounds::new(0, 0, 10, 4);
        assert_eq!(b.clamp(GridPos::new(12, -1)), GridPos::new(9, 0));
        assert!(b.contains(GridPos::new(9, 3)));
        assert!(!b.contains(GridPos::new(10, 3)));
    }

    #[test]
    fn level_bounds_stop_one_short() {
        let lb = LevelBounds::from_grid(&GridBounds::new(0, 0, 10, 10), Vec2::new(32.0, 32.0));
        assert_eq!(lb.max_x, 319.0);
        assert_eq!(lb.clamp(400.0, -3.0), (319.0, 0.0));
    }
}
