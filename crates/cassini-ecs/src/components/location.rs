//! Grid and world-space position of an entity.
//!
//! A [`Location`] keeps two coordinates in lockstep: the integer map cell
//! and the floating-point level (world/pixel) position. They are related by
//! the per-map cell size, and every mutator recomputes the other side, so the
//! fields are private.

use serde::{Deserialize, Serialize};

use crate::geometry::{GridBounds, GridPos, LevelBounds, Vec2, Vec3};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    grid: GridPos,
    grid_bounds: GridBounds,
    map_name: String,
    level: Vec3,
    level_bounds: LevelBounds,
    cell: Vec2,
    level_name: String,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            grid: GridPos::default(),
            grid_bounds: GridBounds::default(),
            map_name: String::new(),
            level: Vec3::default(),
            level_bounds: LevelBounds::default(),
            cell: Vec2::new(1.0, 1.0),
            level_name: String::new(),
        }
    }
}

impl Location {
    pub fn new() -> Self {
        Self::default()
    }

    /// A location on the same map as `template` (names, bounds, cell size)
    /// placed at cell `(x, y)`.
    pub fn on_same_map(template: &Location, x: i32, y: i32) -> Self {
        let mut location = Self {
            map_name: template.map_name.clone(),
            level_name: template.level_name.clone(),
            grid_bounds: template.grid_bounds,
            level_bounds: template.level_bounds,
            cell: template.cell,
            ..Self::default()
        };
        location.set_grid(x, y);
        location
    }

    // -- accessors ------------------------------------------------------------

    pub fn grid(&self) -> GridPos {
        self.grid
    }

    pub fn level(&self) -> Vec3 {
        self.level
    }

    pub fn grid_bounds(&self) -> GridBounds {
        self.grid_bounds
    }

    pub fn level_bounds(&self) -> LevelBounds {
        self.level_bounds
    }

    pub fn cell(&self) -> Vec2 {
        self.cell
    }

    /// Centre of a cell relative to its lower-left corner.
    pub fn offset_center(&self) -> Vec2 {
        Vec2::new(self.cell.x * 0.5, self.cell.y * 0.5)
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    pub fn level_name(&self) -> &str {
        &self.level_name
    }

    /// Namespace key for per-map group names.
    pub fn context_tag(&self) -> String {
        format!("{}{}", self.level_name, self.map_name)
    }

    // -- conversions ----------------------------------------------------------

    /// World-space position of a grid cell (clamped to the grid bounds).
    pub fn grid_to_level(&self, pos: GridPos) -> Vec3 {
        let pos = self.grid_bounds.clamp(pos);
        Vec3::new(pos.x as f32 * self.cell.x, pos.y as f32 * self.cell.y, 0.0)
    }

    /// Grid cell containing a world-space point (clamped to the level bounds).
    pub fn level_to_grid(&self, x: f32, y: f32) -> GridPos {
        let (x, y) = self.clamp_level(x, y);
        GridPos::new(
            (x / self.cell.x).floor() as i32,
            (y / self.cell.y).floor() as i32,
        )
    }

    // -- mutators -------------------------------------------------------------

    pub fn set_grid(&mut self, x: i32, y: i32) {
        self.grid = self.grid_bounds.clamp(GridPos::new(x, y));
        self.sync_level_from_grid();
    }

    pub fn add_grid(&mut self, dx: i32, dy: i32) {
        self.set_grid(self.grid.x + dx, self.grid.y + dy);
    }

    pub fn set_level(&mut self, x: f32, y: f32, z: f32) {
        let (x, y) = self.clamp_level(x, y);
        self.level = Vec3::new(x, y, z);
        self.grid = GridPos::new(
            (x / self.cell.x).floor() as i32,
            (y / self.cell.y).floor() as i32,
        );
    }

    pub fn add_level(&mut self, dx: f32, dy: f32, dz: f32) {
        self.set_level(self.level.x + dx, self.level.y + dy, self.level.z + dz);
    }

    pub fn set_grid_bounds(&mut self, bounds: GridBounds) {
        self.grid_bounds = bounds;
        self.level_bounds = LevelBounds::from_grid(&bounds, self.cell);
    }

    /// Change the cell size. Non-positive sizes are ignored.
    pub fn set_cell(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.cell = Vec2::new(width, height);
            self.level_bounds = LevelBounds::from_grid(&self.grid_bounds, self.cell);
            self.sync_level_from_grid();
        }
    }

    pub fn set_map_name(&mut self, name: impl Into<String>) {
        self.map_name = name.into();
    }

    pub fn set_level_name(&mut self, name: impl Into<String>) {
        self.level_name = name.into();
    }

    fn sync_level_from_grid(&mut self) {
        self.level = Vec3::new(
            self.grid.x as f32 * self.cell.x,
            self.grid.y as f32 * self.cell.y,
            0.0,
        );
    }

    fn clamp_level(&self, x: f32, y: f32) -> (f32, f32) {
        if self.grid_bounds.is_empty() {
            (x, y)
        } else {
            self.level_bounds.clamp(x, y)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_by_ten() -> Location {
        let mut loc = Location::new();
        loc.set_cell(32.0, 32.0);
        loc.set_grid_bounds(GridBounds::new(0, 0, 10, 10));
        loc
    }

    #[test]
    fn grid_moves_level() {
        let mut loc = ten_by_ten();
        loc.set_grid(3, 4);
        assert_eq!(loc.level(), Vec3::new(96.0, 128.0, 0.0));
        loc.add_grid(1, -1);
        assert_eq!(loc.grid(), GridPos::new(4, 3));
        assert_eq!(loc.level(), Vec3::new(128.0, 96.0, 0.0));
    }

    #[test]
    fn level_moves_grid() {
        let mut loc = ten_by_ten();
        loc.set_level(100.0, 40.0, 0.0);
        assert_eq!(loc.grid(), GridPos::new(3, 1));
    }

    #[test]
    fn grid_is_clamped_to_bounds() {
        let mut loc = ten_by_ten();
        loc.set_grid(15, -2);
        assert_eq!(loc.grid(), GridPos::new(9, 0));
        loc.add_grid(1, 0);
        assert_eq!(loc.grid(), GridPos::new(9, 0));
    }

    #[test]
    fn level_is_clamped_to_level_bounds() {
        let mut loc = ten_by_ten();
        loc.set_level(1000.0, -10.0, 0.0);
        assert_eq!(loc.level(), Vec3::new(319.0, 0.0, 0.0));
        assert_eq!(loc.grid(), GridPos::new(9, 0));
    }

    #[test]
    fn cell_change_keeps_grid_and_rescales_level() {
        let mut loc = ten_by_ten();
        loc.set_grid(2, 2);
        loc.set_cell(16.0, 16.0);
        assert_eq!(loc.grid(), GridPos::new(2, 2));
        assert_eq!(loc.level(), Vec3::new(32.0, 32.0, 0.0));
        loc.set_cell(0.0, 5.0);
        assert_eq!(loc.cell(), Vec2::new(16.0, 16.0));
    }

    #[test]
    fn unbounded_location_moves_freely() {
        let mut loc = Location::new();
        loc.set_grid(-4, 7);
        assert_eq!(loc.grid(), GridPos::new(-4, 7));
        assert_eq!(loc.level(), Vec3::new(-4.0, 7.0, 0.0));
    }

    #[test]
    fn context_tag_joins_level_and_map() {
        let mut loc = Location::new();
        loc.set_level_name("planet1/");
        loc.set_map_name("maps/test.tmx");
        assert_eq!(loc.context_tag(), "planet1/maps/test.tmx");
    }

    #[test]
    fn on_same_map_copies_map_context() {
        let mut base = ten_by_ten();
        base.set_map_name("m");
        let other = Location::on_same_map(&base, 5, 6);
        assert_eq!(other.map_name(), "m");
        assert_eq!(other.level(), Vec3::new(160.0, 192.0, 0.0));
    }
}
