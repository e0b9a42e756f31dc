// Uniform spatial hash over the XZ plane.
// Used as the broad phase of the human -> zombie conversion scan.

use glam::{Vec2, Vec3};

/// Uniform grid of index buckets.
///
/// Stores indices into the caller's snapshot slice. Positions outside the
/// covered area are clamped onto the edge cells, so agents that drifted past
/// the bounds are still found by `query_radius`.
pub struct SpatialGrid {
    cells: Vec<Vec<usize>>,
    cell_size: f32,
    width: u32,
    height: u32,
    world_min: Vec2, // bottom-left corner of the grid in world XZ
}

/// Upper bound on the number of cells a grid may allocate.
pub const MAX_GRID_CELLS: usize = 1 << 22;

fn dimensions(world_min: Vec2, world_max: Vec2, cell_size: f32) -> (u32, u32) {
    let span = (world_max - world_min).max(Vec2::ZERO);
    // `as` saturates, so oversized spans land on u32::MAX instead of wrapping.
    let width = ((span.x / cell_size).ceil() as u32).saturating_add(1);
    let height = ((span.y / cell_size).ceil() as u32).saturating_add(1);
    (width, height)
}

impl SpatialGrid {
    /// Number of cells a grid over the given area would allocate, or `None`
    /// if that count overflows `usize`.
    pub fn cell_count(world_min: Vec2, world_max: Vec2, cell_size: f32) -> Option<usize> {
        let (width, height) = dimensions(world_min, world_max, cell_size);
        (width as usize).checked_mul(height as usize)
    }

    /// `world_min` / `world_max` define the area the grid covers (XZ plane).
    /// `cell_size` is the side length of each cell in world units.
    ///
    /// Callers must keep `cell_count` within `MAX_GRID_CELLS`; config
    /// validation enforces this.
    pub fn new(world_min: Vec2, world_max: Vec2, cell_size: f32) -> Self {
        let (width, height) = dimensions(world_min, world_max, cell_size);
        Self {
            cells: vec![Vec::new(); width as usize * height as usize],
            cell_size,
            width,
            height,
            world_min,
        }
    }

    /// Remove all stored indices.
    pub fn clear(&mut self) {
        for c in &mut self.cells {
            c.clear();
        }
    }

    fn cell_xy(&self, pos: Vec3) -> (u32, u32) {
        let cx = ((pos.x - self.world_min.x) / self.cell_size).floor();
        let cy = ((pos.z - self.world_min.y) / self.cell_size).floor();
        // `as` saturates NaN to 0 and huge values to the integer range.
        let cx = (cx.max(0.0) as u32).min(self.width - 1);
        let cy = (cy.max(0.0) as u32).min(self.height - 1);
        (cx, cy)
    }

    /// Insert entry `idx` at world position `pos`.
    pub fn insert(&mut self, pos: Vec3, idx: usize) {
        let (cx, cy) = self.cell_xy(pos);
        self.cells[cy as usize * self.width as usize + cx as usize].push(idx);
    }

    /// Append to `out` all indices in cells within `radius` of `pos`.
    ///
    /// Returns a superset; callers must distance-filter results.
    /// Does not clear `out` before writing.
    pub fn query_radius(&self, pos: Vec3, radius: f32, out: &mut Vec<usize>) {
        let r_cells = (radius.max(0.0) / self.cell_size).ceil() as i64 + 1;
        let (cx0, cy0) = self.cell_xy(pos);
        let (cx0, cy0) = (cx0 as i64, cy0 as i64);
        let x_range = (cx0 - r_cells).max(0)..=(cx0 + r_cells).min(self.width as i64 - 1);
        for cy in (cy0 - r_cells).max(0)..=(cy0 + r_cells).min(self.height as i64 - 1) {
            for cx in x_range.clone() {
                out.extend_from_slice(&self.cells[cy as usize * self.width as usize + cx as usize]);
            }
        }
    }
}
