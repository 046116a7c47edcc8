use crate::cell::{self, Cell, Staging};
use crate::error::SimError;
use crate::params::Params;
use crate::pipe::Pipe;
use crate::topology::Topology;

/// Dense row-major storage for a simulation grid, including the fixed outer
/// boundary ring as real cells. The ring is never targeted by
/// phase dispatch and its pipes are forced to zero every step; it exists so
/// interior cells can read a neighbor's committed state without a branch.
///
/// Committed state (`cells`), outgoing pipes (`pipes`) and phase-4 staging
/// (`staging`) are three parallel arrays rather than fields nested inside
/// one `Cell` struct. That split is what lets each phase method below take
/// `&mut self` and still give the borrow checker a single, disjoint
/// mutable array to split across worker threads while the other two stay
/// shared and read-only for the whole phase.
#[derive(Clone, Debug)]
pub struct Grid<D: Topology> {
    cells: Vec<Cell<D>>,
    pipes: Vec<[Pipe; 4]>,
    staging: Vec<Staging<D>>,
    width: usize,
    height: usize,
}

impl<D: Topology> Grid<D> {
    /// `height` must equal `D::FIXED_HEIGHT` when that topology fixes it
    /// (1 for `OneD`); otherwise any `height >= 3` is accepted.
    pub fn new(width: usize, height: usize) -> Result<Self, SimError> {
        if width < 3 {
            return Err(SimError::InvalidDimensions { width, height });
        }
        match D::FIXED_HEIGHT {
            Some(h) if height != h => return Err(SimError::InvalidDimensions { width, height }),
            None if height < 3 => return Err(SimError::InvalidDimensions { width, height }),
            _ => {}
        }
        let len = width * height;
        Ok(Self {
            cells: vec![Cell::default(); len],
            pipes: vec![[Pipe::new(); 4]; len],
            staging: vec![Staging::default(); len],
            width,
            height,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &Cell<D> {
        &self.cells[self.index(x, y)]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut Cell<D> {
        let i = self.index(x, y);
        &mut self.cells[i]
    }

    #[inline]
    pub fn cells(&self) -> &[Cell<D>] {
        &self.cells
    }

    #[inline]
    pub fn cells_mut(&mut self) -> &mut [Cell<D>] {
        &mut self.cells
    }

    #[inline]
    pub fn pipes_at(&self, x: usize, y: usize) -> &[Pipe; 4] {
        &self.pipes[self.index(x, y)]
    }

    /// `true` for every index inside the interior (excludes the outer ring).
    pub fn is_interior(&self, index: usize) -> bool {
        let x = index % self.width;
        let y = index / self.width;
        x > 0 && x < self.width - 1 && D::is_interior_row(y, self.height)
    }

    /// Zero the pipes that would otherwise cross into the outer ring.
    pub fn zero_boundary_pipes(&mut self) {
        for (index, dir) in D::boundary_pipe_targets(self.width, self.height) {
            self.pipes[index][dir].flow = 0.0;
        }
    }

    /// Initialize every cell (including the boundary ring) via a callback
    /// indexed by grid coordinates: `(x, y) -> (terrain, water, sediment)`.
    pub fn init_with(&mut self, mut f: impl FnMut(usize, usize) -> (f32, f32, f32)) {
        for y in 0..self.height {
            for x in 0..self.width {
                let (terrain, water, sediment) = f(x, y);
                let cell = self.get_mut(x, y);
                cell.terrain = terrain;
                cell.water = water;
                cell.sediment = sediment;
            }
        }
    }

    /// Phase 1: rainfall. Writes `cells` in place, one disjoint row chunk
    /// per worker.
    pub fn par_rainfall(&mut self, params: &Params, seed: u64, step: u64) {
        use rayon::prelude::*;
        let width = self.width;
        let height = self.height;
        self.cells.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            if !D::is_interior_row(y, height) {
                return;
            }
            for (x, c) in row.iter_mut().enumerate() {
                if x == 0 || x == width - 1 {
                    continue;
                }
                let index = y * width + x;
                let trigger = crate::rng::rain_trigger(seed, step, index, params.rain_random);
                c.apply_rainfall(params, trigger);
            }
        });
    }

    /// Phase 2: flux. Writes `pipes` in place per cell, reading the full
    /// `cells` array (shared, read-only) for neighbor heights.
    pub fn par_update_pipes(&mut self, params: &Params) {
        use rayon::prelude::*;
        let width = self.width;
        let height = self.height;
        let cells = &self.cells;
        self.pipes.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            if !D::is_interior_row(y, height) {
                return;
            }
            for (x, bank) in row.iter_mut().enumerate() {
                if x == 0 || x == width - 1 {
                    continue;
                }
                let index = y * width + x;
                let neighbor_idx = D::neighbor_indices(index, width);
                let mut heights = [0.0f32; 4];
                for i in 0..D::DEGREE {
                    heights[i] = cells[neighbor_idx[i]].combined_height();
                }
                cell::update_pipes(&cells[index], bank, params, &heights[..D::DEGREE]);
            }
        });
    }

    /// Phase 4: transport + steepness. Writes `staging` in place per cell,
    /// reading `cells` and `pipes` (both shared, read-only, already
    /// boundary-zeroed by phase 3).
    pub fn par_transport(&mut self, params: &Params)
    where
        D::Velocity: cell::VelocityFromFlows,
    {
        use rayon::prelude::*;
        let width = self.width;
        let height = self.height;
        let cells = &self.cells;
        let pipes = &self.pipes;
        self.staging.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            if !D::is_interior_row(y, height) {
                return;
            }
            for (x, staged) in row.iter_mut().enumerate() {
                if x == 0 || x == width - 1 {
                    continue;
                }
                let index = y * width + x;
                let neighbor_idx = D::neighbor_indices(index, width);

                let mut neighbor_cells: [&Cell<D>; 4] = [&cells[index]; 4];
                let mut neighbor_pipes: [&[Pipe; 4]; 4] = [&pipes[index]; 4];
                let mut neighbor_terrain = [0.0f32; 4];
                for i in 0..D::DEGREE {
                    let n = neighbor_idx[i];
                    neighbor_cells[i] = &cells[n];
                    neighbor_pipes[i] = &pipes[n];
                    neighbor_terrain[i] = cells[n].terrain;
                }

                let (water, sediment, velocity) = cell::transport(
                    &cells[index],
                    &pipes[index],
                    params,
                    &neighbor_cells[..D::DEGREE],
                    &neighbor_pipes[..D::DEGREE],
                );
                let terrain = cell::steepness(&cells[index], params, &neighbor_terrain[..D::DEGREE]);

                *staged = Staging {
                    water,
                    sediment,
                    terrain,
                    velocity,
                };
            }
        });
    }

    /// Phase 5: finish + erosion/deposition + evaporation. Writes `cells` in
    /// place, reading `staging` (shared, read-only, fully written by phase
    /// 4).
    pub fn par_finish(&mut self, params: &Params) {
        use rayon::prelude::*;
        let width = self.width;
        let height = self.height;
        let staging = &self.staging;
        self.cells.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            if !D::is_interior_row(y, height) {
                return;
            }
            for (x, c) in row.iter_mut().enumerate() {
                if x == 0 || x == width - 1 {
                    continue;
                }
                let index = y * width + x;
                let s = &staging[index];
                c.finish(s.water, s.sediment, s.terrain, s.velocity);
                c.update_erosion_and_deposition(params);
                c.update_evaporation(params);
            }
        });
    }

    pub fn all_finite(&self) -> bool {
        self.cells.iter().all(Cell::is_finite)
    }
}
