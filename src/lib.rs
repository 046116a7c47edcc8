pub mod cell;
pub mod error;
pub mod executor;
pub mod ffi;
pub mod generate;
pub mod grid;
pub mod noise;
pub mod params;
pub mod pipe;
pub mod rng;
pub mod step;
pub mod timing;
pub mod topology;

use cell::VelocityFromFlows;
use error::SimError;
use executor::Executor;
use grid::Grid;
use params::Params;
use topology::Topology;

/// A running hydraulic-erosion grid, generic over its dimensionality
/// (`topology::OneD` or `topology::TwoD`). Owns the committed grid state,
/// the validated parameters, the worker pool, and the deterministic
/// rainfall seed/tick counter.
pub struct Simulation<D: Topology>
where
    D::Velocity: VelocityFromFlows,
{
    grid: Grid<D>,
    params: Params,
    executor: Executor,
    tick: u64,
}

impl<D: Topology> Simulation<D>
where
    D::Velocity: VelocityFromFlows,
{
    /// `params.thread_count == 0` uses rayon's default
    /// (`hardware_concurrency()`); `params.seed` drives the deterministic
    /// rainfall hash. Fails if `params` or the grid dimensions don't
    /// validate — the only place this crate returns a `Result`. For
    /// `topology::OneD`, `height` must equal 1 (see `Grid::new`).
    pub fn new(width: usize, height: usize, params: Params) -> Result<Self, SimError> {
        params.validate()?;
        let grid = Grid::new(width, height)?;
        Ok(Self {
            grid,
            executor: Executor::new(params.thread_count),
            params,
            tick: 0,
        })
    }

    /// Seed every cell (including the outer ring) via `(x, y) -> (terrain,
    /// water, sediment)`. Prefer `generate` for the built-in terrains.
    pub fn init_with(&mut self, f: impl FnMut(usize, usize) -> (f32, f32, f32)) {
        self.grid.init_with(f);
    }

    /// Seed the grid with one of the built-in starting terrains.
    pub fn generate(&mut self, generator: &generate::Generator) {
        generator.apply(&mut self.grid, self.params.seed as u32);
    }

    /// Advance the simulation by one tick (rainfall, flux, boundary
    /// zeroing, transport + steepness, finish + erosion/deposition +
    /// evaporation). Never fails once constructed; see `step::step`'s doc
    /// comment for the debug-only finiteness check.
    pub fn step(&mut self) {
        step::step(&mut self.grid, &self.params, &self.executor, self.params.seed, self.tick);
        self.tick += 1;
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    #[inline]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[inline]
    pub fn thread_count(&self) -> usize {
        self.executor.thread_count()
    }

    #[inline]
    pub fn params(&self) -> &Params {
        &self.params
    }

    #[inline]
    pub fn terrain_height(&self, x: usize, y: usize) -> f32 {
        self.grid.get(x, y).terrain
    }

    #[inline]
    pub fn water_height(&self, x: usize, y: usize) -> f32 {
        self.grid.get(x, y).water
    }

    #[inline]
    pub fn sediment_height(&self, x: usize, y: usize) -> f32 {
        self.grid.get(x, y).sediment
    }

    #[inline]
    pub fn combined_height(&self, x: usize, y: usize) -> f32 {
        self.grid.get(x, y).combined_height()
    }

    /// Scan the interior for NaN/Inf. Exposed for test harnesses and
    /// embedders that want this check outside of a debug build, where it
    /// otherwise only runs implicitly after each `step`.
    pub fn check_finite(&self) -> Result<(), SimError> {
        step::check_finite(&self.grid, "external-check")
    }
}
