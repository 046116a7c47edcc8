//! The six-phase step pipeline: rainfall, flux, boundary zeroing,
//! transport + steepness, finish + erosion/deposition + evaporation. Each
//! phase is a full barrier — `Executor::install` blocks until every row
//! chunk finishes before the next phase's reads are valid.

use crate::cell::VelocityFromFlows;
use crate::error::SimError;
use crate::executor::Executor;
use crate::grid::Grid;
use crate::params::Params;
use crate::topology::Topology;

/// Advance `grid` by one tick. `seed` and `tick` feed the deterministic
/// per-cell rainfall hash (`rng::rain_trigger`); callers own the `tick`
/// counter and increment it once per call, not per phase.
///
/// No `Result` here even in debug builds — `step` can't
/// fail once `grid`/`params` are valid (checked once at construction, see
/// `params::Params::validate`). In debug builds only, a failed finiteness
/// check after the pipeline panics with the offending phase and cell index
/// rather than silently propagating NaN; release builds skip the scan
/// entirely.
pub fn step<D: Topology>(grid: &mut Grid<D>, params: &Params, executor: &Executor, seed: u64, tick: u64)
where
    D::Velocity: VelocityFromFlows,
{
    executor.install(|| grid.par_rainfall(params, seed, tick));
    #[cfg(debug_assertions)]
    assert_finite(grid, "rainfall");

    executor.install(|| grid.par_update_pipes(params));
    #[cfg(debug_assertions)]
    assert_finite(grid, "flux");

    grid.zero_boundary_pipes();

    executor.install(|| grid.par_transport(params));
    executor.install(|| grid.par_finish(params));
    #[cfg(debug_assertions)]
    assert_finite(grid, "finish");
}

/// Scan every interior cell for non-finite terrain/water/sediment/velocity,
/// returning the first offender. Exposed separately from `step` so test
/// harnesses and `Simulation::step` (in debug builds) can report which
/// phase and cell produced the degeneracy.
pub fn check_finite<D: Topology>(grid: &Grid<D>, phase: &'static str) -> Result<(), SimError> {
    for (index, cell) in grid.cells().iter().enumerate() {
        if grid.is_interior(index) && !cell.is_finite() {
            return Err(SimError::NumericalDegeneracy { phase, index });
        }
    }
    Ok(())
}

#[cfg(debug_assertions)]
fn assert_finite<D: Topology>(grid: &Grid<D>, phase: &'static str) {
    if let Err(e) = check_finite(grid, phase) {
        panic!("{e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{OneD, TwoD};

    /// End-to-end scenario: a 16-cell 1D ramp (`terrain = (15 - x) * 0.1`),
    /// water placed only in the leftmost interior cell, no rainfall, no
    /// evaporation, 200 steps. Total water is conserved (nothing evaporates
    /// and the boundary ring never receives inflow), and it migrates almost
    /// entirely to the rightmost interior cell, the low end of the ramp,
    /// since the fixed ring blocks further outflow once it arrives there.
    #[test]
    fn drains_downhill_in_one_d() {
        use approx::assert_relative_eq;
        let mut params = Params::default();
        params.rainfall = 0.0;
        params.evaporation = 0.0;
        let executor = Executor::new(1);
        let width = 16;
        let mut grid = Grid::<OneD>::new(width, 1).unwrap();
        grid.init_with(|x, _y| ((width - 1 - x) as f32 * 0.1, 0.0, 0.0));
        grid.get_mut(1, 0).water = 1.0;

        let initial_total: f32 = grid.cells().iter().map(|c| c.water).sum();

        for tick in 0..200u64 {
            step(&mut grid, &params, &executor, 42, tick);
        }

        let final_total: f32 = grid.cells().iter().map(|c| c.water).sum();
        assert_relative_eq!(final_total, initial_total, epsilon = 1e-4);

        let low_end = grid.get(width - 2, 0).water;
        assert!(
            low_end > 0.9 * initial_total,
            "expected most of the water to collect at the low end, got {low_end} of {initial_total}"
        );
    }

    #[test]
    fn flat_pond_stays_flat_in_two_d() {
        let mut params = Params::default();
        params.rainfall = 0.0;
        params.rain_random = 1_000_000;
        let executor = Executor::new(2);
        let mut grid = Grid::<TwoD>::new(8, 8).unwrap();
        grid.init_with(|_x, _y| (0.0, 1.0, 0.0));
        for tick in 0..20u64 {
            step(&mut grid, &params, &executor, 1, tick);
        }
        let center = grid.get(4, 4).water;
        let other = grid.get(2, 3).water;
        assert!((center - other).abs() < 1e-3);
    }

    #[test]
    fn evaporation_drains_a_dry_pond_over_time() {
        let mut params = Params::default();
        params.rainfall = 0.0;
        params.rain_random = 1_000_000;
        let executor = Executor::new(1);
        let mut grid = Grid::<TwoD>::new(6, 6).unwrap();
        grid.init_with(|_x, _y| (0.0, 1.0, 0.0));
        let before: f32 = grid.cells().iter().map(|c| c.water).sum();
        for tick in 0..50u64 {
            step(&mut grid, &params, &executor, 2, tick);
        }
        let after: f32 = grid.cells().iter().map(|c| c.water).sum();
        assert!(after < before);
    }

    /// End-to-end scenario: 8x8 flat terrain, `WaterHeight = 1.0` everywhere,
    /// no rainfall, `EVAPORATION = 0.1`, `DT = 0.1`, 10 steps. No flux occurs
    /// (flat terrain, uniform water column), so this isolates the per-step
    /// evaporation multiplier: `WaterHeight ~= (1 - 0.01)^10 ~= 0.9044`.
    #[test]
    fn uniform_evaporation_matches_the_closed_form() {
        use approx::assert_relative_eq;
        let mut params = Params::default();
        params.rainfall = 0.0;
        params.rain_random = 1_000_000;
        params.evaporation = 0.1;
        params.dt = 0.1;
        let executor = Executor::new(1);
        let mut grid = Grid::<TwoD>::new(8, 8).unwrap();
        grid.init_with(|_x, _y| (0.0, 1.0, 0.0));
        for tick in 0..10u64 {
            step(&mut grid, &params, &executor, 3, tick);
        }
        let expected = (1.0f32 - 0.01).powi(10);
        for y in 1..7 {
            for x in 1..7 {
                assert_relative_eq!(grid.get(x, y).water, expected, epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn same_seed_is_deterministic_across_thread_counts() {
        use approx::assert_relative_eq;
        let params = Params::default();
        let mut a = Grid::<TwoD>::new(10, 10).unwrap();
        let mut b = Grid::<TwoD>::new(10, 10).unwrap();
        a.init_with(|x, y| (((x + y) as f32) * 0.05, 0.0, 0.0));
        b.init_with(|x, y| (((x + y) as f32) * 0.05, 0.0, 0.0));

        let exec_a = Executor::new(1);
        let exec_b = Executor::new(4);
        for tick in 0..30u64 {
            step(&mut a, &params, &exec_a, 99, tick);
            step(&mut b, &params, &exec_b, 99, tick);
        }

        for (ca, cb) in a.cells().iter().zip(b.cells().iter()) {
            assert_relative_eq!(ca.terrain, cb.terrain, epsilon = 1e-4);
            assert_relative_eq!(ca.water, cb.water, epsilon = 1e-4);
        }
    }

    /// End-to-end scenario: a single cell raised `10 * MAX_STEP` above flat
    /// neighbors, no water, 50 steps. After convergence no two adjacent
    /// cells should differ by more than `MAX_STEP`.
    #[test]
    fn slope_relaxation_converges_within_max_step() {
        let params = Params::default();
        let executor = Executor::new(1);
        let mut grid = Grid::<TwoD>::new(10, 10).unwrap();
        grid.init_with(|_x, _y| (0.0, 0.0, 0.0));
        let peak = grid.index(5, 5);
        let (px, py) = (peak % 10, peak / 10);
        grid.get_mut(px, py).terrain = 10.0 * params.max_step;

        for tick in 0..50u64 {
            step(&mut grid, &params, &executor, 11, tick);
        }

        for y in 1..9 {
            for x in 1..9 {
                let here = grid.get(x, y).terrain;
                for (nx, ny) in [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)] {
                    let diff = (here - grid.get(nx, ny).terrain).abs();
                    assert!(
                        diff <= params.max_step + 1e-3,
                        "cells ({x},{y}) and ({nx},{ny}) still differ by {diff}, max_step={}",
                        params.max_step
                    );
                }
            }
        }
    }

    /// `Sum(TerrainHeight + Sediment)` over the interior is invariant across
    /// steps with rainfall disabled and no water present (erosion/deposition
    /// only moves mass between terrain and sediment, never creates or
    /// destroys it).
    #[test]
    fn mass_conservation_of_terrain_plus_sediment_with_no_water() {
        let mut params = Params::default();
        params.rainfall = 0.0;
        params.rain_random = 1_000_000;
        let executor = Executor::new(2);
        let mut grid = Grid::<TwoD>::new(10, 10).unwrap();
        grid.init_with(|x, y| (((x + y) as f32) * 0.2, 0.0, 0.0));

        let before: f32 = grid
            .cells()
            .iter()
            .enumerate()
            .filter(|(i, _)| grid.is_interior(*i))
            .map(|(_, c)| c.terrain + c.sediment)
            .sum();

        for tick in 0..20u64 {
            step(&mut grid, &params, &executor, 5, tick);
        }

        let after: f32 = grid
            .cells()
            .iter()
            .enumerate()
            .filter(|(i, _)| grid.is_interior(*i))
            .map(|(_, c)| c.terrain + c.sediment)
            .sum();

        assert!((before - after).abs() < 1e-2 * grid.len() as f32);
    }

    /// A terrain configuration symmetric about the grid's vertical axis
    /// stays symmetric under a rain schedule that is itself symmetric about
    /// that axis (here: rain disabled entirely, the simplest such schedule).
    #[test]
    fn symmetric_configuration_stays_symmetric() {
        let mut params = Params::default();
        params.rainfall = 0.0;
        params.rain_random = 1_000_000;
        let executor = Executor::new(2);
        let width = 11;
        let mut grid = Grid::<TwoD>::new(width, 9).unwrap();
        grid.init_with(|x, y| {
            let dx = (x as f32 - (width - 1) as f32 / 2.0).abs();
            (dx * dx * 0.3 + y as f32 * 0.05, 0.0, 0.0)
        });

        for tick in 0..25u64 {
            step(&mut grid, &params, &executor, 77, tick);
        }

        for y in 1..8 {
            for x in 1..width / 2 {
                let mirror = width - 1 - x;
                let a = grid.get(x, y).terrain;
                let b = grid.get(mirror, y).terrain;
                assert!((a - b).abs() < 1e-3, "asymmetry at x={x},mirror={mirror},y={y}: {a} vs {b}");
            }
        }
    }

    /// End-to-end scenario: a steep slope feeding a shallow one, fed by a
    /// standing water source along one column. Fast water on the steep
    /// stretch carries more sediment than it starts with, so it erodes;
    /// by the time that water reaches the shallow stretch its capacity has
    /// dropped below the sediment it carries, so it deposits. `terrain +
    /// sediment` is still conserved over the interior throughout.
    #[test]
    fn erosion_deposition_toggle_matches_spec_scenario_five() {
        let mut params = Params::default();
        params.rainfall = 0.0;
        params.rain_random = 1_000_000;
        let executor = Executor::new(2);

        let width = 20;
        let height = 5;
        let mid = 9usize;
        let mut grid = Grid::<TwoD>::new(width, height).unwrap();
        grid.init_with(|x, _y| {
            let x = x as f32;
            let mid = mid as f32;
            let tail = (width - 2) as f32 - mid;
            let terrain = if x <= mid {
                (mid - x) * 0.5 + tail * 0.02
            } else {
                ((width - 2) as f32 - x) * 0.02
            };
            (terrain, 0.0, 0.0)
        });

        let source_x = 1;
        let upstream_x = 3;
        let downstream_x = 15;
        let source_rows = 1..height - 1;

        let before: f32 = grid
            .cells()
            .iter()
            .enumerate()
            .filter(|(i, _)| grid.is_interior(*i))
            .map(|(_, c)| c.terrain + c.sediment)
            .sum();
        let upstream_before = grid.get(upstream_x, 2).terrain;
        let downstream_before = grid.get(downstream_x, 2).terrain;

        for tick in 0..1000u64 {
            for y in source_rows.clone() {
                grid.get_mut(source_x, y).water = 1.0;
            }
            step(&mut grid, &params, &executor, 21, tick);
        }

        let upstream_after = grid.get(upstream_x, 2).terrain;
        let downstream_after = grid.get(downstream_x, 2).terrain;
        assert!(
            upstream_after < upstream_before,
            "expected the steep stretch to erode: before={upstream_before}, after={upstream_after}"
        );
        assert!(
            downstream_after > downstream_before,
            "expected the shallow stretch to gain deposited sediment: before={downstream_before}, after={downstream_after}"
        );

        let after: f32 = grid
            .cells()
            .iter()
            .enumerate()
            .filter(|(i, _)| grid.is_interior(*i))
            .map(|(_, c)| c.terrain + c.sediment)
            .sum();
        assert!(
            (before - after).abs() < 1e-2 * grid.len() as f32,
            "terrain + sediment should be conserved: before={before}, after={after}"
        );
    }
}
