use crate::params::Params;
use crate::pipe::Pipe;
use crate::topology::{dir, Topology, Velocity};

/// Committed per-location state: the fields every phase not currently
/// writing them treats as read-only. Deliberately does NOT carry pipes or
/// staging fields — those live in their own arrays on `Grid` (see
/// `grid.rs`) so a phase that reads every cell's committed state and writes
/// a disjoint array never needs to borrow the same `Vec` two ways at once.
/// A cell bundling its own pipes is the more obvious layout; splitting them
/// out is purely to make that borrow pattern work in safe Rust.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cell<D: Topology> {
    pub terrain: f32,
    pub water: f32,
    pub sediment: f32,
    pub velocity: D::Velocity,
}

/// Values written by the transport/steepness phase and committed into the
/// matching `Cell` by the finish phase. Kept as its
/// own array on `Grid` rather than `Temp*` fields on `Cell` itself, so the
/// phase that writes it only ever borrows this array mutably while reading
/// `Cell`/`Pipe` storage immutably.
#[derive(Clone, Copy, Debug, Default)]
pub struct Staging<D: Topology> {
    pub water: f32,
    pub sediment: f32,
    pub terrain: f32,
    pub velocity: D::Velocity,
}

impl<D: Topology> Cell<D> {
    /// `water + sediment`. Sediment contributes to the surface height used
    /// for gravity so depositing sediment cannot raise the surface and push
    /// a wave back upstream.
    #[inline]
    pub fn liquid_height(&self) -> f32 {
        self.water + self.sediment
    }

    #[inline]
    pub fn combined_height(&self) -> f32 {
        self.terrain + self.liquid_height()
    }

    #[inline]
    pub fn velocity_magnitude(&self) -> f32 {
        self.velocity.magnitude()
    }

    #[inline]
    pub fn sediment_transport_capacity(&self, params: &Params) -> f32 {
        params.sediment_capacity * self.velocity_magnitude()
    }

    /// Fraction of the liquid column that volume `v` represents, or 0 if the
    /// column is empty.
    #[inline]
    fn volume_pro_rata(&self, params: &Params, volume: f32) -> f32 {
        let current = self.liquid_height() * params.pipe_length * params.pipe_length;
        if current > 0.0 {
            volume / current
        } else {
            0.0
        }
    }

    #[inline]
    pub fn water_for_volume(&self, params: &Params, volume: f32) -> f32 {
        self.volume_pro_rata(params, volume) * self.water
    }

    #[inline]
    pub fn sediment_for_volume(&self, params: &Params, volume: f32) -> f32 {
        self.volume_pro_rata(params, volume) * self.sediment
    }

    /// With probability `1/rain_random`, add `rainfall * rain_random * dt`.
    /// `trigger` is supplied by the caller (a pure hash of seed/step/index,
    /// see `rng::rain_trigger`) rather than drawn here, so this function has
    /// no hidden RNG state.
    #[inline]
    pub fn apply_rainfall(&mut self, params: &Params, trigger: bool) {
        if trigger {
            self.water += params.rainfall * params.rain_random as f32 * params.dt;
        }
    }

    /// Commit staging fields written by the transport/steepness phase. The
    /// `max(0, _)` clamps guard against float drift, not a persistent bug —
    /// a debug build instead asserts non-negativity before this point (see
    /// `step.rs`).
    pub fn finish(&mut self, temp_water: f32, temp_sediment: f32, temp_terrain: f32, temp_velocity: D::Velocity) {
        self.water = temp_water.max(0.0);
        self.sediment = temp_sediment.max(0.0);
        self.terrain = temp_terrain;
        self.velocity = temp_velocity;
    }

    /// `terrain -= delta; sediment += delta`, so `terrain + sediment` is
    /// invariant across this call.
    pub fn update_erosion_and_deposition(&mut self, params: &Params) {
        let capacity = self.sediment_transport_capacity(params);
        let diff = capacity - self.sediment;
        let rate = if diff > 0.0 {
            params.dissolve_constant
        } else {
            params.deposition_constant
        };
        let delta = diff * rate * params.dt;
        self.terrain -= delta;
        self.sediment += delta;
    }

    /// Sediment is never evaporated, only water.
    pub fn update_evaporation(&mut self, params: &Params) {
        self.water *= (1.0 - params.evaporation * params.dt).max(0.0);
    }

    pub fn is_finite(&self) -> bool {
        self.terrain.is_finite() && self.water.is_finite() && self.sediment.is_finite() && self.velocity_magnitude().is_finite()
    }
}

/// Update this cell's outgoing pipes in place from the combined heights of
/// self and its `DEGREE` neighbors, then scale every outgoing pipe so the
/// cell cannot drain more water than it holds. A free
/// function (not a `Cell` method) because it mutates the separate pipe
/// array, not the cell itself.
pub fn update_pipes<D: Topology>(
    cell: &Cell<D>,
    pipes: &mut [Pipe; 4],
    params: &Params,
    neighbor_heights: &[f32],
) {
    debug_assert_eq!(neighbor_heights.len(), D::DEGREE);
    let height = cell.combined_height();
    for i in 0..D::DEGREE {
        pipes[i].update(params, height, neighbor_heights[i]);
    }

    let total: f32 = pipes[..D::DEGREE].iter().map(|p| p.flow).sum();
    let current_volume = cell.water * params.pipe_length * params.pipe_length;
    let denom = total * params.dt;
    let k = if denom == 0.0 {
        0.0
    } else {
        let k = current_volume / denom;
        if k.is_infinite() {
            0.0
        } else {
            k.min(1.0)
        }
    };
    for i in 0..D::DEGREE {
        pipes[i].scale_back(k);
    }
}

/// Transport water and sediment according to this cell's own outflow and the
/// inflow read from each neighbor's opposite pipe, then recompute velocity
/// as the central-difference mean lateral flow. Returns the
/// staged `(water, sediment, velocity)` — never writes `cell` directly.
///
/// `neighbor_cells`/`neighbor_pipes` are `cell`'s `DEGREE` neighbors (and
/// their full pipe banks) in canonical topology order.
pub fn transport<D: Topology>(
    cell: &Cell<D>,
    pipes: &[Pipe; 4],
    params: &Params,
    neighbor_cells: &[&Cell<D>],
    neighbor_pipes: &[&[Pipe; 4]],
) -> (f32, f32, D::Velocity)
where
    D::Velocity: VelocityFromFlows,
{
    debug_assert_eq!(neighbor_cells.len(), D::DEGREE);
    debug_assert_eq!(neighbor_pipes.len(), D::DEGREE);

    let outflow: f32 = pipes[..D::DEGREE].iter().map(|p| p.flow).sum();
    let mut inflow = 0.0;
    for i in 0..D::DEGREE {
        let back = D::opposite(i);
        inflow += neighbor_pipes[i][back].flow;
    }

    let delta_volume = (inflow - outflow) * params.dt;
    let temp_water = cell.water + delta_volume / (params.pipe_length * params.pipe_length);

    let out_volume = outflow * params.dt;
    let mut temp_sediment = cell.sediment - cell.sediment_for_volume(params, out_volume);
    for i in 0..D::DEGREE {
        let back = D::opposite(i);
        let in_volume = neighbor_pipes[i][back].flow * params.dt;
        temp_sediment += neighbor_cells[i].sediment_for_volume(params, in_volume);
    }

    let mut flows = [(0.0f32, 0.0f32); 4];
    for i in 0..D::DEGREE {
        let back = D::opposite(i);
        flows[i] = (neighbor_pipes[i][back].flow, pipes[i].flow);
    }
    let velocity = D::Velocity::from_flows(&flows[..D::DEGREE]);

    (temp_water, temp_sediment, velocity)
}

/// Relax terrain against neighbors that differ by more than
/// `max_step * distance`: half the excess slips toward the lower neighbor.
/// Generalized over `DEGREE` neighbors so it applies uniformly to 1D and
/// 2D, rather than only to the 2D case.
pub fn steepness<D: Topology>(cell: &Cell<D>, params: &Params, neighbor_terrain: &[f32]) -> f32 {
    debug_assert_eq!(neighbor_terrain.len(), D::DEGREE);
    let distances = D::distances();
    let mut total_change = 0.0;
    for i in 0..D::DEGREE {
        let diff = cell.terrain - neighbor_terrain[i];
        let step = params.max_step * distances[i];
        total_change += if diff > step {
            (step - diff) / 2.0
        } else if diff < -step {
            (-step - diff) / 2.0
        } else {
            0.0
        };
    }
    cell.terrain + total_change / D::DEGREE as f32
}

/// Reconstruct a cell's velocity from central-difference flow pairs
/// `(inflow, outflow)` per direction, in canonical topology order. 1D has
/// one pair (a single axis); 2D has two axes built from four directions.
pub trait VelocityFromFlows: Velocity {
    fn from_flows(flows: &[(f32, f32)]) -> Self;
}

impl VelocityFromFlows for f32 {
    /// `(left_in - left_out - right_in + right_out) / 2`.
    fn from_flows(flows: &[(f32, f32)]) -> Self {
        let (left_in, left_out) = flows[dir::LEFT];
        let (right_in, right_out) = flows[dir::RIGHT];
        (left_in - left_out - right_in + right_out) / 2.0
    }
}

impl VelocityFromFlows for crate::topology::Vec2 {
    fn from_flows(flows: &[(f32, f32)]) -> Self {
        let (left_in, left_out) = flows[dir::LEFT];
        let (right_in, right_out) = flows[dir::RIGHT];
        let (up_in, up_out) = flows[dir::UP];
        let (down_in, down_out) = flows[dir::DOWN];
        let vx = (left_in - left_out - right_in + right_out) / 2.0;
        let vy = (down_in - down_out - up_in + up_out) / 2.0;
        crate::topology::Vec2::new(vx, vy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{OneD, TwoD};

    #[test]
    fn liquid_height_includes_sediment() {
        let mut cell: Cell<OneD> = Cell::default();
        cell.water = 1.0;
        cell.sediment = 0.5;
        assert_eq!(cell.liquid_height(), 1.5);
        assert_eq!(cell.combined_height(), 1.5 + cell.terrain);
    }

    #[test]
    fn volume_pro_rata_zero_when_dry() {
        let cell: Cell<TwoD> = Cell::default();
        let params = Params::default();
        assert_eq!(cell.water_for_volume(&params, 1.0), 0.0);
        assert_eq!(cell.sediment_for_volume(&params, 1.0), 0.0);
    }

    #[test]
    fn erosion_conserves_terrain_plus_sediment() {
        use approx::assert_relative_eq;
        let params = Params::default();
        let mut cell: Cell<TwoD> = Cell::default();
        cell.sediment = 0.01;
        cell.velocity = crate::topology::Vec2::new(1.0, 0.0);
        let before = cell.terrain + cell.sediment;
        cell.update_erosion_and_deposition(&params);
        let after = cell.terrain + cell.sediment;
        assert_relative_eq!(before, after, epsilon = 1e-6);
    }

    #[test]
    fn evaporation_never_adds_water() {
        let params = Params::default();
        let mut cell: Cell<OneD> = Cell::default();
        cell.water = 2.0;
        cell.update_evaporation(&params);
        assert!(cell.water < 2.0 && cell.water >= 0.0);
    }

    #[test]
    fn rainfall_only_on_trigger() {
        let params = Params::default();
        let mut cell: Cell<OneD> = Cell::default();
        cell.apply_rainfall(&params, false);
        assert_eq!(cell.water, 0.0);
        cell.apply_rainfall(&params, true);
        assert!(cell.water > 0.0);
    }

    #[test]
    fn steepness_relaxes_toward_lower_neighbor() {
        let params = Params::default();
        let mut cell: Cell<OneD> = Cell::default();
        cell.terrain = 100.0 * params.max_step;
        let new_terrain = steepness(&cell, &params, &[0.0, 0.0]);
        assert!(new_terrain < cell.terrain);
    }

    #[test]
    fn pipes_update_reduces_with_k_scaling() {
        let params = Params::default();
        let mut cell: Cell<TwoD> = Cell::default();
        cell.terrain = 10.0;
        cell.water = 0.0001; // tiny water volume forces heavy scale-back
        let mut pipes = [Pipe::new(); 4];
        update_pipes(&cell, &mut pipes, &params, &[0.0, 0.0, 0.0, 0.0]);
        let total: f32 = pipes.iter().map(|p| p.flow).sum();
        let volume = cell.water * params.pipe_length * params.pipe_length;
        assert!(total * params.dt <= volume + 1e-6);
    }
}
