//! C ABI surface: an opaque handle plus free functions, so a host
//! application can embed the simulator without linking Rust. Scoped to
//! `TwoD` — a `Simulation<D>` is generic over topology for the Rust API,
//! but a C caller needs one concrete monomorphization to link against, and
//! 2D is the common embedding case.

use crate::params::Params;
use crate::topology::TwoD;
use crate::Simulation;

/// C-compatible mirror of `Params`. Field order and types must stay in sync
/// by hand since `#[repr(C)]` can't derive from `Params` directly.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct SimulationVariables {
    pub thread_count: usize,
    pub rainfall: f32,
    pub evaporation: f32,
    pub dt: f32,
    pub gravity: f32,
    pub pipe_length: f32,
    pub sediment_capacity: f32,
    pub dissolve_constant: f32,
    pub deposition_constant: f32,
    pub max_step: f32,
    pub rain_random: u32,
    /// Added after the original field list; keep new fields appended here,
    /// not interleaved, so existing callers' struct layouts stay valid.
    pub seed: u64,
}

impl From<SimulationVariables> for Params {
    fn from(v: SimulationVariables) -> Self {
        Params {
            rainfall: v.rainfall,
            evaporation: v.evaporation,
            dt: v.dt,
            gravity: v.gravity,
            pipe_length: v.pipe_length,
            sediment_capacity: v.sediment_capacity,
            dissolve_constant: v.dissolve_constant,
            deposition_constant: v.deposition_constant,
            max_step: v.max_step,
            rain_random: v.rain_random,
            seed: v.seed,
            thread_count: v.thread_count,
        }
    }
}

impl From<Params> for SimulationVariables {
    fn from(p: Params) -> Self {
        SimulationVariables {
            thread_count: p.thread_count,
            rainfall: p.rainfall,
            evaporation: p.evaporation,
            dt: p.dt,
            gravity: p.gravity,
            pipe_length: p.pipe_length,
            sediment_capacity: p.sediment_capacity,
            dissolve_constant: p.dissolve_constant,
            deposition_constant: p.deposition_constant,
            max_step: p.max_step,
            rain_random: p.rain_random,
            seed: p.seed,
        }
    }
}

/// The crate's default parameters, as a starting point for callers who only
/// want to tweak a couple of fields before calling `new_simulation`.
#[no_mangle]
pub extern "C" fn new_simulation_variables() -> SimulationVariables {
    Params::default().into()
}

/// Construct a 2D simulation and return an opaque handle, or null if `vars`
/// or `size_x`/`size_y` fail validation — construction is the only place
/// this crate reports an error to a C caller; `step_simulation` cannot
/// fail.
#[no_mangle]
pub extern "C" fn new_simulation(vars: SimulationVariables, size_x: usize, size_y: usize) -> *mut Simulation<TwoD> {
    match Simulation::<TwoD>::new(size_x, size_y, vars.into()) {
        Ok(sim) => Box::into_raw(Box::new(sim)),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Release a simulation created by `new_simulation`.
///
/// # Safety
/// `handle` must be a pointer returned by `new_simulation`, not already
/// freed, and not used again after this call.
#[no_mangle]
pub unsafe extern "C" fn free_simulation(handle: *mut Simulation<TwoD>) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Advance the simulation by one tick. No-op on a null handle.
///
/// # Safety
/// `handle` must be a live pointer returned by `new_simulation`.
#[no_mangle]
pub unsafe extern "C" fn step_simulation(handle: *mut Simulation<TwoD>) {
    if let Some(sim) = handle.as_mut() {
        sim.step();
    }
}

/// # Safety
/// `handle` must be a live pointer returned by `new_simulation`.
#[no_mangle]
pub unsafe extern "C" fn get_terrain_height(handle: *const Simulation<TwoD>, x: usize, y: usize) -> f32 {
    read_cell(handle, x, y, Simulation::terrain_height)
}

/// # Safety
/// `handle` must be a live pointer returned by `new_simulation`.
#[no_mangle]
pub unsafe extern "C" fn get_water_height(handle: *const Simulation<TwoD>, x: usize, y: usize) -> f32 {
    read_cell(handle, x, y, Simulation::water_height)
}

/// # Safety
/// `handle` must be a live pointer returned by `new_simulation`.
#[no_mangle]
pub unsafe extern "C" fn get_sediment_height(handle: *const Simulation<TwoD>, x: usize, y: usize) -> f32 {
    read_cell(handle, x, y, Simulation::sediment_height)
}

unsafe fn read_cell(
    handle: *const Simulation<TwoD>,
    x: usize,
    y: usize,
    accessor: impl Fn(&Simulation<TwoD>, usize, usize) -> f32,
) -> f32 {
    match handle.as_ref() {
        Some(sim) if x < sim.width() && y < sim.height() => accessor(sim, x, y),
        _ => 0.0,
    }
}

/// Copy one row of combined height (`terrain + water + sediment`) into
/// `out`, which must have room for at least `width()` elements. Returns the
/// number of elements written, or 0 on any invalid argument. A bulk
/// accessor so a host doesn't pay one FFI call per cell to draw a frame.
///
/// # Safety
/// `handle` must be a live pointer returned by `new_simulation`; `out` must
/// be valid for `out_len` writes of `f32`.
#[no_mangle]
pub unsafe extern "C" fn get_grid_slice(
    handle: *const Simulation<TwoD>,
    y: usize,
    out: *mut f32,
    out_len: usize,
) -> usize {
    let sim = match handle.as_ref() {
        Some(sim) => sim,
        None => return 0,
    };
    if y >= sim.height() || out.is_null() || out_len < sim.width() {
        return 0;
    }
    let out_slice = std::slice::from_raw_parts_mut(out, sim.width());
    for (x, slot) in out_slice.iter_mut().enumerate() {
        *slot = sim.combined_height(x, y);
    }
    sim.width()
}
