use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Immutable tunables for a run. Defaults match the reference constants from
/// the original pipe-model erosion implementation this crate is built on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Params {
    /// Mean water-height added per rain event.
    pub rainfall: f32,
    /// Fractional water loss per unit time.
    pub evaporation: f32,
    /// Time step.
    pub dt: f32,
    /// Acceleration constant for the flux update.
    pub gravity: f32,
    /// Linear size of one cell; cell footprint is `pipe_length^2`.
    pub pipe_length: f32,
    /// Proportionality of carrying capacity to speed.
    pub sediment_capacity: f32,
    /// Erosion rate applied when capacity exceeds carried sediment.
    pub dissolve_constant: f32,
    /// Deposition rate applied when carried sediment exceeds capacity.
    pub deposition_constant: f32,
    /// Maximum tolerated terrain slope per cell spacing before slippage.
    pub max_step: f32,
    /// `R >= 1`. On any cell in a rain phase, with probability `1/R` the
    /// cell receives `rainfall * R * dt`, keeping the long-run mean at
    /// `rainfall * dt`.
    pub rain_random: u32,
    /// Seed for the deterministic per-cell rainfall hash.
    pub seed: u64,
    /// Worker count for the step pipeline's thread pool. `0` means use the
    /// host's default parallelism (see `Executor::new`).
    pub thread_count: usize,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            rainfall: 0.4,
            evaporation: 0.05,
            dt: 0.1,
            gravity: 9.81,
            pipe_length: 1.0,
            sediment_capacity: 0.15,
            dissolve_constant: 0.025,
            deposition_constant: 10.0,
            max_step: (35.0_f32).to_radians().tan(),
            rain_random: 10,
            seed: 0,
            thread_count: 0,
        }
    }
}

impl Params {
    /// Reject parameter combinations that would make the simulation
    /// degenerate or undefined.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.dt > 0.0) {
            return Err(SimError::InvalidParameters("dt must be > 0"));
        }
        if !(self.pipe_length > 0.0) {
            return Err(SimError::InvalidParameters("pipe_length must be > 0"));
        }
        if self.rain_random < 1 {
            return Err(SimError::InvalidParameters("rain_random must be >= 1"));
        }
        if self.evaporation * self.dt > 1.0 {
            return Err(SimError::InvalidParameters("evaporation * dt must be <= 1"));
        }
        if !self.gravity.is_finite() || !self.max_step.is_finite() {
            return Err(SimError::InvalidParameters("gravity/max_step must be finite"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Params::default().validate().is_ok());
    }

    #[test]
    fn rejects_zero_dt() {
        let mut p = Params::default();
        p.dt = 0.0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_rain_random_zero() {
        let mut p = Params::default();
        p.rain_random = 0;
        assert!(p.validate().is_err());
    }

    #[test]
    fn rejects_runaway_evaporation() {
        let mut p = Params::default();
        p.evaporation = 20.0;
        p.dt = 1.0;
        assert!(p.validate().is_err());
    }
}
