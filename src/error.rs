use thiserror::Error;

/// Error taxonomy for the simulation core.
///
/// `step()` itself never returns one of these in a release build — phase
/// preconditions are checked once at construction time and are assumed to
/// hold for the life of the `Simulation`. In debug builds a detected NaN/Inf
/// at a phase boundary is surfaced as [`SimError::NumericalDegeneracy`]
/// via a panic, not a `Result`, since by that point the simulation state is
/// already corrupted and there is nothing sensible to hand back to the
/// caller.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameters(&'static str),

    #[error("numerical degeneracy (NaN/Inf) in phase {phase} at cell {index}")]
    NumericalDegeneracy { phase: &'static str, index: usize },
}
