//! Phase/run timing, reported via `eprintln!` the way `main.rs` reports
//! generation-stage timings — this crate has no tracing/log dependency, and
//! nothing downstream of a CLI or a test harness needs structured logs.

use std::time::Instant;

/// One named timing entry.
#[derive(Clone, Copy, Debug)]
pub struct Timing {
    pub name: &'static str,
    pub ms: f64,
}

/// A running stopwatch; call `finish` to turn it into a `Timing`.
pub struct Tick {
    start: Instant,
}

impl Tick {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    pub fn finish(self, name: &'static str) -> Timing {
        Timing {
            name,
            ms: self.start.elapsed().as_secs_f64() * 1000.0,
        }
    }
}
