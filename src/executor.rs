use rayon::{ThreadPool, ThreadPoolBuilder};

/// Fixed-size worker pool driving each phase's row-range dispatch.
///
/// A hand-rolled `std::thread` pool pulling row ranges off a shared atomic
/// counter is the obvious port of this design. This crate builds a
/// dedicated `rayon::ThreadPool` instead: rayon's work-stealing scheduler is
/// a proven, already-vetted equivalent of that same contract — a dynamic,
/// pull-based partition of disjoint row ranges across a fixed worker count
/// — and rayon is already this crate's concurrency dependency elsewhere.
/// Building a private pool (rather than using rayon's global one) is what
/// lets `thread_count` be configured per `Simulation`.
///
/// `Grid`'s `par_*` phase methods do the actual `par_chunks_mut` row split;
/// `Executor::install` just pins that work to this pool and acts as the
/// global synchronization barrier between phases — `install` does not
/// return until every row chunk finishes.
pub struct Executor {
    pool: ThreadPool,
}

impl Executor {
    /// `threads == 0` means "use `hardware_concurrency()`", i.e. let rayon
    /// pick its own default.
    pub fn new(threads: usize) -> Self {
        let mut builder = ThreadPoolBuilder::new();
        if threads > 0 {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .expect("failed to build the simulation's worker pool");
        Self { pool }
    }

    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run `f` on this pool and block until it completes.
    pub fn install<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        self.pool.install(f)
    }
}
