// ============================================================
// Layer 6 — Checkpoint I/O Metrics
// ============================================================
// Each worker times its own part of a checkpoint write and,
// when it knows it, the number of bytes it wrote. The samples
// of all workers are then reduced to one figure per write:
//
//   max_elapsed  — the slowest worker, i.e. what the run waited
//   total_bytes  — sum over workers that reported a count
//   bandwidth    — total_bytes / max_elapsed, in B/s
//
// Workers that had nothing to write report no bytes and simply
// contribute zero; they still take part in the reduction so no
// worker is left waiting at the rendezvous.
//
// The reduction is a trait so the single-process driver does not
// depend on a distributed runtime. The MPI implementation only
// exists when the `mpi` feature is enabled.

use anyhow::Result;
use std::time::Duration;

/// One worker's measurement of one I/O event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimingSample {
    /// Wall-clock time spent by this worker
    pub elapsed: Duration,

    /// Bytes this worker wrote, if it wrote anything
    pub bytes: Option<u64>,
}

impl TimingSample {
    pub fn new(elapsed: Duration, bytes: Option<u64>) -> Self {
        Self { elapsed, bytes }
    }
}

/// Samples of all workers reduced to one reportable figure
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AggregateSample {
    pub max_elapsed: Duration,
    pub total_bytes: u64,
    /// Aggregate write bandwidth in bytes per second
    pub bandwidth: f64,
}

impl AggregateSample {
    fn from_parts(max_elapsed: Duration, total_bytes: u64) -> Self {
        let secs      = max_elapsed.as_secs_f64();
        let bandwidth = if secs > 0.0 { total_bytes as f64 / secs } else { 0.0 };
        Self { max_elapsed, total_bytes, bandwidth }
    }
}

/// Reduce a set of per-worker samples: max of elapsed, sum of bytes.
pub fn aggregate(samples: &[TimingSample]) -> AggregateSample {
    let max_elapsed = samples
        .iter()
        .map(|s| s.elapsed)
        .max()
        .unwrap_or_default();
    let total_bytes = samples.iter().filter_map(|s| s.bytes).sum();
    AggregateSample::from_parts(max_elapsed, total_bytes)
}

// ─── Reducer ──────────────────────────────────────────────────────────────────
/// Cross-worker reduction of timing samples.
///
/// Every worker calls `reduce` once per I/O event with its local
/// sample. Only the root worker gets the aggregate back.
pub trait Reducer {
    fn reduce(&self, local: &TimingSample) -> Result<Option<AggregateSample>>;

    /// True on the worker that reports results
    fn is_root(&self) -> bool;
}

/// The trivial reduction for a single worker
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleWorker;

impl Reducer for SingleWorker {
    fn reduce(&self, local: &TimingSample) -> Result<Option<AggregateSample>> {
        Ok(Some(aggregate(std::slice::from_ref(local))))
    }

    fn is_root(&self) -> bool {
        true
    }
}

#[cfg(feature = "mpi")]
pub use self::distributed::MpiReducer;

#[cfg(feature = "mpi")]
mod distributed {
    use super::{AggregateSample, Reducer, TimingSample};
    use anyhow::Result;
    use mpi::collective::SystemOperation;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;
    use std::time::Duration;

    const ROOT: i32 = 0;

    /// Reduces samples over all ranks of a communicator onto rank 0
    pub struct MpiReducer {
        world: SimpleCommunicator,
    }

    impl MpiReducer {
        pub fn new(world: SimpleCommunicator) -> Self {
            Self { world }
        }

        pub fn rank(&self) -> i32 {
            self.world.rank()
        }
    }

    impl Reducer for MpiReducer {
        fn reduce(&self, local: &TimingSample) -> Result<Option<AggregateSample>> {
            let elapsed = local.elapsed.as_secs_f64();
            let bytes   = local.bytes.unwrap_or(0);
            let root    = self.world.process_at_rank(ROOT);

            if self.world.rank() == ROOT {
                let mut max_elapsed = 0.0f64;
                let mut total_bytes = 0u64;
                root.reduce_into_root(&elapsed, &mut max_elapsed, SystemOperation::max());
                root.reduce_into_root(&bytes, &mut total_bytes, SystemOperation::sum());
                Ok(Some(AggregateSample::from_parts(
                    Duration::from_secs_f64(max_elapsed.max(0.0)),
                    total_bytes,
                )))
            } else {
                root.reduce_into(&elapsed, SystemOperation::max());
                root.reduce_into(&bytes, SystemOperation::sum());
                Ok(None)
            }
        }

        fn is_root(&self) -> bool {
            self.world.rank() == ROOT
        }
    }
}
