// ============================================================
// Layer 6 — Timed Checkpoint I/O
// ============================================================
// Wraps the kernel's `output` and `load` calls with a monotonic
// clock and hands the local sample to the reducer. The root
// worker logs the aggregate:
//
//   Wrote polycrystal.0100.dat in 0.41 sec. Write bandwidth was 2.1e8 B/s
//
// Reporting is advisory. A failed reduction is logged and the
// checkpoint write still counts as successful; only a failure of
// the write itself ends the run.

use std::path::Path;
use std::time::Instant;

use crate::domain::error::DriverError;
use crate::domain::traits::GridKernel;
use crate::infra::grid_file::probe_header;
use crate::infra::metrics::{AggregateSample, Reducer, TimingSample};

/// Timed write/read of checkpoints for one run
pub struct TimedIo<'a, K: GridKernel> {
    kernel:  &'a K,
    reducer: &'a dyn Reducer,
    report:  bool,
}

impl<'a, K: GridKernel> TimedIo<'a, K> {
    pub fn new(kernel: &'a K, reducer: &'a dyn Reducer, report: bool) -> Self {
        Self { kernel, reducer, report }
    }

    /// Write `grid` to `path` and return this worker's timing sample.
    pub fn write(&self, grid: &K::Grid, path: &Path) -> Result<TimingSample, DriverError> {
        if self.reducer.is_root() {
            tracing::debug!("Writing {}", path.display());
        }

        let start  = Instant::now();
        let bytes  = self.kernel.output(grid, path)?;
        let sample = TimingSample::new(start.elapsed(), bytes);

        if let Some(agg) = self.reduce(&sample, path) {
            if self.report {
                tracing::info!(
                    "Wrote {} in {:.3} sec. Write bandwidth was {:.4e} B/s, excluding aggregation overhead.",
                    path.display(),
                    agg.max_elapsed.as_secs_f64(),
                    agg.bandwidth,
                );
            }
        }
        Ok(sample)
    }

    /// Validate the header of `path`, then load the grid it holds.
    pub fn read(&self, path: &Path) -> Result<K::Grid, DriverError> {
        let dimension = probe_header(path)?;

        let start = Instant::now();
        let grid  = self.kernel.load(path, dimension)?;
        let local = TimingSample::new(start.elapsed(), None);

        if let Some(agg) = self.reduce(&local, path) {
            if self.report {
                tracing::info!(
                    "Read {}-D grid from {} in {:.3} sec.",
                    dimension,
                    path.display(),
                    agg.max_elapsed.as_secs_f64(),
                );
            }
        }
        Ok(grid)
    }

    /// Every worker takes part in the reduction, reporting or not
    fn reduce(&self, sample: &TimingSample, path: &Path) -> Option<AggregateSample> {
        match self.reducer.reduce(sample) {
            Ok(agg) => agg,
            Err(e) => {
                tracing::warn!("Could not aggregate timing for {}: {e:#}", path.display());
                None
            }
        }
    }
}
