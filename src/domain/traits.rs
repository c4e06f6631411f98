// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The driver never touches grid internals. Everything it needs
// from the physics side goes through `GridKernel`, so the run
// loop works the same for the bundled Potts kernel and for the
// recording kernel used in tests.
//
// Implementations:
//   - PottsKernel    → Voronoi start + Monte-Carlo grain growth
//   - (tests) a recording kernel that counts calls in memory

use anyhow::Result;
use std::path::Path;

use crate::domain::invocation::Dimension;

// ─── GridKernel ───────────────────────────────────────────────────────────────
/// The simulation collaborator consumed by the run loop.
///
/// The grid handle is exclusively owned by the caller between
/// calls; `update` mutates it in place and `output` only reads it.
pub trait GridKernel {
    /// Opaque grid handle, specialised internally by dimension
    type Grid;

    /// Build a fresh grid (tessellation) of the given dimension
    fn generate(&self, dimension: Dimension, workers: usize) -> Result<Self::Grid>;

    /// Advance the grid by `steps` time steps
    fn update(&self, grid: &mut Self::Grid, steps: u64, workers: usize) -> Result<()>;

    /// Serialise the grid to `path`.
    /// Returns the bytes this worker wrote, or `None` when the
    /// worker took no part in the write.
    fn output(&self, grid: &Self::Grid, path: &Path) -> Result<Option<u64>>;

    /// Rebuild a grid from a file whose header declared `dimension`
    fn load(&self, path: &Path, dimension: Dimension) -> Result<Self::Grid>;
}
