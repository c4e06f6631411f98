// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting pieces the run loop leans on:
//
//   checkpoint.rs — checkpoint file naming and the iteration
//                   a resumed run starts from
//
//   grid_file.rs  — header check for grid files handed in on
//                   the command line
//
//   metrics.rs    — per-worker timing samples and their
//                   reduction across workers
//
//   timed_io.rs   — timed checkpoint write/read with
//                   advisory bandwidth reporting

/// Checkpoint filename template
pub mod checkpoint;

/// Grid file header validation
pub mod grid_file;

/// Timing samples and cross-worker reduction
pub mod metrics;

/// Timed checkpoint I/O
pub mod timed_io;
