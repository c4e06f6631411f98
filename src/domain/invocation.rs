// ============================================================
// Layer 3 — Invocation Domain Types
// ============================================================
// The validated description of what one process launch should
// do. It is built exactly once by the CLI layer and is read-only
// for the rest of the run.
//
// The four run modes carry only the fields that make sense for
// them, so an `InitOnly` run simply has no step schedule and a
// `Resume` run has no dimension until the input header is read.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::error::DriverError;

// ─── Dimension ────────────────────────────────────────────────────────────────
/// Spatial dimension of the simulation grid. Only 2-D and 3-D grids exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Two,
    Three,
}

impl Dimension {
    /// Number of spatial axes
    pub fn rank(self) -> usize {
        match self {
            Dimension::Two   => 2,
            Dimension::Three => 3,
        }
    }
}

impl TryFrom<u64> for Dimension {
    type Error = DriverError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Dimension::Two),
            3 => Ok(Dimension::Three),
            _ => Err(DriverError::usage("initial grid must be of dimension 2 or 3")),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rank())
    }
}

// ─── Schedule ─────────────────────────────────────────────────────────────────
/// How far to run and how often to checkpoint.
///
/// `increment` is always in `1..=total_steps`, so a schedule can never
/// loop forever and never batches more than one increment into a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    total_steps: u64,
    increment:   u64,
}

impl Schedule {
    /// Validate and build a schedule
    pub fn new(total_steps: u64, increment: u64) -> Result<Self, DriverError> {
        if increment == 0 {
            return Err(DriverError::usage("output increment must be positive"));
        }
        if increment > total_steps {
            return Err(DriverError::usage(
                "output increment must be smaller than number of time steps",
            ));
        }
        Ok(Self { total_steps, increment })
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    pub fn increment(&self) -> u64 {
        self.increment
    }

    /// The chunks a run starting at `start` performs, as
    /// `(steps_to_advance, iteration_reached)` pairs.
    ///
    /// The last chunk is shortened so the run stops exactly on
    /// `total_steps`. Starting at or past the end yields nothing.
    pub fn chunks_from(&self, start: u64) -> impl Iterator<Item = (u64, u64)> + '_ {
        let total = self.total_steps;
        let inc   = self.increment;
        let mut i = start;
        std::iter::from_fn(move || {
            if i >= total {
                return None;
            }
            let steps = inc.min(total - i);
            i += steps;
            Some((steps, i))
        })
    }
}

// ─── Mode ─────────────────────────────────────────────────────────────────────
/// Bare mode tag, used for logging and dispatch summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Help,
    InitOnly,
    NonStop,
    Resume,
}

// ─── Invocation ───────────────────────────────────────────────────────────────
/// A validated command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Print usage and exit successfully
    Help,

    /// Tessellate a fresh grid and write it once
    InitOnly {
        dimension: Dimension,
        output:    PathBuf,
        workers:   usize,
    },

    /// Tessellate, write the initial grid, then simulate and checkpoint
    NonStop {
        dimension: Dimension,
        output:    PathBuf,
        schedule:  Schedule,
        workers:   usize,
    },

    /// Load a grid from `input`, then simulate and checkpoint.
    /// Checkpoint names and the start iteration come from `output`.
    Resume {
        input:    PathBuf,
        output:   PathBuf,
        schedule: Schedule,
        workers:  usize,
    },
}

impl Invocation {
    pub fn mode(&self) -> Mode {
        match self {
            Invocation::Help             => Mode::Help,
            Invocation::InitOnly { .. }  => Mode::InitOnly,
            Invocation::NonStop { .. }   => Mode::NonStop,
            Invocation::Resume { .. }    => Mode::Resume,
        }
    }

    /// Total steps requested; zero for modes that do not simulate
    pub fn total_steps(&self) -> u64 {
        match self {
            Invocation::NonStop { schedule, .. } | Invocation::Resume { schedule, .. } => {
                schedule.total_steps()
            }
            _ => 0,
        }
    }

    /// Worker count handed to the collaborators
    pub fn workers(&self) -> usize {
        match self {
            Invocation::Help => 1,
            Invocation::InitOnly { workers, .. }
            | Invocation::NonStop { workers, .. }
            | Invocation::Resume { workers, .. } => *workers,
        }
    }
}
