// ============================================================
// Layer 6 — Grid File Header Probe
// ============================================================
// Before a resumed run hands an input file to the kernel, the
// driver checks that it is grid data at all and finds out which
// dimension to load it as:
//
//   grid:potts      ← first line must start with "grid"
//   2               ← next token is the dimension
//   ...             ← the rest belongs to the kernel
//
// Anything else is an input error and ends the run before a
// grid is constructed.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::domain::error::DriverError;
use crate::domain::invocation::Dimension;

/// Marker every grid file starts with
pub const GRID_MARKER: &str = "grid";

/// Read just enough of `path` to validate it and return its dimension.
pub fn probe_header(path: &Path) -> Result<Dimension, DriverError> {
    let file = File::open(path).map_err(|_| {
        DriverError::input(format!("could not open {}.", path.display()))
    })?;
    let mut lines = BufReader::new(file).lines();

    let first = lines
        .next()
        .transpose()
        .map_err(|e| DriverError::input(format!("could not read {}: {e}", path.display())))?
        .unwrap_or_default();
    if !first.starts_with(GRID_MARKER) {
        return Err(DriverError::input("file does not contain grid data."));
    }

    // The dimension is the next token, possibly after blank lines
    for line in lines {
        let line = line
            .map_err(|e| DriverError::input(format!("could not read {}: {e}", path.display())))?;
        let Some(token) = line.split_whitespace().next() else {
            continue;
        };
        return token
            .parse::<u64>()
            .ok()
            .and_then(|d| Dimension::try_from(d).ok())
            .ok_or_else(|| {
                DriverError::input(format!("grid in {} has unsupported dimension '{token}'.", path.display()))
            });
    }

    Err(DriverError::input(format!("grid in {} declares no dimension.", path.display())))
}
