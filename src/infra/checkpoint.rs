// ============================================================
// Layer 6 — Checkpoint Naming
// ============================================================
// Every checkpoint file name encodes the iteration it holds:
//
//   polycrystal.0000.dat   ← initial grid
//   polycrystal.0100.dat   ← after 100 steps
//   polycrystal.0200.dat   ← after 200 steps
//   ...
//
// A name is split into three parts:
//
//   base   "polycrystal."   everything before the number, ends in '.'
//   number "0100"           zero-padded to the width of total_steps
//   suffix ".dat"           the extension, may be empty
//
// Feeding a previously written checkpoint back in as the output
// target makes the run continue numbering from that checkpoint.
// A middle token that is not all digits ("polycrystal.final.dat")
// is simply part of the base, and numbering starts at zero.
//
// Only the final path component is scanned for dots, so a dotted
// directory ("runs/v1.2/poly") never leaks into the numbering.
//
// Reference: Rust Book §8 (Strings)

use std::path::{is_separator, PathBuf};

use crate::domain::invocation::Schedule;

/// Naming policy for all checkpoints written by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    /// Path up to, and including, the dot before the number
    base: String,

    /// Minimum number of digits printed for an iteration
    digit_width: usize,

    /// Extension including its leading dot, or empty
    suffix: String,

    /// Iteration embedded in the output path, zero if none
    start_iteration: u64,
}

impl FilenameTemplate {
    /// Derive the template for `output_path` in a run of `total_steps`.
    ///
    /// Never fails: anything that does not look like an embedded
    /// iteration number degrades to `start_iteration == 0`.
    pub fn derive(output_path: &str, total_steps: u64) -> Self {
        let digit_width = decimal_len(total_steps);

        // Dots are only meaningful inside the file name itself
        let name_start = output_path.rfind(is_separator).map_or(0, |i| i + 1);
        let name       = &output_path[name_start..];

        // Rule 1: no dot at all
        let Some(last_dot) = name.rfind('.').map(|i| name_start + i) else {
            return Self {
                base: format!("{output_path}."),
                digit_width,
                suffix: String::new(),
                start_iteration: 0,
            };
        };

        let suffix    = output_path[last_dot..].to_string();
        let last_base = format!("{}.", &output_path[..last_dot]);

        // Rule 2: exactly one dot
        let Some(prev_dot) = output_path[name_start..last_dot]
            .rfind('.')
            .map(|i| name_start + i)
        else {
            return Self { base: last_base, digit_width, suffix, start_iteration: 0 };
        };

        // Rule 3: the token between the last two dots may be a number
        match parse_iteration(&output_path[prev_dot + 1..last_dot]) {
            Some(start_iteration) => Self {
                base: format!("{}.", &output_path[..prev_dot]),
                digit_width,
                suffix,
                start_iteration,
            },
            None => Self { base: last_base, digit_width, suffix, start_iteration: 0 },
        }
    }

    /// File name for the checkpoint holding `iteration`
    pub fn format(&self, iteration: u64) -> String {
        format!(
            "{}{:0width$}{}",
            self.base,
            iteration,
            self.suffix,
            width = self.digit_width
        )
    }

    /// Same as [`format`](Self::format), as a path
    pub fn path_for(&self, iteration: u64) -> PathBuf {
        PathBuf::from(self.format(iteration))
    }

    /// Every checkpoint a run from iteration `start` writes, in order,
    /// as `(steps_to_advance_first, path)` pairs
    pub fn checkpoints<'a>(
        &'a self,
        schedule: &'a Schedule,
        start:    u64,
    ) -> impl Iterator<Item = (u64, PathBuf)> + 'a {
        schedule
            .chunks_from(start)
            .map(move |(steps, reached)| (steps, self.path_for(reached)))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn digit_width(&self) -> usize {
        self.digit_width
    }

    pub fn start_iteration(&self) -> u64 {
        self.start_iteration
    }
}

/// A non-empty, all-digit token that fits in a u64.
/// Overflowing tokens are treated as not numeric.
fn parse_iteration(token: &str) -> Option<u64> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// Number of decimal digits needed to print `n`
fn decimal_len(n: u64) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}
