// ============================================================
// Layer 5 — Periodic Lattice
// ============================================================
// A D-dimensional periodic box of grain ids, stored row-major
// with the last axis varying fastest. Neighbours are the 2·D
// von Neumann neighbours with periodic wrap.
//
// On-disk text layout:
//
//   grid:potts          marker
//   2                   dimension
//   128 128             extents
//   40                  completed sweeps
//   0 0 0 1 1 ...       ids, one row (last axis) per line

use anyhow::{bail, ensure, Context, Result};
use std::fmt::Write as _;

pub const MARKER: &str = "grid:potts";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lattice<const D: usize> {
    extents: [usize; D],
    ids:     Vec<u32>,
    sweeps:  u64,
}

impl<const D: usize> Lattice<D> {
    /// A lattice with every site set to grain 0
    pub fn new(extents: [usize; D]) -> Self {
        let len: usize = extents.iter().product();
        Self { extents, ids: vec![0; len], sweeps: 0 }
    }

    pub fn from_ids(extents: [usize; D], ids: Vec<u32>) -> Result<Self> {
        let len = extents
            .iter()
            .try_fold(1usize, |acc, &e| acc.checked_mul(e))
            .context("extents overflow")?;
        ensure!(ids.len() == len, "expected {len} sites, got {}", ids.len());
        Ok(Self { extents, ids, sweeps: 0 })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    pub(crate) fn set_ids(&mut self, ids: Vec<u32>) {
        debug_assert_eq!(ids.len(), self.ids.len());
        self.ids = ids;
    }

    /// Monte-Carlo sweeps applied since tessellation
    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }

    pub(crate) fn advance_sweeps(&mut self) {
        self.sweeps += 1;
    }

    pub fn coords(&self, mut index: usize) -> [usize; D] {
        let mut c = [0; D];
        for axis in (0..D).rev() {
            c[axis] = index % self.extents[axis];
            index  /= self.extents[axis];
        }
        c
    }

    pub fn index(&self, coords: [usize; D]) -> usize {
        coords
            .iter()
            .zip(self.extents.iter())
            .fold(0, |acc, (&c, &e)| acc * e + c)
    }

    /// Checkerboard colour (0 or 1) of a site
    pub fn colour(&self, index: usize) -> usize {
        self.coords(index).iter().sum::<usize>() % 2
    }

    /// The 2·D nearest neighbours of `index`, with periodic wrap
    pub fn neighbours(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let centre = self.coords(index);
        (0..2 * D).map(move |k| {
            let axis  = k / 2;
            let ext   = self.extents[axis];
            let mut c = centre;
            c[axis] = if k % 2 == 0 { (c[axis] + ext - 1) % ext } else { (c[axis] + 1) % ext };
            self.index(c)
        })
    }

    /// Number of unlike nearest-neighbour pairs (the Potts energy)
    pub fn boundary_count(&self) -> usize {
        (0..self.len())
            .map(|i| self.neighbours(i).filter(|&n| self.ids[n] != self.ids[i]).count())
            .sum::<usize>()
            / 2
    }

    /// Render the lattice in its text layout
    pub fn to_text(&self) -> String {
        let row     = self.extents[D - 1];
        let mut out = String::with_capacity(self.ids.len() * 4 + 64);

        // writing into a String cannot fail
        let _ = writeln!(out, "{MARKER}");
        let _ = writeln!(out, "{D}");
        let extents: Vec<String> = self.extents.iter().map(|e| e.to_string()).collect();
        let _ = writeln!(out, "{}", extents.join(" "));
        let _ = writeln!(out, "{}", self.sweeps);

        for chunk in self.ids.chunks(row) {
            let line: Vec<String> = chunk.iter().map(|id| id.to_string()).collect();
            let _ = writeln!(out, "{}", line.join(" "));
        }
        out
    }

    /// Parse the text layout back, checking every header field
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();

        let marker = lines.next().unwrap_or_default();
        ensure!(marker.starts_with("grid"), "file does not contain grid data");

        let dim: usize = lines
            .next()
            .context("missing dimension")?
            .trim()
            .parse()
            .context("dimension is not an integer")?;
        if dim != D {
            bail!("grid has dimension {dim}, expected {D}");
        }

        let extent_line = lines.next().context("missing extents")?;
        let parsed: Vec<usize> = extent_line
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()
            .context("extents are not integers")?;
        let extents: [usize; D] = parsed
            .try_into()
            .map_err(|v: Vec<usize>| anyhow::anyhow!("expected {D} extents, got {}", v.len()))?;
        ensure!(extents.iter().all(|&e| e > 0), "extents must be positive");

        let sweeps: u64 = lines
            .next()
            .context("missing sweep count")?
            .trim()
            .parse()
            .context("sweep count is not an integer")?;

        let ids: Vec<u32> = lines
            .flat_map(str::split_whitespace)
            .map(str::parse)
            .collect::<Result<_, _>>()
            .context("grain ids are not integers")?;

        let mut lattice = Self::from_ids(extents, ids)?;
        lattice.sweeps  = sweeps;
        Ok(lattice)
    }
}
