// ============================================================
// Layer 5 — Simulation Kernel (Potts grain growth)
// ============================================================
// The only layer that knows what a grid looks like. The driver
// reaches it exclusively through the `GridKernel` trait.
//
//   lattice.rs — periodic D-dimensional lattice + text layout
//   voronoi.rs — initial microstructure by Voronoi tessellation
//   potts.rs   — checkerboard Metropolis sweeps
//
// Every call builds a rayon pool with exactly `workers` threads,
// so the worker count from the command line is honoured without
// touching rayon's global pool.

pub mod lattice;
pub mod potts;
pub mod voronoi;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::invocation::Dimension;
use crate::domain::traits::GridKernel;
use lattice::Lattice;

// ─── Kernel Settings ──────────────────────────────────────────────────────────
/// Physical and numerical parameters of the Potts kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelSettings {
    /// Sites per edge of a 2-D grid
    pub edge_2d: usize,
    /// Sites per edge of a 3-D grid
    pub edge_3d: usize,
    /// Number of Voronoi seeds in a fresh grid
    pub grains: usize,
    /// Monte-Carlo temperature kT, in units of the boundary energy
    pub temperature: f64,
    /// Seed for tessellation and Monte-Carlo streams
    pub seed: u64,
}

impl Default for KernelSettings {
    fn default() -> Self {
        Self {
            edge_2d:     128,
            edge_3d:     32,
            grains:      64,
            temperature: 0.5,
            seed:        42,
        }
    }
}

impl KernelSettings {
    /// Edges are rounded up to an even length so the checkerboard
    /// colouring stays consistent across the periodic boundary
    fn even_edge(edge: usize) -> usize {
        let edge = edge.max(2);
        edge + edge % 2
    }
}

// ─── Grid handle ──────────────────────────────────────────────────────────────
/// A Potts grid of either dimension
#[derive(Debug, Clone, PartialEq)]
pub enum PottsGrid {
    Planar(Lattice<2>),
    Volumetric(Lattice<3>),
}

impl PottsGrid {
    pub fn dimension(&self) -> Dimension {
        match self {
            PottsGrid::Planar(_)     => Dimension::Two,
            PottsGrid::Volumetric(_) => Dimension::Three,
        }
    }

    pub fn sweeps(&self) -> u64 {
        match self {
            PottsGrid::Planar(l)     => l.sweeps(),
            PottsGrid::Volumetric(l) => l.sweeps(),
        }
    }

    pub fn boundary_count(&self) -> usize {
        match self {
            PottsGrid::Planar(l)     => l.boundary_count(),
            PottsGrid::Volumetric(l) => l.boundary_count(),
        }
    }

    fn to_text(&self) -> String {
        match self {
            PottsGrid::Planar(l)     => l.to_text(),
            PottsGrid::Volumetric(l) => l.to_text(),
        }
    }
}

// ─── PottsKernel ──────────────────────────────────────────────────────────────
/// Voronoi start plus Monte-Carlo grain growth.
pub struct PottsKernel {
    settings: KernelSettings,
    /// False on workers that must not touch checkpoint files
    writer:   bool,
}

impl PottsKernel {
    pub fn new(settings: KernelSettings) -> Self {
        Self { settings, writer: true }
    }

    /// Mark this worker as an idle writer: `output` becomes a no-op
    pub fn idle_writer(mut self) -> Self {
        self.writer = false;
        self
    }

    fn pool(workers: usize) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .build()
            .context("failed to create thread pool")
    }
}

impl GridKernel for PottsKernel {
    type Grid = PottsGrid;

    fn generate(&self, dimension: Dimension, workers: usize) -> Result<PottsGrid> {
        let s    = &self.settings;
        let pool = Self::pool(workers)?;
        let grid = pool.install(|| match dimension {
            Dimension::Two => {
                let e = KernelSettings::even_edge(s.edge_2d);
                PottsGrid::Planar(voronoi::tessellate([e, e], s.grains, s.seed))
            }
            Dimension::Three => {
                let e = KernelSettings::even_edge(s.edge_3d);
                PottsGrid::Volumetric(voronoi::tessellate([e, e, e], s.grains, s.seed))
            }
        });
        Ok(grid)
    }

    fn update(&self, grid: &mut PottsGrid, steps: u64, workers: usize) -> Result<()> {
        let s    = &self.settings;
        let pool = Self::pool(workers)?;
        pool.install(|| match grid {
            PottsGrid::Planar(l)     => potts::run(l, steps, s.temperature, s.seed),
            PottsGrid::Volumetric(l) => potts::run(l, steps, s.temperature, s.seed),
        });
        tracing::debug!(
            "Advanced {}-D grid by {} sweeps ({} total, {} boundary bonds)",
            grid.dimension(),
            steps,
            grid.sweeps(),
            grid.boundary_count(),
        );
        Ok(())
    }

    fn output(&self, grid: &PottsGrid, path: &Path) -> Result<Option<u64>> {
        if !self.writer {
            return Ok(None);
        }

        // write next to the target, then rename over it
        let text    = grid.to_text();
        let partial = partial_path(path);
        fs::write(&partial, &text)
            .with_context(|| format!("Cannot write grid to '{}'", partial.display()))?;
        if let Err(e) = fs::rename(&partial, path) {
            // the target keeps whatever it held before
            let _ = fs::remove_file(&partial);
            return Err(e)
                .with_context(|| format!("Cannot move grid into place at '{}'", path.display()));
        }

        Ok(Some(text.len() as u64))
    }

    fn load(&self, path: &Path, dimension: Dimension) -> Result<PottsGrid> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read grid from '{}'", path.display()))?;
        let grid = match dimension {
            Dimension::Two   => PottsGrid::Planar(Lattice::parse(&text)?),
            Dimension::Three => PottsGrid::Volumetric(Lattice::parse(&text)?),
        };
        Ok(grid)
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".partial");
    PathBuf::from(name)
}
