// ============================================================
// Layer 2 — Run Settings
// ============================================================
// Everything about a run that is not on the command line.
// Serialisable so a run can be configured from a JSON file:
//
//   {
//     "workers": 4,
//     "kernel": { "edge_2d": 256, "grains": 500, "temperature": 0.3 }
//   }
//
// Missing fields fall back to their defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::domain::error::DriverError;
use crate::kernel::KernelSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Output file for `--init` when none is given
    pub default_init_file: String,

    /// Worker count for modes whose command line has none
    /// (`--init` and resume)
    pub workers: usize,

    /// Log tessellation and checkpoint timings
    pub report_timing: bool,

    pub kernel: KernelSettings,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            default_init_file: "voronoi.dat".to_string(),
            workers:           1,
            report_timing:     true,
            kernel:            KernelSettings::default(),
        }
    }
}

impl RunSettings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, DriverError> {
        let json = fs::read_to_string(path).map_err(|e| {
            DriverError::input(format!("could not open {}: {e}", path.display()))
        })?;
        let settings: Self = serde_json::from_str(&json).map_err(|e| {
            DriverError::input(format!("invalid settings in {}: {e}", path.display()))
        })?;
        if settings.workers == 0 {
            return Err(DriverError::input(format!(
                "invalid settings in {}: workers must be positive",
                path.display()
            )));
        }
        tracing::debug!("Loaded run settings from '{}'", path.display());
        Ok(settings)
    }
}
