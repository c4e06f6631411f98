// ============================================================
// Layer 3 — Driver Errors
// ============================================================
// Every failure the driver can surface falls into one of three
// kinds, and every one of them terminates the run:
//
//   Usage  — malformed, missing or out-of-range arguments
//   Input  — unreadable input file or malformed grid header
//   Kernel — a failure raised inside generate/update/output/load
//
// There is no retry anywhere. The operator recovers by resuming
// from the last checkpoint that was written successfully.

/// Driver-level errors.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("{0}")]
    Usage(String),

    #[error("File input error: {0}")]
    Input(String),

    #[error("kernel failure: {0:#}")]
    Kernel(anyhow::Error),
}

impl DriverError {
    /// Shorthand for building a usage error from anything printable
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    /// Shorthand for building an input error from anything printable
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// True for errors caused by the command line rather than the run
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}

/// Collaborator failures cross the boundary unchanged
impl From<anyhow::Error> for DriverError {
    fn from(e: anyhow::Error) -> Self {
        Self::Kernel(e)
    }
}
