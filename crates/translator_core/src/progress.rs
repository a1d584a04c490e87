//! Client-side progress heuristic for the synchronous-response variant.
//!
//! The server gives no progress feedback while it translates, so the
//! estimate is derived from elapsed time and upload size only. It is capped
//! below completion: only a real result may report 100%.

use std::time::Duration;

use crate::JobStatus;

/// Fixed part of the estimated duration, in seconds.
pub const BASE_SECS: f64 = 10.0;
/// Additional estimated seconds per MiB of source file.
pub const SECS_PER_MIB: f64 = 15.0;
/// Highest percentage the estimate may report on its own.
pub const CEILING_PERCENT: f64 = 95.0;

const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Estimated translation time for a file of the given size.
pub fn estimated_duration_secs(file_size_bytes: u64) -> f64 {
    BASE_SECS + (file_size_bytes as f64 / BYTES_PER_MIB) * SECS_PER_MIB
}

/// Percentage after `elapsed_secs`, in `0.0..=95.0`.
pub fn estimate_percent(elapsed_secs: f64, file_size_bytes: u64) -> f64 {
    let duration = estimated_duration_secs(file_size_bytes);
    let raw = (elapsed_secs.max(0.0) / duration) * 100.0;
    raw.min(CEILING_PERCENT)
}

/// Percentage after `elapsed_ticks` one-second ticks.
pub fn advance_estimate(elapsed_ticks: u32, file_size_bytes: u64) -> f64 {
    estimate_percent(f64::from(elapsed_ticks), file_size_bytes)
}

/// Whole seconds left on the estimate; zero or negative once it has run out.
pub fn remaining_secs(elapsed_secs: f64, file_size_bytes: u64) -> i64 {
    (estimated_duration_secs(file_size_bytes) - elapsed_secs).round() as i64
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEstimate {
    /// Time-based guess while waiting on a blocking upload.
    Simulated {
        elapsed: Duration,
        file_size_bytes: u64,
    },
    /// Only the coarse state reported by the status endpoint.
    Coarse(JobStatus),
    /// A real terminal success arrived.
    Finished,
}

impl ProgressEstimate {
    pub fn simulated(file_size_bytes: u64) -> Self {
        Self::Simulated {
            elapsed: Duration::ZERO,
            file_size_bytes,
        }
    }

    /// Current percentage, if the estimate has one.
    pub fn percent(&self) -> Option<f64> {
        match self {
            Self::Simulated {
                elapsed,
                file_size_bytes,
            } => Some(estimate_percent(elapsed.as_secs_f64(), *file_size_bytes)),
            Self::Coarse(_) => None,
            Self::Finished => Some(100.0),
        }
    }

    /// Adds one tick of `interval`. Returns `true` while the estimate can still grow.
    pub(crate) fn advance(&mut self, interval: Duration) -> bool {
        match self {
            Self::Simulated {
                elapsed,
                file_size_bytes,
            } => {
                *elapsed += interval;
                estimate_percent(elapsed.as_secs_f64(), *file_size_bytes) < CEILING_PERCENT
            }
            Self::Coarse(_) | Self::Finished => false,
        }
    }

    /// `~Ns remaining` while time is left on the estimate, `Finalizing...` afterwards.
    pub fn remaining_label(&self) -> Option<String> {
        match self {
            Self::Simulated {
                elapsed,
                file_size_bytes,
            } => {
                let remaining = remaining_secs(elapsed.as_secs_f64(), *file_size_bytes);
                Some(if remaining > 0 {
                    format!("~{remaining}s remaining")
                } else {
                    "Finalizing...".to_string()
                })
            }
            Self::Coarse(_) | Self::Finished => None,
        }
    }
}
