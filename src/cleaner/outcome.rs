//! Terminal result of one cleanup request.

/// Outcome of a single cleanup invocation. Produced once, never retried
/// internally; callers decide whether a failed request is worth repeating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// The cleanup ran and reclaimed the given number of bytes.
    ///
    /// Toolchain-delegated purges report 0 because the toolchain does not
    /// say how much it removed.
    Success { message: String, reclaimed_bytes: u64 },
    /// The cleanup was attempted and failed.
    Failed { message: String },
    /// There was nothing to do, or the operation does not apply.
    Skipped { reason: String },
}

impl CleanupOutcome {
    pub fn success(message: impl Into<String>, reclaimed_bytes: u64) -> Self {
        CleanupOutcome::Success {
            message: message.into(),
            reclaimed_bytes,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        CleanupOutcome::Failed {
            message: message.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        CleanupOutcome::Skipped {
            reason: reason.into(),
        }
    }

    /// Bytes reclaimed, zero for anything but a success.
    pub fn reclaimed_bytes(&self) -> u64 {
        match self {
            CleanupOutcome::Success { reclaimed_bytes, .. } => *reclaimed_bytes,
            _ => 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CleanupOutcome::Success { .. })
    }
}
