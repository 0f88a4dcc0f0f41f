//! Quota policy definition and validation.

use std::time::Duration;

use crate::error::{Result, TurnstileError};

/// An immutable admission policy: how many requests each identifier may
/// make within one fixed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Window length
    interval: Duration,
    /// Admissions allowed per window
    max_requests: u32,
}

impl Policy {
    /// Create a new policy.
    ///
    /// A zero-length interval or a zero request budget is a configuration
    /// error reported here, at construction, never deferred to the first
    /// check or silently defaulted.
    pub fn new(interval: Duration, max_requests: u32) -> Result<Self> {
        if interval.as_millis() == 0 {
            return Err(TurnstileError::Config(
                "interval must be at least one millisecond".to_string(),
            ));
        }
        if max_requests == 0 {
            return Err(TurnstileError::Config(
                "max_requests must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            interval,
            max_requests,
        })
    }

    /// Window length.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Admissions allowed per window.
    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub(crate) fn interval_ms(&self) -> u64 {
        self.interval.as_millis() as u64
    }
}
