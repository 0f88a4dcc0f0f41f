//! Core fixed-window limiter implementation.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::entry::Entry;
use super::policy::Policy;

/// The outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether the request may proceed
    pub admitted: bool,
    /// Admissions left in the current window after this call
    pub remaining: u32,
    /// Absolute end of the current window, in milliseconds since the Unix epoch
    pub reset_at_ms: u64,
}

/// A fixed-window rate limiter over opaque string identifiers.
///
/// All requests for an identifier within one window share a single counter
/// and one cliff-edge reset. A client straddling a window boundary can
/// therefore be admitted up to twice the budget in a short span; that is an
/// accepted property of the fixed-window strategy, not a defect.
///
/// This struct is thread-safe and can be shared across multiple tasks. The
/// entry table is guarded by a single lock, which also serializes checks
/// for the same identifier.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    /// The policy this limiter enforces
    policy: Policy,
    /// Window entries indexed by identifier
    entries: RwLock<HashMap<String, Entry>>,
}

impl FixedWindowLimiter {
    /// Create a new limiter with an empty entry table.
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The policy this limiter enforces.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Check admission for `identifier` against the system clock.
    ///
    /// See [`check_at`](Self::check_at) for the decision semantics.
    pub fn check(&self, identifier: &str) -> Decision {
        self.check_at(identifier, epoch_ms())
    }

    /// Check admission for `identifier` as of `now_ms`.
    ///
    /// The first call for an identifier, or the first call after its
    /// previous window expired, opens a fresh window with that call already
    /// consumed. Within a live window, calls are admitted until the budget
    /// is spent; once spent, further calls are rejected without touching the
    /// entry, so a rejected caller sees the same `remaining` and reset time
    /// until the window rolls over.
    ///
    /// Identifiers are opaque. The caller decides what to key on: an IP
    /// address, a user id, or a composite such as `"colorimetry:42"`. No
    /// shape validation happens here; even the empty string is a valid key.
    pub fn check_at(&self, identifier: &str, now_ms: u64) -> Decision {
        trace!(identifier, now_ms, "Checking admission");

        let max_requests = self.policy.max_requests();
        let mut entries = self.entries.write();

        if let Some(entry) = entries.get_mut(identifier) {
            if !entry.expired(now_ms) {
                if entry.count >= max_requests {
                    debug!(
                        identifier,
                        reset_at_ms = entry.reset_at_ms,
                        "Budget exhausted, rejecting"
                    );
                    return Decision {
                        admitted: false,
                        remaining: 0,
                        reset_at_ms: entry.reset_at_ms,
                    };
                }

                entry.count += 1;
                return Decision {
                    admitted: true,
                    remaining: max_requests - entry.count,
                    reset_at_ms: entry.reset_at_ms,
                };
            }
        }

        // Absent and expired entries are treated alike: the expired one is
        // overwritten rather than swept here.
        let entry = Entry::open(now_ms, self.policy.interval_ms());
        debug!(
            identifier,
            reset_at_ms = entry.reset_at_ms,
            "Opening fresh window"
        );
        entries.insert(identifier.to_string(), entry);

        Decision {
            admitted: true,
            remaining: max_requests - 1,
            reset_at_ms: entry.reset_at_ms,
        }
    }

    /// Remove expired entries, judged against the system clock.
    pub fn sweep(&self) {
        self.sweep_at(epoch_ms());
    }

    /// Remove entries whose window ended before `now_ms`.
    ///
    /// Purely memory reclamation: `check_at` already treats expired entries
    /// as absent, so a limiter that is never swept stays correct and only
    /// grows with the number of distinct identifiers seen. Sweeping twice
    /// in succession is a no-op the second time.
    pub fn sweep_at(&self, now_ms: u64) {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.expired(now_ms));

        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, tracked = entries.len(), "Swept expired entries");
        }
    }

    /// Number of identifiers currently tracked, expired entries included.
    pub fn tracked(&self) -> usize {
        self.entries.read().len()
    }

    /// Drop all entries.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

/// Milliseconds since the Unix epoch.
fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}
