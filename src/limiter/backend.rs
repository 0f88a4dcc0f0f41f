//! Limiter trait for abstracting the backing store.

use super::fixed_window::{Decision, FixedWindowLimiter};

/// Trait for admission backends.
///
/// Collaborators that hold a limiter through this trait keep the same call
/// contract if the in-memory table is later replaced by a shared or
/// networked backing store.
pub trait LimiterBackend: Send + Sync {
    /// Check admission for a single identifier.
    fn check(&self, identifier: &str) -> Decision;

    /// Reclaim memory held by expired entries.
    fn sweep(&self);
}

impl LimiterBackend for FixedWindowLimiter {
    fn check(&self, identifier: &str) -> Decision {
        FixedWindowLimiter::check(self, identifier)
    }

    fn sweep(&self) {
        FixedWindowLimiter::sweep(self)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::limiter::Policy;

    #[test]
    fn test_limiter_is_usable_as_a_trait_object() {
        let policy = Policy::new(Duration::from_secs(60), 1).unwrap();
        let backend: Arc<dyn LimiterBackend> = Arc::new(FixedWindowLimiter::new(policy));

        assert!(backend.check("client").admitted);
        assert!(!backend.check("client").admitted);
        backend.sweep();
    }
}
