//! Named limiter instances.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::Config;
use crate::error::{Result, TurnstileError};
use crate::limiter::{FixedWindowLimiter, Policy};

/// Owner of one independently scoped limiter per named quota.
///
/// Each limiter has a disjoint entry table; the same identifier checked
/// under two quotas never shares a counter. Collaborators fetch the
/// instance for their feature once and hold the `Arc`.
#[derive(Debug)]
pub struct Registry {
    limiters: HashMap<String, Arc<FixedWindowLimiter>>,
}

impl Registry {
    /// Build one limiter per configured quota.
    ///
    /// Fails fast on the first invalid or duplicated quota; nothing is
    /// partially constructed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut limiters = HashMap::new();

        for quota in &config.quotas {
            let policy = Policy::new(Duration::from_millis(quota.interval_ms), quota.max_requests)
                .map_err(|err| match err {
                    TurnstileError::Config(msg) => {
                        TurnstileError::Config(format!("quota {:?}: {}", quota.name, msg))
                    }
                    other => other,
                })?;

            let previous = limiters.insert(
                quota.name.clone(),
                Arc::new(FixedWindowLimiter::new(policy)),
            );
            if previous.is_some() {
                return Err(TurnstileError::Config(format!(
                    "duplicate quota name {:?}",
                    quota.name
                )));
            }
        }

        info!(quotas = limiters.len(), "Quota registry built");
        Ok(Self { limiters })
    }

    /// Get the limiter for a named quota.
    pub fn get(&self, name: &str) -> Option<&Arc<FixedWindowLimiter>> {
        self.limiters.get(name)
    }

    /// Run one sweep pass over every registered limiter.
    pub fn sweep_all(&self) {
        for limiter in self.limiters.values() {
            limiter.sweep();
        }
    }

    /// Names of all registered quotas.
    pub fn names(&self) -> Vec<&str> {
        self.limiters.keys().map(String::as_str).collect()
    }

    /// Number of registered quotas.
    pub fn len(&self) -> usize {
        self.limiters.len()
    }

    /// Whether the registry holds no quotas.
    pub fn is_empty(&self) -> bool {
        self.limiters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuotaConfig;

    #[test]
    fn test_default_config_builds_the_stock_registry() {
        let registry = Registry::from_config(&Config::default()).unwrap();
        assert_eq!(registry.len(), 4);

        let api = registry.get("api").unwrap();
        assert_eq!(api.policy().max_requests(), 100);
        assert_eq!(api.policy().interval(), Duration::from_secs(3_600));

        let colorimetry = registry.get("colorimetry").unwrap();
        assert_eq!(colorimetry.policy().max_requests(), 10);
        assert_eq!(colorimetry.policy().interval(), Duration::from_secs(86_400));

        let mut names = registry.names();
        names.sort_unstable();
        assert_eq!(names, ["api", "closet", "colorimetry", "outfits"]);

        assert!(!registry.is_empty());
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_quotas_with_the_same_identifier_stay_disjoint() {
        let registry = Registry::from_config(&Config::default()).unwrap();

        let outfits = registry.get("outfits").unwrap();
        let closet = registry.get("closet").unwrap();

        for _ in 0..30 {
            assert!(outfits.check_at("user-7", 0).admitted);
        }
        assert!(!outfits.check_at("user-7", 1).admitted);

        // The same user is untouched under the other quota.
        assert!(closet.check_at("user-7", 1).admitted);
    }

    #[test]
    fn test_invalid_quota_fails_construction() {
        let mut config = Config::default();
        config.quotas.push(QuotaConfig {
            name: "broken".to_string(),
            interval_ms: 0,
            max_requests: 5,
        });

        let err = Registry::from_config(&config).unwrap_err();
        assert!(matches!(err, TurnstileError::Config(_)));
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_duplicate_quota_names_fail_construction() {
        let mut config = Config::default();
        config.quotas.push(QuotaConfig {
            name: "api".to_string(),
            interval_ms: 1_000,
            max_requests: 1,
        });

        let err = Registry::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_sweep_all_reclaims_expired_entries_everywhere() {
        let registry = Registry::from_config(&Config::default()).unwrap();

        // Entries anchored in the distant past are expired on any real clock.
        registry.get("api").unwrap().check_at("client", 5);
        registry.get("closet").unwrap().check_at("client", 5);

        registry.sweep_all();

        assert_eq!(registry.get("api").unwrap().tracked(), 0);
        assert_eq!(registry.get("closet").unwrap().tracked(), 0);
    }
}
