//! # Distributor configuration.
//!
//! Provides [`DistributorConfig`], the settings shared by every worker a
//! distributor creates. Per-subscriber settings live in
//! [`SubscribeOptions`](crate::SubscribeOptions).
//!
//! ## Sentinel values
//! - `diagnostics_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::error::ConfigError;

/// Default wait of one drain-loop iteration.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Global configuration for an [`EventDistributor`](crate::EventDistributor).
///
/// ## Field semantics
/// - `poll_interval`: how long a drain loop waits for items before re-checking
///   its state; used for subscribers that do not set their own
/// - `diagnostics_capacity`: ring size of the diagnostic bus (min 1)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistributorConfig {
    /// Default drain-loop poll interval.
    pub poll_interval: Duration,

    /// Capacity of the diagnostic broadcast channel.
    ///
    /// Receivers lagging more than this many events observe `Lagged` and skip
    /// older ones.
    pub diagnostics_capacity: usize,
}

impl DistributorConfig {
    /// Returns the diagnostics capacity clamped to a minimum of 1.
    #[inline]
    pub fn diagnostics_capacity_clamped(&self) -> usize {
        self.diagnostics_capacity.max(1)
    }

    /// Fails fast on settings no worker can honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(())
    }
}

impl Default for DistributorConfig {
    /// Default configuration:
    ///
    /// - `poll_interval = 10s`
    /// - `diagnostics_capacity = 1024`
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            diagnostics_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_poll_interval_rejected() {
        let cfg = DistributorConfig {
            poll_interval: Duration::ZERO,
            ..DistributorConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroPollInterval));
        assert!(DistributorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_diagnostics_capacity_clamped() {
        let cfg = DistributorConfig {
            diagnostics_capacity: 0,
            ..DistributorConfig::default()
        };
        assert_eq!(cfg.diagnostics_capacity_clamped(), 1);
    }
}
