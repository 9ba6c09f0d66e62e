//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the flow engine.
//!
//! # Metrics
//!
//! - `flow_payments_total` - Payments routed through `ripple_calculate`
//! - `flow_crossings_total` - Offer crossings routed through `flow_cross`
//! - `flow_path_dry_total` - Calculations that found no liquidity
//! - `flow_path_partial_total` - Calculations that fell short with partial
//!   payments disallowed
//! - `flow_rounds` - Histogram of rounds per calculation
//! - `flow_offers_removed_total` - Offers flagged for removal

use crate::types::Ter;
use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::fmt;
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Payments calculated
    pub payments_total: IntCounter,

    /// Offer crossings calculated
    pub crossings_total: IntCounter,

    /// Path dry results
    pub path_dry_total: IntCounter,

    /// Path partial results
    pub path_partial_total: IntCounter,

    /// Rounds per calculation
    pub rounds: Histogram,

    /// Offers flagged for removal
    pub offers_removed_total: IntCounter,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let payments_total = IntCounter::new(
            "flow_payments_total",
            "Payments routed through ripple_calculate",
        )?;
        registry.register(Box::new(payments_total.clone()))?;

        let crossings_total = IntCounter::new(
            "flow_crossings_total",
            "Offer crossings routed through flow_cross",
        )?;
        registry.register(Box::new(crossings_total.clone()))?;

        let path_dry_total =
            IntCounter::new("flow_path_dry_total", "Calculations that found no liquidity")?;
        registry.register(Box::new(path_dry_total.clone()))?;

        let path_partial_total = IntCounter::new(
            "flow_path_partial_total",
            "Calculations that fell short with partial payments disallowed",
        )?;
        registry.register(Box::new(path_partial_total.clone()))?;

        let rounds = Histogram::with_opts(
            HistogramOpts::new("flow_rounds", "Histogram of rounds per calculation")
                .buckets(vec![1.0, 2.0, 4.0, 8.0, 16.0, 64.0, 256.0, 1000.0, 2000.0]),
        )?;
        registry.register(Box::new(rounds.clone()))?;

        let offers_removed_total = IntCounter::new(
            "flow_offers_removed_total",
            "Offers flagged for removal",
        )?;
        registry.register(Box::new(offers_removed_total.clone()))?;

        Ok(Self {
            payments_total,
            crossings_total,
            path_dry_total,
            path_partial_total,
            rounds,
            offers_removed_total,
            registry,
        })
    }

    /// Record a finished payment calculation
    pub fn record_payment(&self, ter: Ter, rounds: usize, offers_removed: usize) {
        self.payments_total.inc();
        self.record_outcome(ter, rounds, offers_removed);
    }

    /// Record a finished offer crossing
    pub fn record_crossing(&self, ter: Ter, rounds: usize, offers_removed: usize) {
        self.crossings_total.inc();
        self.record_outcome(ter, rounds, offers_removed);
    }

    fn record_outcome(&self, ter: Ter, rounds: usize, offers_removed: usize) {
        match ter {
            Ter::PathDry => self.path_dry_total.inc(),
            Ter::PathPartial => self.path_partial_total.inc(),
            _ => {}
        }
        self.rounds.observe(rounds as f64);
        self.offers_removed_total.inc_by(offers_removed as u64);
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl fmt::Debug for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metrics")
            .field("payments_total", &self.payments_total.get())
            .field("crossings_total", &self.crossings_total.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert_eq!(metrics.payments_total.get(), 0);
        assert_eq!(metrics.crossings_total.get(), 0);
        // independent registries, no global collisions
        assert!(Metrics::new().is_ok());
    }

    #[test]
    fn test_record_payment() {
        let metrics = Metrics::new().unwrap();
        metrics.record_payment(Ter::Success, 2, 1);
        metrics.record_payment(Ter::PathDry, 0, 0);
        metrics.record_payment(Ter::PathPartial, 3, 2);

        assert_eq!(metrics.payments_total.get(), 3);
        assert_eq!(metrics.path_dry_total.get(), 1);
        assert_eq!(metrics.path_partial_total.get(), 1);
        assert_eq!(metrics.offers_removed_total.get(), 3);
        assert_eq!(metrics.rounds.get_sample_count(), 3);
    }

    #[test]
    fn test_record_crossing() {
        let metrics = Metrics::new().unwrap();
        metrics.record_crossing(Ter::Success, 1, 1);
        assert_eq!(metrics.crossings_total.get(), 1);
        assert_eq!(metrics.payments_total.get(), 0);
        assert_eq!(metrics.registry().gather().len(), 6);
    }
}
