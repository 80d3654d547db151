//! Resolution metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use offline_core::ResponseSource;
use offline_router::Strategy;
use serde::{Deserialize, Serialize};

/// Counters shared by every request a worker handles.
///
/// All updates are relaxed atomic increments, so recording never blocks a
/// resolution.
#[derive(Debug, Default)]
pub struct ResolutionMetrics {
    network_only: AtomicU64,
    navigation: AtomicU64,
    cache_first: AtomicU64,
    network_first: AtomicU64,
    from_network: AtomicU64,
    from_cache: AtomicU64,
    synthetic: AtomicU64,
    failures: AtomicU64,
    revalidated: AtomicU64,
    revalidation_failures: AtomicU64,
    total_duration_us: AtomicU64,
}

impl ResolutionMetrics {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    fn strategy_counter(&self, strategy: Strategy) -> &AtomicU64 {
        match strategy {
            Strategy::NetworkOnlyWithStub => &self.network_only,
            Strategy::NetworkFirstNavigation => &self.navigation,
            Strategy::CacheFirstRevalidate => &self.cache_first,
            Strategy::NetworkFirst => &self.network_first,
        }
    }

    /// Record one resolution. `source` is `None` when the request could not be answered.
    pub fn record_resolution(
        &self,
        strategy: Strategy,
        source: Option<ResponseSource>,
        duration: Duration,
    ) {
        self.strategy_counter(strategy).fetch_add(1, Ordering::Relaxed);
        let counter = match source {
            Some(ResponseSource::Network) => &self.from_network,
            Some(ResponseSource::Cache) => &self.from_cache,
            Some(ResponseSource::Synthetic) => &self.synthetic,
            None => &self.failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.total_duration_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    /// Record a settled background cache write.
    pub fn record_revalidation(&self, updated: bool) {
        let counter = if updated {
            &self.revalidated
        } else {
            &self.revalidation_failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        let requests = load(&self.network_only)
            + load(&self.navigation)
            + load(&self.cache_first)
            + load(&self.network_first);

        MetricsSnapshot {
            requests,
            by_strategy: StrategyCounts {
                network_only_with_stub: load(&self.network_only),
                network_first_navigation: load(&self.navigation),
                cache_first_revalidate: load(&self.cache_first),
                network_first: load(&self.network_first),
            },
            by_source: SourceCounts {
                network: load(&self.from_network),
                cache: load(&self.from_cache),
                synthetic: load(&self.synthetic),
            },
            failures: load(&self.failures),
            revalidated: load(&self.revalidated),
            revalidation_failures: load(&self.revalidation_failures),
            avg_duration_us: load(&self.total_duration_us).checked_div(requests).unwrap_or(0),
        }
    }
}

/// Requests per strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyCounts {
    pub network_only_with_stub: u64,
    pub network_first_navigation: u64,
    pub cache_first_revalidate: u64,
    pub network_first: u64,
}

/// Answered requests per response source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCounts {
    pub network: u64,
    pub cache: u64,
    pub synthetic: u64,
}

/// Serializable view of `ResolutionMetrics`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total resolutions.
    pub requests: u64,
    pub by_strategy: StrategyCounts,
    pub by_source: SourceCounts,
    /// Requests with no response from network or cache.
    pub failures: u64,
    /// Background writes that updated the store.
    pub revalidated: u64,
    /// Background writes that failed (fetch or store).
    pub revalidation_failures: u64,
    /// Mean resolution time in microseconds.
    pub avg_duration_us: u64,
}

impl MetricsSnapshot {
    /// Share of answered requests served from the cache, 0.0 to 1.0.
    pub fn cache_ratio(&self) -> f64 {
        let answered = self.by_source.network + self.by_source.cache + self.by_source.synthetic;
        if answered == 0 {
            0.0
        } else {
            self.by_source.cache as f64 / answered as f64
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let metrics = ResolutionMetrics::new();
        metrics.record_resolution(
            Strategy::CacheFirstRevalidate,
            Some(ResponseSource::Cache),
            Duration::from_micros(100),
        );
        metrics.record_resolution(
            Strategy::NetworkOnlyWithStub,
            Some(ResponseSource::Synthetic),
            Duration::from_micros(300),
        );
        metrics.record_resolution(Strategy::NetworkFirst, None, Duration::from_micros(200));
        metrics.record_revalidation(true);
        metrics.record_revalidation(false);

        let snap = metrics.snapshot();
        assert_eq!(snap.requests, 3);
        assert_eq!(snap.by_strategy.cache_first_revalidate, 1);
        assert_eq!(snap.by_strategy.network_first, 1);
        assert_eq!(snap.by_source.synthetic, 1);
        assert_eq!(snap.failures, 1);
        assert_eq!(snap.revalidated, 1);
        assert_eq!(snap.revalidation_failures, 1);
        assert_eq!(snap.avg_duration_us, 200);
    }

    #[test]
    fn test_cache_ratio() {
        let metrics = ResolutionMetrics::new();
        assert_eq!(metrics.snapshot().cache_ratio(), 0.0);

        for source in [ResponseSource::Cache, ResponseSource::Cache, ResponseSource::Network] {
            metrics.record_resolution(Strategy::NetworkFirst, Some(source), Duration::ZERO);
        }
        metrics.record_resolution(Strategy::NetworkFirst, Some(ResponseSource::Cache), Duration::ZERO);

        assert_eq!(metrics.snapshot().cache_ratio(), 0.75);
    }

    #[test]
    fn test_snapshot_json() {
        let json = ResolutionMetrics::new().snapshot().to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["requests"], 0);
        assert_eq!(value["by_source"]["cache"], 0);
    }
}
