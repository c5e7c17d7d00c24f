//! Proxy metrics
//!
//! Thread-safe counters for proxied requests and access control decisions,
//! served as JSON on the metrics endpoint.

use crate::access_control::UserId;
use crate::docker::FilterOutcome;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant, SystemTime};

/// Metrics collector shared by all request handlers
pub struct ProxyMetrics {
    start_time: Instant,
    start_system_time: SystemTime,
    total_requests: AtomicU64,
    total_errors: AtomicU64,
    /// Inspect responses replaced by an access denied response
    total_denied: AtomicU64,
    /// List elements hidden from non-admin callers
    total_removed: AtomicU64,
    data: RwLock<MetricsData>,
    max_recent_requests: usize,
}

#[derive(Default)]
struct RouteStatsInner {
    request_count: u64,
    error_count: u64,
    denied_count: u64,
    total_duration_ms: u64,
}

#[derive(Default)]
struct MetricsData {
    route_stats: HashMap<String, RouteStatsInner>,
    recent_requests: VecDeque<RequestRecord>,
}

/// One recent request
#[derive(Clone, Serialize)]
pub struct RequestRecord {
    pub route: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub success: bool,
    pub duration_ms: u64,
    pub timestamp: u64,
    /// Filter decision, for filtered routes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    /// Resource whose control denied the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denied_resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
}

#[derive(Clone, Serialize)]
pub struct RouteStats {
    pub route: String,
    pub request_count: u64,
    pub error_count: u64,
    pub denied_count: u64,
    pub avg_duration_ms: u64,
}

/// Serializable view of all metrics
#[derive(Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub start_time: u64,
    pub total_requests: u64,
    pub total_errors: u64,
    pub total_denied: u64,
    pub total_removed: u64,
    pub routes: Vec<RouteStats>,
    pub recent_requests: Vec<RequestRecord>,
}

impl ProxyMetrics {
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Create a collector keeping the last `max_recent_requests` requests
    pub fn with_capacity(max_recent_requests: usize) -> Self {
        Self {
            start_time: Instant::now(),
            start_system_time: SystemTime::now(),
            total_requests: AtomicU64::new(0),
            total_errors: AtomicU64::new(0),
            total_denied: AtomicU64::new(0),
            total_removed: AtomicU64::new(0),
            data: RwLock::new(MetricsData {
                route_stats: HashMap::new(),
                recent_requests: VecDeque::with_capacity(max_recent_requests),
            }),
            max_recent_requests,
        }
    }

    // Poisoned locks are recovered: metrics never take the proxy down.

    fn write_data(&self) -> RwLockWriteGuard<'_, MetricsData> {
        self.data.write().unwrap_or_else(|poisoned| {
            tracing::warn!("metrics data lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn read_data(&self) -> RwLockReadGuard<'_, MetricsData> {
        self.data.read().unwrap_or_else(|poisoned| {
            tracing::warn!("metrics data lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Record a proxied request.
    ///
    /// `outcome` is set for filtered routes that reached the filter;
    /// `error` is set when the request failed.
    pub fn record_request(
        &self,
        route: &str,
        user_id: Option<UserId>,
        duration: Duration,
        outcome: Option<&FilterOutcome>,
        error: Option<&str>,
    ) {
        let duration_ms = duration.as_millis() as u64;
        let timestamp = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let success = error.is_none();

        let denied_resource = match outcome {
            Some(FilterOutcome::Denied { resource_id }) => Some(resource_id.clone()),
            _ => None,
        };
        if let Some(FilterOutcome::Listed { removed, .. }) = outcome {
            self.total_removed.fetch_add(*removed as u64, Ordering::Relaxed);
        }

        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.total_errors.fetch_add(1, Ordering::Relaxed);
        }
        if denied_resource.is_some() {
            self.total_denied.fetch_add(1, Ordering::Relaxed);
        }

        let mut data = self.write_data();

        let entry = data.route_stats.entry(route.to_string()).or_default();
        entry.request_count += 1;
        entry.total_duration_ms += duration_ms;
        if !success {
            entry.error_count += 1;
        }
        if denied_resource.is_some() {
            entry.denied_count += 1;
        }

        if data.recent_requests.len() >= self.max_recent_requests {
            data.recent_requests.pop_front();
        }
        data.recent_requests.push_back(RequestRecord {
            route: route.to_string(),
            user_id,
            success,
            duration_ms,
            timestamp,
            decision: outcome.map(|o| o.label().to_string()),
            denied_resource,
            error_details: error.map(String::from),
        });
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let uptime_secs = self.start_time.elapsed().as_secs();

        let data = self.read_data();

        let mut routes: Vec<RouteStats> = data
            .route_stats
            .iter()
            .map(|(route, s)| RouteStats {
                route: route.clone(),
                request_count: s.request_count,
                error_count: s.error_count,
                denied_count: s.denied_count,
                avg_duration_ms: if s.request_count > 0 {
                    s.total_duration_ms / s.request_count
                } else {
                    0
                },
            })
            .collect();
        routes.sort_unstable_by(|a, b| b.request_count.cmp(&a.request_count));

        let recent_requests: Vec<_> = data.recent_requests.iter().cloned().collect();
        drop(data);

        let start_time = self
            .start_system_time
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        MetricsSnapshot {
            uptime_secs,
            start_time,
            total_requests: self.total_requests(),
            total_errors: self.total_errors(),
            total_denied: self.total_denied.load(Ordering::Relaxed),
            total_removed: self.total_removed.load(Ordering::Relaxed),
            routes,
            recent_requests,
        }
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    pub fn total_errors(&self) -> u64 {
        self.total_errors.load(Ordering::Relaxed)
    }
}

impl Default for ProxyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = ProxyMetrics::new();
        assert_eq!(metrics.total_requests(), 0);
        assert_eq!(metrics.total_errors(), 0);
    }

    #[test]
    fn test_record_list_request() {
        let metrics = ProxyMetrics::new();
        metrics.record_request(
            "container_list",
            Some(UserId(2)),
            Duration::from_millis(12),
            Some(&FilterOutcome::Listed {
                returned: 3,
                removed: 2,
            }),
            None,
        );

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_requests, 1);
        assert_eq!(snapshot.total_removed, 2);
        assert_eq!(snapshot.routes.len(), 1);
        assert_eq!(snapshot.routes[0].route, "container_list");
        assert_eq!(
            snapshot.recent_requests[0].decision.as_deref(),
            Some("filtered")
        );
    }

    #[test]
    fn test_record_denied_request() {
        let metrics = ProxyMetrics::new();
        let outcome = FilterOutcome::Denied {
            resource_id: "s1".to_string(),
        };
        metrics.record_request(
            "container_inspect",
            Some(UserId(2)),
            Duration::from_millis(3),
            Some(&outcome),
            None,
        );

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.total_denied, 1);
        assert_eq!(snapshot.routes[0].denied_count, 1);
        assert_eq!(
            snapshot.recent_requests[0].denied_resource.as_deref(),
            Some("s1")
        );
    }

    #[test]
    fn test_record_failed_request() {
        let metrics = ProxyMetrics::new();
        metrics.record_request(
            "container_inspect",
            None,
            Duration::from_millis(1),
            None,
            Some("Docker container identifier not found"),
        );

        assert_eq!(metrics.total_errors(), 1);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.routes[0].error_count, 1);
        assert!(!snapshot.recent_requests[0].success);
    }

    #[test]
    fn test_recent_requests_circular_buffer() {
        let metrics = ProxyMetrics::with_capacity(3);
        for i in 0..5 {
            metrics.record_request(
                &format!("route_{}", i),
                None,
                Duration::from_millis(1),
                None,
                None,
            );
        }

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.recent_requests.len(), 3);
        assert_eq!(snapshot.recent_requests[0].route, "route_2");
        assert_eq!(snapshot.recent_requests[2].route, "route_4");
    }
}
