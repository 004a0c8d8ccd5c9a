use std::time::Instant;

use prometheus::{HistogramVec, IntCounterVec, Registry};

/// Per-method call counters and duration histograms, labeled by
/// sub-operation name and success boolean, as spec'd for the store's
/// observable side channel. Grounded on `IndexerMetrics::new(&registry)`
/// in `sui-indexer/src/test_utils.rs` and the dedicated
/// `sui-indexer-alt-metrics` crate.
#[derive(Clone)]
pub struct StoreMetrics {
    calls: IntCounterVec,
    latency: HistogramVec,
}

impl StoreMetrics {
    pub fn new(registry: &Registry) -> Self {
        let calls = IntCounterVec::new(
            prometheus::Opts::new("scanstore_calls_total", "Store method calls"),
            &["method", "success"],
        )
        .expect("valid metric description");
        let latency = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "scanstore_call_duration_seconds",
                "Store method call duration",
            ),
            &["method", "success"],
        )
        .expect("valid metric description");

        registry
            .register(Box::new(calls.clone()))
            .expect("metric not already registered");
        registry
            .register(Box::new(latency.clone()))
            .expect("metric not already registered");

        Self { calls, latency }
    }

    /// Runs `body` and records its outcome under `method`.
    pub async fn observe<T, E>(
        &self,
        method: &'static str,
        body: impl std::future::Future<Output = Result<T, E>>,
    ) -> Result<T, E> {
        let start = Instant::now();
        let result = body.await;
        let success = if result.is_ok() { "true" } else { "false" };
        self.calls.with_label_values(&[method, success]).inc();
        self.latency
            .with_label_values(&[method, success])
            .observe(start.elapsed().as_secs_f64());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_success_and_failure_under_distinct_labels() {
        let registry = Registry::new();
        let metrics = StoreMetrics::new(&registry);

        let _ = metrics
            .observe("noop", async { Ok::<_, ()>(()) })
            .await;
        let _ = metrics.observe("noop", async { Err::<(), _>(()) }).await;

        let families = registry.gather();
        let calls = families
            .iter()
            .find(|f| f.get_name() == "scanstore_calls_total")
            .expect("calls metric registered");
        assert_eq!(calls.get_metric().len(), 2);
    }
}
