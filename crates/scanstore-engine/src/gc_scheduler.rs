use std::sync::Arc;
use std::time::Duration;

use scanstore_store_traits::MatcherStore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// How many operations per updater/kind to retain, and how often to sweep.
#[derive(Clone, Copy, Debug)]
pub struct GcSchedule {
    pub keep: u32,
    pub interval: Duration,
}

impl Default for GcSchedule {
    fn default() -> Self {
        Self {
            keep: 5,
            interval: Duration::from_secs(300),
        }
    }
}

/// Drives `MatcherStore::gc` to quiescence once per tick of `interval`:
/// spec.md §4.8 says callers "invoke GC repeatedly until the return is
/// zero", so each tick loops the call until it reports no remaining work
/// before sleeping again. Mirrors the `tokio::select!`-against-a-shutdown-
/// signal shape used throughout the corpus's background loops (e.g.
/// `consensus::core::Broadcaster`), rather than polling on a fixed
/// interval with no way to stop.
pub struct GcScheduler {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl GcScheduler {
    /// Spawns the background sweep loop. Call [`GcScheduler::shutdown`] to
    /// stop it and wait for the in-flight sweep (if any) to finish.
    pub fn spawn(store: Arc<dyn MatcherStore>, schedule: GcSchedule) -> Self {
        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            run(store, schedule, loop_cancel).await;
        });
        Self { handle, cancel }
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

async fn run(store: Arc<dyn MatcherStore>, schedule: GcSchedule, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("gc scheduler shutting down");
                return;
            }
            _ = tokio::time::sleep(schedule.interval) => {
                sweep_to_quiescence(store.as_ref(), schedule.keep, &cancel).await;
            }
        }
    }
}

/// Calls `gc(keep)` repeatedly until it reports zero remaining eligible
/// operations, honoring cancellation between calls (each call is itself a
/// suspension point per spec.md §5).
async fn sweep_to_quiescence(store: &dyn MatcherStore, keep: u32, cancel: &CancellationToken) {
    loop {
        if cancel.is_cancelled() {
            return;
        }
        match store.gc(keep).await {
            Ok(0) => {
                debug!("gc sweep reached quiescence");
                return;
            }
            Ok(remaining) => {
                debug!(remaining, "gc sweep made progress, continuing");
            }
            Err(e) => {
                error!(error = %e, "gc sweep failed, will retry next tick");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use scanstore_store_traits::{EnrichmentRecord, StoreResult, UpdateOperation, Vulnerability};
    use std::sync::atomic::{AtomicU64, Ordering};
    use uuid::Uuid;

    struct CountingGc {
        calls: AtomicU64,
        remaining_by_call: Vec<u64>,
    }

    #[async_trait]
    impl MatcherStore for CountingGc {
        async fn update_vulnerabilities(&self, _: &str, _: &str, _: Vec<Vulnerability>) -> StoreResult<Uuid> {
            unimplemented!()
        }
        async fn delta_update_vulnerabilities(
            &self,
            _: &str,
            _: &str,
            _: Vec<Vulnerability>,
            _: Vec<String>,
        ) -> StoreResult<Uuid> {
            unimplemented!()
        }
        async fn update_enrichments(&self, _: &str, _: &str, _: Vec<EnrichmentRecord>) -> StoreResult<Uuid> {
            unimplemented!()
        }
        async fn get_enrichment(&self, _: &str, _: &[String]) -> StoreResult<Vec<EnrichmentRecord>> {
            unimplemented!()
        }
        async fn latest_update_operations(&self) -> StoreResult<Vec<UpdateOperation>> {
            unimplemented!()
        }
        async fn gc(&self, _keep: u32) -> StoreResult<u64> {
            let idx = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            Ok(*self.remaining_by_call.get(idx).unwrap_or(&0))
        }
    }

    #[tokio::test]
    async fn sweeps_until_quiescent() {
        let gc = CountingGc {
            calls: AtomicU64::new(0),
            remaining_by_call: vec![5, 0],
        };
        let cancel = CancellationToken::new();
        sweep_to_quiescence(&gc, 5, &cancel).await;
        assert_eq!(gc.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stops_immediately_if_already_cancelled() {
        let gc = CountingGc {
            calls: AtomicU64::new(0),
            remaining_by_call: vec![5, 5, 0],
        };
        let cancel = CancellationToken::new();
        cancel.cancel();
        sweep_to_quiescence(&gc, 5, &cancel).await;
        assert_eq!(gc.calls.load(Ordering::SeqCst), 0);
    }
}
