//! Background refresh task.
//!
//! In background mode the cache replaces its snapshot once per TTL,
//! regardless of read activity. The task is owned by a [`RefreshHandle`]
//! returned from construction; cancelling or dropping the handle stops future
//! ticks. A refresh already running when the signal arrives is allowed to
//! finish.
//!
//! The task holds only a weak reference to the cache, so dropping every
//! `CachingRegistry` clone also ends it.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::controller::RegistryInner;
use crate::store::RegistryStore;

/// Owner of the background refresh task.
///
/// Inert when the cache was built in a mode that has no background task.
/// Dropping the handle stops the task, so keep it for as long as the cache
/// should refresh itself.
#[derive(Debug)]
#[must_use = "dropping the handle stops background refresh"]
pub struct RefreshHandle {
    shutdown_tx: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    /// A handle with no task behind it.
    pub fn inert() -> Self {
        Self {
            shutdown_tx: None,
            task: None,
        }
    }

    /// Returns true while the background task is alive.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Signal the task to stop scheduling further refreshes.
    pub fn cancel(&self) {
        if let Some(tx) = &self.shutdown_tx {
            // Receiver is gone once the task has exited; nothing to stop then.
            let _ = tx.send(true);
        }
    }

    /// Signal the task to stop and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Registry refresh task ended abnormally");
            }
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Start the background task for `inner`, ticking every `period`.
///
/// Returns an inert handle if a task was already started for this cache, or
/// if `period` is so long that its tick instants cannot be represented.
pub(crate) fn spawn_background_refresh<S>(
    inner: &Arc<RegistryInner<S>>,
    period: Duration,
) -> RefreshHandle
where
    S: RegistryStore + 'static,
{
    // The interval schedules each tick one period past the previous one, so
    // the tick after the first must fit as well.
    let first_tick = Instant::now()
        .checked_add(period)
        .filter(|tick| tick.checked_add(period).is_some());
    let Some(first_tick) = first_tick else {
        tracing::warn!(
            period_secs = period.as_secs(),
            "Refresh period out of range, background refresh disabled"
        );
        return RefreshHandle::inert();
    };

    if !inner.claim_background_task() {
        tracing::warn!("Registry refresh task already running, not starting another");
        return RefreshHandle::inert();
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(background_refresh_task(
        Arc::downgrade(inner),
        first_tick,
        period,
        shutdown_rx,
    ));

    RefreshHandle {
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    }
}

async fn background_refresh_task<S: RegistryStore>(
    inner: Weak<RegistryInner<S>>,
    first_tick: Instant,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(period_secs = period.as_secs(), "Registry refresh task started");

    let mut ticks: u64 = 0;
    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::info!("Registry refresh task shutting down");
                    break;
                }
            }

            _ = ticker.tick() => {
                let Some(inner) = inner.upgrade() else {
                    tracing::debug!("Registry cache dropped, stopping refresh task");
                    break;
                };
                inner.scheduled_refresh().await;
                ticks += 1;
            }
        }
    }

    tracing::info!(ticks, "Registry refresh task completed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::CachingRegistry;
    use crate::memory::InMemoryRegistryStore;
    use featreg_core::{CacheConfig, RefreshMode};

    fn background_config(ttl_seconds: u64) -> CacheConfig {
        CacheConfig::new("fraud")
            .with_ttl_seconds(ttl_seconds)
            .with_mode(RefreshMode::Background)
    }

    #[test]
    fn test_inert_handle() {
        let handle = RefreshHandle::inert();
        assert!(!handle.is_running());
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let store = Arc::new(InMemoryRegistryStore::new());
        let (registry, handle) = CachingRegistry::new(store, background_config(5))
            .await
            .unwrap();
        assert!(handle.is_running());

        tokio::time::sleep(Duration::from_millis(4_999)).await;
        assert_eq!(registry.stats().refreshes, 1);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(registry.stats().refreshes, 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(registry.stats().refreshes, 4);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_future_ticks() {
        let store = Arc::new(InMemoryRegistryStore::new());
        let (registry, handle) = CachingRegistry::new(store, background_config(5))
            .await
            .unwrap();

        handle.shutdown().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(registry.stats().refreshes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_stops_task() {
        let store = Arc::new(InMemoryRegistryStore::new());
        let (registry, handle) = CachingRegistry::new(store, background_config(5))
            .await
            .unwrap();

        drop(handle);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(registry.stats().refreshes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_range_period_has_no_task() {
        let store = Arc::new(InMemoryRegistryStore::new());
        let (registry, handle) = CachingRegistry::new(store, background_config(u64::MAX))
            .await
            .unwrap();
        assert!(!handle.is_running());

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(registry.current_snapshot().unwrap().has_project("fraud"));
        assert_eq!(registry.stats().refreshes, 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_background_has_no_task() {
        let store = Arc::new(InMemoryRegistryStore::new());
        let (_registry, handle) = CachingRegistry::new(store, background_config(0))
            .await
            .unwrap();
        assert!(!handle.is_running());
    }
}
