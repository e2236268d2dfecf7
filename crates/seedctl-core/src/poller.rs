// ── Background poller ──
//
// Keeps one `EntityCache` in step with the daemon. Each cycle lists the
// entity kind under `poll.timeout`, reconciles the result and publishes a
// `SyncStatus`. Failures back off exponentially; the snapshot survives
// them untouched. The loop only ends on cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use serde::Serialize;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::model::Entity;
use crate::remote::{ClientError, RemoteClient};
use crate::settings::Settings;
use crate::store::{Batch, Diff, EntityCache};

// ── SyncStatus ───────────────────────────────────────────────────────

/// Connection state of one poller, observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SyncState {
    Uninitialized,
    Syncing,
    Ready,
    Stale,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    pub state: SyncState,
    /// Consecutive failed cycles.
    pub failures: u32,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            state: SyncState::Uninitialized,
            failures: 0,
            last_error: None,
            last_success: None,
        }
    }
}

impl SyncStatus {
    /// Persistent warning shown while the daemon is unreachable.
    pub fn warning(&self) -> Option<String> {
        (self.state == SyncState::Disconnected).then(|| {
            format!(
                "Disconnected: {}",
                self.last_error.as_deref().unwrap_or("daemon unreachable")
            )
        })
    }
}

// ── PollConfig ───────────────────────────────────────────────────────

/// `poll.*` settings, read fresh at every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
    pub max_failures: u32,
    pub backoff_max: Duration,
    pub full_every: u64,
}

impl PollConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            interval: settings.duration("poll.interval"),
            timeout: settings.duration("poll.timeout"),
            max_failures: u32::try_from(settings.integer("poll.max-failures").max(1))
                .unwrap_or(u32::MAX),
            backoff_max: settings.duration("poll.backoff-max"),
            full_every: u64::try_from(settings.integer("poll.full-every").max(1)).unwrap_or(1),
        }
    }

    /// Delay before the next attempt after `failures` consecutive failures.
    pub fn retry_delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return self.interval;
        }
        let factor = 2_u32.saturating_pow(failures - 1);
        self.interval.saturating_mul(factor).min(self.backoff_max)
    }
}

// ── Poller ───────────────────────────────────────────────────────────

/// Periodic listing loop for one entity kind.
pub struct Poller<E: Entity> {
    client: Arc<dyn RemoteClient>,
    cache: Arc<EntityCache<E>>,
    settings: Arc<Settings>,
    status: watch::Sender<SyncStatus>,
    trigger: Notify,
    cycles: AtomicU64,
}

impl<E: Entity> Poller<E> {
    pub fn new(
        client: Arc<dyn RemoteClient>,
        cache: Arc<EntityCache<E>>,
        settings: Arc<Settings>,
    ) -> Self {
        let (status, _) = watch::channel(SyncStatus::default());
        Self {
            client,
            cache,
            settings,
            status,
            trigger: Notify::new(),
            cycles: AtomicU64::new(0),
        }
    }

    pub fn cache(&self) -> &Arc<EntityCache<E>> {
        &self.cache
    }

    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Request a cycle as soon as possible. Any number of triggers before
    /// the loop wakes collapse into one cycle.
    pub fn trigger(&self) {
        self.trigger.notify_one();
    }

    /// Run one listing cycle now.
    pub async fn run_cycle(&self) -> Result<Diff, ClientError> {
        let config = PollConfig::from_settings(&self.settings);
        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed);
        let full = !self.cache.is_loaded() || cycle % config.full_every == 0;
        if full {
            self.status.send_if_modified(|s| {
                let enter = matches!(s.state, SyncState::Uninitialized | SyncState::Ready);
                if enter {
                    s.state = SyncState::Syncing;
                }
                enter
            });
        }
        let since = (!full).then(|| self.cache.version());
        debug!(kind = %E::KIND, cycle, full, "poll cycle");

        let listing = tokio::time::timeout(
            config.timeout,
            self.client.list_entities(E::KIND, since),
        )
        .await
        .unwrap_or_else(|_| Err(ClientError::timeout(config.timeout)));

        let batch = listing.and_then(|batch| {
            let complete = batch.complete;
            let removed = batch.removed;
            E::from_items(batch.items)
                .map(|items| Batch {
                    items,
                    removed,
                    complete,
                })
                .ok_or_else(|| {
                    ClientError::rejected(format!("daemon answered with the wrong kind for {}", E::KIND))
                })
        });

        match batch {
            Ok(batch) => {
                let diff = self.cache.reconcile(batch);
                self.record_success();
                Ok(diff)
            }
            Err(err) => {
                self.record_failure(&err, config.max_failures);
                Err(err)
            }
        }
    }

    fn record_success(&self) {
        let previous = self.status.borrow().state;
        self.status.send_if_modified(|s| {
            let changed = s.state != SyncState::Ready || s.failures > 0;
            s.state = SyncState::Ready;
            s.failures = 0;
            s.last_error = None;
            s.last_success = Some(Utc::now());
            changed
        });
        if matches!(previous, SyncState::Stale | SyncState::Disconnected) {
            info!(kind = %E::KIND, "connection restored");
        }
    }

    fn record_failure(&self, err: &ClientError, max_failures: u32) {
        let message = err.to_string();
        let mut repeated = false;
        let mut state = SyncState::Stale;
        self.status.send_modify(|s| {
            repeated = s.last_error.as_deref() == Some(message.as_str());
            s.failures = s.failures.saturating_add(1);
            s.state = if s.failures >= max_failures {
                SyncState::Disconnected
            } else {
                SyncState::Stale
            };
            s.last_error = Some(message.clone());
            state = s.state;
        });
        if repeated {
            debug!(kind = %E::KIND, error = %message, %state, "poll failed again");
        } else {
            warn!(kind = %E::KIND, error = %message, %state, "poll failed");
        }
    }

    /// Poll until `cancel` fires.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                outcome = self.run_cycle() => outcome,
            };
            let config = PollConfig::from_settings(&self.settings);
            let delay = match outcome {
                Ok(_) => config.interval,
                Err(_) => config.retry_delay(self.status.borrow().failures),
            };
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = self.trigger.notified() => {
                    // Swallow a permit stored by triggers that raced the wakeup.
                    let _ = self.trigger.notified().now_or_never();
                    debug!(kind = %E::KIND, "poll triggered");
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
        debug!(kind = %E::KIND, "poller stopped");
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run(cancel))
    }
}
