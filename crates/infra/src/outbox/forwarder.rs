//! Background forwarder draining the outbox ledger to the broker.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::outbox::OutboxStore;
use crate::publisher::EventPublisher;

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Backoff before attempt `attempts + 1`, doubling per failed attempt.
    pub fn backoff_for(&self, attempts: u32) -> Duration {
        let exp = attempts.min(16);
        let backoff = self.base_backoff.saturating_mul(1u32 << exp);
        backoff.min(self.max_backoff)
    }
}

#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// How often to poll for due rows.
    pub poll_interval: Duration,
    /// Rows claimed per poll.
    pub batch_size: u32,
    pub retry: RetryPolicy,
    /// Published rows older than this are swept from the ledger.
    pub sweep_after: Duration,
    /// Drain passes between sweeps.
    pub sweep_every: u64,
    /// Name for logging.
    pub name: String,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            batch_size: 64,
            retry: RetryPolicy::default(),
            sweep_after: Duration::from_secs(24 * 60 * 60),
            sweep_every: 256,
            name: "outbox-forwarder".to_string(),
        }
    }
}

/// Counters for one drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    pub forwarded: u64,
    pub failed: u64,
}

/// Cumulative forwarder counters.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ForwarderStats {
    pub forwarded: u64,
    pub failed: u64,
    pub drain_passes: u64,
}

/// Handle to a running forwarder task.
#[derive(Debug)]
pub struct ForwarderHandle {
    shutdown: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
    stats: Arc<Mutex<ForwarderStats>>,
}

impl ForwarderHandle {
    /// Request graceful shutdown; the task runs one final drain pass first.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(join) = self.join.take() {
            let _ = join.await;
        }
    }

    pub fn stats(&self) -> ForwarderStats {
        self.stats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Drains unpublished ledger rows to the broker with bounded retry.
///
/// Rows that exhaust their retry budget stay in the ledger (there is no
/// dead-letter topic); they are logged at error level and left for
/// operators or a later sweep.
pub struct OutboxForwarder<O, P> {
    outbox: O,
    publisher: P,
    config: ForwarderConfig,
}

impl<O, P> OutboxForwarder<O, P>
where
    O: OutboxStore + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    pub fn new(outbox: O, publisher: P, config: ForwarderConfig) -> Self {
        Self {
            outbox,
            publisher,
            config,
        }
    }

    /// One claim-and-publish pass. Public so tests and operational tooling
    /// can drain deterministically without the background task.
    pub async fn drain_once(&self) -> DrainOutcome {
        let mut outcome = DrainOutcome::default();

        let entries = match self
            .outbox
            .claim_unpublished(self.config.batch_size, self.config.retry.max_attempts)
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                warn!(forwarder = %self.config.name, error = %e, "failed to claim outbox rows");
                return outcome;
            }
        };

        let mut published = Vec::new();
        for entry in entries {
            match self.publisher.publish(entry.record()).await {
                Ok(()) => {
                    debug!(outbox_id = %entry.id, topic = %entry.topic, "outbox row forwarded");
                    published.push(entry.id);
                    outcome.forwarded += 1;
                }
                Err(e) => {
                    outcome.failed += 1;
                    let attempts = entry.attempts + 1;
                    if attempts >= self.config.retry.max_attempts {
                        error!(
                            outbox_id = %entry.id,
                            topic = %entry.topic,
                            attempts,
                            error = %e,
                            "outbox row exhausted its retry budget; leaving in ledger"
                        );
                    } else {
                        warn!(outbox_id = %entry.id, topic = %entry.topic, attempts, error = %e, "outbox publish failed; will retry");
                    }

                    let backoff = self.config.retry.backoff_for(entry.attempts);
                    let next = Utc::now()
                        + chrono::Duration::from_std(backoff)
                            .unwrap_or_else(|_| chrono::Duration::seconds(60));
                    if let Err(e) = self.outbox.record_failure(entry.id, next).await {
                        warn!(outbox_id = %entry.id, error = %e, "failed to record outbox attempt");
                    }
                }
            }
        }

        if let Err(e) = self.outbox.mark_published(&published).await {
            // The rows were delivered; they will be forwarded again and
            // consumers deduplicate by entity id (at-least-once).
            warn!(forwarder = %self.config.name, error = %e, "failed to mark outbox rows published");
        }

        outcome
    }

    /// Remove long-published rows so the ledger does not grow unbounded.
    async fn sweep(&self) {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.config.sweep_after)
                .unwrap_or_else(|_| chrono::Duration::days(1));

        match self.outbox.sweep_published(cutoff).await {
            Ok(0) => {}
            Ok(removed) => debug!(forwarder = %self.config.name, removed, "swept published outbox rows"),
            Err(e) => warn!(forwarder = %self.config.name, error = %e, "outbox sweep failed"),
        }
    }

    /// Spawn the polling task; returns a handle for shutdown/stats.
    pub fn spawn(self) -> ForwarderHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let stats = Arc::new(Mutex::new(ForwarderStats::default()));
        let task_stats = stats.clone();

        let join = tokio::spawn(async move {
            info!(forwarder = %self.config.name, "outbox forwarder started");
            let mut ticker = tokio::time::interval(self.config.poll_interval);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let outcome = self.drain_once().await;
                        let passes = {
                            let mut stats = task_stats.lock().unwrap_or_else(|e| e.into_inner());
                            stats.forwarded += outcome.forwarded;
                            stats.failed += outcome.failed;
                            stats.drain_passes += 1;
                            stats.drain_passes
                        };

                        if self.config.sweep_every > 0 && passes % self.config.sweep_every == 0 {
                            self.sweep().await;
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        // Final drain so a clean shutdown leaves nothing
                        // deliverable behind.
                        let _ = self.drain_once().await;
                        info!(forwarder = %self.config.name, "outbox forwarder stopped");
                        return;
                    }
                }
            }
        });

        ForwarderHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::InMemoryOutbox;
    use crate::publisher::PublishError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use tradepost_events::BrokerRecord;

    struct FlakyPublisher {
        healthy: AtomicBool,
        sent: AtomicU32,
    }

    impl FlakyPublisher {
        fn down() -> Self {
            Self {
                healthy: AtomicBool::new(false),
                sent: AtomicU32::new(0),
            }
        }

        fn recover(&self) {
            self.healthy.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl EventPublisher for FlakyPublisher {
        async fn publish(&self, _record: BrokerRecord) -> Result<(), PublishError> {
            if self.healthy.load(Ordering::SeqCst) {
                self.sent.fetch_add(1, Ordering::SeqCst);
                Ok(())
            } else {
                Err(PublishError::BrokerUnavailable("connection refused".to_string()))
            }
        }
    }

    fn record() -> BrokerRecord {
        BrokerRecord {
            topic: "supplier-events".to_string(),
            key: "k".to_string(),
            payload: b"{}".to_vec(),
        }
    }

    fn config() -> ForwarderConfig {
        ForwarderConfig {
            retry: RetryPolicy {
                max_attempts: 3,
                base_backoff: Duration::ZERO,
                max_backoff: Duration::ZERO,
            },
            ..Default::default()
        }
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 8,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(1),
        };
        assert_eq!(policy.backoff_for(0), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(200));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(400));
        assert_eq!(policy.backoff_for(10), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn drain_forwards_and_marks_published() {
        let outbox = Arc::new(InMemoryOutbox::new());
        outbox.append(record());
        outbox.append(record());

        let publisher = Arc::new(FlakyPublisher::down());
        publisher.recover();

        let forwarder = OutboxForwarder::new(outbox.clone(), publisher.clone(), config());
        let outcome = forwarder.drain_once().await;

        assert_eq!(outcome.forwarded, 2);
        assert_eq!(outbox.unpublished_len(), 0);
        assert_eq!(publisher.sent.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rows_survive_broker_outage_and_drain_after_recovery() {
        let outbox = Arc::new(InMemoryOutbox::new());
        outbox.append(record());

        let publisher = Arc::new(FlakyPublisher::down());
        let forwarder = OutboxForwarder::new(outbox.clone(), publisher.clone(), config());

        let outcome = forwarder.drain_once().await;
        assert_eq!(outcome.failed, 1);
        assert_eq!(outbox.unpublished_len(), 1);

        publisher.recover();
        let outcome = forwarder.drain_once().await;
        assert_eq!(outcome.forwarded, 1);
        assert_eq!(outbox.unpublished_len(), 0);
    }

    #[tokio::test]
    async fn exhausted_rows_are_left_in_the_ledger() {
        let outbox = Arc::new(InMemoryOutbox::new());
        outbox.append(record());

        let publisher = Arc::new(FlakyPublisher::down());
        let forwarder = OutboxForwarder::new(outbox.clone(), publisher.clone(), config());

        for _ in 0..3 {
            forwarder.drain_once().await;
        }

        // Retry budget spent: the row is no longer claimed but not lost.
        let outcome = forwarder.drain_once().await;
        assert_eq!(outcome, DrainOutcome::default());
        assert_eq!(outbox.unpublished_len(), 1);
    }
}
