//! Interaction logger.
//!
//! [`InteractionLogger::log`] is synchronous, never fails and never waits on
//! I/O. Records travel over a bounded channel to a background writer task
//! that inserts a [minimal payload](InteractionRecord::minimal_payload) into
//! the durable store. A record lands in the [`FallbackLog`] instead when
//!
//! - no store is configured, or the store reports itself unavailable;
//! - the channel is full or the writer is gone;
//! - no tokio runtime was running when the logger was created;
//! - every insert attempt failed.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::fallback::FallbackLog;
use super::store::DurableStore;
use crate::telemetry;
use crate::types::InteractionRecord;

/// Settings for the interaction logger.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Table the writer inserts into. Default: `llm_interactions`.
    pub table: String,
    /// Records waiting for the writer before new ones spill to the
    /// fallback tier. Default: 256.
    pub queue_capacity: usize,
    /// Records kept by the fallback tier. Default: 1000.
    pub fallback_capacity: usize,
    /// Insert attempts per record; only transient errors are retried.
    /// Default: 2.
    pub persist_attempts: u32,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            table: "llm_interactions".to_string(),
            queue_capacity: 256,
            fallback_capacity: 1000,
            persist_attempts: 2,
        }
    }
}

enum LogCommand {
    Record(Box<InteractionRecord>),
    Flush(oneshot::Sender<()>),
}

/// Best-effort, two-tier interaction log. Cheap to clone.
#[derive(Clone)]
pub struct InteractionLogger {
    tx: Option<mpsc::Sender<LogCommand>>,
    store: Option<Arc<dyn DurableStore>>,
    fallback: Arc<FallbackLog>,
}

impl InteractionLogger {
    /// Create a logger and spawn its writer on the current tokio runtime.
    pub fn new(store: Option<Arc<dyn DurableStore>>, config: LoggerConfig) -> Self {
        let fallback = Arc::new(FallbackLog::new(config.fallback_capacity));

        let tx = match (&store, tokio::runtime::Handle::try_current()) {
            (Some(store), Ok(handle)) => {
                let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
                let writer = Writer {
                    store: Arc::clone(store),
                    fallback: Arc::clone(&fallback),
                    table: config.table,
                    attempts: config.persist_attempts.max(1),
                };
                handle.spawn(writer.run(rx));
                Some(tx)
            }
            (Some(_), Err(_)) => {
                warn!("no tokio runtime, interaction records will only be kept in memory");
                None
            }
            (None, _) => None,
        };

        Self {
            tx,
            store,
            fallback,
        }
    }

    /// Logger with no durable store; everything goes to the fallback tier.
    pub fn memory_only(config: LoggerConfig) -> Self {
        Self::new(None, config)
    }

    /// Hand a record to the logging tier.
    pub fn log(&self, record: InteractionRecord) {
        let Some(tx) = self.tx.as_ref().filter(|_| self.durable_available()) else {
            debug!(record_id = %record.id, "durable store unavailable, keeping record in memory");
            self.fallback.push(record);
            return;
        };

        if let Err(err) = tx.try_send(LogCommand::Record(Box::new(record))) {
            let (reason, command) = match err {
                mpsc::error::TrySendError::Full(c) => ("queue full", c),
                mpsc::error::TrySendError::Closed(c) => ("writer stopped", c),
            };
            if let LogCommand::Record(record) = command {
                warn!(record_id = %record.id, reason, "interaction record diverted to fallback");
                self.fallback.push(*record);
            }
        }
    }

    /// Wait until every record logged before this call has been handled.
    pub async fn flush(&self) {
        let Some(tx) = &self.tx else { return };
        let (done_tx, done_rx) = oneshot::channel();
        if tx.send(LogCommand::Flush(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }

    /// Whether a durable store is configured and reports itself available.
    pub fn durable_available(&self) -> bool {
        self.store.as_ref().is_some_and(|s| s.is_available())
    }

    pub fn fallback(&self) -> &FallbackLog {
        &self.fallback
    }

    /// Copy of the records held by the fallback tier.
    pub fn fallback_records(&self) -> Vec<InteractionRecord> {
        self.fallback.snapshot()
    }
}

struct Writer {
    store: Arc<dyn DurableStore>,
    fallback: Arc<FallbackLog>,
    table: String,
    attempts: u32,
}

impl Writer {
    async fn run(self, mut rx: mpsc::Receiver<LogCommand>) {
        while let Some(command) = rx.recv().await {
            match command {
                LogCommand::Record(record) => self.persist(*record).await,
                LogCommand::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        debug!("interaction writer stopped");
    }

    async fn persist(&self, record: InteractionRecord) {
        if !self.store.is_available() {
            self.fallback.push(record);
            return;
        }

        let row = record.minimal_payload();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.insert(&self.table, row.clone()).await {
                Ok(()) => {
                    metrics::counter!(telemetry::INTERACTIONS_LOGGED_TOTAL, "tier" => "durable")
                        .increment(1);
                    debug!(record_id = %record.id, table = %self.table, "interaction logged");
                    return;
                }
                Err(err) if err.is_transient() && attempt < self.attempts => {
                    debug!(record_id = %record.id, attempt, error = %err, "retrying interaction insert");
                }
                Err(err) => {
                    warn!(
                        record_id = %record.id,
                        store = self.store.name(),
                        attempts = attempt,
                        error = %err,
                        "failed to persist interaction, keeping it in memory"
                    );
                    self.fallback.push(record);
                    return;
                }
            }
        }
    }
}
