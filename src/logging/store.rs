//! Durable store seam and the in-memory implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use crate::{GatewayError, Result};

/// A relational store reachable by table name.
///
/// Only the two operations the interaction logger needs are modelled.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Store name for logging/debugging.
    fn name(&self) -> &str;

    /// Whether the store is configured and worth trying. A `false` here
    /// sends records straight to the fallback tier.
    fn is_available(&self) -> bool {
        true
    }

    /// Insert one row.
    async fn insert(&self, table: &str, row: Value) -> Result<()>;

    /// Read up to `limit` rows, oldest first.
    async fn select(&self, table: &str, limit: usize) -> Result<Vec<Value>>;
}

/// Process-local [`DurableStore`] for tests and offline runs.
///
/// Can be switched offline, or told to fail a number of upcoming inserts.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    offline: AtomicBool,
    failing_inserts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report the store as unavailable (`true`) or available (`false`).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make the next `n` inserts fail with a transient error.
    pub fn fail_next_inserts(&self, n: usize) {
        self.failing_inserts.store(n, Ordering::SeqCst);
    }

    /// Copy of every row in `table`.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    fn take_failure(&self) -> bool {
        self.failing_inserts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn is_available(&self) -> bool {
        !self.offline.load(Ordering::SeqCst)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<()> {
        if !self.is_available() {
            return Err(GatewayError::Connection("memory store is offline".into()));
        }
        if self.take_failure() {
            return Err(GatewayError::Api {
                status: 503,
                message: "injected insert failure".into(),
            });
        }
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(table.to_string())
            .or_default()
            .push(row);
        Ok(())
    }

    async fn select(&self, table: &str, limit: usize) -> Result<Vec<Value>> {
        if !self.is_available() {
            return Err(GatewayError::Connection("memory store is offline".into()));
        }
        Ok(self.rows(table).into_iter().take(limit).collect())
    }
}
