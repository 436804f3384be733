//! In-process durable store.
//!
//! Used when no `DATABASE_URL` is configured and throughout the tests.
//! Reads and writes can be switched to fail so the degraded paths of the
//! aggregate store are observable.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::DurableStore;
use super::models::{PaymentRow, PromptRow, SnapshotRow};
use crate::domain::{EnergyDelta, GlobalSnapshot, PaymentRecord, TrackedEvent};
use crate::error::SapError;

#[derive(Debug, Default)]
struct Tables {
    prompts: Vec<PromptRow>,
    snapshots: Vec<SnapshotRow>,
    payments: Vec<PaymentRow>,
}

/// Vector-backed [`DurableStore`] with failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_snapshot_writes: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent read fail (or succeed again).
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes only snapshot writes fail (or succeed again); tracking rows
    /// written on their own still go through.
    pub fn set_fail_snapshot_writes(&self, fail: bool) {
        self.fail_snapshot_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns all stored tracking rows in insertion order.
    pub async fn prompts(&self) -> Vec<PromptRow> {
        self.tables.read().await.prompts.clone()
    }

    /// Returns the number of stored snapshot rows.
    pub async fn snapshot_count(&self) -> usize {
        self.tables.read().await.snapshots.len()
    }

    fn check_read(&self) -> Result<(), SapError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SapError::Persistence("memory store: reads disabled".into()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), SapError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SapError::Persistence("memory store: writes disabled".into()));
        }
        Ok(())
    }

    fn check_snapshot_write(&self) -> Result<(), SapError> {
        self.check_write()?;
        if self.fail_snapshot_writes.load(Ordering::SeqCst) {
            return Err(SapError::Persistence(
                "memory store: snapshot writes disabled".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl DurableStore for MemoryStore {
    async fn save_event(&self, event: &TrackedEvent, delta: EnergyDelta) -> Result<(), SapError> {
        self.check_write()?;
        let row = PromptRow::from_event(event, delta)?;
        self.tables.write().await.prompts.push(row);
        Ok(())
    }

    async fn save_snapshot(&self, snapshot: &GlobalSnapshot) -> Result<(), SapError> {
        self.check_snapshot_write()?;
        let row = SnapshotRow::from_snapshot(snapshot)?;
        self.tables.write().await.snapshots.push(row);
        Ok(())
    }

    async fn save_tracked(
        &self,
        event: &TrackedEvent,
        delta: EnergyDelta,
        snapshot: &GlobalSnapshot,
    ) -> Result<(), SapError> {
        self.check_write()?;
        self.check_snapshot_write()?;
        let prompt = PromptRow::from_event(event, delta)?;
        let snapshot = SnapshotRow::from_snapshot(snapshot)?;
        let mut tables = self.tables.write().await;
        tables.prompts.push(prompt);
        tables.snapshots.push(snapshot);
        Ok(())
    }

    async fn latest_snapshot(&self) -> Result<Option<GlobalSnapshot>, SapError> {
        self.check_read()?;
        let tables = self.tables.read().await;
        // Latest by creation time; on ties the later insert wins.
        let latest = tables
            .snapshots
            .iter()
            .enumerate()
            .max_by_key(|(idx, row)| (row.created_at, *idx))
            .map(|(_, row)| row.clone());
        latest.map(SnapshotRow::into_snapshot).transpose()
    }

    async fn save_payment(&self, record: &PaymentRecord) -> Result<(), SapError> {
        self.check_write()?;
        self.tables
            .write()
            .await
            .payments
            .push(PaymentRow::from(record));
        Ok(())
    }

    async fn payments_for_user(&self, user_id: &str) -> Result<Vec<PaymentRecord>, SapError> {
        self.check_read()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<PaymentRow> = tables
            .payments
            .iter()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.into_iter().map(PaymentRow::into_record).collect()
    }
}
