//! Process-wide running totals with durable write-through.
//!
//! [`AggregateStore`] owns the single mutable [`GlobalSnapshot`]. Every
//! increment is a serialized read-modify-write under a
//! [`tokio::sync::Mutex`], so concurrent tracking requests never lose
//! updates. Each applied delta also requests persistence of the raw
//! tracking row and of the resulting snapshot row.
//!
//! # Durability modes
//!
//! - [`DurabilityMode::BestEffort`]: memory advances first; persistence
//!   failures are logged and never rolled back. Memory and the durable
//!   store may diverge until the next successful snapshot write.
//! - [`DurabilityMode::Strict`]: the tracking row and the snapshot row
//!   are written atomically first and memory only advances when that
//!   write succeeds, so the prompt count always matches the persisted
//!   tracking rows.
//!
//! # Reads
//!
//! [`AggregateStore::current_snapshot`] prefers the latest durable
//! snapshot and degrades to memory when the store read fails or is empty.
//! A durable snapshot that has fewer prompts than memory (left behind by a
//! failed best-effort write) is not adopted, so reads never go backwards.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use super::{EnergyDelta, EventBus, GlobalSnapshot, StatsEvent, TrackedEvent};
use crate::error::SapError;
use crate::persistence::DurableStore;

/// How strictly an applied delta is tied to durable persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DurabilityMode {
    /// Advance memory, then attempt persistence; failures are only logged.
    #[default]
    BestEffort,
    /// Persist both rows atomically first; advance memory only on success.
    Strict,
}

/// Owner of the global totals.
#[derive(Debug)]
pub struct AggregateStore {
    current: Mutex<GlobalSnapshot>,
    store: Arc<dyn DurableStore>,
    event_bus: EventBus,
    mode: DurabilityMode,
}

impl AggregateStore {
    /// Creates a store with all-zero totals.
    #[must_use]
    pub fn new(store: Arc<dyn DurableStore>, event_bus: EventBus, mode: DurabilityMode) -> Self {
        Self {
            current: Mutex::new(GlobalSnapshot::empty(Utc::now())),
            store,
            event_bus,
            mode,
        }
    }

    /// Returns the configured durability mode.
    #[must_use]
    pub const fn mode(&self) -> DurabilityMode {
        self.mode
    }

    /// Loads the latest durable snapshot into memory, if it is ahead.
    ///
    /// Called once at startup so totals survive restarts.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::Persistence`] if the durable read fails.
    pub async fn hydrate(&self) -> Result<GlobalSnapshot, SapError> {
        let durable = self.store.latest_snapshot().await?;
        let mut current = self.current.lock().await;
        if let Some(durable) = durable
            && !durable.is_behind(&current)
        {
            *current = durable;
        }
        Ok(*current)
    }

    /// Applies one event's delta to the totals and returns the new snapshot.
    ///
    /// # Errors
    ///
    /// In [`DurabilityMode::Strict`] returns [`SapError::Persistence`] when
    /// the rows cannot be written; neither row is stored and the totals are
    /// left unchanged. In best-effort mode this never fails.
    pub async fn apply_delta(
        &self,
        event: &TrackedEvent,
        delta: EnergyDelta,
    ) -> Result<GlobalSnapshot, SapError> {
        let next = match self.mode {
            DurabilityMode::BestEffort => {
                let next = {
                    let mut current = self.current.lock().await;
                    *current = current.advanced(delta, Utc::now());
                    *current
                };
                self.persist_best_effort(event, delta, &next).await;
                next
            }
            DurabilityMode::Strict => {
                let mut current = self.current.lock().await;
                let next = current.advanced(delta, Utc::now());
                self.store.save_tracked(event, delta, &next).await?;
                *current = next;
                next
            }
        };

        self.event_bus.publish(StatsEvent::StatsUpdated {
            user_id: event.user_id().to_string(),
            model: event.model().to_string(),
            source: event.source(),
            energy: delta.energy,
            co2: delta.co2,
            stats: next,
            timestamp: next.last_updated,
        });

        Ok(next)
    }

    /// Returns the latest known snapshot, never failing.
    ///
    /// The durable read is collapsed here: errors and empty results fall
    /// back to the in-memory totals with a logged degradation event.
    pub async fn current_snapshot(&self) -> GlobalSnapshot {
        match self.store.latest_snapshot().await {
            Ok(Some(durable)) => {
                let mut current = self.current.lock().await;
                if durable.is_behind(&current) {
                    tracing::warn!(
                        durable_prompts = durable.total_prompts,
                        memory_prompts = current.total_prompts,
                        "durable snapshot lags in-memory totals, serving in-memory"
                    );
                } else {
                    *current = durable;
                }
                *current
            }
            Ok(None) => self.in_memory_snapshot().await,
            Err(e) => {
                tracing::warn!(error = %e, "durable snapshot read failed, serving in-memory");
                self.in_memory_snapshot().await
            }
        }
    }

    /// Returns the in-memory totals without consulting the durable store.
    pub async fn in_memory_snapshot(&self) -> GlobalSnapshot {
        *self.current.lock().await
    }

    async fn persist_best_effort(
        &self,
        event: &TrackedEvent,
        delta: EnergyDelta,
        snapshot: &GlobalSnapshot,
    ) {
        if let Err(e) = self.store.save_event(event, delta).await {
            tracing::error!(error = %e, event_id = %event.id(), "failed to persist tracking row");
        }
        if let Err(e) = self.store.save_snapshot(snapshot).await {
            tracing::error!(
                error = %e,
                total_prompts = snapshot.total_prompts,
                "failed to persist snapshot row"
            );
        }
    }
}
