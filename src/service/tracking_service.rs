//! Tracking service: estimates and applies tracked prompts.

use std::sync::Arc;

use crate::domain::{AggregateStore, GlobalSnapshot, TrackedEvent};
use crate::error::SapError;

/// Orchestrates the tracking write path and the snapshot read path.
///
/// Every tracked event follows the pattern: estimate delta, apply it to
/// the [`AggregateStore`] (which persists and publishes), return the new
/// snapshot.
#[derive(Debug, Clone)]
pub struct TrackingService {
    aggregates: Arc<AggregateStore>,
}

impl TrackingService {
    /// Creates a new `TrackingService`.
    #[must_use]
    pub fn new(aggregates: Arc<AggregateStore>) -> Self {
        Self { aggregates }
    }

    /// Returns a reference to the inner [`AggregateStore`].
    #[must_use]
    pub fn aggregates(&self) -> &Arc<AggregateStore> {
        &self.aggregates
    }

    /// Tracks one prompt and returns the updated totals.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::TrackingFailed`] when the aggregate store refuses
    /// the update (strict durability with a failing store).
    pub async fn track(&self, event: TrackedEvent) -> Result<GlobalSnapshot, SapError> {
        let delta = event.delta();
        let snapshot = self
            .aggregates
            .apply_delta(&event, delta)
            .await
            .map_err(|e| SapError::TrackingFailed(e.to_string()))?;

        tracing::info!(
            event_id = %event.id(),
            user_id = event.user_id(),
            model = event.model(),
            tokens = event.token_count(),
            energy = delta.energy,
            co2 = delta.co2,
            total_prompts = snapshot.total_prompts,
            "prompt tracked"
        );
        Ok(snapshot)
    }

    /// Returns the latest global snapshot. Never fails.
    pub async fn snapshot(&self) -> GlobalSnapshot {
        self.aggregates.current_snapshot().await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{DurabilityMode, EventBus};
    use crate::persistence::{DurableStore, MemoryStore};

    fn make_service(mode: DurabilityMode) -> (TrackingService, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new());
        let store: Arc<dyn DurableStore> = Arc::clone(&memory) as Arc<dyn DurableStore>;
        let aggregates = Arc::new(AggregateStore::new(store, EventBus::new(16), mode));
        (TrackingService::new(aggregates), memory)
    }

    #[tokio::test]
    async fn track_returns_updated_snapshot() {
        let (service, _) = make_service(DurabilityMode::BestEffort);
        let Ok(snap) = service
            .track(TrackedEvent::new("hello", "gpt-4", 100, "u1"))
            .await
        else {
            panic!("track failed");
        };
        assert_eq!(snap.total_prompts, 1);
        assert_eq!(service.snapshot().await, snap);
    }

    #[tokio::test]
    async fn track_persists_truncated_prompt() {
        let (service, memory) = make_service(DurabilityMode::BestEffort);
        let long = "z".repeat(2500);
        let _ = service
            .track(TrackedEvent::new(&long, "gpt-4", 2500, "u1"))
            .await;

        let rows = memory.prompts().await;
        let Some(row) = rows.first() else {
            panic!("expected a stored row");
        };
        assert_eq!(row.prompt.chars().count(), 1000);
        assert!((row.energy - 2.5).abs() < 1e-12);
    }

    #[tokio::test]
    async fn strict_failure_maps_to_tracking_failed() {
        let (service, memory) = make_service(DurabilityMode::Strict);
        memory.set_fail_writes(true);
        let result = service
            .track(TrackedEvent::new("hello", "gpt-4", 100, "u1"))
            .await;
        assert!(matches!(result, Err(SapError::TrackingFailed(_))));
        assert_eq!(service.snapshot().await.total_prompts, 0);
    }
}
