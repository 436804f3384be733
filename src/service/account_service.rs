//! Account service: payment recording and user status derivation.

use std::sync::Arc;

use crate::domain::{EventBus, PaymentRecord, StatsEvent, UserStatus};
use crate::error::SapError;
use crate::persistence::DurableStore;

/// A user's derived status together with the records it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAccount {
    /// Derived flags and credit balance.
    pub status: UserStatus,
    /// Payment records, newest first.
    pub payments: Vec<PaymentRecord>,
}

/// Reads and appends payment records.
///
/// Status is recomputed from the full history on every read; nothing is
/// cached.
#[derive(Debug, Clone)]
pub struct AccountService {
    store: Arc<dyn DurableStore>,
    event_bus: EventBus,
}

impl AccountService {
    /// Creates a new `AccountService`.
    #[must_use]
    pub fn new(store: Arc<dyn DurableStore>, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Loads a user's payment history and derives their status.
    ///
    /// Unknown users simply have an empty history.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::Persistence`] if the history cannot be read.
    /// There is deliberately no fallback here.
    pub async fn user_account(&self, user_id: &str) -> Result<UserAccount, SapError> {
        let payments = self.store.payments_for_user(user_id).await?;
        let status = UserStatus::from_records(&payments);
        tracing::debug!(
            user_id,
            payments = payments.len(),
            has_stamp = status.has_stamp,
            has_membership = status.has_membership,
            credits = status.credits,
            "user status derived"
        );
        Ok(UserAccount { status, payments })
    }

    /// Appends a payment record and notifies live subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::Persistence`] if the record cannot be stored.
    pub async fn record_payment(&self, record: PaymentRecord) -> Result<(), SapError> {
        self.store.save_payment(&record).await?;

        tracing::info!(
            user_id = %record.user_id,
            payment_type = %record.payment_type,
            amount = record.amount,
            external_ref = %record.external_ref,
            "payment recorded"
        );

        self.event_bus.publish(StatsEvent::PaymentRecorded {
            user_id: record.user_id,
            payment_type: record.payment_type,
            amount: record.amount,
            timestamp: record.timestamp,
        });
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::PaymentType;
    use crate::persistence::MemoryStore;
    use chrono::Utc;

    fn make_service() -> (AccountService, Arc<MemoryStore>) {
        let memory = Arc::new(MemoryStore::new());
        let store: Arc<dyn DurableStore> = Arc::clone(&memory) as Arc<dyn DurableStore>;
        (AccountService::new(store, EventBus::new(16)), memory)
    }

    fn record(user_id: &str, payment_type: PaymentType, amount: f64) -> PaymentRecord {
        PaymentRecord {
            user_id: user_id.to_string(),
            payment_type,
            amount,
            external_ref: "cs_test".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn unknown_user_has_empty_status() {
        let (service, _) = make_service();
        let Ok(account) = service.user_account("u2").await else {
            panic!("lookup failed");
        };
        assert_eq!(account.status, UserStatus::default());
        assert!(account.payments.is_empty());
    }

    #[tokio::test]
    async fn recorded_payments_drive_status() {
        let (service, _) = make_service();
        let _ = service.record_payment(record("u1", PaymentType::Credits, 5.0)).await;
        let _ = service.record_payment(record("u1", PaymentType::Credits, 2.5)).await;
        let _ = service.record_payment(record("u1", PaymentType::Stamp, 1.0)).await;
        let _ = service.record_payment(record("u3", PaymentType::Membership, 9.0)).await;

        let Ok(account) = service.user_account("u1").await else {
            panic!("lookup failed");
        };
        assert!(account.status.has_stamp);
        assert!(!account.status.has_membership);
        assert!((account.status.credits - 7.5).abs() < f64::EPSILON);
        assert_eq!(account.payments.len(), 3);
    }

    #[tokio::test]
    async fn read_failure_is_an_error() {
        let (service, memory) = make_service();
        memory.set_fail_reads(true);
        let result = service.user_account("u1").await;
        assert!(matches!(result, Err(SapError::Persistence(_))));
    }

    #[tokio::test]
    async fn record_payment_publishes_event() {
        let memory: Arc<dyn DurableStore> = Arc::new(MemoryStore::new());
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let service = AccountService::new(memory, bus);

        let _ = service.record_payment(record("u7", PaymentType::Stamp, 1.0)).await;

        let Ok(event) = rx.recv().await else {
            panic!("expected event");
        };
        assert_eq!(event.event_type_str(), "payment_recorded");
        assert_eq!(event.user_id(), "u7");
    }
}
