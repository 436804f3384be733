//! Persistence layer: durable store for tracking rows, snapshots and payments.
//!
//! The [`DurableStore`] trait is the only interface the rest of the service
//! sees. It offers append and latest-query operations, plus one atomic
//! write of a tracking row together with its snapshot. [`postgres::PostgresStore`] is the production implementation
//! on `sqlx::PgPool`; [`memory::MemoryStore`] backs database-less runs and
//! tests.

pub mod memory;
pub mod models;
pub mod postgres;

use std::fmt;

use async_trait::async_trait;

use crate::domain::{EnergyDelta, GlobalSnapshot, PaymentRecord, TrackedEvent};
use crate::error::SapError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Append / latest-query storage collaborator.
///
/// Implementations return [`SapError::Persistence`] on failure.
#[async_trait]
pub trait DurableStore: Send + Sync + fmt::Debug {
    /// Appends a tracking row with its computed delta.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::Persistence`] on storage failure.
    async fn save_event(&self, event: &TrackedEvent, delta: EnergyDelta) -> Result<(), SapError>;

    /// Appends a global snapshot row.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::Persistence`] on storage failure.
    async fn save_snapshot(&self, snapshot: &GlobalSnapshot) -> Result<(), SapError>;

    /// Appends a tracking row and the snapshot it produced as one unit:
    /// either both rows are stored or neither is.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::Persistence`] on storage failure; nothing is
    /// stored in that case.
    async fn save_tracked(
        &self,
        event: &TrackedEvent,
        delta: EnergyDelta,
        snapshot: &GlobalSnapshot,
    ) -> Result<(), SapError>;

    /// Returns the most recently created snapshot row, if any.
    ///
    /// Ties on creation time go to the row stored last.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::Persistence`] on storage failure.
    async fn latest_snapshot(&self) -> Result<Option<GlobalSnapshot>, SapError>;

    /// Appends a payment record.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::Persistence`] on storage failure.
    async fn save_payment(&self, record: &PaymentRecord) -> Result<(), SapError>;

    /// Returns all payment records of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::Persistence`] on storage failure.
    async fn payments_for_user(&self, user_id: &str) -> Result<Vec<PaymentRecord>, SapError>;
}
