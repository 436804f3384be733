//! Database row models for tracking rows, snapshots and payments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{EnergyDelta, GlobalSnapshot, PaymentRecord, TrackedEvent};
use crate::error::SapError;

/// A stored row from the `prompt_tracking` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PromptRow {
    /// Event identifier.
    pub id: Uuid,
    /// Prompt text, already truncated.
    pub prompt: String,
    /// Model reported by the client.
    pub model: String,
    /// Reported token count.
    pub tokens: i64,
    /// Energy attributed to the prompt (kWh).
    pub energy: f64,
    /// CO2 attributed to the prompt (kg).
    pub co2: f64,
    /// Reporting user.
    pub user_id: String,
    /// Detection source wire name, if reported.
    pub source: Option<String>,
    /// Event creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl PromptRow {
    /// Builds a row from an event and its computed delta.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::Persistence`] if the token count does not fit
    /// in a signed 64-bit column.
    pub fn from_event(event: &TrackedEvent, delta: EnergyDelta) -> Result<Self, SapError> {
        let tokens = i64::try_from(event.token_count()).map_err(|_| {
            SapError::Persistence(format!("token count {} out of range", event.token_count()))
        })?;
        Ok(Self {
            id: event.id(),
            prompt: event.prompt().to_string(),
            model: event.model().to_string(),
            tokens,
            energy: delta.energy,
            co2: delta.co2,
            user_id: event.user_id().to_string(),
            source: event.source().map(|s| s.as_str().to_string()),
            created_at: event.timestamp(),
        })
    }
}

/// A row from the `global_stats` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SnapshotRow {
    /// Number of tracked prompts.
    pub total_prompts: i64,
    /// Cumulative energy (kWh).
    pub total_energy: f64,
    /// Cumulative CO2 (kg).
    pub total_co2: f64,
    /// Snapshot timestamp; equals the snapshot's `last_updated`.
    pub created_at: DateTime<Utc>,
}

impl SnapshotRow {
    /// Builds a row from an in-memory snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SapError::Persistence`] if the prompt count overflows `i64`.
    pub fn from_snapshot(snapshot: &GlobalSnapshot) -> Result<Self, SapError> {
        let total_prompts = i64::try_from(snapshot.total_prompts).map_err(|_| {
            SapError::Persistence(format!(
                "total prompts {} out of range",
                snapshot.total_prompts
            ))
        })?;
        Ok(Self {
            total_prompts,
            total_energy: snapshot.total_energy,
            total_co2: snapshot.total_co2,
            created_at: snapshot.last_updated,
        })
    }

    /// Converts the row back into a [`GlobalSnapshot`].
    ///
    /// # Errors
    ///
    /// Returns [`SapError::Persistence`] if the stored prompt count is negative.
    pub fn into_snapshot(self) -> Result<GlobalSnapshot, SapError> {
        let total_prompts = u64::try_from(self.total_prompts).map_err(|_| {
            SapError::Persistence(format!("negative total prompts {}", self.total_prompts))
        })?;
        Ok(GlobalSnapshot {
            total_prompts,
            total_energy: self.total_energy,
            total_co2: self.total_co2,
            last_updated: self.created_at,
        })
    }
}

/// A row from the `user_payments` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaymentRow {
    /// Paying user.
    pub user_id: String,
    /// Payment type name (`stamp`, `membership`, `credits`).
    #[sqlx(rename = "type")]
    pub payment_type: String,
    /// Amount in major currency units.
    pub amount: f64,
    /// Checkout session id at the payment provider.
    pub stripe_session_id: String,
    /// Record creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&PaymentRecord> for PaymentRow {
    fn from(record: &PaymentRecord) -> Self {
        Self {
            user_id: record.user_id.clone(),
            payment_type: record.payment_type.as_str().to_string(),
            amount: record.amount,
            stripe_session_id: record.external_ref.clone(),
            created_at: record.timestamp,
        }
    }
}

impl PaymentRow {
    /// Converts the row into a [`PaymentRecord`].
    ///
    /// # Errors
    ///
    /// Returns [`SapError::Persistence`] if the stored type is unknown.
    pub fn into_record(self) -> Result<PaymentRecord, SapError> {
        let payment_type = self
            .payment_type
            .parse()
            .map_err(|e| SapError::Persistence(format!("{e}")))?;
        Ok(PaymentRecord {
            user_id: self.user_id,
            payment_type,
            amount: self.amount,
            external_ref: self.stripe_session_id,
            timestamp: self.created_at,
        })
    }
}
