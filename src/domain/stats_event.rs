//! Domain events published after every accepted mutation.
//!
//! Events are broadcast through the [`super::EventBus`] to live WebSocket
//! subscribers. They are never persisted; the durable record of a
//! mutation is the tracking row or payment row itself.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{GlobalSnapshot, PaymentType, SourceTag};

/// Event emitted after the global totals or a user's payments change.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum StatsEvent {
    /// A tracked prompt advanced the global totals.
    StatsUpdated {
        /// User the prompt was attributed to.
        user_id: String,
        /// Model reported by the client.
        model: String,
        /// Detection source, if reported.
        source: Option<SourceTag>,
        /// Energy attributed to this prompt (kWh).
        energy: f64,
        /// CO2 attributed to this prompt (kg).
        co2: f64,
        /// Totals after the update.
        stats: GlobalSnapshot,
        /// Time of the update.
        timestamp: DateTime<Utc>,
    },

    /// A completed checkout was recorded for a user.
    PaymentRecorded {
        /// Paying user.
        user_id: String,
        /// What was purchased.
        payment_type: PaymentType,
        /// Amount in major currency units.
        amount: f64,
        /// Time the payment was recorded.
        timestamp: DateTime<Utc>,
    },
}

impl StatsEvent {
    /// Returns the user this event is attributed to.
    #[must_use]
    pub fn user_id(&self) -> &str {
        match self {
            Self::StatsUpdated { user_id, .. } | Self::PaymentRecorded { user_id, .. } => user_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::StatsUpdated { .. } => "stats_updated",
            Self::PaymentRecorded { .. } => "payment_recorded",
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn stats_updated_serializes_with_tag() {
        let event = StatsEvent::StatsUpdated {
            user_id: "u1".to_string(),
            model: "gpt-4".to_string(),
            source: Some(SourceTag::FormSubmission),
            energy: 0.1,
            co2: 0.05,
            stats: GlobalSnapshot::empty(Utc::now()),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"event_type\":\"stats_updated\""));
        assert!(json.contains("form_submission"));
        assert!(json.contains("totalPrompts"));
    }

    #[test]
    fn user_id_accessor() {
        let event = StatsEvent::PaymentRecorded {
            user_id: "u9".to_string(),
            payment_type: PaymentType::Credits,
            amount: 5.0,
            timestamp: Utc::now(),
        };
        assert_eq!(event.user_id(), "u9");
        assert_eq!(event.event_type_str(), "payment_recorded");
    }
}
