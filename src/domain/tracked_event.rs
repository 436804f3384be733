//! A single observed prompt submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::estimator::{self, EnergyDelta};

/// How a client detected the prompt submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    /// A form containing a prompt box was submitted.
    FormSubmission,
    /// A generate / ask / send button was clicked.
    ButtonClick,
    /// A long value was typed into a prompt box.
    InputChange,
}

impl SourceTag {
    /// Returns the wire name of this tag.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FormSubmission => "form_submission",
            Self::ButtonClick => "button_click",
            Self::InputChange => "input_change",
        }
    }
}

/// An immutable tracking event.
///
/// The prompt is truncated to [`estimator::MAX_PROMPT_CHARS`] on
/// construction. The token count is kept as reported and is the only input
/// to the estimate, so truncation never changes the computed delta.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEvent {
    id: Uuid,
    prompt: String,
    model: String,
    token_count: u64,
    explicit_energy: Option<f64>,
    #[serde(rename = "explicitCO2")]
    explicit_co2: Option<f64>,
    user_id: String,
    source: Option<SourceTag>,
    timestamp: DateTime<Utc>,
}

impl TrackedEvent {
    /// Creates a new event stamped with the current time.
    #[must_use]
    pub fn new(
        prompt: &str,
        model: impl Into<String>,
        token_count: u64,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: estimator::truncate_prompt(prompt).to_string(),
            model: model.into(),
            token_count,
            explicit_energy: None,
            explicit_co2: None,
            user_id: user_id.into(),
            source: None,
            timestamp: Utc::now(),
        }
    }

    /// Attaches a measured energy value in kWh.
    #[must_use]
    pub fn with_explicit_energy(mut self, energy: Option<f64>) -> Self {
        self.explicit_energy = energy;
        self
    }

    /// Attaches a measured CO2 value in kg.
    #[must_use]
    pub fn with_explicit_co2(mut self, co2: Option<f64>) -> Self {
        self.explicit_co2 = co2;
        self
    }

    /// Attaches the detection source.
    #[must_use]
    pub fn with_source(mut self, source: Option<SourceTag>) -> Self {
        self.source = source;
        self
    }

    /// Event identifier.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Truncated prompt text.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Model name reported by the client.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Reported token count.
    #[must_use]
    pub const fn token_count(&self) -> u64 {
        self.token_count
    }

    /// Measured energy, if supplied.
    #[must_use]
    pub const fn explicit_energy(&self) -> Option<f64> {
        self.explicit_energy
    }

    /// Measured CO2, if supplied.
    #[must_use]
    pub const fn explicit_co2(&self) -> Option<f64> {
        self.explicit_co2
    }

    /// Reporting user.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Detection source, if reported.
    #[must_use]
    pub const fn source(&self) -> Option<SourceTag> {
        self.source
    }

    /// Creation time.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Energy and CO2 attributed to this event.
    #[must_use]
    pub fn delta(&self) -> EnergyDelta {
        estimator::estimate(self.token_count, self.explicit_energy, self.explicit_co2)
    }
}
