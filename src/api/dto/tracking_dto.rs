//! Tracking and snapshot DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{GlobalSnapshot, SourceTag, TrackedEvent};
use crate::error::SapError;

/// Model recorded when the client does not report one.
pub const UNKNOWN_MODEL: &str = "unknown";

/// User recorded when the client does not identify itself.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Request body for `POST /api/track`.
///
/// Every field is optional on the wire. `tokens` is authoritative for the
/// estimate; `energy` and `co2` override the derived values when present,
/// including an explicit `0.0`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    /// Prompt text; stored truncated to 1000 characters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Model reported by the client (default `"unknown"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Token count (default 0). Must be a non-negative integer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u64>,
    /// Measured energy in kWh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    /// Measured CO2 in kg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2: Option<f64>,
    /// Attributed user (default `"anonymous"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// How the prompt was detected on the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceTag>,
}

impl TrackRequest {
    /// Validates the request and converts it into a [`TrackedEvent`].
    ///
    /// # Errors
    ///
    /// Returns [`SapError::InvalidTrackingRequest`] if `energy` or `co2`
    /// is negative or not finite.
    pub fn into_event(self) -> Result<TrackedEvent, SapError> {
        check_amount("energy", self.energy)?;
        check_amount("co2", self.co2)?;

        let prompt = self.prompt.unwrap_or_default();
        let model = self
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| UNKNOWN_MODEL.to_string());
        let user_id = self
            .user_id
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| ANONYMOUS_USER.to_string());

        Ok(
            TrackedEvent::new(&prompt, model, self.tokens.unwrap_or(0), user_id)
                .with_explicit_energy(self.energy)
                .with_explicit_co2(self.co2)
                .with_source(self.source),
        )
    }
}

fn check_amount(field: &str, value: Option<f64>) -> Result<(), SapError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(SapError::InvalidTrackingRequest(format!(
            "{field} must be a non-negative number, got {v}"
        ))),
        _ => Ok(()),
    }
}

/// Response body for `POST /api/track`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrackResponse {
    /// Always `true` on a 200 response.
    pub success: bool,
    /// Totals after this prompt was applied.
    pub stats: GlobalSnapshot,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn parse(json: &str) -> TrackRequest {
        let Ok(req) = serde_json::from_str(json) else {
            panic!("failed to parse {json}");
        };
        req
    }

    #[test]
    fn empty_body_gets_defaults() {
        let Ok(event) = parse("{}").into_event() else {
            panic!("empty body must be accepted");
        };
        assert_eq!(event.model(), "unknown");
        assert_eq!(event.user_id(), "anonymous");
        assert_eq!(event.token_count(), 0);
        assert_eq!(event.prompt(), "");
    }

    #[test]
    fn explicit_zero_energy_is_kept() {
        let Ok(event) = parse(r#"{"tokens":500,"energy":0.0}"#).into_event() else {
            panic!("valid body rejected");
        };
        let delta = event.delta();
        assert!(delta.energy.abs() < f64::EPSILON);
        assert!(delta.co2.abs() < f64::EPSILON);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        for body in [r#"{"energy":-1}"#, r#"{"co2":-0.5}"#] {
            let result = parse(body).into_event();
            assert!(matches!(result, Err(SapError::InvalidTrackingRequest(_))));
        }
    }

    #[test]
    fn negative_or_fractional_tokens_do_not_parse() {
        assert!(serde_json::from_str::<TrackRequest>(r#"{"tokens":-5}"#).is_err());
        assert!(serde_json::from_str::<TrackRequest>(r#"{"tokens":1.5}"#).is_err());
    }

    #[test]
    fn camel_case_fields_and_source() {
        let Ok(event) =
            parse(r#"{"userId":"u7","model":"gpt-4","source":"button_click"}"#).into_event()
        else {
            panic!("valid body rejected");
        };
        assert_eq!(event.user_id(), "u7");
        assert_eq!(event.model(), "gpt-4");
        assert_eq!(event.source(), Some(SourceTag::ButtonClick));
    }

    #[test]
    fn long_prompt_is_truncated_but_tokens_are_kept() {
        let body = serde_json::json!({ "prompt": "x".repeat(5000), "tokens": 1250 });
        let Ok(req) = serde_json::from_value::<TrackRequest>(body) else {
            panic!("parse failed");
        };
        let Ok(event) = req.into_event() else {
            panic!("valid body rejected");
        };
        assert_eq!(event.prompt().chars().count(), 1000);
        assert_eq!(event.token_count(), 1250);
    }
}
