//! Global running totals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::estimator::EnergyDelta;

/// The current global totals at a point in time.
///
/// Only ever moves forward: every applied [`EnergyDelta`] adds one prompt
/// and non-negative energy / CO2 amounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSnapshot {
    /// Number of tracked prompts.
    pub total_prompts: u64,
    /// Cumulative energy in kWh.
    pub total_energy: f64,
    /// Cumulative CO2 in kg.
    #[serde(rename = "totalCO2")]
    pub total_co2: f64,
    /// Time of the last applied delta (or of creation for an empty snapshot).
    pub last_updated: DateTime<Utc>,
}

impl GlobalSnapshot {
    /// Creates an all-zero snapshot stamped with `at`.
    #[must_use]
    pub const fn empty(at: DateTime<Utc>) -> Self {
        Self {
            total_prompts: 0,
            total_energy: 0.0,
            total_co2: 0.0,
            last_updated: at,
        }
    }

    /// Returns the snapshot that results from applying `delta` at `at`.
    #[must_use]
    pub fn advanced(&self, delta: EnergyDelta, at: DateTime<Utc>) -> Self {
        Self {
            total_prompts: self.total_prompts.saturating_add(1),
            total_energy: self.total_energy + delta.energy,
            total_co2: self.total_co2 + delta.co2,
            last_updated: at,
        }
    }

    /// Returns `true` if `self` has accumulated fewer prompts than `other`.
    #[must_use]
    pub const fn is_behind(&self, other: &Self) -> bool {
        self.total_prompts < other.total_prompts
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn advanced_accumulates() {
        let start = GlobalSnapshot::empty(Utc::now());
        let at = Utc::now();
        let next = start.advanced(
            EnergyDelta {
                energy: 0.1,
                co2: 0.05,
            },
            at,
        );
        assert_eq!(next.total_prompts, 1);
        assert!((next.total_energy - 0.1).abs() < 1e-12);
        assert!((next.total_co2 - 0.05).abs() < 1e-12);
        assert_eq!(next.last_updated, at);
    }

    #[test]
    fn serializes_with_wire_names() {
        let snap = GlobalSnapshot::empty(Utc::now());
        let Ok(value) = serde_json::to_value(snap) else {
            panic!("serialization failed");
        };
        assert!(value.get("totalPrompts").is_some());
        assert!(value.get("totalEnergy").is_some());
        assert!(value.get("totalCO2").is_some());
        assert!(value.get("lastUpdated").is_some());
    }

    #[test]
    fn is_behind_compares_prompt_counts() {
        let empty = GlobalSnapshot::empty(Utc::now());
        let one = empty.advanced(
            EnergyDelta {
                energy: 0.0,
                co2: 0.0,
            },
            Utc::now(),
        );
        assert!(empty.is_behind(&one));
        assert!(!one.is_behind(&empty));
        assert!(!one.is_behind(&one));
    }
}
