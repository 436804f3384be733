//! Linear energy / CO2 estimator for tracked prompts.
//!
//! The model is a placeholder: energy scales linearly with the token count
//! and CO2 scales linearly with energy. Callers that measured real values
//! may pass them explicitly, in which case they replace the estimate.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Energy attributed to one token, in kWh.
pub const ENERGY_PER_TOKEN_KWH: f64 = 0.001;

/// CO2 emitted per kWh, in kg.
pub const CO2_PER_KWH: f64 = 0.5;

/// Maximum number of prompt characters kept for audit storage.
pub const MAX_PROMPT_CHARS: usize = 1000;

/// Characters per token used by the client-side token heuristic.
pub const CHARS_PER_TOKEN: u64 = 4;

/// The energy and CO2 contribution of a single tracked event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EnergyDelta {
    /// Energy in kWh.
    pub energy: f64,
    /// CO2 in kg.
    pub co2: f64,
}

/// Maps a token count and optional measured values to an [`EnergyDelta`].
///
/// An explicit value of `0.0` is honored as given; only `None` falls back
/// to the linear estimate.
#[must_use]
pub fn estimate(
    token_count: u64,
    explicit_energy: Option<f64>,
    explicit_co2: Option<f64>,
) -> EnergyDelta {
    #[allow(clippy::cast_precision_loss)]
    let energy = explicit_energy.unwrap_or(token_count as f64 * ENERGY_PER_TOKEN_KWH);
    let co2 = explicit_co2.unwrap_or(energy * CO2_PER_KWH);
    EnergyDelta { energy, co2 }
}

/// Rough token count for a piece of text: one token per four characters,
/// rounded up.
#[must_use]
pub fn estimate_tokens(text: &str) -> u64 {
    let chars = text.chars().count() as u64;
    chars.div_ceil(CHARS_PER_TOKEN)
}

/// Returns the first [`MAX_PROMPT_CHARS`] characters of `text`.
///
/// Counts characters, not bytes, so a multi-byte code point is never split.
#[must_use]
pub fn truncate_prompt(text: &str) -> &str {
    match text.char_indices().nth(MAX_PROMPT_CHARS) {
        Some((byte_idx, _)) => text.get(..byte_idx).unwrap_or(text),
        None => text,
    }
}
