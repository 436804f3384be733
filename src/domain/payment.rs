//! Payment records and the user status derived from them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// What a user paid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// One-off sustainability stamp.
    Stamp,
    /// Recurring membership.
    Membership,
    /// Prepaid credits; the amount is added to the user's balance.
    Credits,
}

impl PaymentType {
    /// Returns the wire / storage name of this type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stamp => "stamp",
            Self::Membership => "membership",
            Self::Credits => "credits",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known [`PaymentType`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment type: {0}")]
pub struct UnknownPaymentType(pub String);

impl FromStr for PaymentType {
    type Err = UnknownPaymentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stamp" => Ok(Self::Stamp),
            "membership" => Ok(Self::Membership),
            "credits" => Ok(Self::Credits),
            other => Err(UnknownPaymentType(other.to_string())),
        }
    }
}

/// An append-only record of a completed payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    /// Paying user.
    pub user_id: String,
    /// What was purchased.
    #[serde(rename = "type")]
    pub payment_type: PaymentType,
    /// Amount in major currency units.
    pub amount: f64,
    /// Reference at the payment provider (checkout session id).
    pub external_ref: String,
    /// Time the record was created.
    pub timestamp: DateTime<Utc>,
}

/// Status derived from a user's payment history. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    /// At least one stamp payment exists.
    pub has_stamp: bool,
    /// At least one membership payment exists.
    pub has_membership: bool,
    /// Sum of all credits payments.
    pub credits: f64,
}

impl UserStatus {
    /// Derives the status from a user's records.
    #[must_use]
    pub fn from_records(records: &[PaymentRecord]) -> Self {
        records.iter().fold(Self::default(), |mut status, record| {
            match record.payment_type {
                PaymentType::Stamp => status.has_stamp = true,
                PaymentType::Membership => status.has_membership = true,
                PaymentType::Credits => status.credits += record.amount,
            }
            status
        })
    }
}
