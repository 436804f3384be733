//! User status DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::PaymentRecord;
use crate::service::UserAccount;

/// Response body for `GET /api/user/{userId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusResponse {
    /// At least one stamp payment exists.
    pub has_stamp: bool,
    /// At least one membership payment exists.
    pub has_membership: bool,
    /// Sum of all credits payment amounts.
    pub credits: f64,
    /// Full payment history, newest first.
    pub payments: Vec<PaymentRecord>,
}

impl From<UserAccount> for UserStatusResponse {
    fn from(account: UserAccount) -> Self {
        Self {
            has_stamp: account.status.has_stamp,
            has_membership: account.status.has_membership,
            credits: account.status.credits,
            payments: account.payments,
        }
    }
}
