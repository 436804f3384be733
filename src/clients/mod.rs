//! Outbound collaborators: payment provider and completion API.
//!
//! Both are plain HTTP clients over `reqwest`. Their failures surface to
//! callers as 500-class [`crate::error::SapError`] variants; nothing here
//! retries.

pub mod completion;
pub mod http;
pub mod stripe;

pub use completion::{Completion, CompletionClient};
pub use stripe::{CheckoutSession, StripeClient, WebhookEvent, WebhookVerifier};
