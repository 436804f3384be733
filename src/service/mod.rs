//! Service layer: business logic orchestration.
//!
//! [`TrackingService`] turns tracking events into snapshot updates through
//! the [`crate::domain::AggregateStore`]; [`AccountService`] records
//! payments and derives per-user status from the durable store.

pub mod account_service;
pub mod tracking_service;

pub use account_service::{AccountService, UserAccount};
pub use tracking_service::TrackingService;
