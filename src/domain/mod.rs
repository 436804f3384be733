//! Domain layer: estimator, tracked events, payments, and the aggregate store.
//!
//! This module contains the server-side domain model: the linear
//! energy / CO2 estimator, the immutable tracking event, payment records
//! with the user status derived from them, the global snapshot with its
//! owning aggregate store, and the event bus for broadcasting updates.

pub mod aggregate_store;
pub mod estimator;
pub mod event_bus;
pub mod payment;
pub mod snapshot;
pub mod stats_event;
pub mod tracked_event;

pub use aggregate_store::{AggregateStore, DurabilityMode};
pub use estimator::{EnergyDelta, estimate, estimate_tokens, truncate_prompt};
pub use event_bus::EventBus;
pub use payment::{PaymentRecord, PaymentType, UserStatus};
pub use snapshot::GlobalSnapshot;
pub use stats_event::StatsEvent;
pub use tracked_event::{SourceTag, TrackedEvent};
