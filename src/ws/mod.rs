//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The endpoint at `/ws` pushes `stats_updated` and `payment_recorded`
//! events as they happen. Clients may narrow the feed to specific users.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
