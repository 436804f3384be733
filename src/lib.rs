//! # sap-gateway
//!
//! Tracking gateway for the estimated environmental impact of AI prompts,
//! plus a client SDK for it.
//!
//! Clients report prompts (token counts, optionally measured energy and
//! CO2). The gateway converts each report into an energy/CO2 delta with a
//! linear model, adds it to one global running total, and persists both the
//! raw event and the resulting snapshot. Payments made through the payment
//! provider unlock per-user status.
//!
//! ## Architecture
//!
//! ```text
//! Clients (widget, SDK, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── TrackingService / AccountService (service/)
//!     ├── Stripe + completion clients (clients/)
//!     ├── EventBus (domain/)
//!     │
//!     ├── AggregateStore + Estimator (domain/)
//!     │
//!     └── DurableStore: PostgreSQL or in-memory (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod clients;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod sdk;
pub mod service;
pub mod ws;
