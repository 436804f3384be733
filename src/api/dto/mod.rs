//! Data Transfer Objects for REST request/response serialization.
//!
//! Field names are camelCase on the wire. Response types also derive
//! `Deserialize` so the client SDK can read them back.

pub mod account_dto;
pub mod generate_dto;
pub mod payment_dto;
pub mod tracking_dto;

pub use account_dto::*;
pub use generate_dto::*;
pub use payment_dto::*;
pub use tracking_dto::*;
