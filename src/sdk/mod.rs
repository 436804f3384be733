//! Client SDK for the tracking server.
//!
//! [`SapClient`] wraps the HTTP API and keeps a local copy of the latest
//! global totals that callers can read or watch. [`detect`] holds the
//! rules that decide which UI events count as prompt submissions.
//!
//! ```no_run
//! # async fn demo() -> Result<(), sap_gateway::sdk::SdkError> {
//! use sap_gateway::sdk::{SapClient, SdkConfig, TrackOptions};
//!
//! let client = SapClient::new(SdkConfig::default())?;
//! let stats = client
//!     .track_prompt("Summarize this article", "gpt-4", TrackOptions::default())
//!     .await?;
//! println!("{} prompts so far", stats.total_prompts);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod detect;

pub use client::{SapClient, TrackOptions};
pub use config::SdkConfig;
pub use detect::{Detection, DetectionRules, DocumentEvent, InputElement};

/// Errors returned by [`SapClient`].
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// The client configuration is unusable.
    #[error("invalid SDK configuration: {0}")]
    InvalidConfig(String),

    /// The request could not be sent or the response could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// The server's `error` message, or the raw body.
        message: String,
    },
}
