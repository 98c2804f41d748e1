//! Error types for remote task service calls.

use thiserror::Error;

/// Errors that can occur while talking to the task service.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The configured base URL cannot be parsed.
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl {
        /// Offending value.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// Transport, timeout or body decoding failure.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{method} {url} returned HTTP {status}")]
    Status {
        /// Request method.
        method: &'static str,
        /// Request URL.
        url: String,
        /// Response status code.
        status: u16,
    },
}

