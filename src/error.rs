//! Error types for the generation pipeline.

use std::time::Duration;

/// Errors that can occur while preparing, submitting, or serving a
/// generation request.
#[derive(Debug, thiserror::Error)]
pub enum EnvisionError {
    /// Request is missing its image or prompt.
    #[error("{0}")]
    InvalidInput(String),

    /// Server-side misconfiguration (e.g. missing API key). The detail is
    /// for operator logs only and must never reach the client.
    #[error("configuration error: {0}")]
    Config(String),

    /// The model answered but produced no image, only an explanation.
    #[error("{0}")]
    ModelRefusal(String),

    /// Client-side cancellation timer expired.
    #[error("Request timed out. The image generation took too long.")]
    Timeout(Duration),

    /// The local API boundary answered with markup instead of JSON,
    /// usually a host page standing in for an undeployed endpoint.
    #[error("{0}")]
    EndpointNotFound(String),

    /// The boundary returned a non-success status.
    #[error("{message}")]
    Api {
        /// HTTP status reported by the boundary.
        status: u16,
        /// Error message extracted from the response body, or a generic
        /// `Server error: <status>` fallback.
        message: String,
    },

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Image decode, resize, or re-encode failure.
    #[error("{0}")]
    Image(String),

    /// Normalized payload still exceeds the transport body ceiling.
    #[error("encoded image is {size} bytes, over the {limit} byte limit")]
    PayloadTooLarge {
        /// Encoded payload size in bytes.
        size: usize,
        /// Configured ceiling in bytes.
        limit: usize,
    },

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, EnvisionError>;
