// ABOUTME: Error type shared by every platform capability trait.
// ABOUTME: Distinguishes missing resources, rejected requests, and credential problems.

use chrono::{DateTime, Utc};

/// Errors returned by platform and identity calls.
///
/// A call that reaches the platform and is answered with a non-success
/// status is not an error at this layer; mutations hand back
/// `ResponseMetadata` and the caller decides.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("credentials expired at {0}")]
    ExpiredCredentials(DateTime<Utc>),

    #[error("platform error: {0}")]
    Service(String),
}
