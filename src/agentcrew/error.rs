//! Error taxonomy shared by every layer of the crate.
//!
//! * [`CrewError`] is what orchestration entry points return.
//! * [`UpstreamError`] describes one failed backend call, attributed to the agent that made it.
//! * [`BackendError`] is what a [`ClientWrapper`](crate::ClientWrapper) reports before the
//!   agent attaches its name.
//! * [`AttachmentError`] is non-fatal: the attachment is dropped and the turn proceeds.

use std::fmt;
use thiserror::Error;

/// Classification of a failed backend call.
///
/// Only [`Timeout`](UpstreamErrorKind::Timeout) and
/// [`RateLimited`](UpstreamErrorKind::RateLimited) are eligible for automatic retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamErrorKind {
    Timeout,
    RateLimited,
    Malformed,
    Unknown,
}

impl UpstreamErrorKind {
    /// Whether the orchestrator's retry policy may re-issue a call that failed this way.
    pub fn is_retryable(self) -> bool {
        matches!(self, UpstreamErrorKind::Timeout | UpstreamErrorKind::RateLimited)
    }
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UpstreamErrorKind::Timeout => "timeout",
            UpstreamErrorKind::RateLimited => "rate limited",
            UpstreamErrorKind::Malformed => "malformed response",
            UpstreamErrorKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Failure reported by a completion backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct BackendError {
    pub kind: UpstreamErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Timeout, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::RateLimited, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Malformed, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(UpstreamErrorKind::Unknown, message)
    }
}

/// A backend failure attributed to a specific agent's call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("agent '{agent_name}' upstream failure ({kind}): {cause}")]
pub struct UpstreamError {
    pub agent_name: String,
    pub kind: UpstreamErrorKind,
    pub cause: String,
}

impl UpstreamError {
    pub fn from_backend(agent_name: impl Into<String>, err: BackendError) -> Self {
        Self {
            agent_name: agent_name.into(),
            kind: err.kind,
            cause: err.message,
        }
    }
}

/// An uploaded file could not be turned into a [`MediaRef`](crate::attachment::MediaRef).
#[derive(Debug, Error)]
#[error("attachment '{filename}' could not be ingested: {reason}")]
pub struct AttachmentError {
    pub filename: String,
    pub reason: String,
}

impl AttachmentError {
    pub fn new(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            reason: reason.into(),
        }
    }
}

/// Top-level error returned by orchestration entry points.
#[derive(Debug, Error)]
pub enum CrewError {
    /// Invalid static setup (empty roster, malformed policy, bad config values).
    /// Always raised before any backend call is made.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    /// The run was cancelled before any work could be dispatched.
    #[error("run cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CrewError {
    pub fn config(msg: impl Into<String>) -> Self {
        CrewError::Configuration(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, CrewError::Configuration(_))
    }
}

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CrewError>;
