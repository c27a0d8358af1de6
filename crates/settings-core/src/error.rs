use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message shown when the new password and its confirmation differ.
pub const PASSWORD_MISMATCH_MESSAGE: &str = "Confirm password does not match.";

/// Broad error category used for user-facing handling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SettingsErrorCategory {
    /// Local form validation failed; nothing was sent.
    Validation,
    /// Authentication/authorization failure reported by the server.
    Auth,
    /// Transient network or transport failure.
    Network,
    /// Rate-limited by the server.
    RateLimited,
    /// Server rejected the request for any other reason.
    Remote,
    /// Token/preference persistence failure.
    Storage,
    /// Serialization/deserialization failure.
    Serialization,
    /// Internal bug or invariant break.
    Internal,
}

/// Stable settings error payload surfaced to the form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("{category:?}:{code}: {message}")]
pub struct SettingsError {
    /// High-level error category.
    pub category: SettingsErrorCategory,
    /// Stable machine-readable error code.
    pub code: String,
    /// Human-readable message, shown verbatim by the form.
    pub message: String,
}

impl SettingsError {
    /// Construct a new settings error.
    pub fn new(
        category: SettingsErrorCategory,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Validation failure for a new password that does not match its confirmation.
    pub fn password_mismatch() -> Self {
        Self::new(
            SettingsErrorCategory::Validation,
            "password_mismatch",
            PASSWORD_MISMATCH_MESSAGE,
        )
    }

    /// Wrap a transport failure, keeping the server message untouched.
    pub fn remote(err: RemoteError) -> Self {
        let category = err
            .status
            .map(classify_http_status)
            .unwrap_or(SettingsErrorCategory::Remote);
        Self::new(category, "remote_error", err.message)
    }

    /// Build a persistence error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(SettingsErrorCategory::Storage, "storage_error", message)
    }
}

/// Failure returned by the partial-update and profile-fetch transports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RemoteError {
    /// HTTP status when the failure came from a response.
    pub status: Option<u16>,
    /// Server-provided message.
    pub message: String,
}

impl RemoteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// Map HTTP status codes to settings error categories.
pub fn classify_http_status(status: u16) -> SettingsErrorCategory {
    match status {
        401 | 403 => SettingsErrorCategory::Auth,
        408 | 429 => SettingsErrorCategory::RateLimited,
        400..=499 => SettingsErrorCategory::Remote,
        500..=599 => SettingsErrorCategory::Network,
        _ => SettingsErrorCategory::Internal,
    }
}
