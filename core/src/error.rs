//! Error types for the PocketBase client.
//!
//! # Design
//! Failures fall into three groups: the device has no network link
//! (`Offline`), the transport could not complete the exchange (`Transport`),
//! and the backend answered with an application-level refusal (`NotFound`,
//! `Forbidden`, `CreateFailed`). Callers that only want the old
//! "log it and hand back an empty string" behaviour use [`OrEmpty`].

use std::fmt;

use tracing::error;

/// Errors returned by collection operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The connectivity check reported no link; nothing was sent.
    Offline,

    /// The transport failed before a status line was received. `code` is
    /// the non-positive status reported by the underlying HTTP stack.
    Transport { code: i32, message: String },

    /// The backend answered with an error envelope carrying code 404.
    NotFound { message: String },

    /// The backend answered with an error envelope carrying code 403.
    Forbidden { message: String },

    /// The backend refused to create the record.
    CreateFailed { status: u16, body: String },

    /// The record payload could not be turned into a JSON object.
    SerializationError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Offline => write!(f, "network disconnected"),
            ApiError::Transport { code, message } => {
                write!(f, "transport error {code}: {message}")
            }
            ApiError::NotFound { message } => write!(f, "not found: {message}"),
            ApiError::Forbidden { message } => write!(f, "forbidden: {message}"),
            ApiError::CreateFailed { status, body } => {
                write!(f, "failed to create record (HTTP {status}): {body}")
            }
            ApiError::SerializationError(msg) => {
                write!(f, "serialization failed: {msg}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Collapse a collection result into the bare body string.
///
/// Errors are logged and replaced by `""`, which is how device sketches
/// usually consume the client.
pub trait OrEmpty {
    fn or_empty(self) -> String;
}

impl OrEmpty for Result<String, ApiError> {
    fn or_empty(self) -> String {
        match self {
            Ok(body) => body,
            Err(err) => {
                error!(error = %err, "request failed");
                String::new()
            }
        }
    }
}
