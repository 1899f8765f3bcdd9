//! Client error taxonomy
//!
//! Every fallible operation in the crate returns [`ClientError`]. The variants
//! follow how failures are surfaced to users: inline per-field validation,
//! authentication banners that tear the session down, authorization redirects,
//! transient network failures that the pipeline may retry, and server
//! application errors whose message is passed through verbatim.

use std::collections::BTreeMap;
use std::fmt;

use reqwest::StatusCode;

/// Fallback text when the server did not supply a message.
pub const GENERIC_FAILURE: &str = "An unexpected error occurred, please try again";

/// Per-field validation messages, keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the first message for a field; later messages for the same field are ignored.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// `Ok(())` when no field failed, otherwise a [`ClientError::Validation`].
    pub fn into_result(self) -> Result<(), ClientError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ClientError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error("account banned: {message}")]
    Banned { message: String, reason: String },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server error ({status}): {message}")]
    Server { status: StatusCode, message: String },

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("credential storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Whether a retryable request may be attempted again after this failure.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(e) => !e.is_builder() && !e.is_decode(),
            ClientError::Server { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::REQUEST_TIMEOUT
                    || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }

    /// Whether this failure must end the current session.
    pub fn is_authentication(&self) -> bool {
        matches!(self, ClientError::Authentication(_))
    }

    /// HTTP status behind the failure, when there was a response at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Authentication(_) => Some(StatusCode::UNAUTHORIZED),
            ClientError::Banned { .. } | ClientError::Forbidden(_) => Some(StatusCode::FORBIDDEN),
            ClientError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            ClientError::Server { status, .. } => Some(*status),
            ClientError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// Text suitable for a banner or inline message.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(fields) => fields.to_string(),
            ClientError::Authentication(m)
            | ClientError::Forbidden(m)
            | ClientError::NotFound(m)
            | ClientError::Server { message: m, .. } => m.clone(),
            ClientError::Banned { message, .. } => message.clone(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }

    /// Builds the error for a non-success response from its status and raw body.
    ///
    /// The body's `error` field wins over `message`; without either the
    /// generic fallback is used.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|v| v.get(name))
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let message = field("error")
            .or_else(|| field("message"))
            .unwrap_or_else(|| GENERIC_FAILURE.to_string());

        match status {
            StatusCode::UNAUTHORIZED => ClientError::Authentication(message),
            StatusCode::FORBIDDEN => match field("banReason").or_else(|| field("ban_reason")) {
                Some(reason) => ClientError::Banned { message, reason },
                None => ClientError::Forbidden(message),
            },
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            _ => ClientError::Server { status, message },
        }
    }
}
