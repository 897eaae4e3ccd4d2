//! Classified delivery errors.
//!
//! Every failure that reaches the retry engine is turned into a
//! [`NotificationError`] carrying a `retryable` flag. Errors that arrive
//! untagged are classified by message against [`NON_RETRYABLE_CODES`].

use serde::Serialize;
use std::fmt;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Symbolic failure reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidEmail,
    InvalidPhone,
    Unauthorized,
    Forbidden,
    MissingCredentials,
    ConfigurationError,
    EmailSendFailed,
    SmsSendFailed,
    UnknownError,
}

/// Codes that are never retried. Untagged errors whose message mentions one
/// of these names are classified terminal.
pub const NON_RETRYABLE_CODES: [ErrorCode; 6] = [
    ErrorCode::InvalidEmail,
    ErrorCode::InvalidPhone,
    ErrorCode::Unauthorized,
    ErrorCode::Forbidden,
    ErrorCode::MissingCredentials,
    ErrorCode::ConfigurationError,
];

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidEmail => "INVALID_EMAIL",
            ErrorCode::InvalidPhone => "INVALID_PHONE",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::MissingCredentials => "MISSING_CREDENTIALS",
            ErrorCode::ConfigurationError => "CONFIGURATION_ERROR",
            ErrorCode::EmailSendFailed => "EMAIL_SEND_FAILED",
            ErrorCode::SmsSendFailed => "SMS_SEND_FAILED",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }

    pub fn is_terminal(self) -> bool {
        NON_RETRYABLE_CODES.contains(&self)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A delivery failure with its retry classification.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct NotificationError {
    pub message: String,
    pub code: ErrorCode,
    /// HTTP-like status class.
    pub status_code: u16,
    pub retryable: bool,
    #[source]
    pub source: Option<BoxError>,
}

impl NotificationError {
    /// A pre-classified error. Its `retryable` flag is kept as-is.
    pub fn new(message: impl Into<String>, code: ErrorCode, status_code: u16, retryable: bool) -> Self {
        Self {
            message: message.into(),
            code,
            status_code,
            retryable,
            source: None,
        }
    }

    /// Classify an error that carries no tag of its own.
    ///
    /// Retryable unless the message names one of [`NON_RETRYABLE_CODES`].
    pub fn untagged(message: impl Into<String>) -> Self {
        let message = message.into();
        let retryable = !mentions_terminal_code(&message);
        Self::new(message, ErrorCode::UnknownError, 500, retryable)
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Failure reported by a delivery endpoint. Only 5xx statuses are retried.
    pub fn from_status(message: impl Into<String>, code: ErrorCode, status: u16) -> Self {
        Self::new(message, code, status, status >= 500)
    }
}

fn mentions_terminal_code(text: &str) -> bool {
    NON_RETRYABLE_CODES
        .iter()
        .any(|code| text.contains(code.as_str()))
}

impl From<String> for NotificationError {
    fn from(message: String) -> Self {
        Self::untagged(message)
    }
}

impl From<&str> for NotificationError {
    fn from(message: &str) -> Self {
        Self::untagged(message)
    }
}

impl From<std::io::Error> for NotificationError {
    fn from(err: std::io::Error) -> Self {
        Self::untagged(err.to_string()).with_source(err)
    }
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        Self::untagged(err.to_string()).with_source(err)
    }
}

impl From<BoxError> for NotificationError {
    fn from(err: BoxError) -> Self {
        match err.downcast::<NotificationError>() {
            Ok(tagged) => *tagged,
            Err(other) => Self::untagged(other.to_string()).with_source(other),
        }
    }
}
