//! Result and error types for lyra-smoke.

use thiserror::Error;

/// Result type for lyra-smoke operations
pub type SmokeResult<T> = Result<T, SmokeError>;

/// Errors that can occur while driving a smoke run
#[derive(Debug, Error)]
pub enum SmokeError {
    /// An expected widget or actor never showed up (or a read came back empty).
    /// Aborts the current scenario; never retried automatically.
    #[error("Precondition failed at step '{step}': {message}")]
    PreconditionFailure {
        /// Step that was waiting
        step: String,
        /// Human readable reason
        message: String,
    },

    /// Undefined geometry or malformed input (zero-length aim, bad locator reference)
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message
        message: String,
    },

    /// Automation server unreachable or the external application is not usable.
    /// Fatal to the whole run.
    #[error("Connection error: {message}")]
    ConnectionError {
        /// Error message
        message: String,
    },

    /// A field or path query returned no value
    #[error("Nothing found at {locator}{}", .field.as_deref().map(|f| format!(" (field '{f}')")).unwrap_or_default())]
    NotFound {
        /// Locator that was queried
        locator: String,
        /// Field name, when the query was a field read
        field: Option<String>,
    },

    /// Observable outcome did not match the expectation
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Operation called in the wrong state
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Error message
        message: String,
    },

    /// Scenario catalog could not be loaded or composed
    #[error("Scenario error: {message}")]
    Scenario {
        /// Error message
        message: String,
    },

    /// Fixture setup or teardown failed
    #[error("Fixture error: {message}")]
    Fixture {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl SmokeError {
    /// Create a precondition failure for a step
    #[must_use]
    pub fn precondition(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PreconditionFailure {
            step: step.into(),
            message: message.into(),
        }
    }

    /// Create an invalid input error
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a connection error
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    /// Create a not-found error for a locator read
    #[must_use]
    pub fn not_found(locator: impl Into<String>) -> Self {
        Self::NotFound {
            locator: locator.into(),
            field: None,
        }
    }

    /// Create a not-found error for a field read
    #[must_use]
    pub fn field_not_found(locator: impl Into<String>, field: impl Into<String>) -> Self {
        Self::NotFound {
            locator: locator.into(),
            field: Some(field.into()),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create an invalid state error
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a scenario catalog error
    #[must_use]
    pub fn scenario(message: impl Into<String>) -> Self {
        Self::Scenario {
            message: message.into(),
        }
    }

    /// Create a fixture error
    #[must_use]
    pub fn fixture(message: impl Into<String>) -> Self {
        Self::Fixture {
            message: message.into(),
        }
    }

    /// Whether this error ends the whole run rather than a single scenario
    #[must_use]
    pub const fn is_fatal_to_run(&self) -> bool {
        matches!(self, Self::ConnectionError { .. })
    }
}
