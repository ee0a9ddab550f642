//! Result and error types for flakefree.

use thiserror::Error;

/// Result type for flakefree operations
pub type FlakeResult<T> = Result<T, FlakeError>;

/// Errors that can occur while driving or asserting on a page
#[derive(Debug, Error)]
pub enum FlakeError {
    /// A wait predicate never held before its deadline
    #[error("Timed out after {elapsed_ms}ms (limit {timeout_ms}ms) waiting for {waited_for}")]
    Timeout {
        /// Locator and predicate that were waited for
        waited_for: String,
        /// Configured deadline
        timeout_ms: u64,
        /// Time actually spent waiting
        elapsed_ms: u64,
    },

    /// An expectation never matched within its retry window
    #[error("Assertion failed after {elapsed_ms}ms: expected {assertion} {expected:?}, got {actual:?}")]
    Assertion {
        /// Locator plus matcher, e.g. `#userEmail to contain text`
        assertion: String,
        /// Expected value
        expected: String,
        /// Last observed value
        actual: String,
        /// Time spent retrying
        elapsed_ms: u64,
    },

    /// The page's execution context was replaced while it was being queried
    #[error("Execution context lost: {message}")]
    ContextLost {
        /// Error message
        message: String,
    },

    /// Generic driver failure (missing element for an action, protocol error)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// In-page evaluation error
    #[error("Evaluation of `{expression}` failed: {message}")]
    Evaluation {
        /// Expression that was evaluated (truncated)
        expression: String,
        /// Error message
        message: String,
    },

    /// Input simulation error
    #[error("Input simulation failed: {message}")]
    Input {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// A scenario step failed
    #[error("Step '{step}' failed after {elapsed_ms}ms: {source}")]
    StepFailed {
        /// Step name
        step: String,
        /// Time spent in the step
        elapsed_ms: u64,
        /// Underlying failure
        source: Box<FlakeError>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
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

impl FlakeError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create an input error
    #[must_use]
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether a wait loop may keep polling after this error
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::ContextLost { .. })
    }

    /// Whether this is a wait timeout, looking through step wrappers
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::StepFailed { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Whether this is an assertion failure, looking through step wrappers
    #[must_use]
    pub fn is_assertion(&self) -> bool {
        match self {
            Self::Assertion { .. } => true,
            Self::StepFailed { source, .. } => source.is_assertion(),
            _ => false,
        }
    }

    /// Name of the failing scenario step, if any
    #[must_use]
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            Self::StepFailed { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Innermost error beneath any step wrappers
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::StepFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
