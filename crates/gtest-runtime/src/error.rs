//! Error types for declaration and run-time failures

use thiserror::Error;

/// Errors surfaced by the registration API and the blocking entry point.
///
/// Assertion failures are never errors; they are recorded as outcomes on
/// the test that produced them.
#[derive(Error, Debug)]
pub enum GtestError {
    /// `test` was called with no suite body running
    #[error("test `{description}` declared outside of a suite")]
    DeclarationContext { description: String },

    /// `describe` was given an empty label chain
    #[error("suite path must contain at least one label")]
    EmptySuitePath,

    /// The blocking entry point could not build its tokio runtime
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// A suite body or test callback gave up with a message
    #[error("{0}")]
    Callback(String),
}

impl GtestError {
    /// Build a [`GtestError::Callback`] from any message
    pub fn callback(msg: impl Into<String>) -> Self {
        GtestError::Callback(msg.into())
    }
}

/// Result type for registration operations
pub type GtestResult<T> = Result<T, GtestError>;

/// A suite body that returned an error or panicked during registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationFailure {
    /// Full path of the suite whose body failed
    pub suite: String,
    /// Rendered error
    pub message: String,
}

/// Render a caught panic payload
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
