//! Scenario-level errors.
//!
//! A scenario body returns `Result<(), SuiteError>`; the first `Err`
//! terminates it and becomes its failure detail in the report.

use thiserror::Error;

use crate::driver::DriverError;

/// Why a scenario (or a single page verification) failed.
#[derive(Error, Debug)]
pub enum SuiteError {
    /// A required element was absent or hidden.
    #[error("{what} is not displayed")]
    NotDisplayed {
        /// Human-readable description of the element.
        what: String,
    },

    /// A value read from the screen did not match the expectation.
    #[error("{0}")]
    AssertionFailed(String),

    /// A polled condition did not hold within its deadline.
    #[error("timed out after {elapsed_ms}ms waiting for {what}")]
    Timeout {
        /// The condition that was awaited.
        what: String,
        /// How long the poll ran before giving up.
        elapsed_ms: u64,
    },

    /// The automation backend failed to perform an operation.
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// A fresh app instance could not be prepared for the scenario.
    #[error("failed to launch app: {0}")]
    Launch(String),
}

impl SuiteError {
    /// Shorthand for [`SuiteError::NotDisplayed`].
    pub fn not_displayed(what: impl Into<String>) -> Self {
        SuiteError::NotDisplayed { what: what.into() }
    }

    /// Short machine-readable kind, used in JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            SuiteError::NotDisplayed { .. } => "not_displayed",
            SuiteError::AssertionFailed(_) => "assertion_failed",
            SuiteError::Timeout { .. } => "timeout",
            SuiteError::Driver(_) => "driver",
            SuiteError::Launch(_) => "launch",
        }
    }
}
