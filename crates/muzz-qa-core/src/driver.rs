//! Automation driver trait for backend-agnostic UI automation.
//!
//! This module defines the [`AutomationDriver`] trait, the one capability the
//! page objects consume: a queryable, mutable live UI tree with an idle
//! signal. Backends include a TCP-connected on-device agent
//! ([`AgentDriver`](crate::agent_driver::AgentDriver)) and an in-process model
//! of the app ([`SimulatedApp`](crate::simulated::SimulatedApp)).
//!
//! # Selecting elements
//!
//! ```
//! use muzz_qa_core::driver::Selector;
//!
//! let by_tag = Selector::tag("login_button");
//! let by_text = Selector::text("You're all caught up!");
//! assert_eq!(by_tag.to_string(), "tag 'login_button'");
//! assert_eq!(by_text.value(), "You're all caught up!");
//! ```

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::element::UIElement;

/// Errors that can occur during automation driver operations.
///
/// This enum unifies errors from all backends behind a single type,
/// allowing consumers to handle errors uniformly regardless of the
/// underlying automation backend.
#[derive(Error, Debug)]
pub enum DriverError {
    /// A command or operation failed with the given message.
    #[error("Command failed: {0}")]
    CommandFailed(String),

    /// The targeted element is not in the current tree.
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    /// The backend is not available or not connected.
    #[error("Not connected to automation backend")]
    NotConnected,

    /// The TCP connection to the agent was lost.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// An operation timed out.
    #[error("Operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse JSON data.
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

/// How an element is located in the semantics tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Match the node's stable test tag.
    Tag(String),
    /// Match the node's static label or editable text.
    Text(String),
}

impl Selector {
    /// Selector matching a test tag.
    pub fn tag(tag: impl Into<String>) -> Self {
        Selector::Tag(tag.into())
    }

    /// Selector matching rendered text.
    pub fn text(text: impl Into<String>) -> Self {
        Selector::Text(text.into())
    }

    /// The raw tag or text being matched.
    pub fn value(&self) -> &str {
        match self {
            Selector::Tag(v) | Selector::Text(v) => v,
        }
    }

    /// Returns `true` if `element` itself (not its children) matches.
    ///
    /// Tags and texts compare exactly; a text selector matches either the
    /// label or the editable contents.
    pub fn matches(&self, element: &UIElement) -> bool {
        match self {
            Selector::Tag(tag) => element.test_tag.as_deref() == Some(tag.as_str()),
            Selector::Text(text) => {
                element.text.as_deref() == Some(text.as_str())
                    || element.editable_text.as_deref() == Some(text.as_str())
            }
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Tag(tag) => write!(f, "tag '{}'", tag),
            Selector::Text(text) => write!(f, "text '{}'", text),
        }
    }
}

/// Depth-first search of a tree snapshot for the first node matching `selector`.
pub fn search_tree(elements: &[UIElement], selector: &Selector) -> Option<UIElement> {
    for element in elements {
        if selector.matches(element) {
            return Some(element.clone());
        }
        if let Some(found) = search_tree(&element.children, selector) {
            return Some(found);
        }
    }
    None
}

/// Trait for backend-agnostic automation of the app under test.
///
/// Implementors provide tree inspection and the three mutating interactions
/// the suite uses (click, text input, text clearance) plus an idle signal.
/// [`find_element`](AutomationDriver::find_element) has a default
/// implementation that dumps the full tree and searches locally; backends
/// that can search server-side may override it.
///
/// # Required Methods
///
/// Implementors must provide: [`connect`](AutomationDriver::connect),
/// [`is_connected`](AutomationDriver::is_connected),
/// [`dump_tree`](AutomationDriver::dump_tree),
/// [`click`](AutomationDriver::click),
/// [`type_text`](AutomationDriver::type_text),
/// and [`clear_text`](AutomationDriver::clear_text).
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// Establish connection to the automation backend.
    async fn connect(&mut self) -> Result<(), DriverError>;

    /// Check if the backend is ready to accept commands.
    fn is_connected(&self) -> bool;

    /// Get the full semantics tree of the current screen.
    async fn dump_tree(&self) -> Result<Vec<UIElement>, DriverError>;

    /// Find the first node matching `selector` in a fresh snapshot.
    ///
    /// Returns `Ok(None)` when nothing matches; absence is not an error.
    async fn find_element(&self, selector: &Selector) -> Result<Option<UIElement>, DriverError> {
        let tree = self.dump_tree().await?;
        Ok(search_tree(&tree, selector))
    }

    /// Perform a click on the matching node.
    async fn click(&self, selector: &Selector) -> Result<(), DriverError>;

    /// Append `text` to the matching editable node.
    async fn type_text(&self, selector: &Selector, text: &str) -> Result<(), DriverError>;

    /// Remove all text from the matching editable node.
    async fn clear_text(&self, selector: &Selector) -> Result<(), DriverError>;

    /// Block until the app reports no pending layout, animation or input work.
    ///
    /// The default implementation returns immediately, for backends whose
    /// interactions are already synchronous.
    async fn wait_for_idle(&self, timeout_ms: u64) -> Result<(), DriverError> {
        let _ = timeout_ms;
        Ok(())
    }

    /// Kill and relaunch the app under test so the next scenario starts fresh.
    ///
    /// Not all backends support this. The default implementation returns
    /// an error.
    async fn relaunch(&self) -> Result<(), DriverError> {
        Err(DriverError::CommandFailed(
            "relaunch not supported by this backend".to_string(),
        ))
    }
}
