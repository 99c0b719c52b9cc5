//! UI element types for semantics-tree based automation.
//!
//! This module defines the node type every automation backend reports when
//! asked for the current screen. The shape mirrors what a Compose semantics
//! tree exposes: a stable test tag, static label text, editable field text,
//! and a displayed flag.

use serde::{Deserialize, Serialize};

/// A node from the application's semantics tree.
///
/// Nodes form a tree via the `children` field. A snapshot of the tree is
/// only valid for the instant it was taken; callers re-query the driver
/// instead of holding on to elements across interactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UIElement {
    /// The stable test tag assigned by the application (e.g. `login_button`).
    #[serde(default)]
    pub test_tag: Option<String>,

    /// Static label text rendered by the node.
    #[serde(default)]
    pub text: Option<String>,

    /// Current contents of an editable text field.
    #[serde(default)]
    pub editable_text: Option<String>,

    /// The semantic role of the node (e.g. "Button", "TextField").
    #[serde(default)]
    pub role: Option<String>,

    /// Whether the node is currently laid out on screen.
    ///
    /// `None` means the backend did not report visibility and the node is
    /// treated as displayed.
    #[serde(default)]
    pub displayed: Option<bool>,

    /// Child nodes nested within this node.
    #[serde(default)]
    pub children: Vec<UIElement>,
}

impl UIElement {
    /// Creates a node carrying only a test tag.
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            test_tag: Some(tag.into()),
            ..Self::default()
        }
    }

    /// Sets the static label text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the editable field contents.
    pub fn with_editable_text(mut self, text: impl Into<String>) -> Self {
        self.editable_text = Some(text.into());
        self
    }

    /// Sets the semantic role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Appends a child node.
    pub fn with_child(mut self, child: UIElement) -> Self {
        self.children.push(child);
        self
    }

    /// Returns `true` unless the backend explicitly reported the node hidden.
    pub fn is_displayed(&self) -> bool {
        self.displayed != Some(false)
    }

    /// The text a user would read from this node.
    ///
    /// Editable contents win over the static label; a node with neither
    /// yields an empty string.
    pub fn visible_text(&self) -> &str {
        self.editable_text
            .as_deref()
            .or(self.text.as_deref())
            .unwrap_or("")
    }
}
