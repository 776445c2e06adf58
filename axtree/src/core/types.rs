//! Shared deterministic value types: environment actions and the records the
//! session keeps about them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tree::Node;

/// Tag carried by every [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Click,
    Type,
    Stop,
    Noop,
    KeyPress,
    Scroll,
    GoBack,
}

impl ActionType {
    /// Actions that commit the agent's turn; only one is allowed per turn.
    pub fn is_committing(self) -> bool {
        matches!(self, Self::Click | Self::Type | Self::GoBack)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Click => "CLICK",
            Self::Type => "TYPE",
            Self::Stop => "STOP",
            Self::Noop => "NOOP",
            Self::KeyPress => "KEY_PRESS",
            Self::Scroll => "SCROLL",
            Self::GoBack => "GO_BACK",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
}

/// A low-level action understood by the browser environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action_type", rename_all = "snake_case")]
pub enum Action {
    Click { element_id: i64 },
    Type { element_id: i64, text: String },
    Stop { answer: String },
    Noop,
    KeyPress { key: String },
    Scroll { direction: ScrollDirection },
    GoBack,
}

impl Action {
    pub fn action_type(&self) -> ActionType {
        match self {
            Self::Click { .. } => ActionType::Click,
            Self::Type { .. } => ActionType::Type,
            Self::Stop { .. } => ActionType::Stop,
            Self::Noop => ActionType::Noop,
            Self::KeyPress { .. } => ActionType::KeyPress,
            Self::Scroll { .. } => ActionType::Scroll,
            Self::GoBack => ActionType::GoBack,
        }
    }

    pub fn key(key: &str) -> Self {
        Self::KeyPress {
            key: key.to_string(),
        }
    }
}

/// How a recorded action referred to its target element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    pub id: i64,
    pub category: String,
    pub name: String,
    pub nth: usize,
}

impl From<&Node> for ElementRef {
    fn from(node: &Node) -> Self {
        Self {
            id: node.id,
            category: node.category.clone(),
            name: node.name.clone(),
            nth: node.nth,
        }
    }
}

/// The high-level action an agent invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionRecord {
    Click { element: ElementRef },
    Type { element: ElementRef, text: String },
    PressEnter,
    GoBack,
    Print { text: String },
}
