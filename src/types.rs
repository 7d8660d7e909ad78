//! Core enumerations shared across the stak application.
//!
//! Entry kinds, todo states and calendar directions live here so the
//! classifier, the store and the view can agree on them without depending
//! on each other.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::StakError;

/// A specialized Result type for stak operations.
pub type Result<T> = std::result::Result<T, StakError>;

/// The semantic category assigned to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Note,
    Todo,
    Link,
    Code,
    Question,
    Meeting,
    Idea,
}

impl EntryKind {
    pub const ALL: [EntryKind; 7] = [
        EntryKind::Note,
        EntryKind::Todo,
        EntryKind::Link,
        EntryKind::Code,
        EntryKind::Question,
        EntryKind::Meeting,
        EntryKind::Idea,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Note => "note",
            EntryKind::Todo => "todo",
            EntryKind::Link => "link",
            EntryKind::Code => "code",
            EntryKind::Question => "question",
            EntryKind::Meeting => "meeting",
            EntryKind::Idea => "idea",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion state of a todo entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

impl TodoStatus {
    /// The status reached by the toggle action: pending becomes completed,
    /// anything else goes back to pending.
    pub fn toggled(self) -> Self {
        match self {
            TodoStatus::Pending => TodoStatus::Completed,
            TodoStatus::Completed | TodoStatus::Cancelled => TodoStatus::Pending,
        }
    }

    /// The status reached by the cancel action.
    pub fn cancelled(self) -> Self {
        match self {
            TodoStatus::Cancelled => TodoStatus::Pending,
            TodoStatus::Pending | TodoStatus::Completed => TodoStatus::Cancelled,
        }
    }
}

/// One step on the calendar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Up,
    Down,
    Left,
    Right,
}
