//! Item domain model.
//!
//! # Responsibility
//! - Define the common `Item` shape and its `Task`/`Note` projections.
//! - Provide the wire mappings for status and item-type fields.
//! - Own the `after` comparator used to order combined item lists.
//!
//! # Invariants
//! - `title` must be non-empty after trimming to create or persist an item.
//! - `created_at` is assigned by a backend and never rewritten afterwards.
//! - An item carries at most one tag, owned by value.

use chrono::{DateTime, Utc};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Todo,
    InProgress,
    Done,
    Cancelled,
}

impl Status {
    /// Returns the wire string used in vault frontmatter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a wire string leniently. Unknown values fall back to `Todo`
    /// so that a hand-edited vault file never breaks a scan.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "in-progress" | "inprogress" => Self::InProgress,
            "done" => Self::Done,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Todo,
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::Todo
    }
}

/// Kind discriminator stored in the vault frontmatter `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Task,
    Note,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Note => "note",
        }
    }

    /// Parses a wire string case-insensitively. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "task" => Some(Self::Task),
            "note" => Some(Self::Note),
            _ => None,
        }
    }
}

/// A named label attachable to at most one per item.
///
/// `name` is the logical identity (exact string equality). `id` is
/// backend-defined: a decimal row id on the relational backend, the name
/// itself on the vault backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: String,
    pub name: String,
}

/// Validation failure raised before any write reaches a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyTitle,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
        }
    }
}

impl Error for ValidationError {}

/// The common shape shared by tasks and notes.
///
/// `id` is opaque and backend-defined: a decimal row id on the relational
/// backend, the vault-relative filename on the file backend. On the file
/// backend a title-changing update replaces the id; callers holding the old
/// one get a not-found error afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub body: String,
    /// `None` until a backend assigns it on create.
    pub created_at: Option<DateTime<Utc>>,
    pub tag: Option<Tag>,
}

impl Item {
    /// Creates an unsaved item with just a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            body: String::new(),
            created_at: None,
            tag: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Returns whether `self` orders after `other` in the combined list.
    ///
    /// Tagged items always order before untagged ones. Within the same
    /// tag-presence, the later-created item orders first. Equal timestamps
    /// compare as not-after, so callers must sort stably to keep results
    /// deterministic across calls.
    pub fn after(&self, other: &Item) -> bool {
        match (self.tag.is_some(), other.tag.is_some()) {
            (true, false) => false,
            (false, true) => true,
            _ => {
                let own = self.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC);
                let their = other.created_at.unwrap_or(DateTime::<Utc>::MIN_UTC);
                own < their
            }
        }
    }
}

/// An actionable item with a lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub item: Item,
    pub status: Status,
}

impl Task {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            item: Item::new(title),
            status: Status::Todo,
        }
    }

    /// Applies a status keypress: selecting the current status again
    /// reverts the task to `Todo`.
    pub fn toggle_status(&mut self, status: Status) {
        if self.status == status {
            self.status = Status::Todo;
        } else {
            self.status = status;
        }
    }
}

/// A free-form item with no extra fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub item: Item,
}

impl Note {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            item: Item::new(title),
        }
    }
}

/// Polymorphic list element for operations that mix tasks and notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyItem {
    Task(Task),
    Note(Note),
}

impl AnyItem {
    pub fn item(&self) -> &Item {
        match self {
            Self::Task(task) => &task.item,
            Self::Note(note) => &note.item,
        }
    }

    pub fn id(&self) -> &str {
        &self.item().id
    }

    pub fn title(&self) -> &str {
        &self.item().title
    }
}

#[cfg(test)]
mod tests {
    use super::{Item, ItemType, Status, Task};

    #[test]
    fn status_wire_strings_round_trip() {
        for status in [
            Status::Todo,
            Status::InProgress,
            Status::Done,
            Status::Cancelled,
        ] {
            assert_eq!(Status::parse(status.as_str()), status);
        }
    }

    #[test]
    fn status_parse_accepts_variants_and_defaults_to_todo() {
        assert_eq!(Status::parse("InProgress"), Status::InProgress);
        assert_eq!(Status::parse("canceled"), Status::Cancelled);
        assert_eq!(Status::parse("DONE"), Status::Done);
        assert_eq!(Status::parse("bogus"), Status::Todo);
        assert_eq!(Status::parse(""), Status::Todo);
    }

    #[test]
    fn item_type_parse_is_case_insensitive() {
        assert_eq!(ItemType::parse("task"), Some(ItemType::Task));
        assert_eq!(ItemType::parse("NOTE"), Some(ItemType::Note));
        assert_eq!(ItemType::parse("Task"), Some(ItemType::Task));
        assert_eq!(ItemType::parse("event"), None);
        assert_eq!(ItemType::parse(""), None);
    }

    #[test]
    fn validate_rejects_blank_titles() {
        assert!(Item::new("Write report").validate().is_ok());
        assert!(Item::new("").validate().is_err());
        assert!(Item::new("   ").validate().is_err());
    }

    #[test]
    fn toggle_status_reverts_to_todo_on_repeat() {
        let mut task = Task::new("cycle");
        task.toggle_status(Status::Done);
        assert_eq!(task.status, Status::Done);
        task.toggle_status(Status::Done);
        assert_eq!(task.status, Status::Todo);
        task.toggle_status(Status::InProgress);
        assert_eq!(task.status, Status::InProgress);
    }
}
