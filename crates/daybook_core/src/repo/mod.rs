//! Repository contract and persistence implementations.
//!
//! # Responsibility
//! - Define the single storage facade both backends implement.
//! - Own the repository error taxonomy and bulk-scan diagnostics.
//!
//! # Invariants
//! - Callers depend only on the `Repository` trait; the backend is chosen
//!   once at startup and never inspected by type afterwards.
//! - Bulk scans skip unreadable records and report them; single-item
//!   operations surface their error directly.

use crate::db::DbError;
use crate::frontmatter::FrontmatterError;
use crate::model::item::{AnyItem, Note, Status, Tag, Task, ValidationError};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod sqlite_repo;
pub mod vault_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error taxonomy shared by both backends.
#[derive(Debug)]
pub enum RepoError {
    /// Lookup, update, or remove by id or tag name matched nothing.
    NotFound(String),
    /// The record is not persistable (for example, a blank title).
    Validation(ValidationError),
    /// A vault file's metadata header could not be parsed.
    Parse(FrontmatterError),
    /// Database-engine failure.
    Db(DbError),
    /// Filesystem failure.
    Io(std::io::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Parse(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Validation(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<FrontmatterError> for RepoError {
    fn from(value: FrontmatterError) -> Self {
        Self::Parse(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// One record dropped from a bulk scan, with the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    /// Row id or vault filename of the offending record.
    pub source: String,
    pub reason: String,
}

/// Bulk-scan result: the records that parsed, plus diagnostics for those
/// that did not. A scan with skips is still a successful call.
#[derive(Debug, Clone)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub skipped: Vec<SkippedRecord>,
}

impl<T> Default for Listing<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Listing<T> {
    pub(crate) fn skip(&mut self, source: impl Into<String>, reason: impl Display) {
        let source = source.into();
        let reason = reason.to_string();
        warn!("event=scan_skip module=repo status=skip source={source} reason={reason}");
        self.skipped.push(SkippedRecord { source, reason });
    }
}

/// The uniform storage facade.
///
/// `create_*` assigns the backend id (and, on the vault backend, the
/// creation timestamp) and writes the id back into the argument. On the
/// vault backend a title-changing `update_*` replaces the item's id; the
/// stale id resolves to `NotFound` afterwards.
pub trait Repository {
    fn get_tasks(&self) -> RepoResult<Listing<Task>>;
    fn create_task(&self, task: &mut Task) -> RepoResult<()>;
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn remove_task(&self, id: &str) -> RepoResult<()>;
    fn update_task_status(&self, task: &Task, status: Status) -> RepoResult<()>;
    fn set_task_tag(&self, task: &Task, tag: &Tag) -> RepoResult<()>;
    fn unset_task_tag(&self, task: &Task) -> RepoResult<()>;

    fn get_notes(&self) -> RepoResult<Listing<Note>>;
    fn create_note(&self, note: &mut Note) -> RepoResult<()>;
    fn update_note(&self, note: &Note) -> RepoResult<()>;
    fn remove_note(&self, id: &str) -> RepoResult<()>;
    fn set_note_tag(&self, note: &Note, tag: &Tag) -> RepoResult<()>;
    fn unset_note_tag(&self, note: &Note) -> RepoResult<()>;

    /// Exact-name lookup; `NotFound` when the tag does not exist on this
    /// backend (vault: not referenced by any item).
    fn get_tag(&self, name: &str) -> RepoResult<Tag>;
    /// All tags, sorted by name.
    fn get_tags(&self) -> RepoResult<Vec<Tag>>;
    fn create_tag(&self, name: &str) -> RepoResult<Tag>;
    fn remove_tag(&self, name: &str) -> RepoResult<()>;
    /// Tasks and notes carrying the tag, tasks first.
    fn get_items_with_tag(&self, name: &str) -> RepoResult<Listing<AnyItem>>;

    /// Irreversibly wipes the backing store. Intended for ephemeral demo
    /// installations only.
    fn reset(&self) -> RepoResult<()>;
}

/// Backend selection, decided once at startup by configuration.
#[derive(Debug, Clone)]
pub enum StoreConfig {
    Sqlite { db_path: PathBuf },
    Vault { dir: PathBuf },
}

/// Opens the configured backend behind the uniform facade.
pub fn open_repository(config: StoreConfig) -> RepoResult<Box<dyn Repository>> {
    match config {
        StoreConfig::Sqlite { db_path } => {
            Ok(Box::new(sqlite_repo::SqliteRepository::open(db_path)?))
        }
        StoreConfig::Vault { dir } => Ok(Box::new(vault_repo::VaultRepository::open(dir)?)),
    }
}
