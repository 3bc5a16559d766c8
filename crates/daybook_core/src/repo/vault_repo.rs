//! File-vault backend: one markdown file per item, frontmatter as metadata.
//!
//! # Responsibility
//! - Persist items as `*.md` files in a flat directory.
//! - Derive the tag index by scanning file headers; tags have no storage
//!   of their own.
//!
//! # Invariants
//! - An item's id is its vault-relative filename; a title-changing update
//!   replaces the id.
//! - Scans ignore subdirectories, including the reserved metadata
//!   directory.
//! - There is no index: every query is linear in the vault size.

use crate::frontmatter::{self, Frontmatter};
use crate::model::item::{AnyItem, Item, ItemType, Note, Status, Tag, Task};
use crate::repo::{Listing, RepoError, RepoResult, Repository};
use crate::slug::{filename_from_title, slug};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Reserved subdirectory for backend-internal bookkeeping; never scanned
/// and never touched by `reset`.
pub const META_DIR: &str = ".daybook";

const ITEM_EXTENSION: &str = ".md";

/// Vault-backed repository. Single-writer, synchronous, index-free.
pub struct VaultRepository {
    vault_dir: PathBuf,
}

impl VaultRepository {
    /// Opens the vault, creating the directory if it does not exist yet.
    pub fn open(dir: impl AsRef<Path>) -> RepoResult<Self> {
        let vault_dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&vault_dir).map_err(RepoError::Io)?;
        Ok(Self { vault_dir })
    }

    pub fn vault_dir(&self) -> &Path {
        &self.vault_dir
    }

    fn item_path(&self, id: &str) -> PathBuf {
        self.vault_dir.join(id)
    }

    /// All item files in the vault, non-recursive, sorted by name so scan
    /// output is deterministic.
    fn scan_item_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.vault_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            if is_item_filename(&name.to_string_lossy()) {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// First free path for a new file with this title: `slug.md`, then
    /// `slug-2.md`, `slug-3.md`, ...
    fn unique_path(&self, title: &str) -> PathBuf {
        let base = slug(title);
        let mut path = self.vault_dir.join(format!("{base}{ITEM_EXTENSION}"));
        let mut counter = 2;
        while path.exists() {
            path = self
                .vault_dir
                .join(format!("{base}-{counter}{ITEM_EXTENSION}"));
            counter += 1;
        }
        path
    }

    fn read_parsed(&self, id: &str) -> RepoResult<(Frontmatter, String)> {
        let content =
            fs::read_to_string(self.item_path(id)).map_err(|err| io_to_repo(err, id))?;
        let (header, body) = frontmatter::parse(&content)?;
        Ok((header, body))
    }

    fn write_item(&self, path: &Path, header: &Frontmatter, body: &str) -> RepoResult<()> {
        let content = frontmatter::serialize(header, body)?;
        fs::write(path, content).map_err(RepoError::Io)
    }

    /// Shared read-modify-write for header-only mutations (status, tag).
    fn rewrite_header(
        &self,
        id: &str,
        mutate: impl FnOnce(&mut Frontmatter),
    ) -> RepoResult<()> {
        let (mut header, body) = self.read_parsed(id)?;
        mutate(&mut header);
        self.write_item(&self.item_path(id), &header, &body)
    }

    fn create_item(
        &self,
        item: &mut Item,
        item_type: ItemType,
        status: Option<Status>,
    ) -> RepoResult<()> {
        item.validate()?;
        let created_at = item.created_at.unwrap_or_else(Utc::now);
        let header = build_header(&item.title, item_type, status, item.tag.as_ref(), created_at);
        let path = self.unique_path(&item.title);
        self.write_item(&path, &header, &item.body)?;
        item.id = relative_id(&path);
        Ok(())
    }

    /// Full-record update. If the new title slugs to a different filename
    /// the update becomes write-new-then-delete-old; the two steps are not
    /// atomic and a crash in between can leave both files behind.
    fn update_item(
        &self,
        item: &Item,
        item_type: ItemType,
        status: Option<Status>,
    ) -> RepoResult<()> {
        item.validate()?;
        let old_path = self.item_path(&item.id);
        let existing =
            fs::read_to_string(&old_path).map_err(|err| io_to_repo(err, &item.id))?;
        let (existing_header, _) = frontmatter::parse(&existing)?;

        // An update without a timestamp keeps the stored one.
        let created_at = item
            .created_at
            .unwrap_or_else(|| parse_created_at(existing_header.created_at.as_deref()));
        let header = build_header(&item.title, item_type, status, item.tag.as_ref(), created_at);

        if filename_from_title(&item.title) != item.id {
            let new_path = self.unique_path(&item.title);
            self.write_item(&new_path, &header, &item.body)?;
            fs::remove_file(&old_path).map_err(RepoError::Io)?;
        } else {
            self.write_item(&old_path, &header, &item.body)?;
        }
        Ok(())
    }

    fn remove_item(&self, id: &str) -> RepoResult<()> {
        fs::remove_file(self.item_path(id)).map_err(|err| io_to_repo(err, id))
    }

    /// Runs `visit` over every parseable item file; unreadable or
    /// malformed files are recorded on the listing and skipped.
    fn scan_into<T>(
        &self,
        listing: &mut Listing<T>,
        mut visit: impl FnMut(&mut Listing<T>, Frontmatter, String, String),
    ) -> RepoResult<()> {
        let files = self.scan_item_files().map_err(RepoError::Io)?;
        for path in files {
            let id = relative_id(&path);
            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(err) => {
                    listing.skip(id.as_str(), err);
                    continue;
                }
            };
            match frontmatter::parse(&content) {
                Ok((header, body)) => visit(listing, header, body, id),
                Err(err) => listing.skip(id.as_str(), err),
            }
        }
        Ok(())
    }
}

impl Repository for VaultRepository {
    fn get_tasks(&self) -> RepoResult<Listing<Task>> {
        let mut listing = Listing::default();
        self.scan_into(&mut listing, |listing, header, body, id| {
            if header_type(&header) == Some(ItemType::Task) {
                listing.items.push(task_from_parts(header, body, id));
            }
        })?;
        Ok(listing)
    }

    fn create_task(&self, task: &mut Task) -> RepoResult<()> {
        let status = task.status;
        self.create_item(&mut task.item, ItemType::Task, Some(status))
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        self.update_item(&task.item, ItemType::Task, Some(task.status))
    }

    fn remove_task(&self, id: &str) -> RepoResult<()> {
        self.remove_item(id)
    }

    fn update_task_status(&self, task: &Task, status: Status) -> RepoResult<()> {
        self.rewrite_header(&task.item.id, |header| {
            header.status = Some(status.as_str().to_string());
        })
    }

    fn set_task_tag(&self, task: &Task, tag: &Tag) -> RepoResult<()> {
        let name = tag.name.clone();
        self.rewrite_header(&task.item.id, |header| {
            header.tag = Some(name);
        })
    }

    fn unset_task_tag(&self, task: &Task) -> RepoResult<()> {
        self.rewrite_header(&task.item.id, |header| {
            header.tag = None;
        })
    }

    fn get_notes(&self) -> RepoResult<Listing<Note>> {
        let mut listing = Listing::default();
        self.scan_into(&mut listing, |listing, header, body, id| {
            if header_type(&header) == Some(ItemType::Note) {
                listing.items.push(note_from_parts(header, body, id));
            }
        })?;
        Ok(listing)
    }

    fn create_note(&self, note: &mut Note) -> RepoResult<()> {
        self.create_item(&mut note.item, ItemType::Note, None)
    }

    fn update_note(&self, note: &Note) -> RepoResult<()> {
        self.update_item(&note.item, ItemType::Note, None)
    }

    fn remove_note(&self, id: &str) -> RepoResult<()> {
        self.remove_item(id)
    }

    fn set_note_tag(&self, note: &Note, tag: &Tag) -> RepoResult<()> {
        let name = tag.name.clone();
        self.rewrite_header(&note.item.id, |header| {
            header.tag = Some(name);
        })
    }

    fn unset_note_tag(&self, note: &Note) -> RepoResult<()> {
        self.rewrite_header(&note.item.id, |header| {
            header.tag = None;
        })
    }

    fn get_tag(&self, name: &str) -> RepoResult<Tag> {
        let mut listing: Listing<()> = Listing::default();
        let mut found = false;
        self.scan_into(&mut listing, |_, header, _, _| {
            if header.tag.as_deref() == Some(name) {
                found = true;
            }
        })?;
        if found {
            Ok(Tag {
                id: name.to_string(),
                name: name.to_string(),
            })
        } else {
            Err(RepoError::NotFound(name.to_string()))
        }
    }

    fn get_tags(&self) -> RepoResult<Vec<Tag>> {
        let mut listing: Listing<()> = Listing::default();
        let mut names: BTreeSet<String> = BTreeSet::new();
        self.scan_into(&mut listing, |_, header, _, _| {
            if let Some(tag) = header.tag {
                if !tag.is_empty() {
                    names.insert(tag);
                }
            }
        })?;
        Ok(names
            .into_iter()
            .map(|name| Tag {
                id: name.clone(),
                name,
            })
            .collect())
    }

    /// Pure constructor: a vault tag exists only through item references,
    /// so there is nothing to persist.
    fn create_tag(&self, name: &str) -> RepoResult<Tag> {
        Ok(Tag {
            id: name.to_string(),
            name: name.to_string(),
        })
    }

    /// Re-validates through `get_tag`: a name referenced by no item is
    /// `NotFound`; a still-referenced name is an Ok no-op. The reference
    /// count check itself lives with the caller.
    fn remove_tag(&self, name: &str) -> RepoResult<()> {
        self.get_tag(name)?;
        Ok(())
    }

    fn get_items_with_tag(&self, name: &str) -> RepoResult<Listing<AnyItem>> {
        let mut listing = Listing::default();
        self.scan_into(&mut listing, |listing, header, body, id| {
            if header.tag.as_deref() != Some(name) {
                return;
            }
            match header_type(&header) {
                Some(ItemType::Task) => listing
                    .items
                    .push(AnyItem::Task(task_from_parts(header, body, id))),
                Some(ItemType::Note) => listing
                    .items
                    .push(AnyItem::Note(note_from_parts(header, body, id))),
                None => {}
            }
        })?;
        Ok(listing)
    }

    /// Removes every item file; the metadata directory and non-item files
    /// survive.
    fn reset(&self) -> RepoResult<()> {
        for entry in fs::read_dir(&self.vault_dir).map_err(RepoError::Io)? {
            let entry = entry.map_err(RepoError::Io)?;
            if entry.file_type().map_err(RepoError::Io)?.is_dir() {
                continue;
            }
            if is_item_filename(&entry.file_name().to_string_lossy()) {
                fs::remove_file(entry.path()).map_err(RepoError::Io)?;
            }
        }
        Ok(())
    }
}

fn is_item_filename(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(ITEM_EXTENSION)
}

fn relative_id(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn io_to_repo(err: io::Error, what: &str) -> RepoError {
    if err.kind() == io::ErrorKind::NotFound {
        RepoError::NotFound(what.to_string())
    } else {
        RepoError::Io(err)
    }
}

fn header_type(header: &Frontmatter) -> Option<ItemType> {
    header.item_type.as_deref().and_then(ItemType::parse)
}

fn format_created_at(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses the stored timestamp, falling back to now for absent or
/// malformed values so a hand-edited file still loads.
fn parse_created_at(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

fn build_header(
    title: &str,
    item_type: ItemType,
    status: Option<Status>,
    tag: Option<&Tag>,
    created_at: DateTime<Utc>,
) -> Frontmatter {
    Frontmatter {
        title: title.to_string(),
        item_type: Some(item_type.as_str().to_string()),
        status: status.map(|s| s.as_str().to_string()),
        tag: tag.map(|t| t.name.clone()),
        created_at: Some(format_created_at(created_at)),
    }
}

fn item_from_parts(header: &Frontmatter, body: String, id: String) -> Item {
    let tag = header
        .tag
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(|name| Tag {
            id: name.to_string(),
            name: name.to_string(),
        });
    Item {
        id,
        title: header.title.clone(),
        body,
        created_at: Some(parse_created_at(header.created_at.as_deref())),
        tag,
    }
}

fn task_from_parts(header: Frontmatter, body: String, id: String) -> Task {
    let status = Status::parse(header.status.as_deref().unwrap_or_default());
    Task {
        item: item_from_parts(&header, body, id),
        status,
    }
}

fn note_from_parts(header: Frontmatter, body: String, id: String) -> Note {
    Note {
        item: item_from_parts(&header, body, id),
    }
}
