//! Relational backend over a single-file SQLite database.
//!
//! # Responsibility
//! - Persist tasks and notes in their own tables, tags as independent rows.
//! - Keep SQL details inside this module; callers see only the facade.
//!
//! # Invariants
//! - Status integers follow the explicit mapping in `status_to_db`, never
//!   the enum's declaration order.
//! - `created_at` is written once by the column default and never updated.
//! - Write paths validate the record before any SQL mutation.

use crate::db::{open_db, open_db_in_memory};
use crate::model::item::{AnyItem, Item, Note, Status, Tag, Task};
use crate::repo::{Listing, RepoError, RepoResult, Repository};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::fs;
use std::path::{Path, PathBuf};

/// Format of the `created_at` column, matching SQLite's
/// `CURRENT_TIMESTAMP` output (UTC).
const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TASK_SELECT_SQL: &str = "SELECT t.id, t.title, t.body, t.status_id, t.created_at,
        tag.id, tag.name
 FROM task t
 LEFT JOIN tag ON t.tag_id = tag.id";

const NOTE_SELECT_SQL: &str = "SELECT n.id, n.title, n.body, n.created_at, tag.id, tag.name
 FROM note n
 LEFT JOIN tag ON n.tag_id = tag.id";

/// SQLite-backed repository. Single-writer, synchronous.
pub struct SqliteRepository {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl SqliteRepository {
    /// Opens (creating and migrating if needed) the database file.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        let path = path.as_ref();
        let conn = open_db(path)?;
        Ok(Self {
            conn,
            db_path: Some(path.to_path_buf()),
        })
    }

    /// Opens an in-memory store for tests and throwaway demos.
    pub fn open_in_memory() -> RepoResult<Self> {
        let conn = open_db_in_memory()?;
        Ok(Self {
            conn,
            db_path: None,
        })
    }
}

impl Repository for SqliteRepository {
    fn get_tasks(&self) -> RepoResult<Listing<Task>> {
        let mut stmt = self.conn.prepare(TASK_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut listing = Listing::default();
        while let Some(row) = rows.next()? {
            match parse_task_row(row) {
                Ok(task) => listing.items.push(task),
                Err(reason) => listing.skip(row_source("task", row), reason),
            }
        }
        Ok(listing)
    }

    fn create_task(&self, task: &mut Task) -> RepoResult<()> {
        task.item.validate()?;
        self.conn.execute(
            "INSERT INTO task (title, body, status_id) VALUES (?1, ?2, ?3);",
            params![
                task.item.title,
                task.item.body,
                status_to_db(task.status)
            ],
        )?;
        task.item.id = self.conn.last_insert_rowid().to_string();
        Ok(())
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.item.validate()?;
        let changed = self.conn.execute(
            "UPDATE task SET title = ?1, body = ?2, status_id = ?3 WHERE id = ?4;",
            params![
                task.item.title,
                task.item.body,
                status_to_db(task.status),
                task.item.id
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(task.item.id.clone()));
        }
        Ok(())
    }

    fn remove_task(&self, id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM task WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn update_task_status(&self, task: &Task, status: Status) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE task SET status_id = ?1 WHERE id = ?2;",
            params![status_to_db(status), task.item.id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(task.item.id.clone()));
        }
        Ok(())
    }

    fn set_task_tag(&self, task: &Task, tag: &Tag) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE task SET tag_id = ?1 WHERE id = ?2;",
            params![tag.id, task.item.id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(task.item.id.clone()));
        }
        Ok(())
    }

    fn unset_task_tag(&self, task: &Task) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE task SET tag_id = NULL WHERE id = ?1;",
            [task.item.id.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(task.item.id.clone()));
        }
        Ok(())
    }

    fn get_notes(&self) -> RepoResult<Listing<Note>> {
        let mut stmt = self.conn.prepare(NOTE_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut listing = Listing::default();
        while let Some(row) = rows.next()? {
            match parse_note_row(row) {
                Ok(note) => listing.items.push(note),
                Err(reason) => listing.skip(row_source("note", row), reason),
            }
        }
        Ok(listing)
    }

    fn create_note(&self, note: &mut Note) -> RepoResult<()> {
        note.item.validate()?;
        self.conn.execute(
            "INSERT INTO note (title, body) VALUES (?1, ?2);",
            params![note.item.title, note.item.body],
        )?;
        note.item.id = self.conn.last_insert_rowid().to_string();
        Ok(())
    }

    fn update_note(&self, note: &Note) -> RepoResult<()> {
        note.item.validate()?;
        let changed = self.conn.execute(
            "UPDATE note SET title = ?1, body = ?2 WHERE id = ?3;",
            params![note.item.title, note.item.body, note.item.id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(note.item.id.clone()));
        }
        Ok(())
    }

    fn remove_note(&self, id: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM note WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn set_note_tag(&self, note: &Note, tag: &Tag) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE note SET tag_id = ?1 WHERE id = ?2;",
            params![tag.id, note.item.id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(note.item.id.clone()));
        }
        Ok(())
    }

    fn unset_note_tag(&self, note: &Note) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE note SET tag_id = NULL WHERE id = ?1;",
            [note.item.id.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(note.item.id.clone()));
        }
        Ok(())
    }

    fn get_tag(&self, name: &str) -> RepoResult<Tag> {
        let result = self.conn.query_row(
            "SELECT id, name FROM tag WHERE name = ?1;",
            [name],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        );
        match result {
            Ok((id, name)) => Ok(Tag {
                id: id.to_string(),
                name,
            }),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(RepoError::NotFound(name.to_string())),
            Err(err) => Err(err.into()),
        }
    }

    fn get_tags(&self) -> RepoResult<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tag ORDER BY name;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            tags.push(Tag {
                id: id.to_string(),
                name: row.get(1)?,
            });
        }
        Ok(tags)
    }

    fn create_tag(&self, name: &str) -> RepoResult<Tag> {
        // Duplicate names hit the UNIQUE constraint and surface as a plain
        // database error, not a dedicated variant.
        self.conn
            .execute("INSERT INTO tag (name) VALUES (?1);", [name])?;
        Ok(Tag {
            id: self.conn.last_insert_rowid().to_string(),
            name: name.to_string(),
        })
    }

    fn remove_tag(&self, name: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tag WHERE name = ?1;", [name])?;
        if changed == 0 {
            return Err(RepoError::NotFound(name.to_string()));
        }
        Ok(())
    }

    fn get_items_with_tag(&self, name: &str) -> RepoResult<Listing<AnyItem>> {
        let mut listing = Listing::default();

        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE tag.name = ?1"))?;
        let mut rows = stmt.query([name])?;
        while let Some(row) = rows.next()? {
            match parse_task_row(row) {
                Ok(task) => listing.items.push(AnyItem::Task(task)),
                Err(reason) => listing.skip(row_source("task", row), reason),
            }
        }

        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE tag.name = ?1"))?;
        let mut rows = stmt.query([name])?;
        while let Some(row) = rows.next()? {
            match parse_note_row(row) {
                Ok(note) => listing.items.push(AnyItem::Note(note)),
                Err(reason) => listing.skip(row_source("note", row), reason),
            }
        }

        Ok(listing)
    }

    fn reset(&self) -> RepoResult<()> {
        match &self.db_path {
            Some(path) => fs::remove_file(path).map_err(RepoError::Io),
            // In-memory stores have no file to remove; dropping all rows is
            // the equivalent wipe.
            None => {
                self.conn
                    .execute_batch("DELETE FROM task; DELETE FROM note; DELETE FROM tag;")?;
                Ok(())
            }
        }
    }
}

fn status_to_db(status: Status) -> i64 {
    match status {
        Status::Todo => 0,
        Status::InProgress => 1,
        Status::Done => 2,
        Status::Cancelled => 3,
    }
}

fn status_from_db(value: i64) -> Option<Status> {
    match value {
        0 => Some(Status::Todo),
        1 => Some(Status::InProgress),
        2 => Some(Status::Done),
        3 => Some(Status::Cancelled),
        _ => None,
    }
}

/// Best-effort identifier for a row that failed to parse.
fn row_source(table: &str, row: &Row<'_>) -> String {
    match row.get::<_, i64>(0) {
        Ok(id) => format!("{table}/{id}"),
        Err(_) => format!("{table}/?"),
    }
}

fn parse_item_columns(
    row: &Row<'_>,
    created_at_index: usize,
) -> Result<Item, String> {
    let id: i64 = row.get(0).map_err(|err| err.to_string())?;
    let title: String = row.get(1).map_err(|err| err.to_string())?;
    let body: Option<String> = row.get(2).map_err(|err| err.to_string())?;

    let created_at_text: String = row.get(created_at_index).map_err(|err| err.to_string())?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_text, CREATED_AT_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|err| format!("invalid created_at `{created_at_text}`: {err}"))?;

    let tag_id: Option<i64> = row.get(created_at_index + 1).map_err(|err| err.to_string())?;
    let tag_name: Option<String> = row.get(created_at_index + 2).map_err(|err| err.to_string())?;
    let tag = match (tag_id, tag_name) {
        (Some(id), Some(name)) => Some(Tag {
            id: id.to_string(),
            name,
        }),
        _ => None,
    };

    Ok(Item {
        id: id.to_string(),
        title,
        body: body.unwrap_or_default(),
        created_at: Some(created_at),
        tag,
    })
}

fn parse_task_row(row: &Row<'_>) -> Result<Task, String> {
    let status_id: i64 = row.get(3).map_err(|err| err.to_string())?;
    let status = status_from_db(status_id)
        .ok_or_else(|| format!("invalid status value `{status_id}`"))?;
    let item = parse_item_columns(row, 4)?;
    Ok(Task { item, status })
}

fn parse_note_row(row: &Row<'_>) -> Result<Note, String> {
    let item = parse_item_columns(row, 3)?;
    Ok(Note { item })
}
