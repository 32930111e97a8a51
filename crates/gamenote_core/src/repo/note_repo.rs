//! Note store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/update/delete/get/list/list-recent over `notes`.
//! - Own tag-link replacement (`note_tags`) with atomic semantics.
//!
//! # Invariants
//! - All statements filter on `user_id`; a note is invisible to other users.
//! - `list` is ordered by `created_at DESC`; `list_recent` by `updated_at DESC`.
//! - Search filtering happens after retrieval, over title, content and tags.
//! - Tags are stored already normalized; callers normalize before writing.

use crate::model::note::{Note, NoteCategory, NoteId, NotePatch, NoteType};
use crate::repo::{now_epoch_ms, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use uuid::Uuid;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    title,
    content,
    category,
    note_type,
    created_at,
    updated_at
FROM notes";

/// List filters. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub category: Option<NoteCategory>,
    pub note_type: Option<NoteType>,
    /// Case-insensitive substring matched against title, content and tags.
    pub search: Option<String>,
}

/// Persistence interface for notes, scoped by owning user.
pub trait NoteRepository {
    /// Inserts `note` and returns its id. `note.user_id` is overwritten by
    /// `user_id`; timestamps are assigned by the store.
    fn create(&self, user_id: &str, note: &Note) -> RepoResult<NoteId>;
    /// Applies the present fields of `patch` and bumps `updated_at`.
    fn update(&self, user_id: &str, id: NoteId, patch: &NotePatch) -> RepoResult<()>;
    fn delete(&self, user_id: &str, id: NoteId) -> RepoResult<()>;
    fn get(&self, user_id: &str, id: NoteId) -> RepoResult<Option<Note>>;
    fn list(&self, user_id: &str, filter: &NoteFilter) -> RepoResult<Vec<Note>>;
    fn list_recent(&self, user_id: &str, limit: u32) -> RepoResult<Vec<Note>>;
}

/// SQLite-backed note store.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Wraps a migrated connection (see [`crate::db::open_db`]).
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create(&self, user_id: &str, note: &Note) -> RepoResult<NoteId> {
        let now = now_epoch_ms();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO notes (
                id,
                user_id,
                title,
                content,
                category,
                note_type,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7);",
            params![
                note.id.to_string(),
                user_id,
                note.title.as_str(),
                note.content.as_str(),
                note.category.as_str(),
                note.note_type.as_str(),
                now,
            ],
        )?;
        replace_tags(&tx, &note.id.to_string(), &note.tags)?;
        tx.commit()?;
        Ok(note.id)
    }

    fn update(&self, user_id: &str, id: NoteId, patch: &NotePatch) -> RepoResult<()> {
        let id_text = id.to_string();
        let tx = self.conn.unchecked_transaction()?;

        let mut sql = String::from("UPDATE notes SET updated_at = ?");
        let mut bind_values: Vec<Value> = vec![Value::Integer(now_epoch_ms())];
        if let Some(title) = patch.title.as_ref() {
            sql.push_str(", title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(content) = patch.content.as_ref() {
            sql.push_str(", content = ?");
            bind_values.push(Value::Text(content.clone()));
        }
        if let Some(category) = patch.category {
            sql.push_str(", category = ?");
            bind_values.push(Value::Text(category.as_str().to_string()));
        }
        if let Some(note_type) = patch.note_type {
            sql.push_str(", note_type = ?");
            bind_values.push(Value::Text(note_type.as_str().to_string()));
        }
        sql.push_str(" WHERE id = ? AND user_id = ?;");
        bind_values.push(Value::Text(id_text.clone()));
        bind_values.push(Value::Text(user_id.to_string()));

        let changed = tx.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        if let Some(tags) = patch.tags.as_ref() {
            replace_tags(&tx, &id_text, tags)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, user_id: &str, id: NoteId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM notes WHERE id = ?1 AND user_id = ?2;",
            params![id.to_string(), user_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn get(&self, user_id: &str, id: NoteId) -> RepoResult<Option<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1 AND user_id = ?2;"))?;
        let mut rows = stmt.query(params![id.to_string(), user_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(self.parse_note_row(row)?));
        }
        Ok(None)
    }

    fn list(&self, user_id: &str, filter: &NoteFilter) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE user_id = ?");
        let mut bind_values: Vec<Value> = vec![Value::Text(user_id.to_string())];

        if let Some(category) = filter.category {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.as_str().to_string()));
        }
        if let Some(note_type) = filter.note_type {
            sql.push_str(" AND note_type = ?");
            bind_values.push(Value::Text(note_type.as_str().to_string()));
        }
        sql.push_str(" ORDER BY created_at DESC, rowid DESC;");

        let notes = self.query_notes(&sql, bind_values)?;
        let term = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty());
        Ok(match term {
            Some(term) => notes
                .into_iter()
                .filter(|note| note_matches_search(note, term))
                .collect(),
            None => notes,
        })
    }

    fn list_recent(&self, user_id: &str, limit: u32) -> RepoResult<Vec<Note>> {
        let sql = format!(
            "{NOTE_SELECT_SQL} WHERE user_id = ? ORDER BY updated_at DESC, rowid DESC LIMIT ?;"
        );
        self.query_notes(
            &sql,
            vec![
                Value::Text(user_id.to_string()),
                Value::Integer(i64::from(limit)),
            ],
        )
    }
}

impl SqliteNoteRepository<'_> {
    fn query_notes(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(self.parse_note_row(row)?);
        }
        Ok(notes)
    }

    fn parse_note_row(&self, row: &Row<'_>) -> RepoResult<Note> {
        let id_text: String = row.get("id")?;
        let id = Uuid::parse_str(&id_text)
            .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{id_text}` in notes.id")))?;
        let category_text: String = row.get("category")?;
        let category = NoteCategory::parse(&category_text).ok_or_else(|| {
            RepoError::InvalidData(format!("unknown category `{category_text}`"))
        })?;
        let type_text: String = row.get("note_type")?;
        let note_type = NoteType::parse(&type_text)
            .ok_or_else(|| RepoError::InvalidData(format!("unknown note type `{type_text}`")))?;

        Ok(Note {
            id,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            content: row.get("content")?,
            category,
            note_type,
            tags: load_tags(self.conn, &id_text)?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Case-insensitive substring match over title, content and tags.
pub fn note_matches_search(note: &Note, term: &str) -> bool {
    let needle = term.to_lowercase();
    note.title.to_lowercase().contains(&needle)
        || note.content.to_lowercase().contains(&needle)
        || note.tags.iter().any(|tag| tag.contains(&needle))
}

fn replace_tags(conn: &Connection, note_id: &str, tags: &[String]) -> RepoResult<()> {
    conn.execute("DELETE FROM note_tags WHERE note_id = ?1;", [note_id])?;
    for tag in tags {
        conn.execute(
            "INSERT OR IGNORE INTO note_tags (note_id, tag) VALUES (?1, ?2);",
            params![note_id, tag.as_str()],
        )?;
    }
    Ok(())
}

fn load_tags(conn: &Connection, note_id: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT tag FROM note_tags WHERE note_id = ?1 ORDER BY tag ASC;")?;
    let mut rows = stmt.query([note_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}
