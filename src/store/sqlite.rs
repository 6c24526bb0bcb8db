use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{NotehubError, Result};
use crate::domain::{
    ActorId, CounterField, InteractionKind, Note, NotePage, NoteQuery, SortMode,
};
use crate::store::{CounterStore, InsertOutcome, MembershipStore, Store};

const NOTE_COLUMNS: &str = "n.id, n.user_id, n.title, n.description, n.subject, n.level, n.tags,
     n.pdf_path, n.thumb_path, n.size_bytes, n.mime_type, n.likes, n.downloads, n.bookmarks,
     n.created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;

        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| NotehubError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            NotehubError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    /// Fixed-width UTC timestamps so that text ordering matches time ordering.
    fn format_datetime(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
        Ok(Note {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            subject: row.get(4)?,
            level: row.get(5)?,
            tags: row.get(6)?,
            pdf_path: row.get(7)?,
            thumb_path: row.get(8)?,
            size_bytes: row.get::<_, i64>(9)?.max(0) as u64,
            mime_type: row.get(10)?,
            likes: row.get::<_, i64>(11)?.max(0) as u64,
            downloads: row.get::<_, i64>(12)?.max(0) as u64,
            bookmarks: row.get::<_, i64>(13)?.max(0) as u64,
            created_at: row
                .get::<_, String>(14)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }

    /// Escape LIKE wildcards; patterns use `ESCAPE '\\'`.
    fn escape_like(term: &str) -> String {
        let mut escaped = String::with_capacity(term.len());
        for c in term.chars() {
            if matches!(c, '%' | '_' | '\\') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped
    }

    fn is_unique_violation(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    }

    fn i64_from(value: u64) -> i64 {
        i64::try_from(value).unwrap_or(i64::MAX)
    }
}

impl Store for SqliteStore {
    fn add_note(&self, note: &Note) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO notes (id, user_id, title, description, subject, level, tags, pdf_path,
                                thumb_path, size_bytes, mime_type, likes, downloads, bookmarks, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                note.id,
                note.user_id,
                note.title,
                note.description,
                note.subject,
                note.level,
                note.tags,
                note.pdf_path,
                note.thumb_path,
                Self::i64_from(note.size_bytes),
                note.mime_type,
                Self::i64_from(note.likes),
                Self::i64_from(note.downloads),
                Self::i64_from(note.bookmarks),
                Self::format_datetime(&note.created_at)
            ],
        )?;

        Ok(())
    }

    fn get_note(&self, id: &str) -> Result<Option<Note>> {
        let conn = self.conn()?;

        let result = conn
            .query_row(
                &format!("SELECT {} FROM notes n WHERE n.id = ?1", NOTE_COLUMNS),
                params![id],
                Self::note_from_row,
            )
            .optional()?;

        Ok(result)
    }

    fn find_note(&self, id_or_prefix: &str) -> Result<Option<Note>> {
        let needle = id_or_prefix.trim();
        if needle.is_empty() {
            return Err(NotehubError::Validation("Missing note id.".into()));
        }

        if let Some(note) = self.get_note(needle)? {
            return Ok(Some(note));
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes n WHERE n.id LIKE ?1 ESCAPE '\\' LIMIT 2",
            NOTE_COLUMNS
        ))?;
        let pattern = format!("{}%", Self::escape_like(needle));
        let mut matches = stmt
            .query_map(params![pattern], Self::note_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            _ => Err(NotehubError::Validation(format!(
                "Ambiguous note id prefix: {}",
                needle
            ))),
        }
    }

    fn query_notes(&self, query: &NoteQuery) -> Result<NotePage> {
        let conn = self.conn()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut values: Vec<Value> = Vec::new();

        if !query.subject.is_empty() {
            values.push(Value::Text(query.subject.clone()));
            clauses.push("n.subject = ?");
        }
        if !query.level.is_empty() {
            values.push(Value::Text(query.level.clone()));
            clauses.push("n.level = ?");
        }
        if let Some(term) = query.search_term() {
            let pattern = format!("%{}%", Self::escape_like(term));
            for _ in 0..3 {
                values.push(Value::Text(pattern.clone()));
            }
            clauses.push(
                "(n.title LIKE ? ESCAPE '\\' OR n.description LIKE ? ESCAPE '\\' OR n.tags LIKE ? ESCAPE '\\')",
            );
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM notes n {}", where_sql),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let order_sql = match query.sort {
            SortMode::Popular => "n.likes DESC, n.downloads DESC, n.created_at DESC",
            SortMode::Title => "n.title COLLATE NOCASE ASC",
            // Trending is reordered client-side from a newest-first page
            SortMode::Newest | SortMode::Trending => "n.created_at DESC",
        };

        values.push(Value::Integer(query.limit as i64));
        values.push(Value::Integer(Self::i64_from(query.offset())));

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes n {} ORDER BY {} LIMIT ? OFFSET ?",
            NOTE_COLUMNS, where_sql, order_sql
        ))?;

        let notes = stmt
            .query_map(params_from_iter(values.iter()), Self::note_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(NotePage {
            notes,
            total: total.max(0) as u64,
        })
    }

    fn notes_by_user(&self, user_id: &str, limit: u32) -> Result<Vec<Note>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes n WHERE n.user_id = ?1 ORDER BY n.created_at DESC LIMIT ?2",
            NOTE_COLUMNS
        ))?;

        let notes = stmt
            .query_map(params![user_id, limit as i64], Self::note_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    fn notes_with_membership(
        &self,
        kind: InteractionKind,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<Note>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes n
             JOIN {} m ON m.note_id = n.id
             WHERE m.user_id = ?1
             ORDER BY n.created_at DESC
             LIMIT ?2",
            NOTE_COLUMNS,
            kind.table()
        ))?;

        let notes = stmt
            .query_map(params![user_id, limit as i64], Self::note_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(notes)
    }

    fn count_uploads(&self, user_id: &str) -> Result<u64> {
        let conn = self.conn()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notes WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        Ok(count.max(0) as u64)
    }

    fn count_memberships(&self, kind: InteractionKind, user_id: &str) -> Result<u64> {
        let conn = self.conn()?;

        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {} WHERE user_id = ?1", kind.table()),
            params![user_id],
            |row| row.get(0),
        )?;

        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl MembershipStore for SqliteStore {
    async fn exists(&self, kind: InteractionKind, note_id: &str, actor: &ActorId) -> Result<bool> {
        let conn = self.conn()?;

        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE note_id = ?1 AND user_id = ?2",
                kind.table()
            ),
            params![note_id, actor.as_str()],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    async fn insert(
        &self,
        kind: InteractionKind,
        note_id: &str,
        actor: &ActorId,
    ) -> Result<InsertOutcome> {
        let conn = self.conn()?;

        let inserted = conn.execute(
            &format!(
                "INSERT INTO {} (note_id, user_id, created_at) VALUES (?1, ?2, ?3)",
                kind.table()
            ),
            params![note_id, actor.as_str(), Self::format_datetime(&Utc::now())],
        );

        match inserted {
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(e) if Self::is_unique_violation(&e) => Ok(InsertOutcome::Conflict),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, kind: InteractionKind, note_id: &str, actor: &ActorId) -> Result<()> {
        let conn = self.conn()?;

        conn.execute(
            &format!(
                "DELETE FROM {} WHERE note_id = ?1 AND user_id = ?2",
                kind.table()
            ),
            params![note_id, actor.as_str()],
        )?;

        Ok(())
    }
}

#[async_trait]
impl CounterStore for SqliteStore {
    async fn set_count(&self, note_id: &str, field: CounterField, value: u64) -> Result<()> {
        let conn = self.conn()?;

        let updated = conn.execute(
            &format!("UPDATE notes SET {} = ?1 WHERE id = ?2", field.column()),
            params![Self::i64_from(value), note_id],
        )?;

        if updated == 0 {
            return Err(NotehubError::NoteNotFound(note_id.to_string()));
        }

        Ok(())
    }
}
