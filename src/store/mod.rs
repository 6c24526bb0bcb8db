pub mod sqlite;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{ActorId, CounterField, InteractionKind, Note, NotePage, NoteQuery};

pub use sqlite::SqliteStore;

/// Note catalogue backed by the relational tables.
pub trait Store {
    // Note operations
    fn add_note(&self, note: &Note) -> Result<()>;
    fn get_note(&self, id: &str) -> Result<Option<Note>>;
    /// Look a note up by full id or by an unambiguous id prefix.
    fn find_note(&self, id_or_prefix: &str) -> Result<Option<Note>>;
    fn query_notes(&self, query: &NoteQuery) -> Result<NotePage>;

    // Per-user collections
    fn notes_by_user(&self, user_id: &str, limit: u32) -> Result<Vec<Note>>;
    fn notes_with_membership(
        &self,
        kind: InteractionKind,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<Note>>;
    fn count_uploads(&self, user_id: &str) -> Result<u64>;
    fn count_memberships(&self, kind: InteractionKind, user_id: &str) -> Result<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The membership record already existed
    Conflict,
}

/// Per-user membership records (likes, bookmarks).
#[async_trait]
pub trait MembershipStore {
    async fn exists(&self, kind: InteractionKind, note_id: &str, actor: &ActorId) -> Result<bool>;
    async fn insert(
        &self,
        kind: InteractionKind,
        note_id: &str,
        actor: &ActorId,
    ) -> Result<InsertOutcome>;
    async fn delete(&self, kind: InteractionKind, note_id: &str, actor: &ActorId) -> Result<()>;
}

/// Aggregate counters stored on the note row.
#[async_trait]
pub trait CounterStore {
    async fn set_count(&self, note_id: &str, field: CounterField, value: u64) -> Result<()>;
}
