use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::error::{NotehubError, Result};
use crate::domain::{ActorId, Note, NotePage, NoteQuery, SortMode};
use crate::download::{self, DownloadReceipt};
use crate::profile::{self, Profile};
use crate::ranking;
use crate::storage::LocalObjectStore;
use crate::store::sqlite::SqliteStore;
use crate::store::{CounterStore, MembershipStore, Store};
use crate::toggle::OptimisticToggle;
use crate::upload::{self, UploadRequest};

/// Wires the catalogue, the bucket and the signed-in actor together.
pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub objects: Arc<LocalObjectStore>,
    pub actor: Option<ActorId>,
}

impl AppContext {
    pub fn new(
        db_path: Option<PathBuf>,
        bucket_dir: Option<PathBuf>,
        actor: Option<ActorId>,
    ) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::data_dir()?.join("notehub.db"),
        };
        let bucket_dir = match bucket_dir {
            Some(p) => p,
            None => Self::data_dir()?.join("bucket"),
        };

        tracing::debug!(db = %db_path.display(), bucket = %bucket_dir.display(), "Opening notehub");
        Ok(Self {
            store: Arc::new(SqliteStore::new(&db_path)?),
            objects: Arc::new(LocalObjectStore::new(bucket_dir)?),
            actor,
        })
    }

    /// In-memory catalogue over a bucket at `bucket_dir`.
    pub fn in_memory(bucket_dir: &Path, actor: Option<ActorId>) -> Result<Self> {
        Ok(Self {
            store: Arc::new(SqliteStore::in_memory()?),
            objects: Arc::new(LocalObjectStore::new(bucket_dir)?),
            actor,
        })
    }

    fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| NotehubError::Config("Could not find data directory".into()))?;
        let notehub_dir = data_dir.join("notehub");
        std::fs::create_dir_all(&notehub_dir)?;
        Ok(notehub_dir)
    }

    pub fn like_toggle(&self) -> OptimisticToggle {
        OptimisticToggle::like(self.memberships(), self.counters())
    }

    pub fn bookmark_toggle(&self) -> OptimisticToggle {
        OptimisticToggle::bookmark(self.memberships(), self.counters())
    }

    fn memberships(&self) -> Arc<dyn MembershipStore + Send + Sync> {
        self.store.clone()
    }

    fn counters(&self) -> Arc<dyn CounterStore + Send + Sync> {
        self.store.clone()
    }

    /// One page of the catalogue. Trending pages are fetched newest first
    /// and then reordered by score.
    pub fn browse(&self, query: &NoteQuery) -> Result<NotePage> {
        let mut page = self.store.query_notes(query)?;
        if query.sort == SortMode::Trending {
            page.notes = ranking::sort_by_trending(page.notes);
        }
        Ok(page)
    }

    pub fn note(&self, id_or_prefix: &str) -> Result<Note> {
        self.store
            .find_note(id_or_prefix)?
            .ok_or_else(|| NotehubError::NoteNotFound(id_or_prefix.to_string()))
    }

    pub async fn upload(&self, request: &UploadRequest) -> Result<Note> {
        upload::upload_note(
            self.store.as_ref(),
            self.objects.as_ref(),
            self.actor.as_ref(),
            request,
        )
        .await
    }

    pub async fn download(&self, note: &Note, dest: Option<&Path>) -> Result<DownloadReceipt> {
        download::download_note(self.store.as_ref(), self.objects.as_ref(), note, dest).await
    }

    pub async fn preview_path(&self, note: &Note) -> Result<PathBuf> {
        download::preview_path(self.objects.as_ref(), note).await
    }

    pub fn profile(&self, limit: u32) -> Result<Profile> {
        let actor = self.actor.as_ref().ok_or_else(|| {
            NotehubError::NotAuthenticated("Please sign in to view your profile.".into())
        })?;
        Ok(profile::load_profile(self.store.as_ref(), actor, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InteractionKind;
    use crate::toggle::ToggleOutcome;
    use chrono::{Duration, Utc};

    fn context(dir: &Path, user: Option<&str>) -> AppContext {
        AppContext::in_memory(&dir.join("bucket"), user.and_then(ActorId::new)).unwrap()
    }

    #[test]
    fn test_browse_trending_reorders_page() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), None);

        let mut fresh = Note::new("alice", "pdfs/alice/fresh.pdf", "Fresh");
        fresh.created_at = Utc::now() - Duration::hours(1);
        let mut popular = Note::new("bob", "pdfs/bob/popular.pdf", "Popular");
        popular.created_at = Utc::now() - Duration::hours(2);
        popular.likes = 50;
        ctx.store.add_note(&fresh).unwrap();
        ctx.store.add_note(&popular).unwrap();

        let newest = ctx.browse(&NoteQuery::default()).unwrap();
        assert_eq!(newest.notes[0].id, fresh.id);

        let query = NoteQuery {
            sort: SortMode::Trending,
            ..Default::default()
        };
        let trending = ctx.browse(&query).unwrap();
        assert_eq!(trending.total, 2);
        assert_eq!(trending.notes[0].id, popular.id);
    }

    #[test]
    fn test_note_lookup_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), None);
        let note = Note::new("alice", "pdfs/alice/a.pdf", "A");
        ctx.store.add_note(&note).unwrap();

        assert_eq!(ctx.note(note.short_id()).unwrap().id, note.id);
        assert!(matches!(
            ctx.note("zzzz"),
            Err(NotehubError::NoteNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_toggles_share_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), Some("alice"));
        let note = Note::new("bob", "pdfs/bob/a.pdf", "A");
        ctx.store.add_note(&note).unwrap();

        let like = ctx.like_toggle();
        assert_eq!(like.kind(), InteractionKind::Like);
        like.bind(&note.id, ctx.actor.clone(), note.likes);
        assert!(matches!(
            like.toggle().await.unwrap(),
            ToggleOutcome::Committed(_)
        ));

        assert_eq!(ctx.store.get_note(&note.id).unwrap().unwrap().likes, 1);
        assert_eq!(
            ctx.store
                .count_memberships(InteractionKind::Like, "alice")
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_profile_requires_actor() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), None);
        assert!(matches!(
            ctx.profile(12),
            Err(NotehubError::NotAuthenticated(_))
        ));
    }
}
