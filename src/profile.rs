use serde::Serialize;

use crate::app::Result;
use crate::domain::{ActorId, InteractionKind, Note};
use crate::store::Store;

pub const DEFAULT_COLLECTION_SIZE: u32 = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProfileStats {
    pub uploads: u64,
    pub bookmarks: u64,
    pub likes: u64,
}

/// A signed-in actor's stats and note collections.
///
/// Each collection carries its own result so one failing query does not hide
/// the others.
#[derive(Debug)]
pub struct Profile {
    pub actor: ActorId,
    pub stats: Result<ProfileStats>,
    pub uploads: Result<Vec<Note>>,
    pub bookmarks: Result<Vec<Note>>,
    pub likes: Result<Vec<Note>>,
}

fn load_stats<S: Store>(store: &S, actor: &ActorId) -> Result<ProfileStats> {
    let uid = actor.as_str();
    Ok(ProfileStats {
        uploads: store.count_uploads(uid)?,
        bookmarks: store.count_memberships(InteractionKind::Bookmark, uid)?,
        likes: store.count_memberships(InteractionKind::Like, uid)?,
    })
}

/// Load stats, then uploads, bookmarks and likes, one query after another on
/// the store's connection. A failed query is recorded and the rest still run.
pub fn load_profile<S: Store>(store: &S, actor: &ActorId, limit: u32) -> Profile {
    let uid = actor.as_str();
    let stats = load_stats(store, actor);
    let uploads = store.notes_by_user(uid, limit);
    let bookmarks = store.notes_with_membership(InteractionKind::Bookmark, uid, limit);
    let likes = store.notes_with_membership(InteractionKind::Like, uid, limit);

    for (name, failed) in [
        ("stats", stats.as_ref().err().map(|e| e.to_string())),
        ("uploads", uploads.as_ref().err().map(|e| e.to_string())),
        ("bookmarks", bookmarks.as_ref().err().map(|e| e.to_string())),
        ("likes", likes.as_ref().err().map(|e| e.to_string())),
    ] {
        if let Some(error) = failed {
            tracing::warn!(user = %actor, collection = name, error = %error, "Failed to load profile data");
        }
    }

    Profile {
        actor: actor.clone(),
        stats,
        uploads,
        bookmarks,
        likes,
    }
}
