//! Trending order for an already-fetched page of notes.
//!
//! The catalogue query handles `newest`, `popular` and `title` in SQL.
//! `trending` is fetched newest-first and reordered here:
//!
//! ```text
//! score = (4*likes + 2*downloads + 3*bookmarks) / (1 + age_hours/24)
//! age_hours = max(1, hours since created_at)
//! ```

use chrono::{DateTime, Utc};

use crate::domain::Note;

pub const LIKE_WEIGHT: f64 = 4.0;
pub const DOWNLOAD_WEIGHT: f64 = 2.0;
pub const BOOKMARK_WEIGHT: f64 = 3.0;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Engagement counters and creation time of a rankable record.
pub trait Engagement {
    fn likes(&self) -> u64;
    fn downloads(&self) -> u64;
    fn bookmarks(&self) -> u64;
    fn created_at(&self) -> DateTime<Utc>;
}

impl Engagement for Note {
    fn likes(&self) -> u64 {
        self.likes
    }

    fn downloads(&self) -> u64 {
        self.downloads
    }

    fn bookmarks(&self) -> u64 {
        self.bookmarks
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Hours between `created_at` and `now`, never less than one.
pub fn age_hours(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let elapsed_ms = (now - created_at).num_milliseconds() as f64;
    (elapsed_ms / MS_PER_HOUR).max(1.0)
}

pub fn trending_score<T: Engagement>(item: &T, now: DateTime<Utc>) -> f64 {
    let base = LIKE_WEIGHT * item.likes() as f64
        + DOWNLOAD_WEIGHT * item.downloads() as f64
        + BOOKMARK_WEIGHT * item.bookmarks() as f64;
    let decay = 1.0 + age_hours(item.created_at(), now) / 24.0;
    base / decay
}

/// Sort by descending trending score relative to `now`.
///
/// Equal scores keep their input order.
pub fn sort_by_trending_at<T: Engagement>(items: Vec<T>, now: DateTime<Utc>) -> Vec<T> {
    let mut scored: Vec<(f64, T)> = items
        .into_iter()
        .map(|item| (trending_score(&item, now), item))
        .collect();

    // slice::sort_by is stable
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored.into_iter().map(|(_, item)| item).collect()
}

pub fn sort_by_trending<T: Engagement>(items: Vec<T>) -> Vec<T> {
    sort_by_trending_at(items, Utc::now())
}
