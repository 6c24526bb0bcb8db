use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::Note;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Newest,
    Popular,
    Trending,
    Title,
}

impl SortMode {
    pub fn next(self) -> Self {
        match self {
            SortMode::Newest => SortMode::Popular,
            SortMode::Popular => SortMode::Trending,
            SortMode::Trending => SortMode::Title,
            SortMode::Title => SortMode::Newest,
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortMode::Newest => "newest",
            SortMode::Popular => "popular",
            SortMode::Trending => "trending",
            SortMode::Title => "title",
        };
        f.write_str(name)
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(SortMode::Newest),
            "popular" => Ok(SortMode::Popular),
            "trending" => Ok(SortMode::Trending),
            "title" => Ok(SortMode::Title),
            other => Err(format!(
                "Unknown sort mode: {}. Use newest, popular, trending or title",
                other
            )),
        }
    }
}

/// Search, filter and pagination options for the note catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteQuery {
    pub search: String,
    pub subject: String,
    pub level: String,
    pub sort: SortMode,
    pub limit: u32,
    /// 1-based
    pub page: u32,
}

impl Default for NoteQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            subject: String::new(),
            level: String::new(),
            sort: SortMode::default(),
            limit: DEFAULT_PAGE_SIZE,
            page: 1,
        }
    }
}

impl NoteQuery {
    pub fn offset(&self) -> u64 {
        (self.page.max(1) as u64 - 1) * self.limit as u64
    }

    pub fn search_term(&self) -> Option<&str> {
        let term = self.search.trim();
        (!term.is_empty()).then_some(term)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NotePage {
    pub notes: Vec<Note>,
    /// Exact number of notes matching the filters, across all pages
    pub total: u64,
}

impl NotePage {
    pub fn page_count(&self, limit: u32) -> u64 {
        if limit == 0 {
            return 0;
        }
        self.total.div_ceil(limit as u64)
    }
}
