use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub level: String,
    pub tags: String,
    pub pdf_path: String,
    pub thumb_path: Option<String>,
    pub size_bytes: u64,
    pub mime_type: String,
    pub likes: u64,
    pub downloads: u64,
    pub bookmarks: u64,
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn new(user_id: &str, pdf_path: &str, title: &str) -> Self {
        let id = Self::generate_id(user_id, pdf_path);
        Self {
            id,
            user_id: user_id.to_string(),
            title: title.to_string(),
            description: String::new(),
            subject: String::new(),
            level: String::new(),
            tags: String::new(),
            pdf_path: pdf_path.to_string(),
            thumb_path: None,
            size_bytes: 0,
            mime_type: PDF_MIME_TYPE.to_string(),
            likes: 0,
            downloads: 0,
            bookmarks: 0,
            created_at: Utc::now(),
        }
    }

    /// Generate a deterministic ID from the uploader and the stored object key
    pub fn generate_id(user_id: &str, pdf_path: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(user_id.as_bytes());
        hasher.update(pdf_path.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }

    /// First 8 characters of the id, enough to address a note from the CLI
    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(8)]
    }

    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn readable_size(&self) -> String {
        format_size(self.size_bytes)
    }

    /// File name offered when the note is downloaded
    pub fn download_name(&self) -> String {
        let stem: String = self
            .title
            .trim()
            .chars()
            .map(|c| if matches!(c, '/' | '\\' | ':' | '\0') { '-' } else { c })
            .collect();
        if stem.is_empty() {
            "note.pdf".to_string()
        } else {
            format!("{}.pdf", stem)
        }
    }
}

pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "—".to_string();
    }

    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let decimals = if value >= 100.0 {
        0
    } else if value >= 10.0 {
        1
    } else {
        2
    };
    format!("{:.*} {}", decimals, value, UNITS[unit])
}

/// Normalise free-form tag input into a comma-joined list.
pub fn normalize_tags(raw: &str) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
