use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::app::{NotehubError, Result};
use crate::domain::note::{normalize_tags, PDF_MIME_TYPE};
use crate::domain::{ActorId, Note};
use crate::storage::{object_key, ObjectStore};
use crate::store::Store;

const PDF_MAGIC: &[u8] = b"%PDF";

#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub title: String,
    pub description: String,
    pub subject: String,
    pub tags: String,
    pub level: String,
    pub pdf: PathBuf,
    pub thumb: Option<PathBuf>,
}

impl UploadRequest {
    fn validate(&self) -> Result<()> {
        if self.pdf.as_os_str().is_empty() {
            return Err(NotehubError::Validation(
                "Please select a PDF file to upload.".into(),
            ));
        }
        if self.title.trim().is_empty() {
            return Err(NotehubError::Validation(
                "Please provide a title for your note.".into(),
            ));
        }
        Ok(())
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn image_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

/// Store the PDF (and optional thumbnail) and insert the note row.
pub async fn upload_note<S: Store>(
    store: &S,
    objects: &(dyn ObjectStore + Send + Sync),
    actor: Option<&ActorId>,
    request: &UploadRequest,
) -> Result<Note> {
    let actor = actor.ok_or_else(|| {
        NotehubError::NotAuthenticated("You must be signed in to upload notes.".into())
    })?;
    request.validate()?;

    let pdf_bytes = tokio::fs::read(&request.pdf).await?;
    if !has_extension(&request.pdf, "pdf") && !pdf_bytes.starts_with(PDF_MAGIC) {
        return Err(NotehubError::Validation(
            "Only PDF files are supported.".into(),
        ));
    }
    let size_bytes = pdf_bytes.len() as u64;

    let pdf_key = object_key(
        "pdfs",
        actor.as_str(),
        &file_name(&request.pdf),
        Utc::now().timestamp_millis(),
    );
    let pdf_path = objects.put(&pdf_key, pdf_bytes, PDF_MIME_TYPE).await?;
    tracing::info!(key = %pdf_path, size = size_bytes, "Uploaded PDF");

    let thumb_path = match &request.thumb {
        Some(thumb) => {
            let bytes = tokio::fs::read(thumb).await?;
            let key = object_key(
                "thumbs",
                actor.as_str(),
                &file_name(thumb),
                Utc::now().timestamp_millis(),
            );
            Some(objects.put(&key, bytes, image_content_type(thumb)).await?)
        }
        None => None,
    };

    let mut note = Note::new(actor.as_str(), &pdf_path, request.title.trim());
    note.description = request.description.trim().to_string();
    note.subject = request.subject.trim().to_string();
    note.level = request.level.trim().to_string();
    note.tags = normalize_tags(&request.tags);
    note.thumb_path = thumb_path;
    note.size_bytes = size_bytes;
    note.mime_type = PDF_MIME_TYPE.to_string();

    store.add_note(&note)?;
    tracing::info!(note_id = %note.id, title = %note.title, "Created note");

    Ok(note)
}
