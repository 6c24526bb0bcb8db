use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::app::{NotehubError, Result};
use crate::domain::{CounterField, Note};
use crate::storage::ObjectStore;
use crate::store::CounterStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReceipt {
    pub path: PathBuf,
    pub downloads: u64,
}

/// Resolve where a download lands: directories get the note's file name.
pub fn download_target(note: &Note, dest: Option<&Path>) -> PathBuf {
    match dest {
        Some(path) if path.is_dir() => path.join(note.download_name()),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(note.download_name()),
    }
}

/// Copy a note's PDF out of the bucket, counting the download.
///
/// The counter is bumped before the object is read and restored if the read
/// or the local write fails. An existing file at the target is never
/// replaced.
pub async fn download_note(
    counters: &(dyn CounterStore + Send + Sync),
    objects: &(dyn ObjectStore + Send + Sync),
    note: &Note,
    dest: Option<&Path>,
) -> Result<DownloadReceipt> {
    let previous = note.downloads;
    let next = previous.saturating_add(1);
    counters
        .set_count(&note.id, CounterField::Downloads, next)
        .await?;

    let target = download_target(note, dest);
    let copied = async {
        let bytes = objects.get(&note.pdf_path).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => NotehubError::Storage(format!(
                    "File already exists: {}",
                    target.display()
                )),
                _ => NotehubError::Io(e),
            })?;
        file.write_all(&bytes).await?;
        file.flush().await?;
        Ok::<_, NotehubError>(())
    }
    .await;

    if let Err(e) = copied {
        tracing::warn!(note_id = %note.id, error = %e, "Download failed, restoring counter");
        if let Err(restore) = counters
            .set_count(&note.id, CounterField::Downloads, previous)
            .await
        {
            tracing::error!(note_id = %note.id, error = %restore, "Failed to restore download counter");
        }
        return Err(e);
    }

    tracing::info!(note_id = %note.id, path = %target.display(), "Downloaded note");
    Ok(DownloadReceipt {
        path: target,
        downloads: next,
    })
}

/// Local path of a note's PDF, for handing to a viewer.
pub async fn preview_path(objects: &(dyn ObjectStore + Send + Sync), note: &Note) -> Result<PathBuf> {
    if !objects.exists(&note.pdf_path).await? {
        return Err(NotehubError::Storage(format!(
            "Object not found: {}",
            note.pdf_path
        )));
    }
    objects.local_path(&note.pdf_path).ok_or_else(|| {
        NotehubError::Storage("Preview needs a locally stored object".into())
    })
}
