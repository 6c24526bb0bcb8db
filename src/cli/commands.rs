use std::path::Path;

use crate::app::{AppContext, Result};
use crate::domain::{InteractionKind, Note, NoteQuery};
use crate::profile::Profile;
use crate::toggle::ToggleOutcome;
use crate::upload::UploadRequest;

fn print_note_line(note: &Note) {
    println!(
        "{}  {}  ♥{} ★{} ↓{}  {}",
        note.short_id(),
        note.created_at.format("%Y-%m-%d"),
        note.likes,
        note.bookmarks,
        note.downloads,
        note.display_title()
    );
}

pub fn browse(ctx: &AppContext, query: &NoteQuery, json: bool) -> Result<()> {
    let page = ctx.browse(query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.notes.is_empty() {
        println!("No notes found");
        return Ok(());
    }

    for note in &page.notes {
        print_note_line(note);
    }
    println!(
        "\nPage {} of {} ({} notes, sorted by {})",
        query.page.max(1),
        page.page_count(query.limit).max(1),
        page.total,
        query.sort
    );
    Ok(())
}

pub fn show(ctx: &AppContext, id: &str, json: bool) -> Result<()> {
    let note = ctx.note(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
        return Ok(());
    }

    println!("{}", note.display_title());
    println!("  id:        {}", note.id);
    if !note.subject.is_empty() || !note.level.is_empty() {
        println!("  subject:   {} {}", note.subject, note.level);
    }
    if !note.tags.is_empty() {
        println!("  tags:      {}", note.tag_list().join(", "));
    }
    println!("  uploaded:  {} by {}", note.created_at.format("%Y-%m-%d %H:%M"), note.user_id);
    println!("  size:      {}", note.readable_size());
    println!(
        "  likes: {}  bookmarks: {}  downloads: {}",
        note.likes, note.bookmarks, note.downloads
    );
    if !note.description.is_empty() {
        println!("\n{}", note.description);
    }
    Ok(())
}

pub async fn upload(ctx: &AppContext, request: &UploadRequest) -> Result<()> {
    let note = ctx.upload(request).await?;
    println!("Uploaded: {} ({})", note.display_title(), note.short_id());
    Ok(())
}

/// Flip the actor's like or bookmark on a note and report the result.
pub async fn toggle(ctx: &AppContext, kind: InteractionKind, id: &str) -> Result<()> {
    let note = ctx.note(id)?;
    let toggle = match kind {
        InteractionKind::Like => ctx.like_toggle(),
        InteractionKind::Bookmark => ctx.bookmark_toggle(),
    };
    let count = match kind {
        InteractionKind::Like => note.likes,
        InteractionKind::Bookmark => note.bookmarks,
    };

    toggle.bind(note.id.as_str(), ctx.actor.clone(), count);
    // Without knowing the current state a toggle could double count, so a
    // failed read stops here.
    toggle.hydrate().await?;

    match toggle.toggle().await? {
        ToggleOutcome::Committed(snapshot) => {
            let verb = match (kind, snapshot.active) {
                (InteractionKind::Like, true) => "Liked",
                (InteractionKind::Like, false) => "Unliked",
                (InteractionKind::Bookmark, true) => "Bookmarked",
                (InteractionKind::Bookmark, false) => "Removed bookmark from",
            };
            println!("{} {} ({} {}s)", verb, note.display_title(), snapshot.count, kind);
        }
        ToggleOutcome::Ignored | ToggleOutcome::Superseded => {
            tracing::debug!(note_id = %note.id, "Toggle not applied");
        }
    }
    Ok(())
}

pub async fn download(ctx: &AppContext, id: &str, out: Option<&Path>) -> Result<()> {
    let note = ctx.note(id)?;
    let receipt = ctx.download(&note, out).await?;
    println!("Saved {} to {}", note.display_title(), receipt.path.display());
    Ok(())
}

pub async fn preview(ctx: &AppContext, id: &str) -> Result<()> {
    let note = ctx.note(id)?;
    let path = ctx.preview_path(&note).await?;
    open::that(&path)?;
    println!("Opened {}", path.display());
    Ok(())
}

fn print_collection(name: &str, notes: &Result<Vec<Note>>) {
    println!("\n{}", name);
    match notes {
        Ok(notes) if notes.is_empty() => println!("  (none)"),
        Ok(notes) => {
            for note in notes {
                print!("  ");
                print_note_line(note);
            }
        }
        Err(e) => eprintln!("  Failed to load {}: {}", name.to_lowercase(), e),
    }
}

fn collection_json(notes: &Result<Vec<Note>>) -> serde_json::Value {
    match notes {
        Ok(notes) => serde_json::json!({ "notes": notes }),
        Err(e) => serde_json::json!({ "error": e.to_string() }),
    }
}

pub fn profile(ctx: &AppContext, limit: u32, json: bool) -> Result<()> {
    let Profile {
        actor,
        stats,
        uploads,
        bookmarks,
        likes,
    } = ctx.profile(limit)?;

    if json {
        let stats = match &stats {
            Ok(stats) => serde_json::to_value(stats)?,
            Err(e) => serde_json::json!({ "error": e.to_string() }),
        };
        let value = serde_json::json!({
            "user": actor,
            "stats": stats,
            "uploads": collection_json(&uploads),
            "bookmarks": collection_json(&bookmarks),
            "likes": collection_json(&likes),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{}", actor);
    match &stats {
        Ok(s) => println!(
            "  {} uploads, {} bookmarks, {} likes",
            s.uploads, s.bookmarks, s.likes
        ),
        Err(e) => eprintln!("  Failed to load stats: {}", e),
    }
    print_collection("Uploads", &uploads);
    print_collection("Bookmarks", &bookmarks);
    print_collection("Likes", &likes);
    Ok(())
}
