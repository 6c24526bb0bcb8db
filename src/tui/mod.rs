pub mod app;
pub mod event;
pub mod layout;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::app::{AppContext, Result};
use crate::config::Config;
use crate::domain::{InteractionKind, NoteQuery};
use crate::store::Store;
use crate::toggle::{HydrationOutcome, OptimisticToggle, ToggleOutcome};

use self::app::TuiApp;
use self::event::{Action, AppEvent, EventHandler};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Completion of a toggle or hydration running off the render loop.
enum TaskResult {
    Toggle {
        kind: InteractionKind,
        note_id: String,
        result: Result<ToggleOutcome>,
    },
    Hydrate {
        kind: InteractionKind,
        result: Result<HydrationOutcome>,
    },
}

struct Toggles {
    like: Arc<OptimisticToggle>,
    bookmark: Arc<OptimisticToggle>,
    tx: mpsc::UnboundedSender<TaskResult>,
}

impl Toggles {
    fn get(&self, kind: InteractionKind) -> Arc<OptimisticToggle> {
        match kind {
            InteractionKind::Like => self.like.clone(),
            InteractionKind::Bookmark => self.bookmark.clone(),
        }
    }

    fn spawn_hydrate(&self, kind: InteractionKind) {
        let toggle = self.get(kind);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = toggle.hydrate().await;
            let _ = tx.send(TaskResult::Hydrate { kind, result });
        });
    }

    fn spawn_toggle(&self, kind: InteractionKind, note_id: String) {
        let toggle = self.get(kind);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = toggle.toggle().await;
            let _ = tx.send(TaskResult::Toggle {
                kind,
                note_id,
                result,
            });
        });
    }
}

pub async fn run(ctx: Arc<AppContext>, config: Arc<Config>, query: NoteQuery) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, ctx, config, query).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(
    terminal: &mut Tui,
    ctx: Arc<AppContext>,
    config: Arc<Config>,
    query: NoteQuery,
) -> Result<()> {
    let mut tui_app = TuiApp::new(query, ctx.actor.clone());
    let event_handler = EventHandler::new(Duration::from_millis(100));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let toggles = Toggles {
        like: Arc::new(ctx.like_toggle()),
        bookmark: Arc::new(ctx.bookmark_toggle()),
        tx,
    };

    load_page(&mut tui_app, &ctx);

    loop {
        bind_selected(&mut tui_app, &ctx, &toggles);
        while let Ok(task) = rx.try_recv() {
            handle_task(&mut tui_app, &ctx, task);
        }
        tui_app.sync_toggles(toggles.like.snapshot(), toggles.bookmark.snapshot());

        terminal.draw(|frame| layout::render(frame, &mut tui_app, &config.colors))?;

        let key = match event_handler.next()? {
            AppEvent::Key(key) => key,
            AppEvent::Tick => continue,
        };
        tui_app.clear_status();

        match config.keybindings.get_action(&key) {
            Action::Quit => tui_app.should_quit = true,
            Action::MoveUp => tui_app.move_up(),
            Action::MoveDown => tui_app.move_down(),
            Action::NextPage => {
                if tui_app.next_page() {
                    load_page(&mut tui_app, &ctx);
                }
            }
            Action::PrevPage => {
                if tui_app.prev_page() {
                    load_page(&mut tui_app, &ctx);
                }
            }
            Action::NextPane => tui_app.active_pane = tui_app.active_pane.next(),
            Action::CycleSort => {
                tui_app.cycle_sort();
                load_page(&mut tui_app, &ctx);
                tui_app.set_status(format!("Sorted by {}", tui_app.query.sort));
            }
            Action::ToggleLike => toggle_selected(&mut tui_app, &toggles, InteractionKind::Like),
            Action::ToggleBookmark => {
                toggle_selected(&mut tui_app, &toggles, InteractionKind::Bookmark)
            }
            Action::Download => {
                if let Some(note) = tui_app.selected_note().cloned() {
                    match ctx.download(&note, None).await {
                        Ok(receipt) => {
                            if let Some(n) = tui_app.notes.iter_mut().find(|n| n.id == note.id) {
                                n.downloads = receipt.downloads;
                            }
                            tui_app.set_status(format!("Saved {}", receipt.path.display()));
                        }
                        Err(e) => tui_app.set_status(format!("Download failed: {}", e)),
                    }
                }
            }
            Action::Preview => {
                if let Some(note) = tui_app.selected_note().cloned() {
                    let opened = match ctx.preview_path(&note).await {
                        Ok(path) => open::that(&path).map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };
                    if let Err(e) = opened {
                        tui_app.set_status(format!("Failed to open preview: {}", e));
                    }
                }
            }
            Action::Refresh => {
                load_page(&mut tui_app, &ctx);
                let pending =
                    toggles.like.snapshot().pending || toggles.bookmark.snapshot().pending;
                tui_app.release_binding(pending);
                tui_app.set_status(format!("Refreshed: {} notes", tui_app.total));
            }
            Action::None => {}
        }

        if tui_app.should_quit {
            break;
        }
    }

    Ok(())
}

fn load_page(tui_app: &mut TuiApp, ctx: &AppContext) {
    match ctx.browse(&tui_app.query) {
        Ok(page) => tui_app.set_page(page),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load notes");
            tui_app.set_status(format!("Failed to load notes: {}", e));
        }
    }
}

/// Point both toggles at the selected note when the selection changes.
fn bind_selected(tui_app: &mut TuiApp, ctx: &AppContext, toggles: &Toggles) {
    let selected = tui_app.selected_note().map(|n| (n.id.clone(), n.likes, n.bookmarks));
    let Some((note_id, likes, bookmarks)) = selected else {
        tui_app.bound_note = None;
        return;
    };
    if tui_app.bound_note.as_deref() == Some(note_id.as_str()) {
        return;
    }

    // A write still pending for the previous note will be superseded; its
    // result is reloaded from the store when it lands. Toggling that note
    // again is ignored until then.
    toggles.like.bind(note_id.as_str(), ctx.actor.clone(), likes);
    toggles.bookmark.bind(note_id.as_str(), ctx.actor.clone(), bookmarks);
    tui_app.bound_note = Some(note_id);

    if ctx.actor.is_some() {
        toggles.spawn_hydrate(InteractionKind::Like);
        toggles.spawn_hydrate(InteractionKind::Bookmark);
    }
}

fn toggle_selected(tui_app: &mut TuiApp, toggles: &Toggles, kind: InteractionKind) {
    if tui_app.actor.is_none() {
        tui_app.set_status(kind.sign_in_message().to_string());
        return;
    }
    if let Some(note_id) = tui_app.bound_note.clone() {
        toggles.spawn_toggle(kind, note_id);
    }
}

fn handle_task(tui_app: &mut TuiApp, ctx: &AppContext, task: TaskResult) {
    match task {
        TaskResult::Toggle {
            kind,
            note_id,
            result,
        } => {
            if let Err(e) = &result {
                tracing::debug!(kind = %kind, error = %e, "Toggle reverted");
                tui_app.set_status(format!("{} {}", kind.failure_message(), e));
            }
            // The toggle was rebound while this write ran, so the list still
            // shows the optimistic count for this note.
            if tui_app.bound_note.as_deref() != Some(note_id.as_str()) {
                if let Ok(Some(note)) = ctx.store.get_note(&note_id) {
                    tui_app.replace_note(note);
                }
            }
        }
        TaskResult::Hydrate { kind, result } => {
            if let Err(e) = result {
                tracing::debug!(kind = %kind, error = %e, "Hydration failed");
            }
        }
    }
}
