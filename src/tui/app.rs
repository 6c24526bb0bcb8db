use ratatui::widgets::ListState;

use crate::domain::{ActorId, Note, NotePage, NoteQuery};
use crate::toggle::ToggleSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePane {
    Notes,
    Details,
}

impl ActivePane {
    pub fn next(self) -> Self {
        match self {
            ActivePane::Notes => ActivePane::Details,
            ActivePane::Details => ActivePane::Notes,
        }
    }
}

const SCROLL_STEP: u16 = 10;

pub struct TuiApp {
    pub active_pane: ActivePane,
    pub actor: Option<ActorId>,
    pub query: NoteQuery,
    pub notes: Vec<Note>,
    /// Matches across all pages
    pub total: u64,
    pub note_index: usize,
    pub list_state: ListState,
    pub details_scroll: u16,
    pub like: ToggleSnapshot,
    pub bookmark: ToggleSnapshot,
    /// Note the toggles are currently bound to
    pub bound_note: Option<String>,
    pub should_quit: bool,
    pub status_message: Option<String>,
}

impl TuiApp {
    pub fn new(query: NoteQuery, actor: Option<ActorId>) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self {
            active_pane: ActivePane::Notes,
            actor,
            query,
            notes: Vec::new(),
            total: 0,
            note_index: 0,
            list_state,
            details_scroll: 0,
            like: ToggleSnapshot::default(),
            bookmark: ToggleSnapshot::default(),
            bound_note: None,
            should_quit: false,
            status_message: None,
        }
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.notes.get(self.note_index)
    }

    pub fn page_count(&self) -> u64 {
        NotePage {
            notes: Vec::new(),
            total: self.total,
        }
        .page_count(self.query.limit)
        .max(1)
    }

    /// Replace the visible page, keeping the cursor in range.
    pub fn set_page(&mut self, page: NotePage) {
        self.notes = page.notes;
        self.total = page.total;
        if self.note_index >= self.notes.len() {
            self.note_index = self.notes.len().saturating_sub(1);
        }
        self.list_state.select(Some(self.note_index));
    }

    /// Swap in a fresh copy of one note if it is on the current page.
    pub fn replace_note(&mut self, note: Note) {
        if let Some(slot) = self.notes.iter_mut().find(|n| n.id == note.id) {
            *slot = note;
        }
    }

    /// Mirror toggle state onto the selected note so the list shows live counts.
    pub fn sync_toggles(&mut self, like: ToggleSnapshot, bookmark: ToggleSnapshot) {
        let bound = self.bound_note.clone();
        if let Some(note) = self
            .notes
            .get_mut(self.note_index)
            .filter(|n| bound.as_deref() == Some(n.id.as_str()))
        {
            note.likes = like.count;
            note.bookmarks = bookmark.count;
        }
        self.like = like;
        self.bookmark = bookmark;
    }

    /// Force the toggles to rebind with fresh counts, unless one of them
    /// still has a write pending for the bound note.
    pub fn release_binding(&mut self, toggle_pending: bool) {
        if !toggle_pending {
            self.bound_note = None;
        }
    }

    pub fn move_up(&mut self) {
        match self.active_pane {
            ActivePane::Notes => {
                if self.note_index > 0 {
                    self.select(self.note_index - 1);
                }
            }
            ActivePane::Details => {
                self.details_scroll = self.details_scroll.saturating_sub(1);
            }
        }
    }

    pub fn move_down(&mut self) {
        match self.active_pane {
            ActivePane::Notes => {
                if self.note_index + 1 < self.notes.len() {
                    self.select(self.note_index + 1);
                }
            }
            ActivePane::Details => {
                self.details_scroll = self.details_scroll.saturating_add(1);
            }
        }
    }

    /// Advance the catalogue page. Returns true when a reload is needed.
    pub fn next_page(&mut self) -> bool {
        if self.active_pane == ActivePane::Details {
            self.details_scroll = self.details_scroll.saturating_add(SCROLL_STEP);
            return false;
        }
        if (self.query.page as u64) < self.page_count() {
            self.query.page += 1;
            self.select(0);
            return true;
        }
        false
    }

    pub fn prev_page(&mut self) -> bool {
        if self.active_pane == ActivePane::Details {
            self.details_scroll = self.details_scroll.saturating_sub(SCROLL_STEP);
            return false;
        }
        if self.query.page > 1 {
            self.query.page -= 1;
            self.select(0);
            return true;
        }
        false
    }

    /// Switch to the next sort mode and go back to the first page.
    pub fn cycle_sort(&mut self) {
        self.query.sort = self.query.sort.next();
        self.query.page = 1;
        self.select(0);
    }

    fn select(&mut self, index: usize) {
        self.note_index = index;
        self.list_state.select(Some(index));
        self.details_scroll = 0;
    }

    pub fn set_status(&mut self, message: String) {
        self.status_message = Some(message);
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }
}
