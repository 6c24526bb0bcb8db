//! # notehub
//!
//! A terminal-first hub for sharing study notes: upload PDFs, browse and
//! search the catalogue, like and bookmark notes, download them.
//!
//! ## Architecture
//!
//! ```text
//! CLI / TUI → AppContext → Store (SQLite) + ObjectStore (bucket)
//!                        ↘ OptimisticToggle → MembershipStore + CounterStore
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! notehub --user alice upload week1.pdf --title "Calculus week 1" --subject math
//! notehub browse --sort trending
//! notehub --user bob like 3f2a
//! notehub tui
//! ```

/// Application context and error types.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/notehub/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Note`](domain::Note): an uploaded PDF and its aggregate counters
/// - [`NoteQuery`](domain::NoteQuery): search, filters, sort and page
/// - [`InteractionKind`](domain::InteractionKind): like or bookmark
pub mod domain;

/// Saving notes locally and opening them for preview.
pub mod download;

/// Per-user stats and collections.
pub mod profile;

/// Trending score and ordering.
pub mod ranking;

/// Object bucket holding PDFs and thumbnails.
pub mod storage;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): note catalogue
/// - [`MembershipStore`](store::MembershipStore) and
///   [`CounterStore`](store::CounterStore): the two writes behind a toggle
/// - [`SqliteStore`](store::SqliteStore): implements all three
pub mod store;

/// Optimistic like/bookmark state machine.
pub mod toggle;

/// Terminal user interface.
///
/// Notes list and details panes. Keybindings: j/k navigate, n/p page,
/// s cycles sort, l likes, b bookmarks, d downloads, o opens, q quits.
pub mod tui;

/// Validating and storing new notes.
pub mod upload;
