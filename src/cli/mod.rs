pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::SortMode;
use crate::profile::DEFAULT_COLLECTION_SIZE;

#[derive(Parser)]
#[command(name = "notehub")]
#[command(about = "Share, browse and collect study notes", long_about = None)]
pub struct Cli {
    /// Act as this user (overrides [session] user_id)
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Path to the notes database
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List notes with optional search and filters
    Browse {
        /// Match against title, description and tags
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        level: Option<String>,
        /// newest, popular, trending or title
        #[arg(long)]
        sort: Option<SortMode>,
        /// Notes per page
        #[arg(short, long)]
        limit: Option<u32>,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show one note
    Show {
        /// Note id or unambiguous id prefix
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Upload a PDF as a new note
    Upload {
        pdf: PathBuf,
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        subject: String,
        /// Comma separated
        #[arg(long, default_value = "")]
        tags: String,
        #[arg(long, default_value = "")]
        level: String,
        /// Cover image
        #[arg(long)]
        thumb: Option<PathBuf>,
    },
    /// Like or unlike a note
    Like { id: String },
    /// Bookmark or unbookmark a note
    Bookmark { id: String },
    /// Save a note's PDF locally
    Download {
        id: String,
        /// File or directory to write to
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Open a note's PDF in the system viewer
    Preview { id: String },
    /// Show your uploads, bookmarks and likes
    Profile {
        #[arg(short, long, default_value_t = DEFAULT_COLLECTION_SIZE)]
        limit: u32,
        #[arg(long)]
        json: bool,
    },
    /// Launch the TUI
    Tui,
}
