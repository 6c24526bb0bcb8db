//! Configuration for notehub.
//!
//! Read from `~/.config/notehub/config.toml` at startup. A commented default
//! file is written the first time the path is missing.

pub mod colors;
pub mod keybindings;

pub use colors::ColorConfig;
pub use keybindings::KeybindingConfig;

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::query::DEFAULT_PAGE_SIZE;
use crate::domain::{ActorId, SortMode};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub browse: BrowseConfig,
    pub storage: StorageConfig,
    pub colors: ColorConfig,
    pub keybindings: KeybindingConfig,
}

/// Who is signed in. Without a user the catalogue is read-only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub user_id: Option<String>,
}

impl SessionConfig {
    pub fn actor(&self) -> Option<ActorId> {
        self.user_id.as_deref().and_then(ActorId::new)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowseConfig {
    pub sort: SortMode,
    pub page_size: u32,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            sort: SortMode::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Defaults to `<data_dir>/notehub/notehub.db`
    pub database: Option<PathBuf>,
    /// Defaults to `<data_dir>/notehub/bucket`
    pub bucket_dir: Option<PathBuf>,
}

impl Config {
    /// Load from the default path, creating a commented default file if none
    /// exists. Missing fields fall back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// `~/.config/notehub/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("notehub").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        fs::write(path, DEFAULT_CONFIG).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), "Created default config");
        Ok(())
    }
}

const DEFAULT_CONFIG: &str = r##"# notehub configuration

[session]
# Notes you upload, like and bookmark are recorded under this id.
# Leave unset to browse without signing in, or pass --user on the command line.
# user_id = "alice"

[browse]
# newest, popular, trending or title
sort = "newest"
page_size = 20

[storage]
# database = "/path/to/notehub.db"
# bucket_dir = "/path/to/bucket"

# Colors: named (Black, Red, Green, Yellow, Blue, Magenta, Cyan, Gray, DarkGray,
# LightRed, LightGreen, LightYellow, LightBlue, LightMagenta, LightCyan, White,
# Reset) or hex ("#RRGGBB", "#RGB").
[colors]
active_border = "Cyan"
inactive_border = "DarkGray"
selection_bg = "Cyan"
selection_fg = "Black"
liked = "LightRed"
bookmarked = "LightYellow"
pending = "DarkGray"
metadata_subject = "Green"
metadata_date = "Yellow"
metadata_tags = "Blue"
error = "Red"
status_fg = "White"
status_bg = "DarkGray"

# Keys: single characters ("l", "R"), special keys (Enter, Tab, BackTab,
# PageUp, PageDown, Up, Down, Esc, Space, F1-F12) and modifiers ("Ctrl+c").
[keybindings]
quit = ["q", "Ctrl+c"]
move_up = ["k", "Up"]
move_down = ["j", "Down"]
next_page = ["n", "PageDown"]
prev_page = ["p", "PageUp"]
next_pane = ["Tab", "BackTab"]
cycle_sort = ["s"]
toggle_like = ["l"]
toggle_bookmark = ["b"]
download = ["d"]
preview = ["o", "Enter"]
refresh = ["r", "R"]
"##;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
