//! Library registry configuration for docshelf.
//!
//! The registry lives at `~/.docshelf/docshelf.toml` and maps library ids to
//! documentation source coordinates. It is consumed read-only by the
//! acquisition pipeline; a library without a `docs` table is registered but
//! has nothing to fetch.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocshelfError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docshelf.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docshelf";

// ---------------------------------------------------------------------------
// Config structs (matching docshelf.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory the repository cache is materialized under. Relative paths
    /// are resolved against the working directory; the default is a
    /// process-scoped location chosen by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,

    /// Registered libraries.
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
}

/// `[[libraries]]` entry — one registered library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryEntry {
    /// Library identifier, also the first slug segment of its documents.
    pub id: String,

    /// Documentation source coordinates. Absent means the library has no
    /// fetchable docs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<LibraryDocs>,
}

/// `[libraries.docs]` table — where a library's documentation lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryDocs {
    /// Repository coordinate in `owner/name` form.
    pub repo: String,

    /// Branch to fetch.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Subdirectory within the repository holding the docs. Empty means the
    /// repository root.
    #[serde(default)]
    pub dir: String,
}

fn default_branch() -> String {
    "main".into()
}

impl AppConfig {
    /// Look up a registered library by id.
    pub fn library(&self, id: &str) -> Option<&LibraryEntry> {
        self.libraries.iter().find(|entry| entry.id == id)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docshelf/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocshelfError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docshelf/docshelf.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocshelfError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocshelfError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocshelfError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocshelfError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocshelfError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
