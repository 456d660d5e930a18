// ⚙️ Configuration - where settings and exports live
// Resolution order: explicit flag, then environment, then defaults.

use crate::storage::{KeyValueStore, MemoryStore, SqliteStore};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::rc::Rc;

pub const DATA_DIR_ENV: &str = "CARE_DESK_DATA_DIR";
pub const EXPORT_DIR_ENV: &str = "CARE_DESK_EXPORT_DIR";
pub const DB_FILE_NAME: &str = "care-desk.db";
pub const LOG_FILE_NAME: &str = "care-desk.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
    /// Keep settings in memory only
    pub ephemeral: bool,
}

impl Config {
    /// `data_dir` / `export_dir` already include anything clap read from the
    /// environment; missing values fall back to platform defaults.
    pub fn resolve(data_dir: Option<PathBuf>, export_dir: Option<PathBuf>, ephemeral: bool) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let export_dir = export_dir.unwrap_or_else(|| PathBuf::from("."));
        Config {
            data_dir,
            export_dir,
            ephemeral,
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE_NAME)
    }

    /// Open the settings store. A database that cannot be opened degrades to
    /// memory so the session still works.
    pub fn open_store(&self) -> Rc<dyn KeyValueStore> {
        if self.ephemeral {
            return Rc::new(MemoryStore::new());
        }
        match SqliteStore::open(&self.db_path()) {
            Ok(store) => Rc::new(store),
            Err(e) => {
                tracing::warn!(path = %self.db_path().display(), error = %e,
                    "settings database unavailable, using memory only");
                Rc::new(MemoryStore::new())
            }
        }
    }

    pub fn ensure_export_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.export_dir)
            .with_context(|| format!("Failed to create export directory: {:?}", self.export_dir))
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("care-desk"))
        .unwrap_or_else(|| PathBuf::from(".care-desk"))
}
