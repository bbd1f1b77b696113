use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};

use crate::config;

pub const PREFERENCES_NAMESPACE: &str = "app_preferences";
pub const SEARCH_FILTER_KEY: &str = "SEARCH_FILTER";

const PREFERENCES_FILE_NAME: &str = "preferences.db";

/// Durable string key-value store scoped to one namespace.
pub struct Preferences {
    conn: Connection,
    namespace: String,
}

impl Preferences {
    /// Open the application preference store under the data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(&default_path()?, PREFERENCES_NAMESPACE)
    }

    pub fn open(path: &Path, namespace: &str) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create data dir: {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open preferences at {}", path.display()))?;

        let prefs = Self {
            conn,
            namespace: namespace.to_string(),
        };
        prefs.setup()?;
        Ok(prefs)
    }

    fn setup(&self) -> Result<()> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "FULL")?;

        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS preferences (
              namespace TEXT NOT NULL,
              key       TEXT NOT NULL,
              value     TEXT NOT NULL,
              PRIMARY KEY (namespace, key)
            );
        "#,
        )?;
        Ok(())
    }

    pub fn get_string(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE namespace = ?1 AND key = ?2",
                params![self.namespace, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn put_string(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO preferences (namespace, key, value) VALUES (?1, ?2, ?3)
            ON CONFLICT(namespace, key) DO UPDATE SET value = excluded.value
            "#,
            params![self.namespace, key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM preferences WHERE namespace = ?1 AND key = ?2",
            params![self.namespace, key],
        )?;
        Ok(())
    }
}

/// The last search term typed into the search box.
pub struct SearchState {
    prefs: Preferences,
}

impl SearchState {
    pub fn new(prefs: Preferences) -> Self {
        Self { prefs }
    }

    pub fn load(&self) -> Result<String> {
        Ok(self
            .prefs
            .get_string(SEARCH_FILTER_KEY)?
            .unwrap_or_default())
    }

    pub fn save(&self, query: &str) -> Result<()> {
        self.prefs
            .put_string(SEARCH_FILTER_KEY, query)
            .context("failed to persist search filter")
    }

    pub fn clear(&self) -> Result<()> {
        self.prefs.remove(SEARCH_FILTER_KEY)
    }
}

pub fn default_path() -> Result<PathBuf> {
    Ok(config::data_dir()?.join(PREFERENCES_FILE_NAME))
}
