//! Durable key-value storage backends.
//!
//! The note store persists through the [`KeyValueStore`] trait, which mirrors
//! browser local storage: string keys, string values, whole-value writes.

use crate::{Result, RetroNotesError};
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

/// Key holding the JSON array of every note.
pub const NOTES_KEY: &str = "retro-notes-data";

/// Key holding the JSON array of favorite note ids.
pub const FAVORITES_KEY: &str = "retro-notes-favorites";

/// Key holding the selected theme name.
pub const THEME_KEY: &str = "theme";

/// A string-to-string durable store.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// A [`KeyValueStore`] backed by a single SQLite table.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        let table_count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name = 'kv'",
            [],
            |row| row.get(0),
        )?;

        if table_count != 1 {
            return Err(RetroNotesError::InvalidStorage(
                "Not a valid RetroNotes database".to_string(),
            ));
        }

        Ok(Self { conn })
    }

    /// Opens a throwaway database that lives only as long as this value.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl KeyValueStore for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, now],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// An in-process [`KeyValueStore`]; contents vanish with the value.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a storage pre-populated with `entries`.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_create_storage() {
        let temp = NamedTempFile::new().unwrap();
        let storage = SqliteStorage::create(temp.path()).unwrap();

        let tables: Vec<String> = storage
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();

        assert!(tables.contains(&"kv".to_string()));
    }

    #[test]
    fn test_values_survive_reopen() {
        let temp = NamedTempFile::new().unwrap();
        {
            let mut storage = SqliteStorage::create(temp.path()).unwrap();
            storage.set(NOTES_KEY, "[]").unwrap();
            storage.set(THEME_KEY, "cyber").unwrap();
        }

        let storage = SqliteStorage::open(temp.path()).unwrap();
        assert_eq!(storage.get(NOTES_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(storage.get(THEME_KEY).unwrap().as_deref(), Some("cyber"));
    }

    #[test]
    fn test_set_overwrites_and_remove_deletes() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.set("k", "one").unwrap();
        storage.set("k", "two").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("two"));

        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.remove("k").unwrap();
    }

    #[test]
    fn test_open_invalid_database() {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "not a database").unwrap();

        let result = SqliteStorage::open(temp.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_open_database_without_kv_table() {
        let temp = NamedTempFile::new().unwrap();
        {
            let conn = Connection::open(temp.path()).unwrap();
            conn.execute("CREATE TABLE notes (id TEXT PRIMARY KEY)", []).unwrap();
        }

        let result = SqliteStorage::open(temp.path());
        assert!(matches!(result, Err(RetroNotesError::InvalidStorage(_))));
    }

    #[test]
    fn test_memory_storage_round_trip() {
        let mut storage = MemoryStorage::with_entries([(THEME_KEY, "terminal")]);
        assert_eq!(storage.get(THEME_KEY).unwrap().as_deref(), Some("terminal"));
        storage.set(FAVORITES_KEY, "[\"a\"]").unwrap();
        assert_eq!(storage.get(FAVORITES_KEY).unwrap().as_deref(), Some("[\"a\"]"));
        assert_eq!(storage.get(NOTES_KEY).unwrap(), None);
    }
}
