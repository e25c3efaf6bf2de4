//! Key/value storage that the stores mirror themselves into.
//!
//! The contract is the browser's local storage: string keys, string values,
//! synchronous reads and writes, last write wins.

use crate::error::StorageError;
use rusqlite::{Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;

pub const DB_FILE: &str = "orientd.sqlite3";

pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

/// Workspace-backed storage: one SQLite file with a single key/value table.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(workspace)?;
        let conn = Connection::open(workspace.join(DB_FILE))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS local_storage(
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT
            )",
            [],
        )?;
        Ok(Self { conn })
    }
}

impl Storage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?",
                [key],
                |r| r.get::<_, String>(0),
            )
            .optional()
            .map_err(|e| StorageError::Read {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO local_storage(key, value, updated_at)
                 VALUES(?, ?, strftime('%Y-%m-%dT%H:%M:%SZ','now'))
                 ON CONFLICT(key) DO UPDATE SET
                   value = excluded.value,
                   updated_at = excluded.updated_at",
                (key, value),
            )
            .map(|_| ())
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?", [key])
            .map(|_| ())
            .map_err(|e| StorageError::Write {
                key: key.to_string(),
                message: e.to_string(),
            })
    }
}

/// In-process storage. An optional byte quota mimics the browser refusing
/// writes once local storage is full.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: RefCell::new(HashMap::new()),
            quota: Some(quota),
        }
    }

    /// Bytes currently held, counting keys and values.
    pub fn used_bytes(&self) -> usize {
        self.items
            .borrow()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let current = self
                .items
                .borrow()
                .get(key)
                .map(|v| key.len() + v.len())
                .unwrap_or(0);
            let needed = self.used_bytes() - current + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_storage_overwrites_and_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let s = SqliteStorage::open(dir.path()).expect("open");
            assert_eq!(s.get_item("students").expect("get"), None);
            s.set_item("students", "[]").expect("set");
            s.set_item("students", "[1]").expect("overwrite");
        }
        let s = SqliteStorage::open(dir.path()).expect("reopen");
        assert_eq!(s.get_item("students").expect("get").as_deref(), Some("[1]"));
        s.remove_item("students").expect("remove");
        assert_eq!(s.get_item("students").expect("get"), None);
    }

    #[test]
    fn memory_quota_rejects_oversized_write_and_keeps_previous_value() {
        let s = MemoryStorage::with_quota(16);
        s.set_item("k", "short").expect("fits");
        let e = s
            .set_item("k", "much longer than sixteen bytes")
            .expect_err("over quota");
        assert!(matches!(e, StorageError::QuotaExceeded { .. }));
        assert_eq!(s.get_item("k").expect("get").as_deref(), Some("short"));
    }

    #[test]
    fn memory_quota_counts_replacement_not_addition() {
        let s = MemoryStorage::with_quota(10);
        s.set_item("k", "12345678").expect("9 bytes");
        s.set_item("k", "87654321").expect("replacing keeps 9 bytes");
        assert_eq!(s.used_bytes(), 9);
    }
}
