pub mod migrations;
pub mod models;
pub mod queries;

use anyhow::Result;
use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Value, ValueRef};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use jibe_core::Filter;

use crate::models::{InsultRow, SubmitterRow};

/// SQL name of the Unicode-aware lowercase function registered on every
/// connection. SQLite's built-in `lower()` only folds ASCII.
pub const LOWER_FN: &str = "unicode_lower";

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        register_functions(&conn)?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Private in-memory database, mainly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        register_functions(&conn)?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&conn)
    }

    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        f(&mut conn)
    }
}

fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        LOWER_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            Ok(match ctx.get_raw(0) {
                ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).to_lowercase()),
                other => Value::from(other),
            })
        },
    )?;
    Ok(())
}

/// Persistence port used by the HTTP handlers.
///
/// Calls block; async callers should run them on a blocking thread.
pub trait Store: Send + Sync {
    // -- Submitters --

    /// Creates `count` submitters with default fields, all or nothing.
    fn create_submitters(&self, count: usize) -> Result<Vec<SubmitterRow>>;
    fn find_submitters(&self, filter: &Filter) -> Result<Vec<SubmitterRow>>;
    fn get_submitter(&self, sid: i64) -> Result<Option<SubmitterRow>>;
    fn get_submitter_by_userid(&self, userid: &str) -> Result<Option<SubmitterRow>>;
    /// Binds an identity to a key. Returns false when `sid` does not exist.
    fn set_submitter_userid(&self, sid: i64, userid: &str) -> Result<bool>;

    // -- Insults --

    fn create_insult(&self, content: &str, by: Option<i64>) -> Result<InsultRow>;
    /// Every stored insult text, in insertion order.
    fn insult_contents(&self) -> Result<Vec<String>>;
    fn find_insults(&self, filter: &Filter) -> Result<Vec<InsultRow>>;
    fn get_insult(&self, iid: i64) -> Result<Option<InsultRow>>;
    /// Deletes and returns the row, or `None` if it was already gone.
    fn delete_insult(&self, iid: i64) -> Result<Option<InsultRow>>;
}
