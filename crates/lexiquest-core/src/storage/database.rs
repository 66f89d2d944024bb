//! SQLite-based snapshot storage and XP award history.
//!
//! Provides persistent storage for:
//! - Tracker snapshots (key-value store, one key per tracker)
//! - An XP award audit trail with daily and all-time statistics

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::StorageError;
use crate::reward::AwardBreakdown;
use crate::storage::SnapshotStore;

/// One row of the XP award audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardRecord {
    pub id: i64,
    pub base_xp: u32,
    pub final_xp: u64,
    pub combo_multiplier: f64,
    pub boost_multiplier: f64,
    pub bonus_xp: u64,
    pub awarded_at: DateTime<Utc>,
}

/// Aggregated XP statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct XpStats {
    pub total_awards: u64,
    pub total_xp: u64,
    pub total_bonus_xp: u64,
    pub today_awards: u64,
    pub today_xp: u64,
}

/// SQLite database holding tracker snapshots and the award history.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/lexiquest/lexiquest.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()?.join("lexiquest.db");
        let conn = Connection::open(&path)
            .map_err(|source| StorageError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS awards (
                    id               INTEGER PRIMARY KEY AUTOINCREMENT,
                    base_xp          INTEGER NOT NULL,
                    final_xp         INTEGER NOT NULL,
                    combo_multiplier REAL NOT NULL,
                    boost_multiplier REAL NOT NULL,
                    bonus_xp         INTEGER NOT NULL,
                    awarded_at       TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_awards_awarded_at ON awards(awarded_at);",
            )
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Append an award to the audit trail.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_award(&self, breakdown: &AwardBreakdown) -> Result<i64, rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO awards (base_xp, final_xp, combo_multiplier, boost_multiplier, bonus_xp, awarded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                breakdown.base_xp,
                breakdown.final_xp,
                breakdown.combo_multiplier,
                breakdown.boost_multiplier,
                breakdown.bonus_xp,
                breakdown.awarded_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent awards, newest first.
    pub fn recent_awards(&self, limit: u32) -> Result<Vec<AwardRecord>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, base_xp, final_xp, combo_multiplier, boost_multiplier, bonus_xp, awarded_at
             FROM awards ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            let awarded_at: String = row.get(6)?;
            Ok(AwardRecord {
                id: row.get(0)?,
                base_xp: row.get(1)?,
                final_xp: row.get(2)?,
                combo_multiplier: row.get(3)?,
                boost_multiplier: row.get(4)?,
                bonus_xp: row.get(5)?,
                awarded_at: awarded_at
                    .parse::<DateTime<Utc>>()
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;
        rows.collect()
    }

    pub fn stats_all(&self) -> Result<XpStats, rusqlite::Error> {
        let mut stats = XpStats::default();

        let row = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(final_xp), 0), COALESCE(SUM(bonus_xp), 0) FROM awards",
            [],
            |row| {
                Ok((
                    row.get::<_, u64>(0)?,
                    row.get::<_, u64>(1)?,
                    row.get::<_, u64>(2)?,
                ))
            },
        )?;
        stats.total_awards = row.0;
        stats.total_xp = row.1;
        stats.total_bonus_xp = row.2;

        let today = Utc::now().format("%Y-%m-%d").to_string();
        let row = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(final_xp), 0) FROM awards WHERE awarded_at >= ?1",
            params![format!("{today}T00:00:00+00:00")],
            |row| Ok((row.get::<_, u64>(0)?, row.get::<_, u64>(1)?)),
        )?;
        stats.today_awards = row.0;
        stats.today_xp = row.1;

        Ok(stats)
    }
}

impl SnapshotStore for Database {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.kv_get(key).map_err(StorageError::from)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.kv_set(key, value).map_err(StorageError::from)
    }
}
