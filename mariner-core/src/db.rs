//! The single SQLite handle shared by every component.
//!
//! One [`Database`] is opened in `main` and passed around as
//! `Arc<Database>`. Access goes through a mutex, so a lookup that races
//! provisioning waits for the provisioning transaction instead of seeing
//! half-built tables.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::StoreError;

pub const ZONES_TABLE: &str = "marine_zones";
pub const STATIONS_TABLE: &str = "tide_stations";
pub const ZIPCODES_TABLE: &str = "zipcodes";
pub const SAVED_PORTS_TABLE: &str = "saved_ports";

/// Tables that must exist before the dashboard can search.
pub const INDEX_TABLES: [&str; 3] = [ZONES_TABLE, STATIONS_TABLE, ZIPCODES_TABLE];

pub(crate) const ZONES_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS marine_zones (
        code TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        center_lat REAL NOT NULL,
        center_lon REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_marine_zones_center ON marine_zones(center_lat, center_lon);
";

pub(crate) const STATIONS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tide_stations (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        state TEXT NOT NULL DEFAULT '',
        lat REAL NOT NULL,
        lon REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_tide_stations_position ON tide_stations(lat, lon);
";

pub(crate) const ZIPCODES_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS zipcodes (
        zipcode TEXT PRIMARY KEY,
        city TEXT NOT NULL,
        state TEXT NOT NULL,
        lat REAL NOT NULL,
        lon REAL NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_zipcodes_city_state ON zipcodes(city, state);
";

const SAVED_PORTS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS saved_ports (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        state TEXT NOT NULL,
        city TEXT NOT NULL,
        zipcode TEXT NOT NULL,
        zone_code TEXT NOT NULL,
        station_id TEXT,
        lat REAL NOT NULL,
        lon REAL NOT NULL,
        created_at TEXT NOT NULL
    );
";

pub struct Database {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

impl Database {
    /// Opens (creating if needed) the database file and its parent directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        info!(path = %path.display(), "Opening database");
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "cache_size", 10000)?;
        conn.execute_batch(SAVED_PORTS_SCHEMA)?;
        debug!(journal_mode = %mode, "Database ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Runs `f` with exclusive access to the connection.
    pub fn with_conn<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Like [`with_conn`](Self::with_conn) but mutable, for transactions.
    pub fn with_conn_mut<T, E>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, E>,
    ) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut conn = self.lock()?;
        f(&mut conn)
    }

    pub fn table_exists(&self, table: &str) -> Result<bool, StoreError> {
        self.with_conn(|conn| table_exists(conn, table).map_err(StoreError::from))
    }

    /// Cheap launch-time probe: true when any index table is missing.
    pub fn needs_provisioning(&self) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            for table in INDEX_TABLES {
                if !table_exists(conn, table)? {
                    debug!(table, "Index table missing");
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    pub fn row_count(&self, table: &str) -> Result<i64, StoreError> {
        self.with_conn(|conn| {
            if !table_exists(conn, table)? {
                return Ok(0);
            }
            let sql = format!("SELECT COUNT(*) FROM {table}");
            Ok(conn.query_row(&sql, [], |row| row.get(0))?)
        })
    }
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
}
