// src/db/connection.rs
//
// SQLite connection management
//
// One pool per process. Every repository borrows connections from it;
// nothing opens a connection on its own.

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

pub type ConnectionPool = Pool<SqliteConnectionManager>;
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Directory name under the platform data dir
const APP_DIR: &str = "mangahub";

/// Mutations are serialized per work at the service layer, so a small
/// pool covers concurrent readers comfortably
const POOL_SIZE: u32 = 15;

/// Database location: {data_dir}/mangahub/mangahub.db
///
/// The directory is created on first use.
pub fn get_database_path() -> AppResult<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| AppError::Other("no platform data directory".to_string()))?;
    let app_dir = data_dir.join(APP_DIR);
    std::fs::create_dir_all(&app_dir)?;
    Ok(app_dir.join("mangahub.db"))
}

/// Pool over the default application database
pub fn create_connection_pool() -> AppResult<ConnectionPool> {
    create_connection_pool_at(&get_database_path()?)
}

/// Pool over an explicit database file (tests point this at a temp dir)
///
/// Every connection comes up with foreign keys on, WAL journaling, and
/// a busy timeout so concurrent readers back off instead of failing.
pub fn create_connection_pool_at(db_path: &Path) -> AppResult<ConnectionPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )
    });

    Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .map_err(AppError::from)
}

/// Borrow a connection from the pool
pub fn get_connection(pool: &ConnectionPool) -> AppResult<PooledConn> {
    pool.get().map_err(AppError::from)
}

/// In-memory database for unit tests
pub fn create_test_connection() -> AppResult<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}
