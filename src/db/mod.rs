pub mod migrations;
pub mod queries;

use anyhow::Context;
use rusqlite::Connection;

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    migrations::run_migrations(&conn)?;

    Ok(conn)
}

/// In-memory database with the full schema applied, for tests.
pub fn init_memory_db() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}
