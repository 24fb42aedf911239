use rusqlite::Connection;

use crate::error::Result;

/// Initialise the key-value table.
///
/// Safe to call on every startup (`IF NOT EXISTS`).
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key         TEXT NOT NULL PRIMARY KEY,
            value       TEXT NOT NULL,   -- JSON array of records
            updated_at  TEXT NOT NULL
        ) STRICT;",
    )?;
    Ok(())
}
