//! Sequence counter repository: the global acopio number.
//!
//! The counter row only ever grows. The next number is one past the larger
//! of the counter and the highest stored `sequence_number`, so a database
//! populated before the counter existed still continues from its maximum.

use rusqlite::{params, Connection, OptionalExtension};

use super::DatabaseError;

const SAMPLES_COUNTER: &str = "samples";

fn current_high_water(conn: &Connection) -> Result<i64, DatabaseError> {
    let counter: Option<i64> = conn
        .query_row(
            "SELECT value FROM sequence_counters WHERE name = ?1",
            params![SAMPLES_COUNTER],
            |r| r.get(0),
        )
        .optional()?;
    let max_stored: i64 = conn.query_row(
        "SELECT COALESCE(MAX(sequence_number), 0) FROM samples",
        [],
        |r| r.get(0),
    )?;
    Ok(counter.unwrap_or(0).max(max_stored))
}

/// Returns the number the next sample would receive, without reserving it.
pub fn peek_next(conn: &Connection) -> Result<i64, DatabaseError> {
    Ok(current_high_water(conn)? + 1)
}

/// Reserves and returns the next sequence number.
///
/// Must run inside the same write transaction as the sample insert.
pub fn allocate_next(conn: &Connection) -> Result<i64, DatabaseError> {
    let next = current_high_water(conn)? + 1;
    conn.execute(
        "INSERT INTO sequence_counters (name, value) VALUES (?1, ?2)
         ON CONFLICT(name) DO UPDATE SET value = excluded.value",
        params![SAMPLES_COUNTER, next],
    )?;
    log::debug!("Allocated sample sequence number {}", next);
    Ok(next)
}
