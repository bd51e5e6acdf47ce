//! Audit repository: append-only access to `work_front_audit`.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::columns::{format_timestamp, parse_enum, parse_timestamp};
use super::DatabaseError;
use crate::audit::{AuditEntry, NewAuditEntry, WorkFrontSnapshot};

const TABLE: &str = "work_front_audit";

#[derive(Debug, Clone)]
struct AuditRow {
    id: i64,
    work_front_id: i64,
    action: String,
    actor: String,
    before_snapshot: Option<String>,
    after_snapshot: Option<String>,
    note: Option<String>,
    created_at: String,
}

impl AuditRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            work_front_id: row.get("work_front_id")?,
            action: row.get("action")?,
            actor: row.get("actor")?,
            before_snapshot: row.get("before_snapshot")?,
            after_snapshot: row.get("after_snapshot")?,
            note: row.get("note")?,
            created_at: row.get("created_at")?,
        })
    }

    fn into_entry(self) -> Result<AuditEntry, DatabaseError> {
        Ok(AuditEntry {
            id: self.id,
            work_front_id: self.work_front_id,
            action: parse_enum(TABLE, "action", self.action)?,
            actor: self.actor,
            before: decode_snapshot(self.before_snapshot)?,
            after: decode_snapshot(self.after_snapshot)?,
            note: self.note,
            timestamp: parse_timestamp(TABLE, "created_at", self.created_at)?,
        })
    }
}

fn encode_snapshot(snapshot: Option<&WorkFrontSnapshot>) -> Result<Option<String>, DatabaseError> {
    Ok(snapshot.map(serde_json::to_string).transpose()?)
}

fn decode_snapshot(raw: Option<String>) -> Result<Option<WorkFrontSnapshot>, DatabaseError> {
    Ok(raw.as_deref().map(serde_json::from_str).transpose()?)
}

/// Appends an audit entry and returns its id.
pub fn insert(conn: &Connection, entry: &NewAuditEntry<'_>) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO work_front_audit (work_front_id, action, actor, before_snapshot,
         after_snapshot, note, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.work_front_id,
            entry.action.as_str(),
            entry.actor,
            encode_snapshot(entry.before)?,
            encode_snapshot(entry.after)?,
            entry.note,
            format_timestamp(entry.timestamp),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Finds an audit entry by id.
pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<AuditEntry>, DatabaseError> {
    conn.query_row(
        "SELECT * FROM work_front_audit WHERE id = ?1",
        params![id],
        AuditRow::from_row,
    )
    .optional()?
    .map(AuditRow::into_entry)
    .transpose()
}

/// Lists a work front's audit entries, newest first.
pub fn list_for_work_front(
    conn: &Connection,
    work_front_id: i64,
) -> Result<Vec<AuditEntry>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT * FROM work_front_audit WHERE work_front_id = ?1
         ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt
        .query_map(params![work_front_id], AuditRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(AuditRow::into_entry).collect()
}
