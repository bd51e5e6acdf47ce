//! Front type repository: the `front_types` catalogue.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::columns::{format_timestamp, parse_timestamp};
use super::DatabaseError;
use crate::front_type::FrontType;

const TABLE: &str = "front_types";

fn from_row(row: &Row<'_>) -> Result<(FrontType, String, String), rusqlite::Error> {
    Ok((
        FrontType {
            id: row.get("id")?,
            name: row.get("name")?,
            abbreviation: row.get("abbreviation")?,
            created_at: Default::default(),
            updated_at: Default::default(),
        },
        row.get("created_at")?,
        row.get("updated_at")?,
    ))
}

fn finish(
    (mut front_type, created_at, updated_at): (FrontType, String, String),
) -> Result<FrontType, DatabaseError> {
    front_type.created_at = parse_timestamp(TABLE, "created_at", created_at)?;
    front_type.updated_at = parse_timestamp(TABLE, "updated_at", updated_at)?;
    Ok(front_type)
}

/// Lists all front types ordered by name.
pub fn list(conn: &Connection) -> Result<Vec<FrontType>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM front_types ORDER BY name ASC")?;
    let rows = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(finish).collect()
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<FrontType>, DatabaseError> {
    conn.query_row(
        "SELECT * FROM front_types WHERE id = ?1",
        params![id],
        from_row,
    )
    .optional()?
    .map(finish)
    .transpose()
}

/// Returns the id of the type named `name`, ignoring `excluding_id`.
pub fn find_id_by_name(
    conn: &Connection,
    name: &str,
    excluding_id: Option<i64>,
) -> Result<Option<i64>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id FROM front_types WHERE name = ?1 AND (?2 IS NULL OR id != ?2)",
            params![name, excluding_id],
            |r| r.get(0),
        )
        .optional()?)
}

/// Inserts a new front type and returns its id.
pub fn insert(conn: &Connection, front_type: &FrontType) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO front_types (name, abbreviation, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            front_type.name,
            front_type.abbreviation,
            format_timestamp(front_type.created_at),
            format_timestamp(front_type.updated_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update(conn: &Connection, front_type: &FrontType) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE front_types SET name = ?2, abbreviation = ?3, updated_at = ?4 WHERE id = ?1",
        params![
            front_type.id,
            front_type.name,
            front_type.abbreviation,
            format_timestamp(front_type.updated_at),
        ],
    )?;
    Ok(())
}

pub fn delete(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let affected = conn.execute("DELETE FROM front_types WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}
