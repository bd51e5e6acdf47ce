//! Work front repository: CRUD operations for the `work_fronts` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::columns::{format_timestamp, parse_enum, parse_opt_timestamp, parse_timestamp};
use super::DatabaseError;
use crate::work_front::{WorkFront, WorkFrontFilter};

const TABLE: &str = "work_fronts";

#[derive(Debug, Clone)]
struct WorkFrontRow {
    id: i64,
    seam: String,
    street: Option<String>,
    strand: Option<String>,
    front_number: Option<String>,
    front_type_id: i64,
    composite_code: String,
    site_id: Option<i64>,
    status: String,
    deleted_at: Option<String>,
    deleted_by: Option<String>,
    deletion_reason: Option<String>,
    created_at: String,
    updated_at: String,
}

impl WorkFrontRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            seam: row.get("seam")?,
            street: row.get("street")?,
            strand: row.get("strand")?,
            front_number: row.get("front_number")?,
            front_type_id: row.get("front_type_id")?,
            composite_code: row.get("composite_code")?,
            site_id: row.get("site_id")?,
            status: row.get("status")?,
            deleted_at: row.get("deleted_at")?,
            deleted_by: row.get("deleted_by")?,
            deletion_reason: row.get("deletion_reason")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_work_front(self) -> Result<WorkFront, DatabaseError> {
        Ok(WorkFront {
            id: self.id,
            seam: self.seam,
            street: self.street,
            strand: self.strand,
            front_number: self.front_number,
            front_type_id: self.front_type_id,
            composite_code: self.composite_code,
            site_id: self.site_id,
            status: parse_enum(TABLE, "status", self.status)?,
            deleted_at: parse_opt_timestamp(TABLE, "deleted_at", self.deleted_at)?,
            deleted_by: self.deleted_by,
            deletion_reason: self.deletion_reason,
            created_at: parse_timestamp(TABLE, "created_at", self.created_at)?,
            updated_at: parse_timestamp(TABLE, "updated_at", self.updated_at)?,
        })
    }
}

fn collect(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::types::ToSql],
) -> Result<Vec<WorkFront>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, WorkFrontRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(WorkFrontRow::into_work_front).collect()
}

/// Inserts a new work front and returns its id. `front.id` is ignored.
pub fn insert(conn: &Connection, front: &WorkFront) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO work_fronts (seam, street, strand, front_number, front_type_id,
         composite_code, site_id, status, deleted_at, deleted_by, deletion_reason,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            front.seam,
            front.street,
            front.strand,
            front.front_number,
            front.front_type_id,
            front.composite_code,
            front.site_id,
            front.status.as_str(),
            front.deleted_at.map(format_timestamp),
            front.deleted_by,
            front.deletion_reason,
            format_timestamp(front.created_at),
            format_timestamp(front.updated_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrites every column except `id` and `created_at`.
pub fn update(conn: &Connection, front: &WorkFront) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE work_fronts SET seam=?2, street=?3, strand=?4, front_number=?5,
         front_type_id=?6, composite_code=?7, site_id=?8, status=?9, deleted_at=?10,
         deleted_by=?11, deletion_reason=?12, updated_at=?13
         WHERE id=?1",
        params![
            front.id,
            front.seam,
            front.street,
            front.strand,
            front.front_number,
            front.front_type_id,
            front.composite_code,
            front.site_id,
            front.status.as_str(),
            front.deleted_at.map(format_timestamp),
            front.deleted_by,
            front.deletion_reason,
            format_timestamp(front.updated_at),
        ],
    )?;
    Ok(())
}

/// Finds a work front by id, including soft-deleted ones.
pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<WorkFront>, DatabaseError> {
    conn.query_row(
        "SELECT * FROM work_fronts WHERE id = ?1",
        params![id],
        WorkFrontRow::from_row,
    )
    .optional()?
    .map(WorkFrontRow::into_work_front)
    .transpose()
}

/// Returns the id of an active (not soft-deleted) front holding `code`,
/// ignoring `excluding_id`.
pub fn find_active_code_holder(
    conn: &Connection,
    code: &str,
    excluding_id: Option<i64>,
) -> Result<Option<i64>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id FROM work_fronts
             WHERE composite_code = ?1 AND deleted_at IS NULL AND (?2 IS NULL OR id != ?2)
             LIMIT 1",
            params![code, excluding_id],
            |r| r.get(0),
        )
        .optional()?)
}

/// Permanently removes a work front. Audit entries and samples cascade.
pub fn delete(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let affected = conn.execute("DELETE FROM work_fronts WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

/// Whether any work front (deleted or not) references the front type.
pub fn count_by_front_type(conn: &Connection, front_type_id: i64) -> Result<u64, DatabaseError> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM work_fronts WHERE front_type_id = ?1",
        params![front_type_id],
        |r| r.get(0),
    )?)
}

/// Queries non-deleted work fronts, newest first, returning (fronts, total_count).
pub fn query(
    conn: &Connection,
    filter: &WorkFrontFilter,
) -> Result<(Vec<WorkFront>, u64), DatabaseError> {
    let mut conditions = vec!["deleted_at IS NULL".to_string()];
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let n = param_values.len() + 1;
        conditions.push(format!(
            "(composite_code LIKE ?{n} OR seam LIKE ?{n} OR street LIKE ?{n} \
             OR strand LIKE ?{n} OR front_number LIKE ?{n})"
        ));
        param_values.push(Box::new(format!("%{}%", search)));
    }
    if let Some(front_type_id) = filter.front_type_id {
        conditions.push(format!("front_type_id = ?{}", param_values.len() + 1));
        param_values.push(Box::new(front_type_id));
    }
    if let Some(seam) = filter.seam.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        conditions.push(format!("seam LIKE ?{}", param_values.len() + 1));
        param_values.push(Box::new(format!("%{}%", seam)));
    }
    if let Some(site_id) = filter.site_id {
        conditions.push(format!("site_id = ?{}", param_values.len() + 1));
        param_values.push(Box::new(site_id));
    }
    if let Some(status) = filter.status {
        conditions.push(format!("status = ?{}", param_values.len() + 1));
        param_values.push(Box::new(status.as_str()));
    }
    if filter.only_active {
        conditions.push("status = 'active'".to_string());
    }

    let where_clause = format!("WHERE {}", conditions.join(" AND "));

    let count_sql = format!("SELECT COUNT(*) FROM work_fronts {}", where_clause);
    let params_ref: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| p.as_ref()).collect();
    let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

    let limit = filter.limit.unwrap_or(100) as i64;
    let offset = filter.offset.unwrap_or(0) as i64;
    param_values.push(Box::new(limit));
    param_values.push(Box::new(offset));
    let query_sql = format!(
        "SELECT * FROM work_fronts {} ORDER BY created_at DESC, id DESC LIMIT ?{} OFFSET ?{}",
        where_clause,
        param_values.len() - 1,
        param_values.len()
    );

    let params_ref: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| p.as_ref()).collect();
    let fronts = collect(conn, &query_sql, params_ref.as_slice())?;

    Ok((fronts, total))
}

/// Lists soft-deleted work fronts, most recently deleted first.
pub fn list_trashed(conn: &Connection) -> Result<Vec<WorkFront>, DatabaseError> {
    collect(
        conn,
        "SELECT * FROM work_fronts WHERE deleted_at IS NOT NULL
         ORDER BY deleted_at DESC, id DESC",
        &[],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::work_front::WorkFrontStatus;
    use chrono::{Duration, Utc};

    fn front(code: &str) -> WorkFront {
        let now = Utc::now();
        WorkFront {
            id: 0,
            seam: "M5".into(),
            street: Some("-1SH".into()),
            strand: None,
            front_number: Some("7".into()),
            front_type_id: 1,
            composite_code: code.into(),
            site_id: Some(3),
            status: WorkFrontStatus::Active,
            deleted_at: None,
            deleted_by: None,
            deletion_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = Database::open_in_memory().unwrap();
        let id = db.with_conn(|conn| insert(conn, &front("M5-1SHLEV7"))).unwrap();
        let found = db.with_conn(|conn| find_by_id(conn, id)).unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.composite_code, "M5-1SHLEV7");
        assert_eq!(found.street.as_deref(), Some("-1SH"));
        assert!(!found.is_deleted());
    }

    #[test]
    fn test_active_code_unique_index() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| insert(conn, &front("DUP"))).unwrap();
        let err = db.with_conn(|conn| insert(conn, &front("DUP"))).unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_deleted_fronts_release_their_code() {
        let db = Database::open_in_memory().unwrap();
        let id = db.with_conn(|conn| insert(conn, &front("DUP"))).unwrap();
        db.with_conn(|conn| {
            let mut f = find_by_id(conn, id)?.unwrap();
            f.deleted_at = Some(Utc::now());
            update(conn, &f)
        })
        .unwrap();
        assert_eq!(
            db.with_conn(|conn| find_active_code_holder(conn, "DUP", None))
                .unwrap(),
            None
        );
        db.with_conn(|conn| insert(conn, &front("DUP"))).unwrap();
    }

    #[test]
    fn test_code_holder_excludes_self() {
        let db = Database::open_in_memory().unwrap();
        let id = db.with_conn(|conn| insert(conn, &front("SELF"))).unwrap();
        assert_eq!(
            db.with_conn(|conn| find_active_code_holder(conn, "SELF", None))
                .unwrap(),
            Some(id)
        );
        assert_eq!(
            db.with_conn(|conn| find_active_code_holder(conn, "SELF", Some(id)))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_query_and_trash() {
        let db = Database::open_in_memory().unwrap();
        let base = Utc::now();
        db.with_conn(|conn| {
            for (i, code) in ["A1", "B2", "C3"].iter().enumerate() {
                let mut f = front(code);
                f.created_at = base + Duration::seconds(i as i64);
                if *code == "B2" {
                    f.status = WorkFrontStatus::Inactive;
                }
                insert(conn, &f)?;
            }
            let mut trashed = front("Z9");
            trashed.deleted_at = Some(base);
            insert(conn, &trashed)?;
            Ok(())
        })
        .unwrap();

        let (all, total) = db
            .with_conn(|conn| query(conn, &WorkFrontFilter::default()))
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(
            all.iter().map(|f| f.composite_code.as_str()).collect::<Vec<_>>(),
            vec!["C3", "B2", "A1"]
        );

        let filter = WorkFrontFilter {
            only_active: true,
            ..Default::default()
        };
        let (active, _) = db.with_conn(|conn| query(conn, &filter)).unwrap();
        assert_eq!(active.len(), 2);

        let filter = WorkFrontFilter {
            search: Some("b2".into()),
            ..Default::default()
        };
        let (found, _) = db.with_conn(|conn| query(conn, &filter)).unwrap();
        assert_eq!(found.len(), 1);

        let trashed = db.with_conn(list_trashed).unwrap();
        assert_eq!(trashed.len(), 1);
        assert_eq!(trashed[0].composite_code, "Z9");
    }

    #[test]
    fn test_count_by_front_type() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| insert(conn, &front("X1"))).unwrap();
        assert_eq!(db.with_conn(|conn| count_by_front_type(conn, 1)).unwrap(), 1);
        assert_eq!(db.with_conn(|conn| count_by_front_type(conn, 2)).unwrap(), 0);
    }
}
