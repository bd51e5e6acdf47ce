//! Sample repository: CRUD operations for the `samples` table.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::columns::{
    format_date, format_decimal, format_timestamp, parse_date, parse_decimal, parse_enum,
    parse_timestamp,
};
use super::DatabaseError;
use crate::sample::{SampleFilter, SampleRecord};

const TABLE: &str = "samples";

const SELECT_SAMPLE: &str = "SELECT s.id, s.work_front_id, w.composite_code AS work_front_code,
        s.sequence_number, s.composite_code, s.shift, s.sample_date, s.tons, s.grade,
        s.grade_copper_cup, s.certificate_id, s.visual_grade_estimate, s.range_label,
        s.status, s.created_by, s.site_id, s.created_at, s.updated_at
     FROM samples s
     JOIN work_fronts w ON w.id = s.work_front_id";

/// A raw sample row, columns as stored.
#[derive(Debug, Clone)]
struct SampleRow {
    id: i64,
    work_front_id: i64,
    work_front_code: String,
    sequence_number: i64,
    composite_code: String,
    shift: String,
    sample_date: String,
    tons: Option<String>,
    grade: Option<String>,
    grade_copper_cup: Option<String>,
    certificate_id: Option<String>,
    visual_grade_estimate: Option<String>,
    range_label: Option<String>,
    status: String,
    created_by: Option<String>,
    site_id: Option<i64>,
    created_at: String,
    updated_at: String,
}

impl SampleRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            work_front_id: row.get("work_front_id")?,
            work_front_code: row.get("work_front_code")?,
            sequence_number: row.get("sequence_number")?,
            composite_code: row.get("composite_code")?,
            shift: row.get("shift")?,
            sample_date: row.get("sample_date")?,
            tons: row.get("tons")?,
            grade: row.get("grade")?,
            grade_copper_cup: row.get("grade_copper_cup")?,
            certificate_id: row.get("certificate_id")?,
            visual_grade_estimate: row.get("visual_grade_estimate")?,
            range_label: row.get("range_label")?,
            status: row.get("status")?,
            created_by: row.get("created_by")?,
            site_id: row.get("site_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_record(self) -> Result<SampleRecord, DatabaseError> {
        Ok(SampleRecord {
            id: self.id,
            work_front_id: self.work_front_id,
            work_front_code: self.work_front_code,
            sequence_number: self.sequence_number,
            composite_code: self.composite_code,
            shift: parse_enum(TABLE, "shift", self.shift)?,
            date: parse_date(TABLE, "sample_date", self.sample_date)?,
            tons: parse_decimal(TABLE, "tons", self.tons)?,
            grade: parse_decimal(TABLE, "grade", self.grade)?,
            grade_copper_cup: parse_decimal(TABLE, "grade_copper_cup", self.grade_copper_cup)?,
            certificate_id: self.certificate_id,
            visual_grade_estimate: self.visual_grade_estimate,
            range_label: self.range_label,
            status: parse_enum(TABLE, "status", self.status)?,
            created_by: self.created_by,
            site_id: self.site_id,
            created_at: parse_timestamp(TABLE, "created_at", self.created_at)?,
            updated_at: parse_timestamp(TABLE, "updated_at", self.updated_at)?,
        })
    }
}

/// Inserts a new sample and returns its id. `sample.id` and
/// `sample.work_front_code` are ignored.
pub fn insert(conn: &Connection, sample: &SampleRecord) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO samples (work_front_id, sequence_number, composite_code, shift, sample_date,
         tons, grade, grade_copper_cup, certificate_id, visual_grade_estimate, range_label,
         status, created_by, site_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            sample.work_front_id,
            sample.sequence_number,
            sample.composite_code,
            sample.shift.as_str(),
            format_date(sample.date),
            format_decimal(sample.tons),
            format_decimal(sample.grade),
            format_decimal(sample.grade_copper_cup),
            sample.certificate_id,
            sample.visual_grade_estimate,
            sample.range_label,
            sample.status.as_str(),
            sample.created_by,
            sample.site_id,
            format_timestamp(sample.created_at),
            format_timestamp(sample.updated_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrites a sample's mutable columns. `sequence_number`, `created_by`,
/// `site_id` and `created_at` are never changed.
pub fn update(conn: &Connection, sample: &SampleRecord) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE samples SET work_front_id=?2, composite_code=?3, shift=?4, sample_date=?5,
         tons=?6, grade=?7, grade_copper_cup=?8, certificate_id=?9, visual_grade_estimate=?10,
         range_label=?11, status=?12, updated_at=?13
         WHERE id=?1",
        params![
            sample.id,
            sample.work_front_id,
            sample.composite_code,
            sample.shift.as_str(),
            format_date(sample.date),
            format_decimal(sample.tons),
            format_decimal(sample.grade),
            format_decimal(sample.grade_copper_cup),
            sample.certificate_id,
            sample.visual_grade_estimate,
            sample.range_label,
            sample.status.as_str(),
            format_timestamp(sample.updated_at),
        ],
    )?;
    Ok(())
}

/// Finds a sample by id, with its work front's code attached.
pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<SampleRecord>, DatabaseError> {
    let sql = format!("{} WHERE s.id = ?1", SELECT_SAMPLE);
    conn.query_row(&sql, params![id], SampleRow::from_row)
        .optional()?
        .map(SampleRow::into_record)
        .transpose()
}

/// Hard-deletes a sample. Returns whether a row was removed.
pub fn delete(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let affected = conn.execute("DELETE FROM samples WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

/// Queries samples with filters, returning (records, total_count).
pub fn query(
    conn: &Connection,
    filter: &SampleFilter,
) -> Result<(Vec<SampleRecord>, u64), DatabaseError> {
    let mut conditions = Vec::new();
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let n = param_values.len() + 1;
        conditions.push(format!(
            "(s.composite_code LIKE ?{n} OR w.composite_code LIKE ?{n} \
             OR s.certificate_id LIKE ?{n} OR CAST(s.sequence_number AS TEXT) LIKE ?{n})"
        ));
        param_values.push(Box::new(format!("%{}%", search)));
    }
    if let Some(status) = filter.status {
        conditions.push(format!("s.status = ?{}", param_values.len() + 1));
        param_values.push(Box::new(status.as_str()));
    }
    if let Some(shift) = filter.shift {
        conditions.push(format!("s.shift = ?{}", param_values.len() + 1));
        param_values.push(Box::new(shift.as_str()));
    }
    if let Some(from_date) = filter.from_date {
        conditions.push(format!("s.sample_date >= ?{}", param_values.len() + 1));
        param_values.push(Box::new(format_date(from_date)));
    }
    if let Some(to_date) = filter.to_date {
        conditions.push(format!("s.sample_date <= ?{}", param_values.len() + 1));
        param_values.push(Box::new(format_date(to_date)));
    }
    if let Some(work_front_id) = filter.work_front_id {
        conditions.push(format!("s.work_front_id = ?{}", param_values.len() + 1));
        param_values.push(Box::new(work_front_id));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let count_sql = format!(
        "SELECT COUNT(*) FROM samples s JOIN work_fronts w ON w.id = s.work_front_id {}",
        where_clause
    );
    let params_ref: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| p.as_ref()).collect();
    let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

    let limit = filter.limit.unwrap_or(100) as i64;
    let offset = filter.offset.unwrap_or(0) as i64;
    param_values.push(Box::new(limit));
    param_values.push(Box::new(offset));
    let query_sql = format!(
        "{} {} ORDER BY s.id DESC LIMIT ?{} OFFSET ?{}",
        SELECT_SAMPLE,
        where_clause,
        param_values.len() - 1,
        param_values.len()
    );

    let params_ref: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&query_sql)?;
    let rows = stmt
        .query_map(params_ref.as_slice(), SampleRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    let records = rows
        .into_iter()
        .map(SampleRow::into_record)
        .collect::<Result<Vec<_>, _>>()?;

    Ok((records, total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::sample::{SampleStatus, Shift};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO work_fronts (seam, front_type_id, composite_code, created_at, updated_at)
                 VALUES ('M5', 1, 'M5LEV', '2024-01-01T00:00:00Z', '2024-01-01T00:00:00Z')",
                [],
            )?;
            Ok(())
        })
        .unwrap();
        db
    }

    fn sample(sequence_number: i64, shift: Shift, day: u32) -> SampleRecord {
        let now = Utc::now();
        let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        SampleRecord {
            id: 0,
            work_front_id: 1,
            work_front_code: String::new(),
            sequence_number,
            composite_code: crate::codes::build_sample_code("M5LEV", shift, sequence_number, Some(date)),
            shift,
            date,
            tons: Some(dec!(12.5)),
            grade: None,
            grade_copper_cup: None,
            certificate_id: None,
            visual_grade_estimate: Some("alta".into()),
            range_label: None,
            status: SampleStatus::Registered,
            created_by: Some("Operador".into()),
            site_id: Some(2),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let db = setup();
        let id = db.with_conn(|conn| insert(conn, &sample(1, Shift::Am, 5))).unwrap();
        let found = db.with_conn(|conn| find_by_id(conn, id)).unwrap().unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.work_front_code, "M5LEV");
        assert_eq!(found.composite_code, "M5LEV-AM-001-05-03-2024");
        assert_eq!(found.tons, Some(dec!(12.5)));
        assert_eq!(found.site_id, Some(2));
        assert_eq!(found.status, SampleStatus::Registered);
    }

    #[test]
    fn test_find_missing() {
        let db = setup();
        assert!(db.with_conn(|conn| find_by_id(conn, 99)).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_sequence_is_unique_violation() {
        let db = setup();
        db.with_conn(|conn| insert(conn, &sample(1, Shift::Am, 5))).unwrap();
        let mut clash = sample(1, Shift::Pm, 6);
        clash.composite_code = "other".into();
        let err = db.with_conn(|conn| insert(conn, &clash)).unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_update_keeps_sequence() {
        let db = setup();
        let id = db.with_conn(|conn| insert(conn, &sample(4, Shift::Am, 5))).unwrap();
        let mut record = db.with_conn(|conn| find_by_id(conn, id)).unwrap().unwrap();
        record.grade = Some(dec!(0.000001));
        record.status = SampleStatus::Completed;
        record.sequence_number = 99;
        db.with_conn(|conn| update(conn, &record)).unwrap();

        let found = db.with_conn(|conn| find_by_id(conn, id)).unwrap().unwrap();
        assert_eq!(found.grade, Some(dec!(0.000001)));
        assert_eq!(found.status, SampleStatus::Completed);
        assert_eq!(found.sequence_number, 4);
    }

    #[test]
    fn test_delete() {
        let db = setup();
        let id = db.with_conn(|conn| insert(conn, &sample(1, Shift::Am, 5))).unwrap();
        assert!(db.with_conn(|conn| delete(conn, id)).unwrap());
        assert!(!db.with_conn(|conn| delete(conn, id)).unwrap());
    }

    #[test]
    fn test_query_filters_and_order() {
        let db = setup();
        db.with_conn(|conn| {
            insert(conn, &sample(1, Shift::Am, 1))?;
            insert(conn, &sample(2, Shift::Pm, 2))?;
            insert(conn, &sample(3, Shift::Am, 3))?;
            Ok(())
        })
        .unwrap();

        let (all, total) = db
            .with_conn(|conn| query(conn, &SampleFilter::default()))
            .unwrap();
        assert_eq!(total, 3);
        assert_eq!(
            all.iter().map(|s| s.sequence_number).collect::<Vec<_>>(),
            vec![3, 2, 1]
        );

        let filter = SampleFilter {
            shift: Some(Shift::Am),
            from_date: NaiveDate::from_ymd_opt(2024, 3, 2),
            ..Default::default()
        };
        let (rows, total) = db.with_conn(|conn| query(conn, &filter)).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].sequence_number, 3);

        let filter = SampleFilter {
            search: Some("PM-002".into()),
            ..Default::default()
        };
        let (rows, _) = db.with_conn(|conn| query(conn, &filter)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].shift, Shift::Pm);
    }

    #[test]
    fn test_query_pagination() {
        let db = setup();
        db.with_conn(|conn| {
            for n in 1..=5 {
                insert(conn, &sample(n, Shift::Noche, n as u32))?;
            }
            Ok(())
        })
        .unwrap();
        let filter = SampleFilter {
            limit: Some(2),
            offset: Some(2),
            ..Default::default()
        };
        let (rows, total) = db.with_conn(|conn| query(conn, &filter)).unwrap();
        assert_eq!(total, 5);
        assert_eq!(
            rows.iter().map(|s| s.sequence_number).collect::<Vec<_>>(),
            vec![3, 2]
        );
    }

    #[test]
    fn test_search_matches_current_work_front_code() {
        let db = setup();
        db.with_conn(|conn| {
            insert(conn, &sample(1, Shift::Am, 1))?;
            conn.execute(
                "UPDATE work_fronts SET composite_code = 'M9FR2' WHERE id = 1",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let filter = SampleFilter {
            search: Some("M9FR".into()),
            ..Default::default()
        };
        let (rows, total) = db.with_conn(|conn| query(conn, &filter)).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].work_front_code, "M9FR2");
        assert_eq!(rows[0].composite_code, "M5LEV-AM-001-01-03-2024");
    }
}
