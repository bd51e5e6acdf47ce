//! Range band repository: seed data for the `range_bands` table.

use std::str::FromStr;

use rusqlite::{params, Connection};
use rust_decimal::Decimal;

use super::DatabaseError;
use crate::ranges::RangeBand;

fn parse_bound(column: &'static str, raw: String) -> Result<Decimal, DatabaseError> {
    Decimal::from_str(&raw).map_err(|_| DatabaseError::corrupt("range_bands", column, raw))
}

/// Lists all bands ordered by `sort_order`.
pub fn list(conn: &Connection) -> Result<Vec<RangeBand>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT label, lower_bound, upper_bound, description, sort_order
         FROM range_bands ORDER BY sort_order ASC, id ASC",
    )?;
    let raw = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, i32>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(label, lower, upper, description, sort_order)| {
            Ok(RangeBand {
                label,
                lower_bound: parse_bound("lower_bound", lower)?,
                upper_bound: parse_bound("upper_bound", upper)?,
                description,
                sort_order,
            })
        })
        .collect()
}

/// Replaces the whole band list with `bands`.
///
/// Bands are deployment seed data; this is the only write path.
pub fn replace_all(conn: &Connection, bands: &[RangeBand]) -> Result<(), DatabaseError> {
    conn.execute("DELETE FROM range_bands", [])?;
    let mut stmt = conn.prepare(
        "INSERT INTO range_bands (label, lower_bound, upper_bound, width, description, sort_order)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for band in bands {
        stmt.execute(params![
            band.label,
            band.lower_bound.to_string(),
            band.upper_bound.to_string(),
            band.width().to_string(),
            band.description,
            band.sort_order,
        ])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use rust_decimal_macros::dec;

    #[test]
    fn test_list_seeded_bands() {
        let db = Database::open_in_memory().unwrap();
        let bands = db.with_conn(list).unwrap();
        assert_eq!(bands.len(), 14);
        assert_eq!(bands[3].label, "Reserva");
        assert_eq!(bands[3].lower_bound, dec!(0.90));
        assert_eq!(bands[3].upper_bound, dec!(1.04));
        assert!(bands.windows(2).all(|w| w[0].sort_order < w[1].sort_order));
    }

    #[test]
    fn test_replace_all() {
        let db = Database::open_in_memory().unwrap();
        let mut custom = RangeBand::new("Low", dec!(0), dec!(0.999999), 1);
        custom.description = Some("below one percent".into());
        db.with_transaction(|tx| {
            replace_all(
                tx,
                &[custom.clone(), RangeBand::new("High", dec!(1), dec!(100), 2)],
            )
        })
        .unwrap();

        let bands = db.with_conn(list).unwrap();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0], custom);
        assert_eq!(bands[1].label, "High");
    }

    #[test]
    fn test_corrupt_bound_reported() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            conn.execute(
                "UPDATE range_bands SET lower_bound = 'abc' WHERE label = 'A'",
                [],
            )?;
            Ok(())
        })
        .unwrap();
        let err = db.with_conn(list).unwrap_err();
        assert!(matches!(
            err,
            DatabaseError::Corrupt {
                column: "lower_bound",
                ..
            }
        ));
    }
}
