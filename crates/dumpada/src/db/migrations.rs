//! Database migration system.
//!
//! Tracks applied migrations in a `_migrations` table and applies
//! pending ones in order. ALTER TABLE ADD COLUMN migrations are handled
//! conditionally to support databases created before the column existed
//! in the base table definition.

use rusqlite::Connection;

use super::error::DatabaseError;

/// A single migration definition.
struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
    kind: MigrationKind,
}

enum MigrationKind {
    /// Execute the SQL directly.
    Standard,
    /// ALTER TABLE ADD COLUMN; skipped if the column already exists.
    AddColumn {
        table: &'static str,
        column: &'static str,
    },
}

/// All migrations in order. Each is applied at most once.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_front_types_table",
        sql: include_str!("sql/001_create_front_types.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 2,
        description: "create_work_fronts_table",
        sql: include_str!("sql/002_create_work_fronts.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 3,
        description: "create_work_front_audit_table",
        sql: include_str!("sql/003_create_work_front_audit.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 4,
        description: "create_range_bands_table",
        sql: include_str!("sql/004_create_range_bands.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 5,
        description: "create_samples_table",
        sql: include_str!("sql/005_create_samples.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 6,
        description: "create_sequence_counters_table",
        sql: include_str!("sql/006_create_sequence_counters.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 7,
        description: "add_site_id_to_samples",
        sql: include_str!("sql/007_add_site_id_to_samples.sql"),
        kind: MigrationKind::AddColumn {
            table: "samples",
            column: "site_id",
        },
    },
];

/// Runs all pending migrations on the given connection.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        log::info!(
            "Running migration v{}: {}",
            migration.version,
            migration.description
        );

        let should_run = match &migration.kind {
            MigrationKind::Standard => true,
            MigrationKind::AddColumn { table, column } => !column_exists(conn, table, column)?,
        };

        if should_run {
            conn.execute_batch(migration.sql)
                .map_err(|e| DatabaseError::Migration {
                    version: migration.version,
                    reason: e.to_string(),
                })?;
        } else {
            log::info!(
                "Skipping migration v{} (condition not met)",
                migration.version
            );
        }

        conn.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.description],
        )?;
    }

    Ok(())
}

/// Checks whether a column exists on a table using `PRAGMA table_info`.
fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    if !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DatabaseError::Migration {
            version: 0,
            reason: format!("Invalid table name: {}", table),
        });
    }
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let exists = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .any(|r| r.map(|name| name == column).unwrap_or(false));
    Ok(exists)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn migrated() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        run_all(&conn).unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_on_fresh_db() {
        let conn = migrated();
        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = migrated();
        run_all(&conn).unwrap();

        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);

        // Seeds are not duplicated by a second run.
        let bands: u32 = conn
            .query_row("SELECT COUNT(*) FROM range_bands", [], |r| r.get(0))
            .unwrap();
        assert_eq!(bands, 14);
    }

    #[test]
    fn test_column_exists_check() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE test_tbl (id TEXT, name TEXT);")
            .unwrap();

        assert!(column_exists(&conn, "test_tbl", "id").unwrap());
        assert!(column_exists(&conn, "test_tbl", "name").unwrap());
        assert!(!column_exists(&conn, "test_tbl", "missing").unwrap());
        assert!(column_exists(&conn, "bad;name", "id").is_err());
    }

    #[test]
    fn test_samples_table_has_site_id() {
        let conn = migrated();
        assert!(column_exists(&conn, "samples", "site_id").unwrap());
    }

    #[test]
    fn test_add_column_skipped_when_present() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        // Simulate a database whose samples table already carries site_id.
        for migration in &MIGRATIONS[..6] {
            conn.execute_batch(migration.sql).unwrap();
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS _migrations (
                    version INTEGER PRIMARY KEY,
                    description TEXT NOT NULL,
                    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
                );",
            )
            .unwrap();
            conn.execute(
                "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
                rusqlite::params![migration.version, migration.description],
            )
            .unwrap();
        }
        conn.execute_batch("ALTER TABLE samples ADD COLUMN site_id INTEGER;")
            .unwrap();

        run_all(&conn).unwrap();
        let count: u32 = conn
            .query_row("SELECT COUNT(*) FROM _migrations", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as u32);
    }

    #[test]
    fn test_seeded_front_types() {
        let conn = migrated();
        let abbreviation: String = conn
            .query_row(
                "SELECT abbreviation FROM front_types WHERE name = 'Desquinche'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(abbreviation, "DQ");
    }
}
