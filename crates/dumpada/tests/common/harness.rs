//! Test harness over a migrated database.
//!
//! `TestHarness::in_memory()` is the default; `TestHarness::on_disk()` keeps
//! the database in a temp directory so several connections can share it.

#![allow(dead_code)]

use std::path::PathBuf;

use tempfile::TempDir;

use dumpada::{Actor, Config, Database, Dumpada, StatusPolicy, WorkFront};

use super::builders::WorkFrontBuilder;

pub struct TestHarness {
    pub app: Dumpada,
    pub config: Config,
    /// Kept alive for on-disk harnesses.
    temp_dir: Option<TempDir>,
    pub db_path: Option<PathBuf>,
}

impl TestHarness {
    pub fn in_memory() -> Self {
        Self::in_memory_with(Config::default())
    }

    pub fn with_policy(policy: StatusPolicy) -> Self {
        Self::in_memory_with(Config {
            status_policy: policy,
            ..Config::default()
        })
    }

    pub fn in_memory_with(config: Config) -> Self {
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let app = Dumpada::with_database(db, &config).expect("Failed to build services");
        Self {
            app,
            config,
            temp_dir: None,
            db_path: None,
        }
    }

    pub fn on_disk() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("data").join("dumpada.db");
        let config = Config {
            database_path: Some(db_path.clone()),
            ..Config::default()
        };
        let app = Dumpada::open(&config).expect("Failed to open database");
        Self {
            app,
            config,
            temp_dir: Some(temp_dir),
            db_path: Some(db_path),
        }
    }

    /// Opens a second, independent connection to the on-disk database.
    pub fn reopen(&self) -> Dumpada {
        Dumpada::open(&self.config).expect("Failed to reopen database")
    }

    pub fn actor(&self) -> Actor {
        Actor::new("Tester")
    }

    /// Creates a work front from the builder defaults.
    pub fn work_front(&self) -> WorkFront {
        self.work_front_from(WorkFrontBuilder::new())
    }

    pub fn work_front_from(&self, builder: WorkFrontBuilder) -> WorkFront {
        self.app
            .work_fronts()
            .create(&builder.build(), &self.actor())
            .expect("Failed to create work front")
    }
}
