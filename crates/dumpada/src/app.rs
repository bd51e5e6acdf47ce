//! Wires configuration, storage and the managers together.

use std::sync::Arc;

use tracing::info;

use crate::actor::Actor;
use crate::config::Config;
use crate::db::Database;
use crate::error::{ConfigError, Result};
use crate::front_type::FrontTypeManager;
use crate::ranges::RangeTable;
use crate::sample::SampleManager;
use crate::work_front::WorkFrontManager;

pub struct Dumpada {
    db: Database,
    ranges: Arc<RangeTable>,
    samples: SampleManager,
    work_fronts: WorkFrontManager,
    front_types: FrontTypeManager,
    default_actor: String,
}

impl Dumpada {
    /// Opens the configured database (running migrations) and loads the
    /// range table.
    pub fn open(config: &Config) -> Result<Self> {
        let path = config
            .resolved_database_path()
            .ok_or_else(|| ConfigError::Validation {
                message: "database_path is not set and no home directory was found".to_string(),
            })?;
        let db = Database::open(&path)?;
        Self::with_database(db, config)
    }

    /// Builds the managers over an already opened database.
    pub fn with_database(db: Database, config: &Config) -> Result<Self> {
        let ranges = Arc::new(RangeTable::load(&db)?);
        let retries = config.max_conflict_retries;

        let samples = SampleManager::new(db.clone(), Arc::clone(&ranges))
            .with_policy(config.status_policy)
            .with_max_attempts(retries);
        let work_fronts = WorkFrontManager::new(db.clone(), retries);
        let front_types = FrontTypeManager::new(db.clone(), retries);

        info!(
            bands = ranges.bands().len(),
            policy = ?config.status_policy,
            "Dumpada services ready"
        );

        Ok(Self {
            db,
            ranges,
            samples,
            work_fronts,
            front_types,
            default_actor: config.default_actor.clone(),
        })
    }

    pub fn samples(&self) -> &SampleManager {
        &self.samples
    }

    pub fn work_fronts(&self) -> &WorkFrontManager {
        &self.work_fronts
    }

    pub fn front_types(&self) -> &FrontTypeManager {
        &self.front_types
    }

    pub fn ranges(&self) -> &RangeTable {
        &self.ranges
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Attributes a call to the auth-context identity, or the configured
    /// default actor when none was supplied.
    pub fn actor(&self, name: Option<&str>, site_id: Option<i64>) -> Actor {
        Actor::resolve(name, site_id, &self.default_actor)
    }
}
