//! Front type catalogue (Levante, Frente, Desquinche, ...).
//!
//! A type's abbreviation is the suffix segment of every work front code that
//! uses it. Renaming an abbreviation does not rewrite existing codes; codes
//! are rebuilt the next time each front is saved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::{columns, front_type_repo, work_front_repo, Database};
use crate::error::ServiceError;
use crate::retry::retry_on_conflict;
use crate::validation::required_text;

const MAX_NAME_LEN: usize = 100;
const MAX_ABBREVIATION_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontType {
    pub id: i64,
    pub name: String,
    pub abbreviation: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontTypeInput {
    pub name: String,
    pub abbreviation: String,
}

impl FrontTypeInput {
    pub fn new(name: &str, abbreviation: &str) -> Self {
        Self {
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
        }
    }

    fn validated(&self) -> Result<(String, String), ServiceError> {
        Ok((
            required_text("name", &self.name, MAX_NAME_LEN)?,
            required_text("abbreviation", &self.abbreviation, MAX_ABBREVIATION_LEN)?,
        ))
    }
}

pub struct FrontTypeManager {
    db: Database,
    max_attempts: u32,
}

impl FrontTypeManager {
    pub fn new(db: Database, max_attempts: u32) -> Self {
        Self { db, max_attempts }
    }

    pub fn list(&self) -> Result<Vec<FrontType>, ServiceError> {
        Ok(self.db.with_conn(front_type_repo::list)?)
    }

    pub fn get(&self, id: i64) -> Result<FrontType, ServiceError> {
        self.db
            .with_conn(|conn| front_type_repo::find_by_id(conn, id))?
            .ok_or_else(|| ServiceError::not_found("Front type", id))
    }

    pub fn create(&self, input: &FrontTypeInput) -> Result<FrontType, ServiceError> {
        let (name, abbreviation) = input.validated()?;

        let created = retry_on_conflict("front_type.create", self.max_attempts, || {
            self.db.with_transaction(|tx| {
                if front_type_repo::find_id_by_name(tx, &name, None)?.is_some() {
                    return Err(ServiceError::validation(
                        "name",
                        format!("a front type named '{}' already exists", name),
                    ));
                }
                let now = columns::now();
                let mut front_type = FrontType {
                    id: 0,
                    name: name.clone(),
                    abbreviation: abbreviation.clone(),
                    created_at: now,
                    updated_at: now,
                };
                front_type.id = front_type_repo::insert(tx, &front_type)?;
                Ok(front_type)
            })
        })?;

        info!(front_type_id = created.id, abbreviation = %created.abbreviation, "Front type created");
        Ok(created)
    }

    pub fn update(&self, id: i64, input: &FrontTypeInput) -> Result<FrontType, ServiceError> {
        let (name, abbreviation) = input.validated()?;

        let updated = retry_on_conflict("front_type.update", self.max_attempts, || {
            self.db.with_transaction(|tx| {
                let mut front_type = front_type_repo::find_by_id(tx, id)?
                    .ok_or_else(|| ServiceError::not_found("Front type", id))?;
                if front_type_repo::find_id_by_name(tx, &name, Some(id))?.is_some() {
                    return Err(ServiceError::validation(
                        "name",
                        format!("a front type named '{}' already exists", name),
                    ));
                }
                front_type.name = name.clone();
                front_type.abbreviation = abbreviation.clone();
                front_type.updated_at = columns::now();
                front_type_repo::update(tx, &front_type)?;
                Ok(front_type)
            })
        })?;

        info!(front_type_id = id, "Front type updated");
        Ok(updated)
    }

    /// Deletes a front type. Rejected while any work front, including a
    /// soft-deleted one, still references it.
    pub fn delete(&self, id: i64) -> Result<(), ServiceError> {
        self.db.with_transaction(|tx| {
            if front_type_repo::find_by_id(tx, id)?.is_none() {
                return Err(ServiceError::not_found("Front type", id));
            }
            let in_use = work_front_repo::count_by_front_type(tx, id)?;
            if in_use > 0 {
                return Err(ServiceError::validation(
                    "frontTypeId",
                    format!("front type is used by {} work front(s)", in_use),
                ));
            }
            front_type_repo::delete(tx, id)?;
            Ok(())
        })?;

        info!(front_type_id = id, "Front type deleted");
        Ok(())
    }
}
