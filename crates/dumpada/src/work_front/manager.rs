//! Work front lifecycle with an audit entry for every mutation.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::{debug, info, info_span};

use super::model::{WorkFront, WorkFrontFilter, WorkFrontInput};
use crate::actor::Actor;
use crate::audit::{AuditAction, HistoryItem, NewAuditEntry};
use crate::codes::build_front_code;
use crate::db::{audit_repo, columns, front_type_repo, work_front_repo, Database};
use crate::error::ServiceError;
use crate::retry::retry_on_conflict;
use crate::validation::{max_length, required_text};

const MAX_SEAM_LEN: usize = 10;
const MAX_STREET_LEN: usize = 20;
const MAX_STRAND_LEN: usize = 10;
const MAX_FRONT_NUMBER_LEN: usize = 10;

pub struct WorkFrontManager {
    pub(super) db: Database,
    pub(super) max_attempts: u32,
}

impl WorkFrontManager {
    pub fn new(db: Database, max_attempts: u32) -> Self {
        Self {
            db,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Creates a work front and records a `created` audit entry.
    pub fn create(&self, input: &WorkFrontInput, actor: &Actor) -> Result<WorkFront, ServiceError> {
        let _span = info_span!("work_front.create", front_type_id = input.front_type_id).entered();
        let input = validate_input(input)?;

        let front = retry_on_conflict("work_front.create", self.max_attempts, || {
            self.db.with_transaction(|tx| {
                let composite_code = front_code_for(
                    tx,
                    &input.seam,
                    input.street.as_deref(),
                    input.strand.as_deref(),
                    input.front_number.as_deref(),
                    input.front_type_id,
                )?;
                ensure_code_available(tx, &composite_code, None)?;

                let now = columns::now();
                let mut front = WorkFront {
                    id: 0,
                    seam: input.seam.clone(),
                    street: input.street.clone(),
                    strand: input.strand.clone(),
                    front_number: input.front_number.clone(),
                    front_type_id: input.front_type_id,
                    composite_code,
                    site_id: input.site_id,
                    status: input.status.unwrap_or_default(),
                    deleted_at: None,
                    deleted_by: None,
                    deletion_reason: None,
                    created_at: now,
                    updated_at: now,
                };
                front.id = work_front_repo::insert(tx, &front)?;
                record_audit(tx, &front, AuditAction::Created, actor, None, Some(&front), None, now)?;
                Ok(front)
            })
        })?;

        info!(work_front_id = front.id, composite_code = %front.composite_code, "Work front created");
        Ok(front)
    }

    /// Replaces a work front's fields, rebuilding its code, and records an
    /// `updated` audit entry.
    pub fn update(
        &self,
        id: i64,
        input: &WorkFrontInput,
        actor: &Actor,
    ) -> Result<WorkFront, ServiceError> {
        let _span = info_span!("work_front.update", work_front_id = id).entered();
        let input = validate_input(input)?;

        let front = retry_on_conflict("work_front.update", self.max_attempts, || {
            self.db.with_transaction(|tx| {
                let before = active_front(tx, id)?;
                let composite_code = front_code_for(
                    tx,
                    &input.seam,
                    input.street.as_deref(),
                    input.strand.as_deref(),
                    input.front_number.as_deref(),
                    input.front_type_id,
                )?;
                ensure_code_available(tx, &composite_code, Some(id))?;

                let now = columns::now();
                let after = WorkFront {
                    seam: input.seam.clone(),
                    street: input.street.clone(),
                    strand: input.strand.clone(),
                    front_number: input.front_number.clone(),
                    front_type_id: input.front_type_id,
                    composite_code,
                    site_id: input.site_id,
                    status: input.status.unwrap_or(before.status),
                    updated_at: now,
                    ..before.clone()
                };
                work_front_repo::update(tx, &after)?;
                record_audit(
                    tx,
                    &after,
                    AuditAction::Updated,
                    actor,
                    Some(&before),
                    Some(&after),
                    None,
                    now,
                )?;
                Ok(after)
            })
        })?;

        info!(work_front_id = id, composite_code = %front.composite_code, "Work front updated");
        Ok(front)
    }

    /// Marks a work front deleted. The deletion reason becomes the audit note.
    pub fn soft_delete(
        &self,
        id: i64,
        actor: &Actor,
        reason: Option<&str>,
    ) -> Result<WorkFront, ServiceError> {
        let _span = info_span!("work_front.soft_delete", work_front_id = id).entered();
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        let front = self.db.with_transaction(|tx| {
            let before = active_front(tx, id)?;
            let now = columns::now();
            let deleted = WorkFront {
                deleted_at: Some(now),
                deleted_by: Some(actor.name.clone()),
                deletion_reason: reason.clone(),
                updated_at: now,
                ..before.clone()
            };
            work_front_repo::update(tx, &deleted)?;
            record_audit(
                tx,
                &deleted,
                AuditAction::Deleted,
                actor,
                Some(&before),
                None,
                reason.clone(),
                now,
            )?;
            Ok::<_, ServiceError>(deleted)
        })?;

        info!(work_front_id = id, "Work front soft-deleted");
        Ok(front)
    }

    /// Brings a soft-deleted work front back.
    ///
    /// Fails with [`ServiceError::DuplicateCode`] when an active front has
    /// taken its code in the meantime.
    pub fn restore(&self, id: i64, actor: &Actor) -> Result<WorkFront, ServiceError> {
        let _span = info_span!("work_front.restore", work_front_id = id).entered();

        let front = retry_on_conflict("work_front.restore", self.max_attempts, || {
            self.db.with_transaction(|tx| {
                let before = deleted_front(tx, id)?;
                ensure_code_available(tx, &before.composite_code, Some(id))?;

                let now = columns::now();
                let restored = WorkFront {
                    deleted_at: None,
                    deleted_by: None,
                    deletion_reason: None,
                    updated_at: now,
                    ..before.clone()
                };
                work_front_repo::update(tx, &restored)?;
                record_audit(
                    tx,
                    &restored,
                    AuditAction::Restored,
                    actor,
                    Some(&before),
                    Some(&restored),
                    None,
                    now,
                )?;
                Ok(restored)
            })
        })?;

        info!(work_front_id = id, composite_code = %front.composite_code, "Work front restored");
        Ok(front)
    }

    /// Permanently removes a soft-deleted work front with its audit trail
    /// and samples. Active fronts are reported as not found.
    pub fn force_delete(&self, id: i64) -> Result<(), ServiceError> {
        let _span = info_span!("work_front.force_delete", work_front_id = id).entered();
        self.db.with_transaction(|tx| {
            deleted_front(tx, id)?;
            work_front_repo::delete(tx, id)?;
            Ok::<_, ServiceError>(())
        })?;
        info!(work_front_id = id, "Work front permanently deleted");
        Ok(())
    }

    /// Returns an active (not soft-deleted) work front.
    pub fn get(&self, id: i64) -> Result<WorkFront, ServiceError> {
        self.db.with_conn(|conn| work_front_repo::find_by_id(conn, id))?
            .filter(|f| !f.is_deleted())
            .ok_or_else(|| ServiceError::not_found("Work front", id))
    }

    pub fn list(&self, filter: &WorkFrontFilter) -> Result<(Vec<WorkFront>, u64), ServiceError> {
        Ok(self
            .db
            .with_conn(|conn| work_front_repo::query(conn, filter))?)
    }

    pub fn list_trashed(&self) -> Result<Vec<WorkFront>, ServiceError> {
        Ok(self.db.with_conn(work_front_repo::list_trashed)?)
    }

    /// Returns a work front's audit entries, newest first, with field diffs.
    /// Soft-deleted fronts keep their history.
    pub fn list_history(&self, id: i64) -> Result<Vec<HistoryItem>, ServiceError> {
        let entries = self.db.with_conn(|conn| {
            Ok(match work_front_repo::find_by_id(conn, id)? {
                Some(_) => Some(audit_repo::list_for_work_front(conn, id)?),
                None => None,
            })
        })?;
        let entries = entries.ok_or_else(|| ServiceError::not_found("Work front", id))?;
        debug!(work_front_id = id, entries = entries.len(), "Loaded work front history");
        Ok(entries.into_iter().map(HistoryItem::from).collect())
    }
}

fn validate_input(input: &WorkFrontInput) -> Result<WorkFrontInput, ServiceError> {
    let input = input.normalized();
    required_text("seam", &input.seam, MAX_SEAM_LEN)?;
    max_length("street", input.street.as_deref(), MAX_STREET_LEN)?;
    max_length("strand", input.strand.as_deref(), MAX_STRAND_LEN)?;
    max_length("frontNumber", input.front_number.as_deref(), MAX_FRONT_NUMBER_LEN)?;
    if input.front_type_id <= 0 {
        return Err(ServiceError::validation("frontTypeId", "is required"));
    }
    Ok(input)
}

pub(super) fn active_front(conn: &Connection, id: i64) -> Result<WorkFront, ServiceError> {
    work_front_repo::find_by_id(conn, id)?
        .filter(|f| !f.is_deleted())
        .ok_or_else(|| ServiceError::not_found("Work front", id))
}

fn deleted_front(conn: &Connection, id: i64) -> Result<WorkFront, ServiceError> {
    work_front_repo::find_by_id(conn, id)?
        .filter(WorkFront::is_deleted)
        .ok_or_else(|| ServiceError::not_found("Deleted work front", id))
}

/// Builds a front's code from its segments and its type's abbreviation.
fn front_code_for(
    conn: &Connection,
    seam: &str,
    street: Option<&str>,
    strand: Option<&str>,
    front_number: Option<&str>,
    front_type_id: i64,
) -> Result<String, ServiceError> {
    let front_type = front_type_repo::find_by_id(conn, front_type_id)?
        .ok_or_else(|| ServiceError::not_found("Front type", front_type_id))?;
    Ok(build_front_code(
        seam,
        street,
        strand,
        front_number,
        Some(&front_type.abbreviation),
    ))
}

/// Fails when an active front other than `excluding_id` holds `code`.
///
/// The partial unique index on `work_fronts` is the authoritative guard;
/// this check turns the common case into a readable error.
pub(super) fn ensure_code_available(
    conn: &Connection,
    code: &str,
    excluding_id: Option<i64>,
) -> Result<(), ServiceError> {
    match work_front_repo::find_active_code_holder(conn, code, excluding_id)? {
        Some(holder) => {
            debug!(composite_code = %code, holder, "Work front code already in use");
            Err(ServiceError::DuplicateCode(code.to_string()))
        }
        None => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
pub(super) fn record_audit(
    conn: &Connection,
    front: &WorkFront,
    action: AuditAction,
    actor: &Actor,
    before: Option<&WorkFront>,
    after: Option<&WorkFront>,
    note: Option<String>,
    timestamp: DateTime<Utc>,
) -> Result<i64, ServiceError> {
    let note = note.unwrap_or_else(|| action.default_note().to_string());
    Ok(audit_repo::insert(
        conn,
        &NewAuditEntry {
            work_front_id: front.id,
            action,
            actor: &actor.name,
            before,
            after,
            note: Some(note),
            timestamp,
        },
    )?)
}

pub(super) fn rebuild_code(
    conn: &Connection,
    front: &WorkFront,
) -> Result<Option<String>, ServiceError> {
    if front.seam.trim().is_empty() {
        return Ok(None);
    }
    Ok(front_type_repo::find_by_id(conn, front.front_type_id)?.map(|front_type| {
        build_front_code(
            &front.seam,
            front.street.as_deref(),
            front.strand.as_deref(),
            front.front_number.as_deref(),
            Some(&front_type.abbreviation),
        )
    }))
}
