//! Reverting a work front to the state recorded before an audit entry.
//!
//! A revert is an ordinary `updated` mutation: it writes its own audit entry
//! and can itself be reverted. Reverting twice in a row therefore returns the
//! front to where it was before the first revert.

use tracing::{info, info_span, warn};

use super::manager::{active_front, ensure_code_available, rebuild_code, record_audit};
use super::model::WorkFront;
use super::WorkFrontManager;
use crate::actor::Actor;
use crate::audit::{AuditAction, WorkFrontSnapshot};
use crate::db::{audit_repo, columns, work_front_repo};
use crate::error::ServiceError;
use crate::retry::retry_on_conflict;

/// The identity fields a revert restores. Status, site and soft-delete
/// fields are left as they are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertFields {
    pub seam: String,
    pub street: Option<String>,
    pub strand: Option<String>,
    pub front_number: Option<String>,
    pub front_type_id: i64,
}

/// Merges the identity fields of `target` over `current`.
///
/// Optional segments are taken verbatim, absent ones included, so a segment
/// added after the target state is removed again. A blank seam in the target
/// keeps the current seam.
pub fn merge_revert_fields(current: &WorkFront, target: &WorkFrontSnapshot) -> RevertFields {
    let seam = if target.seam.trim().is_empty() {
        current.seam.clone()
    } else {
        target.seam.clone()
    };
    RevertFields {
        seam,
        street: target.street.clone(),
        strand: target.strand.clone(),
        front_number: target.front_number.clone(),
        front_type_id: target.front_type_id,
    }
}

impl WorkFrontManager {
    /// Restores the identity fields recorded in the `before` snapshot of
    /// audit entry `audit_id`.
    ///
    /// The code is rebuilt from the merged segments. When the target's front
    /// type no longer exists the current type is kept and the code is built
    /// with it. The resulting code must not be held by another active front.
    pub fn revert(
        &self,
        work_front_id: i64,
        audit_id: i64,
        actor: &Actor,
    ) -> Result<WorkFront, ServiceError> {
        let _span = info_span!("work_front.revert", work_front_id, audit_id).entered();

        let front = retry_on_conflict("work_front.revert", self.max_attempts, || {
            self.db.with_transaction(|tx| {
                let current = active_front(tx, work_front_id)?;
                let target = audit_repo::find_by_id(tx, audit_id)?
                    .ok_or_else(|| ServiceError::not_found("Audit entry", audit_id))?;
                if target.work_front_id != work_front_id {
                    return Err(ServiceError::Mismatch {
                        audit_id,
                        work_front_id,
                    });
                }
                let prior = target
                    .before
                    .as_ref()
                    .ok_or(ServiceError::NoPriorState(audit_id))?;

                let fields = merge_revert_fields(&current, prior);
                let now = columns::now();
                let mut reverted = WorkFront {
                    seam: fields.seam,
                    street: fields.street,
                    strand: fields.strand,
                    front_number: fields.front_number,
                    front_type_id: fields.front_type_id,
                    updated_at: now,
                    ..current.clone()
                };
                let code = match rebuild_code(tx, &reverted)? {
                    Some(code) => Some(code),
                    None => {
                        warn!(
                            front_type_id = reverted.front_type_id,
                            "Front type no longer resolvable, keeping current type"
                        );
                        reverted.front_type_id = current.front_type_id;
                        rebuild_code(tx, &reverted)?
                    }
                };
                if let Some(code) = code {
                    reverted.composite_code = code;
                }
                ensure_code_available(tx, &reverted.composite_code, Some(work_front_id))?;

                work_front_repo::update(tx, &reverted)?;
                let note = format!(
                    "Reverted to state of {}",
                    target.timestamp.format("%d/%m/%Y %H:%M")
                );
                record_audit(
                    tx,
                    &reverted,
                    AuditAction::Updated,
                    actor,
                    Some(&current),
                    Some(&reverted),
                    Some(note),
                    now,
                )?;
                Ok(reverted)
            })
        })?;

        info!(
            work_front_id,
            audit_id,
            composite_code = %front.composite_code,
            "Work front reverted"
        );
        Ok(front)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::front_type::{FrontTypeInput, FrontTypeManager};
    use crate::work_front::{WorkFrontInput, WorkFrontStatus};
    use chrono::Utc;

    fn front(seam: &str, strand: Option<&str>, front_type_id: i64) -> WorkFront {
        let now = Utc::now();
        WorkFront {
            id: 1,
            seam: seam.into(),
            street: None,
            strand: strand.map(String::from),
            front_number: Some("7".into()),
            front_type_id,
            composite_code: "X".into(),
            site_id: Some(3),
            status: WorkFrontStatus::Inactive,
            deleted_at: None,
            deleted_by: None,
            deletion_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_merge_takes_target_identity() {
        let current = front("M6", Some("2B"), 2);
        let target = front("M5", None, 1);
        let merged = merge_revert_fields(&current, &target);
        assert_eq!(merged.seam, "M5");
        assert_eq!(merged.strand, None);
        assert_eq!(merged.front_type_id, 1);
    }

    #[test]
    fn test_merge_keeps_current_seam_when_target_blank() {
        let current = front("M6", None, 2);
        let target = front("  ", None, 2);
        assert_eq!(merge_revert_fields(&current, &target).seam, "M6");
    }

    fn manager() -> WorkFrontManager {
        WorkFrontManager::new(Database::open_in_memory().unwrap(), 3)
    }

    fn input(seam: &str, strand: Option<&str>) -> WorkFrontInput {
        WorkFrontInput {
            street: Some("-1SH".into()),
            strand: strand.map(String::from),
            front_number: Some("7".into()),
            ..WorkFrontInput::new(seam, 1)
        }
    }

    #[test]
    fn test_revert_update() {
        let m = manager();
        let actor = Actor::system();
        let original = m.create(&input("M5", None), &actor).unwrap();
        m.update(original.id, &input("M6", Some("1A")), &actor).unwrap();

        let history = m.list_history(original.id).unwrap();
        let update_entry = history[0].entry.id;
        let reverted = m.revert(original.id, update_entry, &actor).unwrap();
        assert_eq!(reverted.seam, "M5");
        assert_eq!(reverted.strand, None);
        assert_eq!(reverted.composite_code, "M5-1SHLEV7");

        let history = m.list_history(original.id).unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].entry.action, AuditAction::Updated);
        assert!(history[0]
            .entry
            .note
            .as_deref()
            .unwrap()
            .starts_with("Reverted to state of "));
    }

    #[test]
    fn test_double_revert_restores_pre_revert_state() {
        let m = manager();
        let actor = Actor::system();
        let created = m.create(&input("M5", None), &actor).unwrap();
        let updated = m.update(created.id, &input("M6", Some("1A")), &actor).unwrap();

        let first_target = m.list_history(created.id).unwrap()[0].entry.id;
        m.revert(created.id, first_target, &actor).unwrap();

        let revert_entry = m.list_history(created.id).unwrap()[0].entry.id;
        let back = m.revert(created.id, revert_entry, &actor).unwrap();

        assert_eq!(back.seam, updated.seam);
        assert_eq!(back.strand, updated.strand);
        assert_eq!(back.front_type_id, updated.front_type_id);
        assert_eq!(back.composite_code, updated.composite_code);
    }

    #[test]
    fn test_revert_created_entry_has_no_prior_state() {
        let m = manager();
        let created = m.create(&input("M5", None), &Actor::system()).unwrap();
        let entry = m.list_history(created.id).unwrap()[0].entry.id;
        assert!(matches!(
            m.revert(created.id, entry, &Actor::system()),
            Err(ServiceError::NoPriorState(id)) if id == entry
        ));
    }

    #[test]
    fn test_revert_rejects_foreign_and_missing_entries() {
        let m = manager();
        let a = m.create(&input("M5", None), &Actor::system()).unwrap();
        let b = m.create(&input("M7", None), &Actor::system()).unwrap();
        let entry_of_b = m.list_history(b.id).unwrap()[0].entry.id;

        assert!(matches!(
            m.revert(a.id, entry_of_b, &Actor::system()),
            Err(ServiceError::Mismatch { .. })
        ));
        assert!(matches!(
            m.revert(a.id, 9_999, &Actor::system()),
            Err(ServiceError::NotFound {
                entity: "Audit entry",
                ..
            })
        ));
    }

    #[test]
    fn test_revert_reenforces_uniqueness() {
        let m = manager();
        let actor = Actor::system();
        let front = m.create(&input("M5", None), &actor).unwrap();
        m.update(front.id, &input("M6", None), &actor).unwrap();
        let target = m.list_history(front.id).unwrap()[0].entry.id;

        // Another front takes the old code.
        m.create(&input("M5", None), &actor).unwrap();

        assert!(matches!(
            m.revert(front.id, target, &actor),
            Err(ServiceError::DuplicateCode(code)) if code == "M5-1SHLEV7"
        ));
        assert_eq!(m.get(front.id).unwrap().seam, "M6");
    }

    #[test]
    fn test_revert_keeps_status_and_site() {
        let m = manager();
        let actor = Actor::system();
        let mut first = input("M5", None);
        first.site_id = Some(1);
        let front = m.create(&first, &actor).unwrap();

        let mut second = input("M6", None);
        second.site_id = Some(2);
        second.status = Some(WorkFrontStatus::Inactive);
        m.update(front.id, &second, &actor).unwrap();

        let target = m.list_history(front.id).unwrap()[0].entry.id;
        let reverted = m.revert(front.id, target, &actor).unwrap();
        assert_eq!(reverted.seam, "M5");
        assert_eq!(reverted.site_id, Some(2));
        assert_eq!(reverted.status, WorkFrontStatus::Inactive);
    }

    #[test]
    fn test_revert_to_deleted_front_type_keeps_current_type() {
        let m = manager();
        let types = FrontTypeManager::new(m.db.clone(), 3);
        let actor = Actor::system();
        let temporary = types.create(&FrontTypeInput::new("Temporal", "TMP")).unwrap();

        let created = m
            .create(
                &WorkFrontInput {
                    street: Some("C1".into()),
                    front_number: Some("4".into()),
                    ..WorkFrontInput::new("M5", temporary.id)
                },
                &actor,
            )
            .unwrap();
        assert_eq!(created.composite_code, "M5C1TMP4");

        let updated = m.update(created.id, &WorkFrontInput::new("M5", 1), &actor).unwrap();
        assert_eq!(updated.composite_code, "M5LEV");
        types.delete(temporary.id).unwrap();

        let target = m.list_history(created.id).unwrap()[0].entry.id;
        let reverted = m.revert(created.id, target, &actor).unwrap();
        assert_eq!(reverted.front_type_id, 1);
        assert_eq!(reverted.street.as_deref(), Some("C1"));
        assert_eq!(reverted.front_number.as_deref(), Some("4"));
        assert_eq!(reverted.composite_code, "M5C1LEV4");
        assert_eq!(m.get(created.id).unwrap(), reverted);
    }
}
