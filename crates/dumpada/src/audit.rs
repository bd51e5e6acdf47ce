//! Append-only audit trail for work front mutations.
//!
//! Snapshots are full [`WorkFront`] values stored as JSON. The set of fields
//! compared by [`field_diffs`] is the explicit [`SnapshotField::ALL`] list,
//! so a new work front column is only diffed once it is added there.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::work_front::WorkFront;

/// Full state of a work front at one point in time.
pub type WorkFrontSnapshot = WorkFront;

/// Kind of mutation recorded by an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    Restored,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "created",
            AuditAction::Updated => "updated",
            AuditAction::Deleted => "deleted",
            AuditAction::Restored => "restored",
        }
    }

    /// Note recorded when the operation supplies none.
    pub fn default_note(&self) -> &'static str {
        match self {
            AuditAction::Created => "Work front created",
            AuditAction::Updated => "Work front updated",
            AuditAction::Deleted => "Work front deleted (soft delete)",
            AuditAction::Restored => "Work front restored",
        }
    }
}

impl std::str::FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(AuditAction::Created),
            "updated" => Ok(AuditAction::Updated),
            "deleted" => Ok(AuditAction::Deleted),
            "restored" => Ok(AuditAction::Restored),
            _ => Err(format!("Unknown audit action: {}", s)),
        }
    }
}

/// A snapshot field, named as it appears in the serialized snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SnapshotField {
    Id,
    Seam,
    Street,
    Strand,
    FrontNumber,
    FrontTypeId,
    CompositeCode,
    SiteId,
    Status,
    DeletedAt,
    DeletedBy,
    DeletionReason,
    CreatedAt,
    UpdatedAt,
}

impl SnapshotField {
    pub const ALL: [SnapshotField; 14] = [
        SnapshotField::Id,
        SnapshotField::Seam,
        SnapshotField::Street,
        SnapshotField::Strand,
        SnapshotField::FrontNumber,
        SnapshotField::FrontTypeId,
        SnapshotField::CompositeCode,
        SnapshotField::SiteId,
        SnapshotField::Status,
        SnapshotField::DeletedAt,
        SnapshotField::DeletedBy,
        SnapshotField::DeletionReason,
        SnapshotField::CreatedAt,
        SnapshotField::UpdatedAt,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SnapshotField::Id => "id",
            SnapshotField::Seam => "seam",
            SnapshotField::Street => "street",
            SnapshotField::Strand => "strand",
            SnapshotField::FrontNumber => "frontNumber",
            SnapshotField::FrontTypeId => "frontTypeId",
            SnapshotField::CompositeCode => "compositeCode",
            SnapshotField::SiteId => "siteId",
            SnapshotField::Status => "status",
            SnapshotField::DeletedAt => "deletedAt",
            SnapshotField::DeletedBy => "deletedBy",
            SnapshotField::DeletionReason => "deletionReason",
            SnapshotField::CreatedAt => "createdAt",
            SnapshotField::UpdatedAt => "updatedAt",
        }
    }

    /// Reads this field out of a snapshot.
    pub fn value_in(&self, snapshot: &WorkFrontSnapshot) -> SnapshotValue {
        fn text(v: &Option<String>) -> SnapshotValue {
            v.clone().map_or(SnapshotValue::Null, SnapshotValue::Text)
        }
        match self {
            SnapshotField::Id => SnapshotValue::Integer(snapshot.id),
            SnapshotField::Seam => SnapshotValue::Text(snapshot.seam.clone()),
            SnapshotField::Street => text(&snapshot.street),
            SnapshotField::Strand => text(&snapshot.strand),
            SnapshotField::FrontNumber => text(&snapshot.front_number),
            SnapshotField::FrontTypeId => SnapshotValue::Integer(snapshot.front_type_id),
            SnapshotField::CompositeCode => SnapshotValue::Text(snapshot.composite_code.clone()),
            SnapshotField::SiteId => snapshot
                .site_id
                .map_or(SnapshotValue::Null, SnapshotValue::Integer),
            SnapshotField::Status => SnapshotValue::Text(snapshot.status.as_str().to_string()),
            SnapshotField::DeletedAt => snapshot
                .deleted_at
                .map_or(SnapshotValue::Null, SnapshotValue::Timestamp),
            SnapshotField::DeletedBy => text(&snapshot.deleted_by),
            SnapshotField::DeletionReason => text(&snapshot.deletion_reason),
            SnapshotField::CreatedAt => SnapshotValue::Timestamp(snapshot.created_at),
            SnapshotField::UpdatedAt => SnapshotValue::Timestamp(snapshot.updated_at),
        }
    }
}

/// A single snapshot value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SnapshotValue {
    Null,
    Text(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
}

/// One changed field between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiff {
    pub field: SnapshotField,
    pub before: SnapshotValue,
    pub after: SnapshotValue,
}

/// Lists every field whose value differs between `before` and `after`.
///
/// A missing side reads as all-null, so a creation lists every non-null
/// field of the new state.
pub fn field_diffs(
    before: Option<&WorkFrontSnapshot>,
    after: Option<&WorkFrontSnapshot>,
) -> Vec<FieldDiff> {
    let read = |snapshot: Option<&WorkFrontSnapshot>, field: SnapshotField| {
        snapshot.map_or(SnapshotValue::Null, |s| field.value_in(s))
    };
    SnapshotField::ALL
        .iter()
        .filter_map(|&field| {
            let before = read(before, field);
            let after = read(after, field);
            (before != after).then_some(FieldDiff {
                field,
                before,
                after,
            })
        })
        .collect()
}

/// An immutable record of one work front mutation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: i64,
    pub work_front_id: i64,
    pub action: AuditAction,
    pub actor: String,
    pub before: Option<WorkFrontSnapshot>,
    pub after: Option<WorkFrontSnapshot>,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn field_diffs(&self) -> Vec<FieldDiff> {
        field_diffs(self.before.as_ref(), self.after.as_ref())
    }
}

/// An audit entry about to be written.
#[derive(Debug, Clone)]
pub struct NewAuditEntry<'a> {
    pub work_front_id: i64,
    pub action: AuditAction,
    pub actor: &'a str,
    pub before: Option<&'a WorkFrontSnapshot>,
    pub after: Option<&'a WorkFrontSnapshot>,
    pub note: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// An audit entry together with its computed field diffs, for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    #[serde(flatten)]
    pub entry: AuditEntry,
    pub field_diffs: Vec<FieldDiff>,
}

impl From<AuditEntry> for HistoryItem {
    fn from(entry: AuditEntry) -> Self {
        let field_diffs = entry.field_diffs();
        Self { entry, field_diffs }
    }
}
