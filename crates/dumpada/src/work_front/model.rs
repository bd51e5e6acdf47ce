use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operational status of a work front, independent of soft deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkFrontStatus {
    #[default]
    Active,
    Inactive,
}

impl WorkFrontStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkFrontStatus::Active => "active",
            WorkFrontStatus::Inactive => "inactive",
        }
    }
}

impl std::str::FromStr for WorkFrontStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(WorkFrontStatus::Active),
            "inactive" => Ok(WorkFrontStatus::Inactive),
            _ => Err(format!("Unknown work front status: {}", s)),
        }
    }
}

/// A mining work location ("frente de trabajo").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkFront {
    pub id: i64,
    pub seam: String,
    pub street: Option<String>,
    pub strand: Option<String>,
    pub front_number: Option<String>,
    pub front_type_id: i64,
    pub composite_code: String,
    pub site_id: Option<i64>,
    pub status: WorkFrontStatus,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<String>,
    pub deletion_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkFront {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Form input for creating or updating a work front.
///
/// Segments are trimmed and blank optional segments are stored as absent.
/// On update every field replaces the stored one, except `status`, which
/// keeps the current value when `None`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkFrontInput {
    pub seam: String,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub strand: Option<String>,
    #[serde(default)]
    pub front_number: Option<String>,
    pub front_type_id: i64,
    #[serde(default)]
    pub site_id: Option<i64>,
    #[serde(default)]
    pub status: Option<WorkFrontStatus>,
}

impl WorkFrontInput {
    pub fn new(seam: &str, front_type_id: i64) -> Self {
        Self {
            seam: seam.to_string(),
            front_type_id,
            ..Default::default()
        }
    }

    /// Returns a copy with every text segment trimmed and blanks removed.
    pub(crate) fn normalized(&self) -> Self {
        Self {
            seam: self.seam.trim().to_string(),
            street: clean_segment(self.street.as_deref()),
            strand: clean_segment(self.strand.as_deref()),
            front_number: clean_segment(self.front_number.as_deref()),
            front_type_id: self.front_type_id,
            site_id: self.site_id,
            status: self.status,
        }
    }
}

pub(crate) fn clean_segment(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Query filter parameters for work front listing.
#[derive(Debug, Default, Clone)]
pub struct WorkFrontFilter {
    /// Substring match on code, seam, street, strand or front number.
    pub search: Option<String>,
    pub front_type_id: Option<i64>,
    /// Substring match on seam.
    pub seam: Option<String>,
    pub site_id: Option<i64>,
    pub status: Option<WorkFrontStatus>,
    /// Only fronts with `status = active`.
    pub only_active: bool,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}
