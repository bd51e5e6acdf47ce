//! Sample record ("dumpada") types and the status rule.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Work shift during which a sample was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shift {
    #[serde(rename = "AM")]
    Am,
    #[serde(rename = "PM")]
    Pm,
    Madrugada,
    Noche,
}

impl Shift {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Am => "AM",
            Shift::Pm => "PM",
            Shift::Madrugada => "Madrugada",
            Shift::Noche => "Noche",
        }
    }

    pub fn all() -> &'static [Shift] {
        &[Shift::Am, Shift::Pm, Shift::Madrugada, Shift::Noche]
    }
}

impl std::fmt::Display for Shift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Shift {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shift::all()
            .iter()
            .copied()
            .find(|shift| shift.as_str() == s.trim())
            .ok_or_else(|| {
                ServiceError::validation("shift", format!("'{}' is not one of AM, PM, Madrugada, Noche", s))
            })
    }
}

/// Lifecycle status of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleStatus {
    /// Registered in the field, lab results pending.
    Registered,
    /// Some, but not all, lab results recorded. Only produced by
    /// [`StatusPolicy::Ternary`].
    InAnalysis,
    /// Grade, copper-cup grade and certificate all recorded.
    Completed,
}

impl SampleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleStatus::Registered => "Registered",
            SampleStatus::InAnalysis => "InAnalysis",
            SampleStatus::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SampleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Registered" => Ok(SampleStatus::Registered),
            "InAnalysis" => Ok(SampleStatus::InAnalysis),
            "Completed" => Ok(SampleStatus::Completed),
            _ => Err(format!("Unknown sample status: {}", s)),
        }
    }
}

/// The three laboratory results that drive a sample's status.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabResults<'a> {
    pub grade: Option<Decimal>,
    pub grade_copper_cup: Option<Decimal>,
    pub certificate_id: Option<&'a str>,
}

impl LabResults<'_> {
    /// Number of results present. A blank certificate counts as absent.
    pub fn present_count(&self) -> usize {
        [
            self.grade.is_some(),
            self.grade_copper_cup.is_some(),
            self.certificate_id.is_some_and(|c| !c.trim().is_empty()),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

/// Rule mapping lab results to a [`SampleStatus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPolicy {
    /// `Completed` with all three results, `Registered` otherwise.
    #[default]
    Binary,
    /// Like `Binary`, but partial results give `InAnalysis`.
    Ternary,
}

impl StatusPolicy {
    pub fn derive(&self, results: &LabResults<'_>) -> SampleStatus {
        match (self, results.present_count()) {
            (_, 3) => SampleStatus::Completed,
            (StatusPolicy::Ternary, 1..=2) => SampleStatus::InAnalysis,
            _ => SampleStatus::Registered,
        }
    }
}

/// A persisted sample, with the owning work front's code attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    pub id: i64,
    pub work_front_id: i64,
    pub work_front_code: String,
    pub sequence_number: i64,
    pub composite_code: String,
    pub shift: Shift,
    pub date: NaiveDate,
    pub tons: Option<Decimal>,
    pub grade: Option<Decimal>,
    pub grade_copper_cup: Option<Decimal>,
    pub certificate_id: Option<String>,
    pub visual_grade_estimate: Option<String>,
    pub range_label: Option<String>,
    pub status: SampleStatus,
    pub created_by: Option<String>,
    pub site_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SampleRecord {
    pub fn lab_results(&self) -> LabResults<'_> {
        LabResults {
            grade: self.grade,
            grade_copper_cup: self.grade_copper_cup,
            certificate_id: self.certificate_id.as_deref(),
        }
    }
}

/// Input for registering a new sample.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSample {
    pub work_front_id: i64,
    pub shift: Shift,
    /// `DD-MM-YYYY` or ISO; today when absent.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub tons: Option<Decimal>,
    #[serde(default)]
    pub grade: Option<Decimal>,
    #[serde(default)]
    pub grade_copper_cup: Option<Decimal>,
    #[serde(default)]
    pub certificate_id: Option<String>,
    #[serde(default)]
    pub visual_grade_estimate: Option<String>,
}

impl NewSample {
    pub fn new(work_front_id: i64, shift: Shift) -> Self {
        Self {
            work_front_id,
            shift,
            date: None,
            tons: None,
            grade: None,
            grade_copper_cup: None,
            certificate_id: None,
            visual_grade_estimate: None,
        }
    }
}

/// Changes to an existing sample. `None` keeps the stored value.
///
/// The two free-text fields differ from the rest: a blank string is an
/// explicit clear, not a no-op.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleUpdate {
    #[serde(default)]
    pub work_front_id: Option<i64>,
    #[serde(default)]
    pub shift: Option<Shift>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub tons: Option<Decimal>,
    #[serde(default)]
    pub grade: Option<Decimal>,
    #[serde(default)]
    pub grade_copper_cup: Option<Decimal>,
    /// `Some("")` (or whitespace) clears the stored certificate; `None`
    /// keeps it.
    #[serde(default)]
    pub certificate_id: Option<String>,
    /// Same rule as `certificate_id`: blank clears, `None` keeps.
    #[serde(default)]
    pub visual_grade_estimate: Option<String>,
}

/// Result of previewing the next sample code. Nothing is reserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodePreview {
    pub sequence_number: i64,
    pub composite_code: String,
    pub work_front_code: String,
    pub shift: Shift,
    pub date: NaiveDate,
}

/// Query filter parameters for sample listing.
#[derive(Debug, Default, Clone)]
pub struct SampleFilter {
    /// Substring match on composite code, certificate or sequence number.
    pub search: Option<String>,
    pub status: Option<SampleStatus>,
    pub shift: Option<Shift>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub work_front_id: Option<i64>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}
