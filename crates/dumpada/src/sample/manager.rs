//! Sample registration, update and lab completion.

use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::{debug, info, info_span};

use super::model::{
    CodePreview, LabResults, NewSample, SampleFilter, SampleRecord, SampleUpdate, Shift,
    StatusPolicy,
};
use crate::actor::Actor;
use crate::codes::build_sample_code;
use crate::dates::{normalize_sample_date, parse_sample_date};
use crate::db::{columns, sample_repo, sequence_repo, work_front_repo, Database};
use crate::error::ServiceError;
use crate::ranges::RangeTable;
use crate::retry::retry_on_conflict;
use crate::validation::{max_length, non_negative_decimal};
use crate::work_front::{clean_segment, WorkFront};

const MAX_CERTIFICATE_LEN: usize = 100;
const MAX_VISUAL_ESTIMATE_LEN: usize = 100;

/// Default number of attempts for writes racing on a unique guard.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Owns the sample lifecycle: sequence allocation, code assembly, range
/// lookup and status derivation.
pub struct SampleManager {
    db: Database,
    ranges: Arc<RangeTable>,
    policy: StatusPolicy,
    max_attempts: u32,
}

impl SampleManager {
    pub fn new(db: Database, ranges: Arc<RangeTable>) -> Self {
        Self {
            db,
            ranges,
            policy: StatusPolicy::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_policy(mut self, policy: StatusPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn policy(&self) -> StatusPolicy {
        self.policy
    }

    /// Registers a new sample under the next global sequence number.
    pub fn create(&self, input: &NewSample, actor: &Actor) -> Result<SampleRecord, ServiceError> {
        let _span = info_span!("sample.create", work_front_id = input.work_front_id).entered();

        validate_measurements(input.tons, input.grade, input.grade_copper_cup)?;
        let certificate_id = clean_text(
            "certificateId",
            input.certificate_id.as_deref(),
            MAX_CERTIFICATE_LEN,
        )?;
        let visual_grade_estimate = clean_text(
            "visualGradeEstimate",
            input.visual_grade_estimate.as_deref(),
            MAX_VISUAL_ESTIMATE_LEN,
        )?;
        let date = normalize_sample_date(input.date.as_deref())?;
        let range_label = self.range_label(input.grade);
        let status = self.policy.derive(&LabResults {
            grade: input.grade,
            grade_copper_cup: input.grade_copper_cup,
            certificate_id: certificate_id.as_deref(),
        });

        let record = retry_on_conflict("sample.create", self.max_attempts, || {
            self.db.with_transaction(|tx| {
                let front = active_front(tx, input.work_front_id)?;
                let sequence_number = sequence_repo::allocate_next(tx)?;
                let now = columns::now();
                let mut record = SampleRecord {
                    id: 0,
                    work_front_id: front.id,
                    work_front_code: front.composite_code.clone(),
                    sequence_number,
                    composite_code: build_sample_code(
                        &front.composite_code,
                        input.shift,
                        sequence_number,
                        Some(date),
                    ),
                    shift: input.shift,
                    date,
                    tons: input.tons,
                    grade: input.grade,
                    grade_copper_cup: input.grade_copper_cup,
                    certificate_id: certificate_id.clone(),
                    visual_grade_estimate: visual_grade_estimate.clone(),
                    range_label: range_label.clone(),
                    status,
                    created_by: Some(actor.name.clone()),
                    site_id: front.site_id.or(actor.site_id),
                    created_at: now,
                    updated_at: now,
                };
                record.id = sample_repo::insert(tx, &record)?;
                Ok(record)
            })
        })?;

        info!(
            sample_id = record.id,
            sequence_number = record.sequence_number,
            composite_code = %record.composite_code,
            status = %record.status,
            "Sample registered"
        );
        Ok(record)
    }

    /// Applies `input` over the stored sample.
    ///
    /// The composite code is rebuilt only when the work front, shift or date
    /// changes, and always keeps the original sequence number. A blank
    /// certificate or visual estimate clears the stored value.
    pub fn update(&self, id: i64, input: &SampleUpdate) -> Result<SampleRecord, ServiceError> {
        let _span = info_span!("sample.update", sample_id = id).entered();

        validate_measurements(input.tons, input.grade, input.grade_copper_cup)?;
        let certificate_id = input
            .certificate_id
            .as_deref()
            .map(|c| clean_text("certificateId", Some(c), MAX_CERTIFICATE_LEN))
            .transpose()?;
        let visual_grade_estimate = input
            .visual_grade_estimate
            .as_deref()
            .map(|v| clean_text("visualGradeEstimate", Some(v), MAX_VISUAL_ESTIMATE_LEN))
            .transpose()?;
        let date = input
            .date
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(parse_sample_date)
            .transpose()?;

        let record = retry_on_conflict("sample.update", self.max_attempts, || {
            self.db.with_transaction(|tx| {
                let existing = sample_repo::find_by_id(tx, id)?
                    .ok_or_else(|| ServiceError::not_found("Sample", id))?;

                let mut record = existing.clone();
                if let Some(work_front_id) = input.work_front_id {
                    if work_front_id != existing.work_front_id {
                        let front = active_front(tx, work_front_id)?;
                        record.work_front_id = front.id;
                        record.work_front_code = front.composite_code;
                    }
                }
                record.shift = input.shift.unwrap_or(existing.shift);
                record.date = date.unwrap_or(existing.date);

                if identity_changed(&existing, record.work_front_id, record.shift, record.date) {
                    record.composite_code = build_sample_code(
                        &record.work_front_code,
                        record.shift,
                        existing.sequence_number,
                        Some(record.date),
                    );
                    debug!(composite_code = %record.composite_code, "Sample code regenerated");
                }

                if input.tons.is_some() {
                    record.tons = input.tons;
                }
                if input.grade.is_some() {
                    record.grade = input.grade;
                    record.range_label = self.range_label(input.grade);
                }
                if input.grade_copper_cup.is_some() {
                    record.grade_copper_cup = input.grade_copper_cup;
                }
                if let Some(certificate_id) = &certificate_id {
                    record.certificate_id = certificate_id.clone();
                }
                if let Some(visual) = &visual_grade_estimate {
                    record.visual_grade_estimate = visual.clone();
                }

                record.status = self.policy.derive(&record.lab_results());
                record.updated_at = columns::now();
                sample_repo::update(tx, &record)?;
                Ok(record)
            })
        })?;

        info!(
            sample_id = id,
            composite_code = %record.composite_code,
            status = %record.status,
            "Sample updated"
        );
        Ok(record)
    }

    /// Records all three lab results at once.
    pub fn complete_lab_results(
        &self,
        id: i64,
        grade: Decimal,
        grade_copper_cup: Decimal,
        certificate_id: &str,
    ) -> Result<SampleRecord, ServiceError> {
        if certificate_id.trim().is_empty() {
            return Err(ServiceError::validation("certificateId", "is required"));
        }
        self.update(
            id,
            &SampleUpdate {
                grade: Some(grade),
                grade_copper_cup: Some(grade_copper_cup),
                certificate_id: Some(certificate_id.to_string()),
                ..Default::default()
            },
        )
    }

    /// Permanently removes a sample. Its sequence number is not reused.
    pub fn delete(&self, id: i64) -> Result<(), ServiceError> {
        let _span = info_span!("sample.delete", sample_id = id).entered();
        let removed = self.db.with_transaction(|tx| sample_repo::delete(tx, id))?;
        if !removed {
            return Err(ServiceError::not_found("Sample", id));
        }
        info!(sample_id = id, "Sample deleted");
        Ok(())
    }

    pub fn get(&self, id: i64) -> Result<SampleRecord, ServiceError> {
        self.db
            .with_conn(|conn| sample_repo::find_by_id(conn, id))?
            .ok_or_else(|| ServiceError::not_found("Sample", id))
    }

    /// Lists samples matching `filter`, newest first, with the total count.
    pub fn list(&self, filter: &SampleFilter) -> Result<(Vec<SampleRecord>, u64), ServiceError> {
        Ok(self
            .db
            .with_conn(|conn| sample_repo::query(conn, filter))?)
    }

    /// Shows the code the next sample would get. Nothing is reserved, so the
    /// number may already be taken by the time a sample is created.
    pub fn preview_next_code(
        &self,
        work_front_id: i64,
        shift: Shift,
        date: Option<&str>,
    ) -> Result<CodePreview, ServiceError> {
        let date = normalize_sample_date(date)?;
        let (front, sequence_number) = self.db.with_conn(|conn| {
            let front = work_front_repo::find_by_id(conn, work_front_id)?;
            let next = sequence_repo::peek_next(conn)?;
            Ok((front, next))
        })?;
        let front = front
            .filter(|f| !f.is_deleted())
            .ok_or_else(|| ServiceError::not_found("Work front", work_front_id))?;

        Ok(CodePreview {
            sequence_number,
            composite_code: build_sample_code(
                &front.composite_code,
                shift,
                sequence_number,
                Some(date),
            ),
            work_front_code: front.composite_code,
            shift,
            date,
        })
    }

    fn range_label(&self, grade: Option<Decimal>) -> Option<String> {
        grade
            .and_then(|g| self.ranges.lookup(g))
            .map(|band| band.label.clone())
    }
}

fn active_front(conn: &Connection, id: i64) -> Result<WorkFront, ServiceError> {
    work_front_repo::find_by_id(conn, id)?
        .filter(|f| !f.is_deleted())
        .ok_or_else(|| ServiceError::not_found("Work front", id))
}

fn identity_changed(existing: &SampleRecord, work_front_id: i64, shift: Shift, date: NaiveDate) -> bool {
    existing.work_front_id != work_front_id || existing.shift != shift || existing.date != date
}

fn validate_measurements(
    tons: Option<Decimal>,
    grade: Option<Decimal>,
    grade_copper_cup: Option<Decimal>,
) -> Result<(), ServiceError> {
    non_negative_decimal("tons", tons)?;
    non_negative_decimal("grade", grade)?;
    non_negative_decimal("gradeCopperCup", grade_copper_cup)
}

fn clean_text(
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) -> Result<Option<String>, ServiceError> {
    let value = clean_segment(value);
    max_length(field, value.as_deref(), max_len)?;
    Ok(value)
}
