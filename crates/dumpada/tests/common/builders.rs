//! Builders for manager inputs.

#![allow(dead_code)]

use dumpada::{NewSample, Shift, WorkFrontInput, WorkFrontStatus};
use rust_decimal::Decimal;

/// Builder for `WorkFrontInput`. Defaults to a Levante front on seam `M5`.
pub struct WorkFrontBuilder {
    input: WorkFrontInput,
}

impl WorkFrontBuilder {
    pub fn new() -> Self {
        Self {
            input: WorkFrontInput::new("M5", 1),
        }
    }

    pub fn seam(mut self, seam: &str) -> Self {
        self.input.seam = seam.to_string();
        self
    }

    pub fn street(mut self, street: &str) -> Self {
        self.input.street = Some(street.to_string());
        self
    }

    pub fn strand(mut self, strand: &str) -> Self {
        self.input.strand = Some(strand.to_string());
        self
    }

    pub fn front_number(mut self, number: &str) -> Self {
        self.input.front_number = Some(number.to_string());
        self
    }

    pub fn front_type(mut self, front_type_id: i64) -> Self {
        self.input.front_type_id = front_type_id;
        self
    }

    pub fn site(mut self, site_id: i64) -> Self {
        self.input.site_id = Some(site_id);
        self
    }

    pub fn status(mut self, status: WorkFrontStatus) -> Self {
        self.input.status = Some(status);
        self
    }

    pub fn build(self) -> WorkFrontInput {
        self.input
    }
}

impl Default for WorkFrontBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `NewSample`.
pub struct SampleBuilder {
    input: NewSample,
}

impl SampleBuilder {
    pub fn new(work_front_id: i64) -> Self {
        Self {
            input: NewSample::new(work_front_id, Shift::Am),
        }
    }

    pub fn shift(mut self, shift: Shift) -> Self {
        self.input.shift = shift;
        self
    }

    pub fn date(mut self, date: &str) -> Self {
        self.input.date = Some(date.to_string());
        self
    }

    pub fn tons(mut self, tons: Decimal) -> Self {
        self.input.tons = Some(tons);
        self
    }

    pub fn grade(mut self, grade: Decimal) -> Self {
        self.input.grade = Some(grade);
        self
    }

    pub fn copper_cup(mut self, grade: Decimal) -> Self {
        self.input.grade_copper_cup = Some(grade);
        self
    }

    pub fn certificate(mut self, certificate_id: &str) -> Self {
        self.input.certificate_id = Some(certificate_id.to_string());
        self
    }

    pub fn visual_estimate(mut self, estimate: &str) -> Self {
        self.input.visual_grade_estimate = Some(estimate.to_string());
        self
    }

    pub fn build(self) -> NewSample {
        self.input
    }
}
