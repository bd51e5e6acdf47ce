//! Grade range bands ("rangos") and lookup by grade.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::{range_repo, Database, DatabaseError};
use crate::validation::MAX_DECIMAL_SCALE;

/// A labelled grade bracket. Both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeBand {
    pub label: String,
    pub lower_bound: Decimal,
    pub upper_bound: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sort_order: i32,
}

impl RangeBand {
    pub fn new(label: &str, lower_bound: Decimal, upper_bound: Decimal, sort_order: i32) -> Self {
        Self {
            label: label.to_string(),
            lower_bound,
            upper_bound,
            description: None,
            sort_order,
        }
    }

    pub fn contains(&self, grade: Decimal) -> bool {
        self.lower_bound <= grade && grade <= self.upper_bound
    }

    /// Distance between the bounds.
    pub fn width(&self) -> Decimal {
        self.upper_bound - self.lower_bound
    }
}

/// A defect between two consecutive bands, in `sort_order`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverageIssue {
    /// The band's lower bound is above its upper bound.
    Inverted { label: String },
    /// Grades strictly between the two bands match nothing.
    Gap { below: String, above: String },
    /// Some grades match both bands.
    Overlap { first: String, second: String },
}

/// Static, ordered list of range bands.
#[derive(Debug, Clone, Default)]
pub struct RangeTable {
    bands: Vec<RangeBand>,
}

impl RangeTable {
    /// Builds a table; bands are ordered by ascending `sort_order`.
    pub fn new(mut bands: Vec<RangeBand>) -> Self {
        bands.sort_by_key(|b| b.sort_order);
        Self { bands }
    }

    /// Loads the seeded bands and reports coverage defects as warnings.
    pub fn load(db: &Database) -> Result<Self, DatabaseError> {
        let table = Self::new(db.with_conn(range_repo::list)?);
        for issue in table.coverage_issues() {
            warn!(?issue, "Range table coverage issue");
        }
        Ok(table)
    }

    /// Returns the first band, by `sort_order`, containing `grade`.
    ///
    /// `None` is a valid outcome: the grade is outside the covered interval
    /// or falls between two bands.
    pub fn lookup(&self, grade: Decimal) -> Option<&RangeBand> {
        self.bands.iter().find(|b| b.contains(grade))
    }

    pub fn bands(&self) -> &[RangeBand] {
        &self.bands
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Checks that consecutive bands are non-overlapping and contiguous.
    ///
    /// Contiguity is judged at the precision grades are accepted in (six
    /// decimals), so `0.59` followed by `0.60` is a gap: `0.595` matches
    /// neither band.
    pub fn coverage_issues(&self) -> Vec<CoverageIssue> {
        let mut issues = Vec::new();
        for band in &self.bands {
            if band.lower_bound > band.upper_bound {
                issues.push(CoverageIssue::Inverted {
                    label: band.label.clone(),
                });
            }
        }
        for pair in self.bands.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.lower_bound <= prev.upper_bound {
                issues.push(CoverageIssue::Overlap {
                    first: prev.label.clone(),
                    second: next.label.clone(),
                });
                continue;
            }
            let step = Decimal::new(1, MAX_DECIMAL_SCALE);
            if next.lower_bound - prev.upper_bound > step {
                issues.push(CoverageIssue::Gap {
                    below: prev.label.clone(),
                    above: next.label.clone(),
                });
            }
        }
        issues
    }
}
