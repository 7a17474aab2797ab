use super::criteria::{CriteriaTable, ReferenceRow};
use super::domain::{AssessmentItem, FactorResult, FitnessFactor, StudentProfile};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use tracing::debug;

/// Message shown when the single-query form is incomplete.
pub const INCOMPLETE_INPUT_MESSAGE: &str = "모든 항목을 입력해주세요.";

/// Input problems that stop a lookup before the table is consulted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("record '{0}' is not a finite number")]
    InvalidRecord(String),
    #[error("unknown fitness factor '{0}'")]
    UnknownFactor(String),
    #[error("unknown assessment item '{0}'")]
    UnknownItem(String),
    #[error("{item} is not an assessment item for {factor}")]
    ItemFactorMismatch {
        factor: FitnessFactor,
        item: AssessmentItem,
    },
}

/// A validated lookup: every categorical field present, the item belongs to
/// the factor, and the record is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaQuery {
    factor: FitnessFactor,
    item: AssessmentItem,
    profile: StudentProfile,
    record: f64,
}

impl CriteriaQuery {
    pub fn new(
        factor: FitnessFactor,
        item: AssessmentItem,
        profile: StudentProfile,
        record: f64,
    ) -> Result<Self, EvaluationError> {
        if !item.belongs_to(factor) {
            return Err(EvaluationError::ItemFactorMismatch { factor, item });
        }
        require("school_stage", &profile.school_stage)?;
        require("grade_level", &profile.grade_level)?;
        require("sex", &profile.sex)?;
        if !record.is_finite() {
            return Err(EvaluationError::InvalidRecord(record.to_string()));
        }

        Ok(Self {
            factor,
            item,
            profile,
            record,
        })
    }

    pub fn factor(&self) -> FitnessFactor {
        self.factor
    }

    pub fn item(&self) -> AssessmentItem {
        self.item
    }

    pub fn profile(&self) -> &StudentProfile {
        &self.profile
    }

    pub fn record(&self) -> f64 {
        self.record
    }

    fn matches(&self, row: &ReferenceRow) -> bool {
        let categorical = row.factor.trim() == self.factor.label()
            && row.item.trim() == self.item.label()
            && row.grade_level.trim() == self.profile.grade_level.trim()
            && row.sex.trim() == self.profile.sex.trim()
            && row.school_stage.trim() == self.profile.school_stage.trim();

        categorical
            && row
                .range()
                .is_some_and(|range| range.contains(self.record))
    }
}

/// The six raw fields of the single-query form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LookupRequest {
    #[serde(default)]
    pub factor: String,
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub grade_level: String,
    #[serde(default)]
    pub sex: String,
    #[serde(default)]
    pub school_stage: String,
    #[serde(default, deserialize_with = "lenient_record")]
    pub record: String,
}

impl LookupRequest {
    pub fn to_query(&self) -> Result<CriteriaQuery, EvaluationError> {
        let factor_text = require("factor", &self.factor)?;
        let item_text = require("item", &self.item)?;
        let factor = FitnessFactor::parse(factor_text)
            .ok_or_else(|| EvaluationError::UnknownFactor(factor_text.to_string()))?;
        let item = AssessmentItem::parse(item_text)
            .ok_or_else(|| EvaluationError::UnknownItem(item_text.to_string()))?;
        let record = parse_record(&self.record)?;
        let profile = StudentProfile::new(
            self.school_stage.trim(),
            self.grade_level.trim(),
            self.sex.trim(),
        );

        CriteriaQuery::new(factor, item, profile, record)
    }
}

/// Parses a raw measured record. Blank input counts as missing.
pub fn parse_record(raw: &str) -> Result<f64, EvaluationError> {
    let trimmed = require("record", raw)?;
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| EvaluationError::InvalidRecord(trimmed.to_string()))
}

/// First row, in table order, whose categorical fields and range accept the
/// query. `None` is an ordinary outcome.
pub fn find_match<'a>(rows: &'a [ReferenceRow], query: &CriteriaQuery) -> Option<&'a ReferenceRow> {
    let found = rows.iter().find(|row| query.matches(row));
    debug!(
        factor = query.factor.key(),
        item = query.item.key(),
        record = query.record,
        matched = found.is_some(),
        "criteria lookup"
    );
    found
}

/// Looks up a query and folds the outcome into a factor result.
pub fn evaluate(table: &CriteriaTable, query: &CriteriaQuery) -> FactorResult {
    match find_match(table.rows(), query) {
        Some(row) => FactorResult::new(row.score, row.grade.trim()),
        None => FactorResult::default(),
    }
}

/// Accepts a measured record as a JSON number or string and keeps its text.
/// `null` reads as blank. Validation happens later in [`parse_record`].
pub(crate) fn lenient_record<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct RecordVisitor;

    impl<'de> Visitor<'de> for RecordVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a measured record as a number or string")
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<String, E> {
            Ok(value)
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(RecordVisitor)
}

fn require<'a>(field: &'static str, value: &'a str) -> Result<&'a str, EvaluationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(EvaluationError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}
