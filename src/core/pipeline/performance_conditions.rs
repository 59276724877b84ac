use std::str::FromStr;

use thiserror::Error;

use crate::core::ads::performance::MetricThresholds;

const CONDITION_COUNT: usize = 7;

#[derive(Debug, Error, PartialEq)]
pub enum ConditionsError {
    #[error("Skipping the performance evaluation: Performance condition Sheet is empty.")]
    Empty,
    #[error("{0}")]
    Invalid(String),
}

/// Thresholds read from `Performance Conditions!B2:B8`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceConditions {
    /// Days an asset must have served before it is graded.
    pub active_days: i64,
    /// Length of the metric window, in days, ending yesterday.
    pub duration: i64,
    pub thresholds: MetricThresholds,
}

impl PerformanceConditions {
    /// Parses the single-column range. Short or missing rows count as empty
    /// cells and whitespace inside a value is ignored.
    pub fn from_rows(rows: &[Vec<String>]) -> Result<Self, ConditionsError> {
        if rows.is_empty() {
            return Err(ConditionsError::Empty);
        }

        let mut values: Vec<String> = rows
            .iter()
            .map(|row| {
                row.first()
                    .map(|v| v.chars().filter(|c| !c.is_whitespace()).collect())
                    .unwrap_or_default()
            })
            .collect();
        values.resize(CONDITION_COUNT.max(values.len()), String::new());

        if values[0].is_empty() {
            return Err(ConditionsError::Invalid(
                "Minimum days elapsed from the creative upload date is empty.".to_string(),
            ));
        }
        let active_days: i64 = parse(&values[0], "Minimum days elapsed")?;

        if values[1].is_empty() {
            return Err(ConditionsError::Invalid(
                "Evaluate duration of last N(Duration) days is empty.".to_string(),
            ));
        }
        let duration: i64 = parse(&values[1], "Duration")?;
        if duration <= 0 {
            return Err(ConditionsError::Invalid(
                "Evaluate duration of last N(Duration) days should be greater than 0.".to_string(),
            ));
        }

        if values[2..CONDITION_COUNT].iter().all(String::is_empty) {
            return Err(ConditionsError::Invalid(
                "Performance evaluation metrics are all empty. Please fill in at least one metric."
                    .to_string(),
            ));
        }

        Ok(Self {
            active_days,
            duration,
            thresholds: MetricThresholds {
                impressions: optional(&values[2], "Impressions")?,
                conversions: optional(&values[3], "Conversions")?,
                conversions_value: optional(&values[4], "Conversions value")?,
                ctr: optional(&values[5], "CTR")?,
                clicks: optional(&values[6], "Clicks")?,
            },
        })
    }
}

fn parse<T: FromStr>(value: &str, label: &str) -> Result<T, ConditionsError> {
    value.parse().map_err(|_| {
        ConditionsError::Invalid(format!(
            "{} in the Performance Conditions sheet is not a valid number: {}",
            label, value
        ))
    })
}

fn optional<T: FromStr>(value: &str, label: &str) -> Result<Option<T>, ConditionsError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse(value, label).map(Some)
}
