use super::ads_models::{AssetMetrics, AssetPerformance, PerformanceLabel};

/// Picks the asset to rotate out of an ad group.
///
/// Only assets carrying the lowest label present compete. Among those the
/// highest cost per conversion loses; an asset without conversions is worse
/// than any asset with conversions, and two assets without conversions are
/// compared on raw cost. Ties keep the earlier asset.
pub fn least_performing_asset(assets: &[AssetPerformance]) -> Option<&AssetPerformance> {
    let lowest = assets.iter().map(|a| a.label).min()?;

    let mut worst: Option<&AssetPerformance> = None;
    for challenger in assets.iter().filter(|a| a.label == lowest) {
        let current = match worst {
            Some(current) => current,
            None => {
                worst = Some(challenger);
                continue;
            }
        };

        let current_converted = current.conversions != 0.0;
        let challenger_converted = challenger.conversions != 0.0;
        let challenger_is_worse = match (current_converted, challenger_converted) {
            (false, false) => current.cost_micros < challenger.cost_micros,
            (_, false) => true,
            (false, true) => false,
            (true, true) => {
                current.cost_micros as f64 / current.conversions
                    < challenger.cost_micros as f64 / challenger.conversions
            }
        };
        if challenger_is_worse {
            worst = Some(challenger);
        }
    }
    worst
}

/// Thresholds from the Performance Conditions sheet. Unset metrics are skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricThresholds {
    pub impressions: Option<i64>,
    pub conversions: Option<i64>,
    pub conversions_value: Option<f64>,
    pub ctr: Option<f64>,
    pub clicks: Option<i64>,
}

impl MetricThresholds {
    pub fn is_empty(&self) -> bool {
        self.impressions.is_none()
            && self.conversions.is_none()
            && self.conversions_value.is_none()
            && self.ctr.is_none()
            && self.clicks.is_none()
    }
}

/// Value of the Performance column in the Time Managed sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceNote {
    Low,
    NoRecentRecords,
    Clear,
}

impl PerformanceNote {
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceNote::Low => "LOW",
            PerformanceNote::NoRecentRecords => "NO RECENT RECORDS",
            PerformanceNote::Clear => "",
        }
    }

    /// Notes that make a row eligible for removal when its checkbox is ticked.
    pub fn marks_for_removal(note: &str) -> bool {
        let note = note.trim().to_uppercase();
        note == PerformanceNote::Low.as_str() || note == PerformanceNote::NoRecentRecords.as_str()
    }
}

/// Grades the first metric row of an asset.
///
/// Configured metrics are checked in sheet order and the last one decides.
pub fn evaluate_metrics(rows: &[AssetMetrics], thresholds: &MetricThresholds) -> PerformanceNote {
    let Some(row) = rows.first() else {
        return PerformanceNote::NoRecentRecords;
    };
    if row.label != Some(PerformanceLabel::Low) {
        return PerformanceNote::Clear;
    }

    let mut below = false;
    if let Some(min) = thresholds.impressions {
        below = row.impressions < min;
    }
    if let Some(min) = thresholds.conversions {
        below = (row.conversions.trunc() as i64) < min;
    }
    if let Some(min) = thresholds.conversions_value {
        below = row.conversions_value < min;
    }
    if let Some(min) = thresholds.ctr {
        below = row.ctr < min;
    }
    if let Some(min) = thresholds.clicks {
        below = row.clicks < min;
    }

    if below {
        PerformanceNote::Low
    } else {
        PerformanceNote::Clear
    }
}
