use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate};
use serde_json::Value;
use tracing::{error, info, warn};

use super::performance_conditions::PerformanceConditions;
use crate::core::ads::performance::{evaluate_metrics, PerformanceNote};
use crate::core::ads::{AdType, AdsClient, AdsService, CreativeType};
use crate::core::sheets::layout::{
    history_timestamp, parse_sheet_date, time_managed_col, TimeManagedRow, CHANGE_HISTORY_RANGE,
    PERFORMANCE_CONDITIONS_RANGE, TIME_MANAGED_NOTES_RANGE, TIME_MANAGED_RANGE, TIME_MANAGED_SHEET,
};
use crate::core::sheets::requests::{delete_rows, set_cell_text, set_checkbox};
use crate::core::sheets::SheetsClient;

const INVALID_TYPE: &str = "Please check the creative type";
const REMOVED: &str = "Creative successfully removed";
const BAD_END_DATE: &str = "END_DATE is not correct format. Kindly follow the format of YYYY-MM-DD.";
const BAD_START_DATE: &str =
    "START_DATE is not correct format. Kindly follow the format of YYYY-MM-DD.";
const ACE_UNSUPPORTED: &str = "Performance reporting not supported for ACe Campaigns.";
const TOO_FEW_DAYS: &str = "Need to serve more days to evaluate performance.";

/// Row index plus the note to write into it.
type RowNote = (usize, String);

/// Removes expired or flagged assets listed in the Time Managed sheet and grades
/// the remaining ones against the Performance Conditions sheet.
pub struct CreativeRemover<'a, S: SheetsClient, A: AdsClient> {
    sheets: &'a S,
    ads: &'a AdsService<A>,
}

impl<'a, S: SheetsClient, A: AdsClient> CreativeRemover<'a, S, A> {
    pub fn new(sheets: &'a S, ads: &'a AdsService<A>) -> Self {
        Self { sheets, ads }
    }

    pub async fn run(&self, spreadsheet_ids: &[String], now: DateTime<Local>) -> Result<()> {
        for spreadsheet_id in spreadsheet_ids {
            if let Err(e) = self.run_for_spreadsheet(spreadsheet_id, now).await {
                error!("Creative remover failed for {}: {:#}", spreadsheet_id, e);
            }
        }
        Ok(())
    }

    async fn run_for_spreadsheet(&self, spreadsheet_id: &str, now: DateTime<Local>) -> Result<()> {
        let sheet_id = self
            .sheets
            .sheet_id(spreadsheet_id, TIME_MANAGED_SHEET)
            .await
            .context("Error while retrieving the Time Managed Sheet ID")?;

        let rows = self.time_managed_rows(spreadsheet_id).await;
        let removed = self
            .remove_expired(spreadsheet_id, sheet_id, &rows, now)
            .await;
        if removed.is_empty() {
            info!("No assets to delete");
        } else {
            info!("Successfully deleted {} assets", removed.len());
        }

        let condition_rows = self
            .sheets
            .get_values(spreadsheet_id, PERFORMANCE_CONDITIONS_RANGE)
            .await
            .context("Unable to read the Performance Condition sheet")?;
        let conditions = match PerformanceConditions::from_rows(&condition_rows) {
            Ok(conditions) => conditions,
            Err(e) => {
                warn!("{}", e);
                return Ok(());
            }
        };

        let rows = self.time_managed_rows(spreadsheet_id).await;
        let noted = self
            .evaluate_performance(spreadsheet_id, sheet_id, &conditions, &rows, now.date_naive())
            .await;
        if noted > 0 {
            info!("Updated the performance note of {} assets", noted);
        } else {
            info!("No low performing assets to update");
        }
        Ok(())
    }

    /// Usable Time Managed rows. A read failure is logged and yields no rows.
    pub async fn time_managed_rows(&self, spreadsheet_id: &str) -> Vec<TimeManagedRow> {
        match self
            .sheets
            .get_values(spreadsheet_id, TIME_MANAGED_RANGE)
            .await
        {
            Ok(values) => values
                .iter()
                .enumerate()
                .filter_map(|(position, cells)| TimeManagedRow::from_cells(cells, position))
                .collect(),
            Err(e) => {
                warn!("Unable to read the Time Managed sheet: {}", e);
                Vec::new()
            }
        }
    }

    /// Removes assets whose end date has passed or that were flagged by
    /// performance, then rewrites the note columns and deletes their rows.
    pub async fn remove_expired(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        rows: &[TimeManagedRow],
        now: DateTime<Local>,
    ) -> Vec<usize> {
        let today = now.date_naive();
        let mut removed = Vec::new();
        let mut errors: Vec<RowNote> = Vec::new();

        for row in rows {
            let Some(creative) = row.creative() else {
                errors.push((row.row_index, INVALID_TYPE.to_string()));
                continue;
            };

            if !row.end_date().is_empty() {
                match parse_sheet_date(row.end_date()) {
                    Some(end) if end <= today => {
                        match self.remove_asset(row, creative).await {
                            Ok(()) => {
                                self.log_removal(spreadsheet_id, row, now).await;
                                removed.push(row.row_index);
                            }
                            Err(message) => errors.push((row.row_index, message)),
                        }
                        continue;
                    }
                    Some(_) => {}
                    None => errors.push((row.row_index, BAD_END_DATE.to_string())),
                }
            }

            if PerformanceNote::marks_for_removal(&row.performance_note())
                && row.delete_by_performance()
            {
                match self.remove_asset(row, creative).await {
                    Ok(()) => {
                        self.log_removal(spreadsheet_id, row, now).await;
                        removed.push(row.row_index);
                    }
                    Err(message) => errors.push((row.row_index, message)),
                }
            }
        }

        self.rewrite_time_managed(spreadsheet_id, sheet_id, &errors, &removed)
            .await;
        removed
    }

    /// Removes one asset if the ad group keeps more than the minimum of its type.
    async fn remove_asset(&self, row: &TimeManagedRow, creative: CreativeType) -> Result<(), String> {
        let (counts, _) = self
            .ads
            .asset_counts(row.customer_id(), row.ad_group_id())
            .await
            .map_err(|e| e.row_message())?;
        if counts.of(creative) <= creative.minimum_in_ad_group() {
            return Err(creative.not_enough_message());
        }
        self.ads
            .remove_asset(row.customer_id(), row.ad_group_id(), creative, row.asset())
            .await
            .map_err(|e| e.row_message())
    }

    async fn log_removal(&self, spreadsheet_id: &str, row: &TimeManagedRow, now: DateTime<Local>) {
        let mut entry = row.identity_cells();
        entry.push(REMOVED.to_string());
        entry.push(history_timestamp(now));
        if let Err(e) = self
            .sheets
            .append_values(spreadsheet_id, CHANGE_HISTORY_RANGE, &[entry])
            .await
        {
            warn!("Unable to update Change History Sheet: {}", e);
        }
    }

    async fn rewrite_time_managed(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        errors: &[RowNote],
        removed: &[usize],
    ) {
        if let Err(e) = self
            .sheets
            .clear_values(spreadsheet_id, TIME_MANAGED_NOTES_RANGE)
            .await
        {
            warn!("Unable to update Time Managed Sheet rows: {}", e);
        }

        if !errors.is_empty() {
            let requests = errors
                .iter()
                .map(|(row, note)| set_cell_text(sheet_id, *row, time_managed_col::ERROR_NOTE, note))
                .collect();
            self.send_batch(spreadsheet_id, requests, "Unable to update Time Managed Sheet rows")
                .await;
        }

        if !removed.is_empty() {
            self.send_batch(
                spreadsheet_id,
                delete_rows(sheet_id, removed),
                "Unable to delete Time Managed Sheet rows",
            )
            .await;
        }
    }

    /// Grades every row and writes the notes back. Returns how many performance
    /// notes were written.
    pub async fn evaluate_performance(
        &self,
        spreadsheet_id: &str,
        sheet_id: i64,
        conditions: &PerformanceConditions,
        rows: &[TimeManagedRow],
        today: NaiveDate,
    ) -> usize {
        let mut notes: Vec<RowNote> = Vec::new();
        let mut errors: Vec<RowNote> = Vec::new();

        for row in rows {
            let Some(creative) = row.creative() else {
                continue;
            };

            match self.grade(row, creative, conditions, today).await {
                Ok(note) => {
                    if row.performance_note().is_empty() && note == PerformanceNote::Clear {
                        continue;
                    }
                    notes.push((row.row_index, note.as_str().to_string()));
                }
                Err(message) => {
                    let message = if row.error_note().is_empty() {
                        message
                    } else {
                        format!("{} / {}", row.error_note(), message)
                    };
                    errors.push((row.row_index, message));
                }
            }
        }

        let mut values: Vec<Value> = notes
            .iter()
            .map(|(row, note)| set_cell_text(sheet_id, *row, time_managed_col::PERFORMANCE, note))
            .collect();
        values.extend(
            errors
                .iter()
                .map(|(row, note)| set_cell_text(sheet_id, *row, time_managed_col::ERROR_NOTE, note)),
        );
        let checkboxes: Vec<Value> = notes
            .iter()
            .map(|(row, note)| {
                set_checkbox(
                    sheet_id,
                    *row,
                    time_managed_col::DELETE_BY_PERFORMANCE,
                    !note.is_empty(),
                )
            })
            .collect();

        if !values.is_empty() {
            self.send_batch(
                spreadsheet_id,
                values,
                "Error while updating performance note in the Time Managed Sheet",
            )
            .await;
        }
        if !checkboxes.is_empty() {
            self.send_batch(
                spreadsheet_id,
                checkboxes,
                "Error while updating performance note in the Time Managed Sheet",
            )
            .await;
        }
        notes.len()
    }

    async fn grade(
        &self,
        row: &TimeManagedRow,
        creative: CreativeType,
        conditions: &PerformanceConditions,
        today: NaiveDate,
    ) -> Result<PerformanceNote, String> {
        let ad = self
            .ads
            .ad_group_ad(row.customer_id(), row.ad_group_id())
            .await
            .map_err(|e| e.row_message())?;
        if ad.ad_type == AdType::AppEngagementAd {
            return Err(ACE_UNSUPPORTED.to_string());
        }

        let start = parse_sheet_date(row.start_date()).ok_or_else(|| BAD_START_DATE.to_string())?;
        if (today - start).num_days() < conditions.active_days {
            return Err(TOO_FEW_DAYS.to_string());
        }

        let metrics = self
            .ads
            .asset_metrics(
                row.customer_id(),
                row.ad_group_id(),
                creative,
                row.asset(),
                conditions.duration,
                today,
            )
            .await
            .map_err(|e| e.row_message())?;
        Ok(evaluate_metrics(&metrics, &conditions.thresholds))
    }

    async fn send_batch(&self, spreadsheet_id: &str, requests: Vec<Value>, failure: &str) {
        if let Err(e) = self.sheets.batch_update(spreadsheet_id, requests).await {
            warn!("{}: {}", failure, e);
        }
    }
}
