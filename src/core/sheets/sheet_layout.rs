// Fixed layout of the Creative Mango spreadsheet. Column order is the contract
// with the people editing the sheet, so it must not change.

use chrono::{DateTime, Local, NaiveDate};

use crate::core::ads::CreativeType;

pub const UPLOAD_RANGE: &str = "Upload!A2:H";
pub const UPLOAD_FILES_RANGE: &str = "Upload!A2:D";
pub const USED_AD_GROUP_COLUMN: &str = "Upload!H";
pub const MAPPING_RANGE: &str = "Mapping!A2:K";
pub const MAPPING_KEY_RANGE: &str = "Mapping!A2:C";
pub const MAPPING_DATE_CELL: &str = "Mapping!N1";
pub const TIME_MANAGED_SHEET: &str = "Time Managed";
pub const TIME_MANAGED_RANGE: &str = "Time Managed!A2:L";
pub const TIME_MANAGED_APPEND_RANGE: &str = "Time Managed!A2:I";
pub const TIME_MANAGED_NOTES_RANGE: &str = "Time Managed!J2:L";
pub const CHANGE_HISTORY_RANGE: &str = "Change History!A2:K";
pub const PERFORMANCE_CONDITIONS_RANGE: &str = "Performance Conditions!B2:B8";
pub const YT_LIST_RANGE: &str = "YT List!A2:Z";
pub const YT_LIST_URL_RANGE: &str = "YT List!A2:A";

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Data rows start on sheet row 2.
pub const FIRST_DATA_ROW: usize = 2;

pub mod upload_col {
    pub const ALIAS: usize = 0;
    pub const CREATIVE_TYPE: usize = 1;
    pub const NAME_OR_TEXT: usize = 2;
    pub const URL: usize = 3;
    pub const REPLACE_ASSET: usize = 4;
    pub const START_DATE: usize = 5;
    pub const END_DATE: usize = 6;
    pub const USED_AD_GROUP_IDS: usize = 7;
    pub const COUNT: usize = 8;
}

pub mod mapping_col {
    pub const ALIAS: usize = 0;
    pub const CUSTOMER_ID: usize = 1;
    pub const AD_GROUP_ID: usize = 2;
    pub const KEY_COUNT: usize = 3;
}

pub mod time_managed_col {
    pub const ALIAS: usize = 0;
    pub const CREATIVE_TYPE: usize = 1;
    pub const CREATIVE_NAME: usize = 2;
    pub const URL: usize = 3;
    pub const CUSTOMER_ID: usize = 4;
    pub const AD_GROUP_ID: usize = 5;
    pub const ASSET_ID_OR_TEXT: usize = 6;
    pub const START_DATE: usize = 7;
    pub const END_DATE: usize = 8;
    pub const DELETE_BY_PERFORMANCE: usize = 9;
    pub const PERFORMANCE: usize = 10;
    pub const ERROR_NOTE: usize = 11;
    pub const COUNT: usize = 12;
}

pub fn parse_sheet_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}

pub fn format_sheet_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Timestamp written in the last column of Change History and in `Mapping!N1`.
pub fn history_timestamp(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn cell(cells: &[String], index: usize) -> String {
    cells.get(index).cloned().unwrap_or_default()
}

fn pad(cells: &[String], width: usize) -> Vec<String> {
    let mut padded = cells.to_vec();
    if padded.len() < width {
        padded.resize(width, String::new());
    }
    padded
}

/// A row of the Upload sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRow {
    pub alias: String,
    /// Upper-cased; may still be an unknown type.
    pub creative_type: String,
    pub name_or_text: String,
    pub url: String,
    pub replace_asset: String,
    pub start_date: String,
    pub end_date: String,
    pub used_ad_group_ids: String,
    /// 1-based sheet row.
    pub row_index: usize,
}

impl UploadRow {
    /// Rows without an ad group alias are ignored.
    pub fn from_cells(cells: &[String], position: usize) -> Option<Self> {
        let cells = pad(cells, upload_col::COUNT);
        if cells[upload_col::ALIAS].is_empty() {
            return None;
        }
        Some(Self {
            alias: cell(&cells, upload_col::ALIAS),
            creative_type: cell(&cells, upload_col::CREATIVE_TYPE).to_uppercase(),
            name_or_text: cell(&cells, upload_col::NAME_OR_TEXT),
            url: cell(&cells, upload_col::URL),
            replace_asset: cell(&cells, upload_col::REPLACE_ASSET),
            start_date: cell(&cells, upload_col::START_DATE),
            end_date: cell(&cells, upload_col::END_DATE),
            used_ad_group_ids: cell(&cells, upload_col::USED_AD_GROUP_IDS),
            row_index: position + FIRST_DATA_ROW,
        })
    }

    pub fn creative(&self) -> Option<CreativeType> {
        self.creative_type.parse().ok()
    }

    pub fn cells(&self) -> Vec<String> {
        vec![
            self.alias.clone(),
            self.creative_type.clone(),
            self.name_or_text.clone(),
            self.url.clone(),
            self.replace_asset.clone(),
            self.start_date.clone(),
            self.end_date.clone(),
            self.used_ad_group_ids.clone(),
        ]
    }

    pub fn used_ad_group_cell(&self) -> String {
        format!("{}{}", USED_AD_GROUP_COLUMN, self.row_index)
    }
}

/// A row of the Time Managed sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeManagedRow {
    pub cells: Vec<String>,
    pub row_index: usize,
}

impl TimeManagedRow {
    /// Rows need a customer, ad group, asset, type and start date. Dashes and
    /// spaces are stripped from the customer id.
    pub fn from_cells(cells: &[String], position: usize) -> Option<Self> {
        use time_managed_col::*;

        let mut cells = pad(cells, COUNT);
        let required = [CUSTOMER_ID, AD_GROUP_ID, ASSET_ID_OR_TEXT, CREATIVE_TYPE, START_DATE];
        if required.iter().any(|&i| cells[i].is_empty()) {
            return None;
        }
        cells[CUSTOMER_ID] = cells[CUSTOMER_ID].replace(['-', ' '], "");
        Some(Self {
            cells,
            row_index: position + FIRST_DATA_ROW,
        })
    }

    pub fn customer_id(&self) -> &str {
        &self.cells[time_managed_col::CUSTOMER_ID]
    }

    pub fn ad_group_id(&self) -> &str {
        &self.cells[time_managed_col::AD_GROUP_ID]
    }

    pub fn asset(&self) -> &str {
        &self.cells[time_managed_col::ASSET_ID_OR_TEXT]
    }

    pub fn creative_type(&self) -> String {
        self.cells[time_managed_col::CREATIVE_TYPE].to_uppercase()
    }

    pub fn creative(&self) -> Option<CreativeType> {
        self.creative_type().parse().ok()
    }

    pub fn start_date(&self) -> &str {
        &self.cells[time_managed_col::START_DATE]
    }

    pub fn end_date(&self) -> &str {
        &self.cells[time_managed_col::END_DATE]
    }

    pub fn delete_by_performance(&self) -> bool {
        self.cells[time_managed_col::DELETE_BY_PERFORMANCE] == "TRUE"
    }

    pub fn performance_note(&self) -> String {
        self.cells[time_managed_col::PERFORMANCE].to_uppercase()
    }

    pub fn error_note(&self) -> &str {
        &self.cells[time_managed_col::ERROR_NOTE]
    }

    /// Columns A..I, the part copied into Change History.
    pub fn identity_cells(&self) -> Vec<String> {
        self.cells[..=time_managed_col::END_DATE].to_vec()
    }
}

/// Alias, customer and ad group from the first three Mapping columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingKey {
    pub alias: String,
    pub customer_id: String,
    pub ad_group_id: String,
}

impl MappingKey {
    pub fn from_cells(cells: &[String]) -> Option<Self> {
        if cells.len() < mapping_col::KEY_COUNT {
            return None;
        }
        Some(Self {
            alias: cells[mapping_col::ALIAS].clone(),
            customer_id: cells[mapping_col::CUSTOMER_ID].clone(),
            ad_group_id: cells[mapping_col::AD_GROUP_ID].clone(),
        })
    }
}

/// A full Mapping row as written by the refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRow {
    pub alias: String,
    pub customer_id: String,
    pub ad_group_id: String,
    pub ad_group_name: String,
    pub campaign_id: String,
    pub campaign_name: String,
    pub app_id: String,
    pub headlines: u32,
    pub descriptions: u32,
    pub images: u32,
    pub videos: u32,
}

impl MappingRow {
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.alias.clone(),
            self.customer_id.clone(),
            self.ad_group_id.clone(),
            self.ad_group_name.clone(),
            self.campaign_id.clone(),
            self.campaign_name.clone(),
            self.app_id.clone(),
            self.headlines.to_string(),
            self.descriptions.to_string(),
            self.images.to_string(),
            self.videos.to_string(),
        ]
    }
}
