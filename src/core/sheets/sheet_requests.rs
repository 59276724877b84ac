use serde_json::{json, Value};

/// Writes `text` into one cell. `row_index` is the 1-based sheet row.
pub fn set_cell_text(sheet_id: i64, row_index: usize, column: usize, text: &str) -> Value {
    json!({
        "updateCells": {
            "start": {
                "sheetId": sheet_id,
                "rowIndex": row_index - 1,
                "columnIndex": column
            },
            "rows": [{ "values": [{ "userEnteredValue": { "stringValue": text } }] }],
            "fields": "userEnteredValue"
        }
    })
}

/// Turns a cell into a checkbox, or back into an empty plain cell.
pub fn set_checkbox(sheet_id: i64, row_index: usize, column: usize, enabled: bool) -> Value {
    if enabled {
        json!({
            "updateCells": {
                "start": {
                    "sheetId": sheet_id,
                    "rowIndex": row_index - 1,
                    "columnIndex": column
                },
                "rows": [{ "values": [{ "dataValidation": { "condition": { "type": "BOOLEAN" } } }] }],
                "fields": "dataValidation"
            }
        })
    } else {
        json!({
            "updateCells": {
                "start": {
                    "sheetId": sheet_id,
                    "rowIndex": row_index - 1,
                    "columnIndex": column
                },
                "rows": [{ "values": [{
                    "userEnteredValue": { "stringValue": "" },
                    "dataValidation": null
                }] }],
                "fields": "userEnteredValue, dataValidation"
            }
        })
    }
}

/// Deletes sheet rows given by 1-based index. Requests run in order, so each
/// index is shifted by the rows already deleted above it.
pub fn delete_rows(sheet_id: i64, row_indexes: &[usize]) -> Vec<Value> {
    let mut sorted = row_indexes.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    sorted
        .iter()
        .enumerate()
        .map(|(deleted, row)| {
            let start = row - (deleted + 1);
            json!({
                "deleteDimension": {
                    "range": {
                        "sheetId": sheet_id,
                        "dimension": "ROWS",
                        "startIndex": start,
                        "endIndex": start + 1
                    }
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletions_shift_by_rows_already_removed() {
        let requests = delete_rows(9, &[7, 3, 4]);
        let starts: Vec<u64> = requests
            .iter()
            .map(|r| r["deleteDimension"]["range"]["startIndex"].as_u64().unwrap())
            .collect();
        // rows 3, 4, 7 are zero-based 2, 3, 6; after each deletion the rest move up
        assert_eq!(starts, vec![2, 2, 4]);
        assert_eq!(
            requests[2]["deleteDimension"]["range"]["endIndex"].as_u64(),
            Some(5)
        );
        assert_eq!(requests[0]["deleteDimension"]["range"]["sheetId"], 9);
    }

    #[test]
    fn cell_updates_use_zero_based_rows() {
        let request = set_cell_text(1, 5, 11, "oops");
        assert_eq!(request["updateCells"]["start"]["rowIndex"], 4);
        assert_eq!(request["updateCells"]["start"]["columnIndex"], 11);
        assert_eq!(
            request["updateCells"]["rows"][0]["values"][0]["userEnteredValue"]["stringValue"],
            "oops"
        );
    }

    #[test]
    fn checkbox_toggle_sets_matching_fields() {
        let on = set_checkbox(1, 2, 9, true);
        assert_eq!(on["updateCells"]["fields"], "dataValidation");
        let off = set_checkbox(1, 2, 9, false);
        assert_eq!(off["updateCells"]["fields"], "userEnteredValue, dataValidation");
        assert!(off["updateCells"]["rows"][0]["values"][0]["dataValidation"].is_null());
    }
}
