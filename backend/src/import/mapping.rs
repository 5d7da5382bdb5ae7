//! Column mapping and row validation for the preview step of an import.
//!
//! Every data row becomes a [`CandidateRecord`]: each system field reads the
//! cell under the column the user mapped to it, trimmed, with blanks turned
//! into `null`. The record is then validated. Problems are collected per row
//! rather than aborting the file, so the client can show every issue at once
//! and let the user pick the rows worth keeping.

use crate::spreadsheet::SheetData;
use crate::store::{LeadStore, StoreError};
use common::model::candidate::{CandidateRecord, ColumnMapping};
use common::model::field::{LeadStatus, SystemField};
use common::responses::PreviewResponse;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// A reason a candidate row cannot be imported as is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("{0} missing")]
    Missing(SystemField),
    #[error("Invalid status (use pending/approved/rejected)")]
    InvalidStatus,
    #[error("rejection_reason required when status is rejected")]
    RejectionReasonRequired,
}

/// Maps every non-blank data row of `sheet`, then flags rows whose mobile
/// number already belongs to a stored lead.
pub fn build_preview(
    sheet: &SheetData,
    mapping: &ColumnMapping,
    store: &LeadStore,
) -> Result<PreviewResponse, StoreError> {
    let mut records = map_rows(sheet, mapping);

    let in_use = store.mobile_numbers_in_use(
        records
            .iter()
            .filter_map(|record| record.mobile_number.as_deref()),
    )?;
    flag_duplicates(&mut records, &in_use);

    let errors = collect_errors(&records);
    Ok(PreviewResponse {
        success: true,
        preview: records,
        errors,
    })
}

/// Maps and validates each data row. Rows whose cells are all blank are
/// dropped without shifting the row numbers of the rows after them.
pub fn map_rows(sheet: &SheetData, mapping: &ColumnMapping) -> Vec<CandidateRecord> {
    let columns = resolve_columns(&sheet.headers, mapping);
    let first_row = sheet.first_data_row();
    sheet
        .rows
        .par_iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|(index, row)| map_row(first_row + index, row, &columns))
        .collect()
}

pub fn flag_duplicates(records: &mut [CandidateRecord], mobile_numbers_in_use: &HashSet<String>) {
    for record in records {
        record.duplicate = record
            .mobile_number
            .as_ref()
            .is_some_and(|number| mobile_numbers_in_use.contains(number));
    }
}

/// Row number -> messages, for rows with at least one problem.
pub fn collect_errors(records: &[CandidateRecord]) -> BTreeMap<usize, Vec<String>> {
    records
        .iter()
        .filter(|record| !record.errors.is_empty())
        .map(|record| (record.row_index, record.errors.clone()))
        .collect()
}

/// Checks a record and normalizes its status in place.
///
/// A blank status becomes `pending` and a valid one is lowercased. An invalid
/// status is left untouched so the user can see what the file contained.
pub fn validate(record: &mut CandidateRecord) -> Vec<RowError> {
    let mut errors: Vec<RowError> = SystemField::REQUIRED
        .into_iter()
        .filter(|&field| is_blank(record.value(field)))
        .map(RowError::Missing)
        .collect();

    let raw_status = record
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let status = match raw_status {
        None => Some(LeadStatus::Pending),
        Some(raw) => raw.parse::<LeadStatus>().ok(),
    };
    match status {
        Some(status) => record.status = Some(status.as_str().to_string()),
        None => errors.push(RowError::InvalidStatus),
    }

    if status == Some(LeadStatus::Rejected) && is_blank(record.rejection_reason.as_deref()) {
        errors.push(RowError::RejectionReasonRequired);
    }
    errors
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

/// Header position for each entry of `SystemField::ALL`. The first header with
/// the mapped name wins.
fn resolve_columns(headers: &[String], mapping: &ColumnMapping) -> Vec<Option<usize>> {
    SystemField::ALL
        .iter()
        .map(|&field| {
            let column = mapping.column_for(field)?.trim();
            headers.iter().position(|header| header == column)
        })
        .collect()
}

fn map_row(row_index: usize, row: &[String], columns: &[Option<usize>]) -> CandidateRecord {
    let mut record = CandidateRecord {
        row_index,
        ..Default::default()
    };
    for (field, column) in SystemField::ALL.iter().zip(columns) {
        let value = column
            .and_then(|c| row.get(c))
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
            .map(str::to_string);
        record.set_value(*field, value);
    }
    record.errors = validate(&mut record)
        .iter()
        .map(ToString::to_string)
        .collect();
    record
}
