use crate::model::candidate::CandidateRecord;
use crate::model::field::SystemField;
use crate::model::lead::Lead;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Generic `{success, message}` body. Every error response uses it with
/// `success: false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadListResponse {
    pub success: bool,
    pub data: Vec<Lead>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadResponse {
    pub success: bool,
    pub message: String,
    pub data: Lead,
}

/// Answer to an upload: the spreadsheet's columns, the fields they can be
/// mapped to, and the token that names the stored file in the next step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadHeadersResponse {
    pub success: bool,
    pub file_columns: Vec<String>,
    pub system_fields: Vec<SystemField>,
    #[serde(rename = "fileToken")]
    pub file_token: String,
}

/// Mapped rows plus their validation errors, keyed by spreadsheet row number.
/// Only rows with at least one error appear in `errors`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub success: bool,
    pub preview: Vec<CandidateRecord>,
    pub errors: BTreeMap<usize, Vec<String>>,
}

impl PreviewResponse {
    /// Row numbers a client should tick by default: every row without errors.
    /// Duplicates stay selectable.
    pub fn default_selection(&self) -> Vec<usize> {
        self.preview
            .iter()
            .map(|record| record.row_index)
            .filter(|row| !self.errors.contains_key(row))
            .collect()
    }
}

/// Outcome counters of a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total: usize,
    pub inserted: usize,
    pub updated: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFinalResponse {
    pub success: bool,
    pub summary: ImportSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selection_skips_rows_with_errors_but_keeps_duplicates() {
        let row = |row_index, duplicate| CandidateRecord {
            row_index,
            duplicate,
            ..Default::default()
        };
        let mut errors = BTreeMap::new();
        errors.insert(3, vec!["customer_name missing".to_string()]);
        let response = PreviewResponse {
            success: true,
            preview: vec![row(2, false), row(3, false), row(4, true)],
            errors,
        };
        assert_eq!(response.default_selection(), vec![2, 4]);
    }

    #[test]
    fn error_map_keys_serialize_as_strings() {
        let mut errors = BTreeMap::new();
        errors.insert(2, vec!["enquiry_for missing".to_string()]);
        let response = PreviewResponse {
            success: true,
            preview: Vec::new(),
            errors,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["errors"]["2"][0], "enquiry_for missing");
    }
}
