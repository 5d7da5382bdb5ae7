use crate::model::candidate::{CandidateRecord, ColumnMapping};
use serde::{Deserialize, Serialize};

/// Query string of `GET /leads`. Every filter is optional and blank values are
/// ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadListQuery {
    pub status: Option<String>,
    pub enquiry_for: Option<String>,
    /// Substring match.
    pub agent_name: Option<String>,
    /// `YYYY-MM-DD`, inclusive from the start of that day.
    pub date_from: Option<String>,
    /// `YYYY-MM-DD`, inclusive until the end of that day.
    pub date_to: Option<String>,
}

/// Body of `PUT /leads/{id}`. Only the fields present are changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateLeadRequest {
    pub customer_name: Option<String>,
    pub mobile_number: Option<String>,
    pub enquiry_for: Option<String>,
    pub status: Option<String>,
    pub rejection_reason: Option<String>,
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
}

impl UpdateLeadRequest {
    pub fn is_empty(&self) -> bool {
        self.customer_name.is_none()
            && self.mobile_number.is_none()
            && self.enquiry_for.is_none()
            && self.status.is_none()
            && self.rejection_reason.is_none()
            && self.agent_id.is_none()
            && self.agent_name.is_none()
    }
}

/// Body of `POST /leads/preview`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewRequest {
    /// Token returned by `POST /leads/upload-headers`.
    #[serde(rename = "fileToken")]
    pub file_token: String,
    pub mapping: ColumnMapping,
}

/// Body of `POST /leads/upload-final`: the preview rows the user selected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFinalRequest {
    pub rows: Vec<CandidateRecord>,
}
