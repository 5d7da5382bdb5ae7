use crate::model::field::SystemField;
use serde::{Deserialize, Serialize};

/// Which spreadsheet column feeds each system field.
///
/// Sent by the client with the preview request, e.g.
/// `{"customer_name": "FullName", "mobile_number": "MobNo"}`. Fields that are
/// absent, null or blank are unmapped. Keys that are not system fields are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub customer_name: Option<String>,
    pub mobile_number: Option<String>,
    pub enquiry_for: Option<String>,
    pub status: Option<String>,
    pub rejection_reason: Option<String>,
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
}

impl ColumnMapping {
    /// The source column mapped to `field`, if one was chosen.
    pub fn column_for(&self, field: SystemField) -> Option<&str> {
        let column = match field {
            SystemField::CustomerName => &self.customer_name,
            SystemField::MobileNumber => &self.mobile_number,
            SystemField::EnquiryFor => &self.enquiry_for,
            SystemField::Status => &self.status,
            SystemField::RejectionReason => &self.rejection_reason,
            SystemField::AgentId => &self.agent_id,
            SystemField::AgentName => &self.agent_name,
        };
        column.as_deref().filter(|c| !c.trim().is_empty())
    }

    pub fn set(&mut self, field: SystemField, column: impl Into<String>) -> &mut Self {
        *self.slot_mut(field) = Some(column.into());
        self
    }

    fn slot_mut(&mut self, field: SystemField) -> &mut Option<String> {
        match field {
            SystemField::CustomerName => &mut self.customer_name,
            SystemField::MobileNumber => &mut self.mobile_number,
            SystemField::EnquiryFor => &mut self.enquiry_for,
            SystemField::Status => &mut self.status,
            SystemField::RejectionReason => &mut self.rejection_reason,
            SystemField::AgentId => &mut self.agent_id,
            SystemField::AgentName => &mut self.agent_name,
        }
    }
}

/// One spreadsheet row after column mapping and validation, before it is
/// committed.
///
/// The preview endpoint produces these and the client sends the rows the user
/// kept back to the final upload endpoint. On that return trip `duplicate`,
/// `_rowIndex` and `errors` are informational and may be left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub customer_name: Option<String>,
    pub mobile_number: Option<String>,
    pub enquiry_for: Option<String>,
    pub status: Option<String>,
    pub rejection_reason: Option<String>,
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
    /// A lead with this mobile number already exists; committing updates it.
    #[serde(default)]
    pub duplicate: bool,
    /// Spreadsheet row number, the header being row 1.
    #[serde(rename = "_rowIndex", default)]
    pub row_index: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl CandidateRecord {
    pub fn value(&self, field: SystemField) -> Option<&str> {
        match field {
            SystemField::CustomerName => self.customer_name.as_deref(),
            SystemField::MobileNumber => self.mobile_number.as_deref(),
            SystemField::EnquiryFor => self.enquiry_for.as_deref(),
            SystemField::Status => self.status.as_deref(),
            SystemField::RejectionReason => self.rejection_reason.as_deref(),
            SystemField::AgentId => self.agent_id.as_deref(),
            SystemField::AgentName => self.agent_name.as_deref(),
        }
    }

    pub fn set_value(&mut self, field: SystemField, value: Option<String>) {
        let slot = match field {
            SystemField::CustomerName => &mut self.customer_name,
            SystemField::MobileNumber => &mut self.mobile_number,
            SystemField::EnquiryFor => &mut self.enquiry_for,
            SystemField::Status => &mut self.status,
            SystemField::RejectionReason => &mut self.rejection_reason,
            SystemField::AgentId => &mut self.agent_id,
            SystemField::AgentName => &mut self.agent_name,
        };
        *slot = value;
    }
}
