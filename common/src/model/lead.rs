use crate::model::field::LeadStatus;
use serde::{Deserialize, Serialize};

/// A persisted sales prospect.
///
/// `id` is the numeric key used in `/leads/{id}` URLs. `lead_id` is the
/// human-facing reference (`LD20240115-482`) generated when an import first
/// inserts the lead. `mobile_number` is unique across all leads and is the key
/// imports upsert on.
///
/// Timestamps are local-time text in `YYYY-MM-DD HH:MM:SS` form, so they sort
/// and compare lexically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    #[serde(rename = "leadId")]
    pub lead_id: String,
    pub customer_name: String,
    pub mobile_number: String,
    pub enquiry_for: String,
    pub status: LeadStatus,
    /// Present whenever `status` is `rejected`.
    pub rejection_reason: Option<String>,
    pub agent_id: Option<String>,
    pub agent_name: Option<String>,
    pub created_date: String,
    pub updated_date: String,
}
