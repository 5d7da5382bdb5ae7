use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A lead attribute that a spreadsheet column can be mapped onto.
///
/// The set is fixed. `SystemField::ALL` is returned to the client after an
/// upload so it can offer one mapping dropdown per field, and it drives the
/// order in which the import engine fills a candidate record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemField {
    CustomerName,
    MobileNumber,
    EnquiryFor,
    Status,
    RejectionReason,
    AgentId,
    AgentName,
}

impl SystemField {
    pub const ALL: [SystemField; 7] = [
        SystemField::CustomerName,
        SystemField::MobileNumber,
        SystemField::EnquiryFor,
        SystemField::Status,
        SystemField::RejectionReason,
        SystemField::AgentId,
        SystemField::AgentName,
    ];

    /// Fields every imported row must carry.
    pub const REQUIRED: [SystemField; 3] = [
        SystemField::CustomerName,
        SystemField::MobileNumber,
        SystemField::EnquiryFor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SystemField::CustomerName => "customer_name",
            SystemField::MobileNumber => "mobile_number",
            SystemField::EnquiryFor => "enquiry_for",
            SystemField::Status => "status",
            SystemField::RejectionReason => "rejection_reason",
            SystemField::AgentId => "agent_id",
            SystemField::AgentName => "agent_name",
        }
    }

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }
}

impl fmt::Display for SystemField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a lead stands in the sales pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::Pending => "pending",
            LeadStatus::Approved => "approved",
            LeadStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status string is not one of pending/approved/rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError(pub String);

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid status '{}' (use pending/approved/rejected)",
            self.0
        )
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for LeadStatus {
    type Err = ParseStatusError;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(LeadStatus::Pending),
            "approved" => Ok(LeadStatus::Approved),
            "rejected" => Ok(LeadStatus::Rejected),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_first_three_fields_are_required() {
        let required: Vec<_> = SystemField::ALL
            .iter()
            .copied()
            .filter(|f| f.is_required())
            .collect();
        assert_eq!(required, SystemField::REQUIRED.to_vec());
        assert!(!SystemField::RejectionReason.is_required());
    }

    #[test]
    fn fields_serialize_as_snake_case_names() {
        let json = serde_json::to_string(&SystemField::ALL).unwrap();
        assert_eq!(
            json,
            r#"["customer_name","mobile_number","enquiry_for","status","rejection_reason","agent_id","agent_name"]"#
        );
        for field in SystemField::ALL {
            assert_eq!(
                serde_json::to_string(&field).unwrap(),
                format!("\"{}\"", field)
            );
        }
    }

    #[test]
    fn status_parsing_ignores_case() {
        assert_eq!("REJECTED".parse(), Ok(LeadStatus::Rejected));
        assert_eq!(" Approved ".parse(), Ok(LeadStatus::Approved));
        assert_eq!("pending".parse(), Ok(LeadStatus::Pending));
        assert!("done".parse::<LeadStatus>().is_err());
        assert!("".parse::<LeadStatus>().is_err());
    }
}
