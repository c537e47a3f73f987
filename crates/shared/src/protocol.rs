use serde::{Deserialize, Serialize};

use crate::domain::{ComplaintId, ComplaintRecord};

/// `message` value the service uses to signal an unknown complaint id.
pub const COMPLAINT_NOT_FOUND: &str = "Complaint not found";

pub fn register_route() -> &'static str {
    "/register"
}

pub fn status_route_prefix() -> &'static str {
    "/status"
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComplaint {
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterComplaintResponse {
    pub complaint_id: ComplaintId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `GET /status/{id}`.
///
/// Every field is optional because the not-found answer carries only `message`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplaintStatusResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ComplaintId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComplaintStatusResponse {
    pub fn not_found() -> Self {
        Self {
            message: Some(COMPLAINT_NOT_FOUND.to_string()),
            ..Self::default()
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.message.as_deref() == Some(COMPLAINT_NOT_FOUND)
    }

    /// Returns the record when every required field is present.
    pub fn into_record(self) -> Option<ComplaintRecord> {
        Some(ComplaintRecord {
            id: self.id?,
            name: self.name,
            mobile: self.mobile?,
            email: self.email?,
            details: self.details?,
            status: self.status?,
            created_at: self.created_at?,
        })
    }
}

impl From<ComplaintRecord> for ComplaintStatusResponse {
    fn from(record: ComplaintRecord) -> Self {
        Self {
            id: Some(record.id),
            name: record.name,
            mobile: Some(record.mobile),
            email: Some(record.email),
            details: Some(record.details),
            status: Some(record.status),
            created_at: Some(record.created_at),
            message: None,
        }
    }
}
