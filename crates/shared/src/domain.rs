use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier the complaint service assigns on registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComplaintId(pub String);

impl ComplaintId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComplaintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored complaint as returned by a status lookup.
///
/// `created_at` is kept as the raw timestamp string; the service writes naive
/// ISO-8601 values, so interpretation is left to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintRecord {
    pub id: ComplaintId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub mobile: String,
    pub email: String,
    pub details: String,
    pub status: String,
    pub created_at: String,
}
