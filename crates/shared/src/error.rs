use serde::{Deserialize, Serialize};

/// Body the complaint service sends alongside a non-2xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ServiceErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn summary(&self) -> String {
        match &self.details {
            Some(details) if !details.is_empty() => format!("{} ({details})", self.error),
            _ => self.error.clone(),
        }
    }
}
