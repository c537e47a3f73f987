use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use shared::{
    domain::{ComplaintId, ComplaintRecord},
    error::ServiceErrorBody,
    protocol::{
        register_route, status_route_prefix, ComplaintStatusResponse, NewComplaint,
        RegisterComplaintResponse,
    },
};
use tracing::{info, warn};
use url::Url;

pub mod canned;
pub mod dialogue;
pub mod error;
pub mod session;
pub mod transcript;
pub mod validation;

pub use dialogue::{ComplaintDraft, DialogueController, DialogueStep, StepKind};
pub use error::{ComplaintServiceError, SubmitError};
pub use session::{ChatEvent, ChatSession, OverlapPolicy, SessionOptions};
pub use transcript::{Message, Sender, Transcript};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLookup {
    Found(ComplaintRecord),
    NotFound,
}

/// Remote store of complaint records.
#[async_trait]
pub trait ComplaintService: Send + Sync {
    async fn create_complaint(
        &self,
        complaint: &NewComplaint,
    ) -> Result<ComplaintId, ComplaintServiceError>;
    async fn complaint_status(
        &self,
        complaint_id: &str,
    ) -> Result<StatusLookup, ComplaintServiceError>;
}

/// `ComplaintService` over the REST endpoints `POST /register` and
/// `GET /status/{id}`.
pub struct HttpComplaintClient {
    http: Client,
    base_url: Url,
}

impl HttpComplaintClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ComplaintServiceError> {
        let base_url = parse_service_url(base_url)?;
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ComplaintServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ComplaintServiceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

pub fn parse_service_url(raw: &str) -> Result<Url, ComplaintServiceError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ComplaintServiceError::InvalidUrl(format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(ComplaintServiceError::InvalidUrl(format!(
            "{raw}: expected an http:// or https:// base url"
        )));
    }
    Ok(url)
}

#[async_trait]
impl ComplaintService for HttpComplaintClient {
    async fn create_complaint(
        &self,
        complaint: &NewComplaint,
    ) -> Result<ComplaintId, ComplaintServiceError> {
        let url = self.endpoint(&[register_route().trim_start_matches('/')])?;
        let response = self.http.post(url).json(complaint).send().await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body: RegisterComplaintResponse = response
            .json()
            .await
            .map_err(|e| ComplaintServiceError::MalformedResponse(e.to_string()))?;
        info!(complaint_id = %body.complaint_id, "complaint registered");
        Ok(body.complaint_id)
    }

    async fn complaint_status(
        &self,
        complaint_id: &str,
    ) -> Result<StatusLookup, ComplaintServiceError> {
        let url = self.endpoint(&[
            status_route_prefix().trim_start_matches('/'),
            complaint_id,
        ])?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(rejection(response).await);
        }

        let raw = response.text().await?;
        let body = serde_json::from_str::<ComplaintStatusResponse>(&raw);
        match body {
            Ok(body) if body.is_not_found() => {
                info!(complaint_id, "complaint not found");
                Ok(StatusLookup::NotFound)
            }
            Ok(body) if status.is_success() => body
                .into_record()
                .map(StatusLookup::Found)
                .ok_or_else(|| {
                    ComplaintServiceError::MalformedResponse(
                        "status response is missing complaint fields".to_string(),
                    )
                }),
            Ok(_) => Err(ComplaintServiceError::Rejected {
                status: status.as_u16(),
                message: raw,
            }),
            Err(e) if status.is_success() => {
                Err(ComplaintServiceError::MalformedResponse(e.to_string()))
            }
            Err(_) => Err(ComplaintServiceError::Rejected {
                status: status.as_u16(),
                message: raw,
            }),
        }
    }
}

async fn rejection(response: Response) -> ComplaintServiceError {
    let status = response.status();
    let raw = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ServiceErrorBody>(&raw)
        .map(|body| body.summary())
        .unwrap_or_else(|_| {
            if raw.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                raw
            }
        });
    warn!(status = status.as_u16(), %message, "complaint service rejected request");
    ComplaintServiceError::Rejected {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
