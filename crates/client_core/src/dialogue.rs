//! Conversation state machine for complaint registration and status lookup.
//!
//! Every submitted line is first checked against the canned small-talk rules,
//! then dispatched on the current [`DialogueStep`]. Each step variant carries
//! only the draft fields collected so far, so a draft can never skip ahead of
//! its validators.

use std::{fmt, sync::Arc};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use shared::{domain::ComplaintRecord, protocol::NewComplaint};
use tracing::{debug, warn};

use crate::{
    canned::match_canned,
    transcript::{Message, Transcript},
    validation::{is_valid_email, is_valid_mobile},
    ComplaintService, StatusLookup,
};

pub mod replies {
    pub const GREETING: &str =
        "Hello! I can help you register complaints or check status. What would you like to do?";
    pub const CONFIRM_REGISTER: &str =
        "Do you want to register a complaint? Please answer Yes or No.";
    pub const CONFIRM_STATUS: &str =
        "Do you want to check your complaint status? Please answer Yes or No.";
    pub const FALLBACK: &str = "Sorry, I can only help with complaint registration or status. Did you mean to register or check status?";
    pub const YES_OR_NO: &str = "Please reply with Yes or No.";
    pub const REGISTER_DECLINED: &str = "Okay, let me know if you want to register or check status.";
    pub const STATUS_DECLINED: &str =
        "Okay, let me know if you want to register a complaint or check status.";
    pub const ASK_NAME: &str = "Please provide your name.";
    pub const ASK_MOBILE: &str = "Please provide your mobile number.";
    pub const INVALID_MOBILE: &str = "Invalid mobile number. Please enter a valid 10-digit mobile number (optionally prefixed with +91).";
    pub const ASK_EMAIL: &str = "Please provide your email address.";
    pub const INVALID_EMAIL: &str = "❌ Invalid email address. Please enter a valid email.";
    pub const ASK_DETAILS: &str = "Please describe your grievance.";
    pub const ASK_COMPLAINT_ID: &str = "Please provide your complaint ID.";
    pub const REGISTER_FAILED: &str = "❌ Failed to register complaint. Please try again.";
    pub const NOT_FOUND: &str = "❌ Complaint not found. Please check your ID and try again.";
    pub const STATUS_FAILED: &str = "❌ Error fetching complaint status. Please try again later.";
}

const REGISTER_KEYWORDS: [&str; 4] = ["register", "complaint", "file", "report"];
const STATUS_KEYWORDS: [&str; 3] = ["status", "check", "track"];

/// Display pattern for complaint timestamps, e.g. `5/1/2024, 10:20:30 AM`.
const CREATED_AT_DISPLAY: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DialogueStep {
    #[default]
    Initial,
    ConfirmRegister,
    ConfirmStatus,
    AskName,
    AskMobile {
        name: String,
    },
    AskEmail {
        name: String,
        mobile: String,
    },
    AskDetails {
        name: String,
        mobile: String,
        email: String,
    },
    AskStatusId,
}

/// Payload-free discriminant of [`DialogueStep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Initial,
    ConfirmRegister,
    ConfirmStatus,
    AskName,
    AskMobile,
    AskEmail,
    AskDetails,
    AskStatusId,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepKind::Initial => "initial",
            StepKind::ConfirmRegister => "confirm_register",
            StepKind::ConfirmStatus => "confirm_status",
            StepKind::AskName => "ask_name",
            StepKind::AskMobile => "ask_mobile",
            StepKind::AskEmail => "ask_email",
            StepKind::AskDetails => "ask_details",
            StepKind::AskStatusId => "ask_status_id",
        };
        f.write_str(name)
    }
}

/// Flat view of the registration fields gathered so far; unset fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintDraft {
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub details: String,
}

impl DialogueStep {
    pub fn kind(&self) -> StepKind {
        match self {
            DialogueStep::Initial => StepKind::Initial,
            DialogueStep::ConfirmRegister => StepKind::ConfirmRegister,
            DialogueStep::ConfirmStatus => StepKind::ConfirmStatus,
            DialogueStep::AskName => StepKind::AskName,
            DialogueStep::AskMobile { .. } => StepKind::AskMobile,
            DialogueStep::AskEmail { .. } => StepKind::AskEmail,
            DialogueStep::AskDetails { .. } => StepKind::AskDetails,
            DialogueStep::AskStatusId => StepKind::AskStatusId,
        }
    }

    pub fn draft(&self) -> ComplaintDraft {
        match self {
            DialogueStep::AskMobile { name } => ComplaintDraft {
                name: name.clone(),
                ..ComplaintDraft::default()
            },
            DialogueStep::AskEmail { name, mobile } => ComplaintDraft {
                name: name.clone(),
                mobile: mobile.clone(),
                ..ComplaintDraft::default()
            },
            DialogueStep::AskDetails {
                name,
                mobile,
                email,
            } => ComplaintDraft {
                name: name.clone(),
                mobile: mobile.clone(),
                email: email.clone(),
                details: String::new(),
            },
            _ => ComplaintDraft::default(),
        }
    }
}

pub struct DialogueController {
    service: Arc<dyn ComplaintService>,
    step: DialogueStep,
    transcript: Transcript,
}

impl DialogueController {
    pub fn new(service: Arc<dyn ComplaintService>) -> Self {
        let mut transcript = Transcript::new();
        transcript.push(Message::bot(replies::GREETING));
        Self {
            service,
            step: DialogueStep::Initial,
            transcript,
        }
    }

    pub fn step(&self) -> &DialogueStep {
        &self.step
    }

    pub fn draft(&self) -> ComplaintDraft {
        self.step.draft()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Records `raw` and the assistant's answer to it.
    ///
    /// Blank input is ignored and yields `None`. Service failures never
    /// propagate; they become an apology and a return to the menu.
    pub async fn handle_input(&mut self, raw: &str) -> Option<Message> {
        self.record_input(raw)?;
        Some(self.reply_to(raw).await)
    }

    /// Appends `raw` to the transcript as the user's message.
    ///
    /// Returns `None` for blank input, which must not be answered either.
    pub fn record_input(&mut self, raw: &str) -> Option<Message> {
        if raw.trim().is_empty() {
            return None;
        }
        let message = Message::user(raw);
        self.transcript.push(message.clone());
        Some(message)
    }

    /// Answers input already taken by [`record_input`](Self::record_input)
    /// and appends the reply to the transcript.
    pub async fn reply_to(&mut self, raw: &str) -> Message {
        let reply = Message::bot(self.respond(raw.trim()).await);
        self.transcript.push(reply.clone());
        reply
    }

    async fn respond(&mut self, trimmed: &str) -> String {
        let normalized = trimmed.to_lowercase();
        if let Some(rule) = match_canned(&normalized) {
            if rule.resets {
                self.transition(DialogueStep::Initial);
            }
            return rule.reply.to_string();
        }

        let current = std::mem::take(&mut self.step);
        let (next, reply) = match current {
            DialogueStep::Initial => {
                if contains_any(&normalized, &REGISTER_KEYWORDS) {
                    (DialogueStep::ConfirmRegister, replies::CONFIRM_REGISTER.into())
                } else if contains_any(&normalized, &STATUS_KEYWORDS) {
                    (DialogueStep::ConfirmStatus, replies::CONFIRM_STATUS.into())
                } else {
                    (DialogueStep::Initial, replies::FALLBACK.into())
                }
            }
            DialogueStep::ConfirmRegister => match normalized.as_str() {
                "yes" => (DialogueStep::AskName, replies::ASK_NAME.into()),
                "no" => (DialogueStep::Initial, replies::REGISTER_DECLINED.into()),
                _ => (DialogueStep::ConfirmRegister, replies::YES_OR_NO.into()),
            },
            DialogueStep::ConfirmStatus => match normalized.as_str() {
                "yes" => (DialogueStep::AskStatusId, replies::ASK_COMPLAINT_ID.into()),
                "no" => (DialogueStep::Initial, replies::STATUS_DECLINED.into()),
                _ => (DialogueStep::ConfirmStatus, replies::YES_OR_NO.into()),
            },
            DialogueStep::AskName => (
                DialogueStep::AskMobile {
                    name: trimmed.to_string(),
                },
                replies::ASK_MOBILE.into(),
            ),
            DialogueStep::AskMobile { name } => {
                if is_valid_mobile(trimmed) {
                    (
                        DialogueStep::AskEmail {
                            name,
                            mobile: trimmed.to_string(),
                        },
                        replies::ASK_EMAIL.into(),
                    )
                } else {
                    (DialogueStep::AskMobile { name }, replies::INVALID_MOBILE.into())
                }
            }
            DialogueStep::AskEmail { name, mobile } => {
                if is_valid_email(trimmed) {
                    (
                        DialogueStep::AskDetails {
                            name,
                            mobile,
                            email: trimmed.to_string(),
                        },
                        replies::ASK_DETAILS.into(),
                    )
                } else {
                    (
                        DialogueStep::AskEmail { name, mobile },
                        replies::INVALID_EMAIL.into(),
                    )
                }
            }
            DialogueStep::AskDetails {
                name,
                mobile,
                email,
            } => {
                let complaint = NewComplaint {
                    name,
                    mobile,
                    email,
                    details: trimmed.to_string(),
                };
                (DialogueStep::Initial, self.register(&complaint).await)
            }
            DialogueStep::AskStatusId => (DialogueStep::Initial, self.lookup(trimmed).await),
        };

        self.transition(next);
        reply
    }

    async fn register(&self, complaint: &NewComplaint) -> String {
        match self.service.create_complaint(complaint).await {
            Ok(complaint_id) => format!(
                "✅ Your complaint has been registered successfully.\n🆔 Complaint ID: {complaint_id}"
            ),
            Err(error) => {
                warn!(%error, "complaint registration failed");
                replies::REGISTER_FAILED.to_string()
            }
        }
    }

    async fn lookup(&self, complaint_id: &str) -> String {
        match self.service.complaint_status(complaint_id).await {
            Ok(StatusLookup::Found(record)) => format_complaint(&record),
            Ok(StatusLookup::NotFound) => replies::NOT_FOUND.to_string(),
            Err(error) => {
                warn!(complaint_id, %error, "complaint status lookup failed");
                replies::STATUS_FAILED.to_string()
            }
        }
    }

    fn transition(&mut self, next: DialogueStep) {
        if self.step.kind() != next.kind() {
            debug!(from = %self.step.kind(), to = %next.kind(), "dialogue step changed");
        }
        self.step = next;
    }
}

fn contains_any(input: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| input.contains(keyword))
}

pub fn format_complaint(record: &ComplaintRecord) -> String {
    format!(
        "📄 Complaint Details:\n🆔 ID: {}\n📱 Mobile: {}\n📧 Email: {}\n📝 Issue: {}\n📌 Status: {}\n🕒 Created At: {}",
        record.id,
        record.mobile,
        record.email,
        record.details,
        record.status,
        format_created_at(&record.created_at),
    )
}

/// Renders a service timestamp in the viewer's local time zone.
pub fn format_created_at(raw: &str) -> String {
    format_created_at_in(raw, &Local)
}

/// Accepts RFC 3339 or a naive ISO-8601 timestamp (read as wall time in `tz`).
/// Unparseable input is returned unchanged.
pub fn format_created_at_in<Tz>(raw: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return at.with_timezone(tz).format(CREATED_AT_DISPLAY).to_string();
    }
    if let Ok(naive) = raw.parse::<NaiveDateTime>() {
        if let Some(at) = tz.from_local_datetime(&naive).earliest() {
            return at.format(CREATED_AT_DISPLAY).to_string();
        }
    }
    raw.to_string()
}

#[cfg(test)]
#[path = "tests/dialogue_tests.rs"]
mod tests;
