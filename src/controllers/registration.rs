// src/controllers/registration.rs
//! The registration modal's submission state machine.
//!
//! `Idle -> Submitting -> Success | Failure(message)`, with `Failure`
//! allowed to re-enter `Submitting`. Every open or close of the modal bumps
//! a generation counter; a gateway result carrying an older generation is
//! dropped instead of being applied to a form the visitor no longer sees.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;
use validator::{Validate, ValidationErrors};

use crate::models::{ReferralSource, RegistrationOutcome, RegistrationRequest};
use crate::services::analytics::Tracker;

pub const GENERIC_FAILURE_MESSAGE: &str = "Registration failed. Please try again.";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Submitting,
    Success,
    Failure(String),
}

/// Raw form fields as the visitor typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
pub struct RegistrationDraft {
    #[serde(default)]
    #[validate(length(min = 1, message = "Full name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Date of birth is required"))]
    pub date_of_birth: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Tell us how you heard about GlitchHunt"))]
    pub referral_source: String,
}

impl RegistrationDraft {
    fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            date_of_birth: self.date_of_birth.trim().to_string(),
            referral_source: self.referral_source.trim().to_string(),
        }
    }

    /// Applies the required-field constraints and converts to a request.
    pub fn to_request(&self) -> Result<RegistrationRequest, FormError> {
        let draft = self.trimmed();
        draft
            .validate()
            .map_err(|errors| FormError::Invalid(first_message(&errors)))?;

        let date_of_birth = NaiveDate::parse_from_str(&draft.date_of_birth, DATE_FORMAT)
            .map_err(|_| FormError::Invalid("Date of birth must be YYYY-MM-DD".to_string()))?;
        let referral_source = draft
            .referral_source
            .parse::<ReferralSource>()
            .map_err(FormError::Invalid)?;

        Ok(RegistrationRequest {
            name: draft.name,
            email: draft.email,
            date_of_birth,
            referral_source,
        })
    }
}

/// Reports errors in form order so the message is stable.
fn first_message(errors: &ValidationErrors) -> String {
    let by_field = errors.field_errors();
    ["name", "email", "date_of_birth", "referral_source"]
        .iter()
        .filter_map(|field| by_field.get(field))
        .flat_map(|errors| errors.iter())
        .find_map(|error| error.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Please fill in all required fields".to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("a registration is already being submitted")]
    InFlight,
    #[error("this registration is already complete")]
    Completed,
    #[error("{0}")]
    Invalid(String),
}

/// Binds a gateway call to the modal instance that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionTicket {
    generation: u64,
    referral_source: ReferralSource,
}

pub struct RegistrationForm {
    draft: RegistrationDraft,
    email_locked: bool,
    state: SubmissionState,
    generation: u64,
    tracker: Tracker,
}

impl RegistrationForm {
    pub fn new(tracker: Tracker) -> Self {
        Self {
            draft: RegistrationDraft::default(),
            email_locked: false,
            state: SubmissionState::Idle,
            generation: 0,
            tracker,
        }
    }

    /// Resets to `Idle` and seeds the email. A non-empty seed locks the
    /// email field.
    pub fn reopen(&mut self, prefilled_email: &str) {
        self.generation += 1;
        self.draft = RegistrationDraft {
            email: prefilled_email.to_string(),
            ..Default::default()
        };
        self.email_locked = !prefilled_email.trim().is_empty();
        self.state = SubmissionState::Idle;
    }

    /// Throws away whatever the visitor typed; any in-flight result is
    /// ignored when it lands.
    pub fn discard(&mut self) {
        self.generation += 1;
        self.draft = RegistrationDraft::default();
        self.email_locked = false;
        self.state = SubmissionState::Idle;
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn draft(&self) -> &RegistrationDraft {
        &self.draft
    }

    pub fn email_locked(&self) -> bool {
        self.email_locked
    }

    pub fn is_submit_disabled(&self) -> bool {
        self.state == SubmissionState::Submitting
    }

    /// The success panel replaces the form entirely.
    pub fn shows_form(&self) -> bool {
        self.state != SubmissionState::Success
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SubmissionState::Failure(message) => Some(message),
            _ => None,
        }
    }

    fn editable(&self) -> bool {
        self.state != SubmissionState::Success
    }

    pub fn set_name(&mut self, name: &str) {
        if self.editable() {
            self.draft.name = name.to_string();
        }
    }

    /// Returns false when the field is read-only.
    pub fn set_email(&mut self, email: &str) -> bool {
        if self.email_locked || !self.editable() {
            return false;
        }
        self.draft.email = email.to_string();
        true
    }

    pub fn set_date_of_birth(&mut self, date_of_birth: &str) {
        if self.editable() {
            self.draft.date_of_birth = date_of_birth.to_string();
        }
    }

    pub fn set_referral_source(&mut self, referral_source: &str) {
        if self.editable() {
            self.draft.referral_source = referral_source.to_string();
        }
    }

    /// Copies a posted form onto the draft, honouring the email lock.
    /// Ignored while a submission is in flight, so the draft keeps the
    /// values that were actually sent.
    pub fn apply(&mut self, input: &RegistrationDraft) {
        if self.is_submit_disabled() {
            return;
        }
        self.set_name(&input.name);
        self.set_email(&input.email);
        self.set_date_of_birth(&input.date_of_birth);
        self.set_referral_source(&input.referral_source);
    }

    /// `Idle | Failure -> Submitting`. Validation failures never reach the
    /// gateway; they drop any earlier failure message and leave the form
    /// `Idle`.
    pub fn begin_submit(&mut self) -> Result<(SubmissionTicket, RegistrationRequest), FormError> {
        match self.state {
            SubmissionState::Submitting => return Err(FormError::InFlight),
            SubmissionState::Success => return Err(FormError::Completed),
            SubmissionState::Idle | SubmissionState::Failure(_) => {}
        }

        let request = match self.draft.to_request() {
            Ok(request) => request,
            Err(e) => {
                self.state = SubmissionState::Idle;
                return Err(e);
            }
        };
        self.state = SubmissionState::Submitting;

        let ticket = SubmissionTicket {
            generation: self.generation,
            referral_source: request.referral_source,
        };
        Ok((ticket, request))
    }

    /// `Submitting -> Success | Failure`. Returns false when the result
    /// belongs to an earlier modal instance and was dropped.
    pub fn complete(&mut self, ticket: SubmissionTicket, outcome: &RegistrationOutcome) -> bool {
        self.tracker
            .track_registration(outcome.success, Some(ticket.referral_source.as_str()));

        if ticket.generation != self.generation || self.state != SubmissionState::Submitting {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "Dropping registration result for a closed form"
            );
            return false;
        }

        if outcome.success {
            self.state = SubmissionState::Success;
            self.draft = RegistrationDraft::default();
        } else {
            let message = outcome
                .error
                .clone()
                .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
            self.state = SubmissionState::Failure(message);
        }
        true
    }
}
