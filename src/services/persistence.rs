// src/services/persistence.rs
use axum::async_trait;
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::{base_url, Capability, GatewayError};
use crate::config::SupabaseConfig;
use crate::models::{ReferralSource, RegistrationOutcome, RegistrationRequest};
use crate::utils::validation::normalize_email;

pub const REGISTRATIONS_TABLE: &str = "early_registrations";
pub const WELCOME_FUNCTION: &str = "send-welcome-email";
/// Postgres `unique_violation`.
pub const UNIQUE_VIOLATION: &str = "23505";

pub const DUPLICATE_EMAIL_MESSAGE: &str = "This email is already registered.";
pub const SAVE_FAILED_MESSAGE: &str = "Failed to save registration.";
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// One row of `early_registrations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationRow {
    pub name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub referral_source: ReferralSource,
}

/// Remote side of the persistence gateway.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn insert_registration(&self, row: &RegistrationRow) -> Result<(), GatewayError>;

    async fn send_welcome_email(&self, name: &str, email: &str) -> Result<(), GatewayError>;
}

/// PostgREST error body.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

/// Supabase over plain HTTP: PostgREST for the insert, edge functions for
/// the welcome email.
pub struct SupabaseStore {
    client: reqwest::Client,
    insert_url: url::Url,
    welcome_url: url::Url,
}

impl SupabaseStore {
    pub fn new(config: &SupabaseConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let base = base_url(&config.url)?;

        let mut headers = HeaderMap::new();
        let invalid_key = |_| GatewayError::Config("SUPABASE_ANON_KEY is not a valid header value");
        let key = HeaderValue::from_str(&config.anon_key).map_err(invalid_key)?;
        let bearer =
            HeaderValue::from_str(&format!("Bearer {}", config.anon_key)).map_err(invalid_key)?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("glitchhunt/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            insert_url: base.join(&format!("rest/v1/{}", REGISTRATIONS_TABLE))?,
            welcome_url: base.join(&format!("functions/v1/{}", WELCOME_FUNCTION))?,
        })
    }
}

#[async_trait]
impl RegistrationStore for SupabaseStore {
    async fn insert_registration(&self, row: &RegistrationRow) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.insert_url.clone())
            .header("Prefer", "return=minimal")
            .json(&[row])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: PostgrestError = serde_json::from_str(&body).unwrap_or_default();
        Err(GatewayError::Remote {
            status: status.as_u16(),
            code: parsed.code,
            message: parsed.message.unwrap_or_default(),
            details: parsed.details,
        })
    }

    async fn send_welcome_email(&self, name: &str, email: &str) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.welcome_url.clone())
            .json(&serde_json::json!({ "name": name, "email": email }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response.text().await.unwrap_or_default();
        Err(GatewayError::Remote {
            status: status.as_u16(),
            code: None,
            message,
            details: None,
        })
    }
}

#[derive(Clone)]
pub struct PersistenceGateway {
    store: Capability<Arc<dyn RegistrationStore>>,
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn RegistrationStore>) -> Self {
        Self {
            store: Capability::Configured(store),
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            store: Capability::Unconfigured { service: "supabase" },
        }
    }

    /// Builds the Supabase-backed gateway, degrading to `Unconfigured` when
    /// the settings are missing or unusable.
    pub fn from_config(config: Option<&SupabaseConfig>, timeout: Duration) -> Self {
        let Some(config) = config else {
            return Self::unconfigured();
        };
        match SupabaseStore::new(config, timeout) {
            Ok(store) => Self::new(Arc::new(store)),
            Err(e) => {
                warn!(error = %e, "Supabase client could not be built; registrations disabled");
                Self::unconfigured()
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.store.is_configured()
    }

    /// Inserts one registration. Never fails: every error becomes an
    /// unsuccessful outcome.
    pub async fn save_registration(&self, data: &RegistrationRequest) -> RegistrationOutcome {
        let store = match self.store.get() {
            Ok(store) => store,
            Err(e) => {
                error!(error = %e, "Registration attempted without a configured store");
                return RegistrationOutcome::failure(UNEXPECTED_MESSAGE);
            }
        };

        let row = RegistrationRow {
            name: data.name.clone(),
            email: normalize_email(&data.email),
            date_of_birth: data.date_of_birth,
            referral_source: data.referral_source,
        };

        if let Err(e) = store.insert_registration(&row).await {
            return classify_insert_error(e);
        }

        info!(referral = %row.referral_source, "Registration saved");

        if let Err(e) = store.send_welcome_email(&row.name, &row.email).await {
            error!(error = %e, "Failed to send welcome email");
        }

        RegistrationOutcome::success()
    }
}

fn classify_insert_error(err: GatewayError) -> RegistrationOutcome {
    match err {
        GatewayError::Remote {
            status,
            code,
            message,
            details,
        } => {
            if code.as_deref() == Some(UNIQUE_VIOLATION)
                && is_email_conflict(&message, details.as_deref())
            {
                info!("Registration rejected: email already registered");
                return RegistrationOutcome::duplicate(DUPLICATE_EMAIL_MESSAGE);
            }

            warn!(status, code = ?code, details = ?details, message = %message, "Supabase rejected registration");
            if message.trim().is_empty() {
                RegistrationOutcome::failure(SAVE_FAILED_MESSAGE)
            } else {
                RegistrationOutcome::failure(message)
            }
        }
        other => {
            error!(error = %other, "Registration error");
            RegistrationOutcome::failure(UNEXPECTED_MESSAGE)
        }
    }
}

/// PostgREST names the violated constraint in `message` and the key in
/// `details`; the only unique key on the table is the email.
fn is_email_conflict(message: &str, details: Option<&str>) -> bool {
    let mentions_email = |text: &str| text.to_lowercase().contains("email");
    let has_column_info = !message.is_empty() || details.is_some();
    !has_column_info || mentions_email(message) || details.map(mentions_email).unwrap_or(false)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every call and answers with scripted results.
    #[derive(Default)]
    pub struct FakeStore {
        pub inserts: Mutex<Vec<RegistrationRow>>,
        pub welcomes: Mutex<Vec<(String, String)>>,
        pub insert_error: Mutex<Option<GatewayError>>,
        pub welcome_fails: bool,
        pub delay: Option<Duration>,
    }

    impl FakeStore {
        pub fn failing_with(err: GatewayError) -> Self {
            Self {
                insert_error: Mutex::new(Some(err)),
                ..Default::default()
            }
        }

        pub fn insert_count(&self) -> usize {
            self.inserts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl RegistrationStore for FakeStore {
        async fn insert_registration(&self, row: &RegistrationRow) -> Result<(), GatewayError> {
            self.inserts.lock().unwrap().push(row.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match self.insert_error.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        async fn send_welcome_email(&self, name: &str, email: &str) -> Result<(), GatewayError> {
            self.welcomes
                .lock()
                .unwrap()
                .push((name.to_string(), email.to_string()));
            if self.welcome_fails {
                Err(GatewayError::EmptyResponse("send-welcome-email"))
            } else {
                Ok(())
            }
        }
    }

    pub fn sample_request(email: &str) -> RegistrationRequest {
        RegistrationRequest {
            name: "Jane".to_string(),
            email: email.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            referral_source: ReferralSource::Friend,
        }
    }

    fn remote(code: Option<&str>, message: &str, details: Option<&str>) -> GatewayError {
        GatewayError::Remote {
            status: 409,
            code: code.map(str::to_string),
            message: message.to_string(),
            details: details.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_email_is_normalized_before_insert() {
        let store = Arc::new(FakeStore::default());
        let gateway = PersistenceGateway::new(store.clone());

        let outcome = gateway
            .save_registration(&sample_request("  User@Example.COM "))
            .await;

        assert_eq!(outcome, RegistrationOutcome::success());
        let inserts = store.inserts.lock().unwrap();
        assert_eq!(inserts.len(), 1);
        assert_eq!(inserts[0].email, "user@example.com");
        assert_eq!(inserts[0].referral_source, ReferralSource::Friend);
    }

    #[tokio::test]
    async fn test_unique_violation_on_email_is_duplicate() {
        let store = Arc::new(FakeStore::failing_with(remote(
            Some(UNIQUE_VIOLATION),
            "duplicate key value violates unique constraint \"early_registrations_email_key\"",
            Some("Key (email)=(a@b.com) already exists."),
        )));
        let gateway = PersistenceGateway::new(store.clone());

        let outcome = gateway.save_registration(&sample_request("a@b.com")).await;

        assert!(!outcome.success);
        assert!(outcome.is_duplicate);
        assert_eq!(outcome.error.as_deref(), Some(DUPLICATE_EMAIL_MESSAGE));
        assert!(store.welcomes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unique_violation_on_other_column_is_generic() {
        let store = Arc::new(FakeStore::failing_with(remote(
            Some(UNIQUE_VIOLATION),
            "duplicate key value violates unique constraint \"early_registrations_pkey\"",
            Some("Key (id)=(7) already exists."),
        )));
        let gateway = PersistenceGateway::new(store);

        let outcome = gateway.save_registration(&sample_request("a@b.com")).await;

        assert!(!outcome.is_duplicate);
        assert!(outcome.error.unwrap().contains("early_registrations_pkey"));
    }

    #[tokio::test]
    async fn test_reported_failure_uses_remote_message_or_fallback() {
        let gateway = PersistenceGateway::new(Arc::new(FakeStore::failing_with(remote(
            Some("42501"),
            "permission denied for table early_registrations",
            None,
        ))));
        let outcome = gateway.save_registration(&sample_request("a@b.com")).await;
        assert_eq!(
            outcome.error.as_deref(),
            Some("permission denied for table early_registrations")
        );

        let gateway = PersistenceGateway::new(Arc::new(FakeStore::failing_with(remote(
            None, "", None,
        ))));
        let outcome = gateway.save_registration(&sample_request("a@b.com")).await;
        assert_eq!(outcome, RegistrationOutcome::failure(SAVE_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn test_unexpected_errors_collapse_to_generic_message() {
        let gateway = PersistenceGateway::new(Arc::new(FakeStore::failing_with(
            GatewayError::EmptyResponse("supabase"),
        )));
        let outcome = gateway.save_registration(&sample_request("a@b.com")).await;
        assert_eq!(outcome, RegistrationOutcome::failure(UNEXPECTED_MESSAGE));

        let outcome = PersistenceGateway::unconfigured()
            .save_registration(&sample_request("a@b.com"))
            .await;
        assert_eq!(outcome, RegistrationOutcome::failure(UNEXPECTED_MESSAGE));
    }

    #[tokio::test]
    async fn test_welcome_failure_keeps_success() {
        let store = Arc::new(FakeStore {
            welcome_fails: true,
            ..Default::default()
        });
        let gateway = PersistenceGateway::new(store.clone());

        let outcome = gateway.save_registration(&sample_request("A@B.com")).await;

        assert_eq!(outcome, RegistrationOutcome::success());
        let welcomes = store.welcomes.lock().unwrap();
        assert_eq!(welcomes.as_slice(), &[("Jane".to_string(), "a@b.com".to_string())]);
    }

    #[test]
    fn test_row_wire_format() {
        let row = RegistrationRow {
            name: "Jane".to_string(),
            email: "a@b.com".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            referral_source: ReferralSource::Blog,
        };
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            serde_json::json!({
                "name": "Jane",
                "email": "a@b.com",
                "date_of_birth": "1990-01-01",
                "referral_source": "blog",
            })
        );
    }
}
