// src/services/analytics.rs
use serde_json::{json, Map, Value};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use super::{Capability, GatewayError};
use crate::config::AnalyticsConfig;

pub const COLLECT_URL: &str = "https://www.google-analytics.com/mp/collect";

static ANALYTICS: OnceLock<Analytics> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsEvent {
    PageView {
        path: String,
        title: Option<String>,
    },
    Event {
        category: String,
        action: String,
        label: Option<String>,
        value: Option<i64>,
    },
}

/// An event attributed to one visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub client_id: String,
    pub event: AnalyticsEvent,
}

impl Hit {
    /// GA4 Measurement Protocol body. `page_location` must be absolute, so
    /// it is only sent when the site origin is known.
    pub fn to_payload(&self, site: Option<&url::Url>) -> Value {
        let (name, params) = match &self.event {
            AnalyticsEvent::PageView { path, title } => {
                let mut params = Map::new();
                params.insert("page_path".into(), json!(path));
                if let Some(location) = site.and_then(|site| site.join(path).ok()) {
                    params.insert("page_location".into(), json!(location.as_str()));
                }
                if let Some(title) = title {
                    params.insert("page_title".into(), json!(title));
                }
                ("page_view".to_string(), params)
            }
            AnalyticsEvent::Event {
                category,
                action,
                label,
                value,
            } => {
                let mut params = Map::new();
                params.insert("event_category".into(), json!(category));
                if let Some(label) = label {
                    params.insert("event_label".into(), json!(label));
                }
                if let Some(value) = value {
                    params.insert("value".into(), json!(value));
                }
                (event_name(action), params)
            }
        };

        json!({
            "client_id": self.client_id,
            "events": [{ "name": name, "params": params }],
        })
    }
}

/// GA4 event names only allow letters, digits and underscores.
fn event_name(action: &str) -> String {
    action
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Process-wide handle to the analytics collector.
#[derive(Clone)]
pub struct Analytics {
    sink: Capability<UnboundedSender<Hit>>,
}

/// Initializes analytics once per process; later calls return the same
/// handle. Must run inside the tokio runtime.
pub fn init(config: &AnalyticsConfig, timeout: Duration) -> Analytics {
    ANALYTICS
        .get_or_init(|| Analytics::connect(config, timeout))
        .clone()
}

impl Analytics {
    pub fn disabled() -> Self {
        Self {
            sink: Capability::Unconfigured {
                service: "google-analytics",
            },
        }
    }

    fn connect(config: &AnalyticsConfig, timeout: Duration) -> Self {
        let Some(measurement_id) = config.usable_measurement_id() else {
            warn!("Google Analytics not initialized. Please add GA_MEASUREMENT_ID to your .env file.");
            return Self::disabled();
        };
        let Some(api_secret) = config.api_secret.as_deref() else {
            warn!("Google Analytics not initialized. GA_API_SECRET is required for server-side collection.");
            return Self::disabled();
        };

        let endpoint = match collect_endpoint(measurement_id, api_secret) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                warn!(error = %e, "Google Analytics endpoint is invalid");
                return Self::disabled();
            }
        };
        let client = match reqwest::Client::builder().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Google Analytics client could not be built");
                return Self::disabled();
            }
        };

        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(run_collector(client, endpoint, config.site_url.clone(), receiver));
        info!(measurement_id, "Google Analytics initialized");

        Self {
            sink: Capability::Configured(sender),
        }
    }

    /// A handle whose receiving end is returned to the caller instead of a
    /// collector task.
    #[cfg(test)]
    pub fn channel() -> (Self, UnboundedReceiver<Hit>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sink: Capability::Configured(sender),
            },
            receiver,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_configured()
    }

    pub fn tracker(&self, client_id: impl Into<String>) -> Tracker {
        Tracker {
            analytics: self.clone(),
            client_id: client_id.into(),
        }
    }

    fn record(&self, hit: Hit) {
        if let Capability::Configured(sender) = &self.sink {
            if sender.send(hit).is_err() {
                debug!("Analytics collector has stopped; dropping event");
            }
        }
    }
}

fn collect_endpoint(measurement_id: &str, api_secret: &str) -> Result<url::Url, GatewayError> {
    let mut url = url::Url::parse(COLLECT_URL)?;
    url.query_pairs_mut()
        .append_pair("measurement_id", measurement_id)
        .append_pair("api_secret", api_secret);
    Ok(url)
}

async fn run_collector(
    client: reqwest::Client,
    endpoint: url::Url,
    site: Option<url::Url>,
    mut hits: UnboundedReceiver<Hit>,
) {
    while let Some(hit) = hits.recv().await {
        let result = client
            .post(endpoint.clone())
            .json(&hit.to_payload(site.as_ref()))
            .send()
            .await
            .and_then(|response| response.error_for_status());
        match result {
            Ok(_) => debug!(client_id = %hit.client_id, "Analytics event delivered"),
            Err(e) => warn!(error = %e, "Analytics event could not be delivered"),
        }
    }
    debug!("Analytics collector stopped");
}

/// Records events for one visitor. Every call returns immediately.
#[derive(Clone)]
pub struct Tracker {
    analytics: Analytics,
    client_id: String,
}

impl Tracker {
    pub fn track_page_view(&self, path: &str, title: Option<&str>) {
        self.analytics.record(Hit {
            client_id: self.client_id.clone(),
            event: AnalyticsEvent::PageView {
                path: path.to_string(),
                title: title.map(str::to_string),
            },
        });
    }

    pub fn track_event(&self, category: &str, action: &str, label: Option<&str>, value: Option<i64>) {
        self.analytics.record(Hit {
            client_id: self.client_id.clone(),
            event: AnalyticsEvent::Event {
                category: category.to_string(),
                action: action.to_string(),
                label: label.map(str::to_string),
                value,
            },
        });
    }

    pub fn track_button_click(&self, button_name: &str, location: Option<&str>) {
        let label = match location {
            Some(location) => format!("{} - {}", button_name, location),
            None => button_name.to_string(),
        };
        self.track_event("Button", "Click", Some(&label), None);
    }

    pub fn track_form_submission(&self, form_name: &str, success: bool) {
        let action = if success { "Submit Success" } else { "Submit Error" };
        self.track_event("Form", action, Some(form_name), None);
    }

    pub fn track_modal_open(&self, modal_name: &str) {
        self.track_event("Modal", "Open", Some(modal_name), None);
    }

    pub fn track_modal_close(&self, modal_name: &str) {
        self.track_event("Modal", "Close", Some(modal_name), None);
    }

    pub fn track_registration(&self, success: bool, referral_source: Option<&str>) {
        let action = if success { "Success" } else { "Failed" };
        self.track_event("Registration", action, referral_source, None);
    }

    pub fn track_navigation(&self, destination: &str) {
        self.track_event("Navigation", "Click", Some(destination), None);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Everything currently queued on the receiver.
    pub fn drain(receiver: &mut UnboundedReceiver<Hit>) -> Vec<AnalyticsEvent> {
        let mut events = Vec::new();
        while let Ok(hit) = receiver.try_recv() {
            events.push(hit.event);
        }
        events
    }

    pub fn event(category: &str, action: &str, label: Option<&str>) -> AnalyticsEvent {
        AnalyticsEvent::Event {
            category: category.to_string(),
            action: action.to_string(),
            label: label.map(str::to_string),
            value: None,
        }
    }

    #[test]
    fn test_wrappers_map_to_categories() {
        let (analytics, mut receiver) = Analytics::channel();
        let tracker = analytics.tracker("visitor-1");

        tracker.track_button_click("Start Hunting", Some("hero"));
        tracker.track_form_submission("ai-copy", false);
        tracker.track_registration(true, Some("friend"));
        tracker.track_navigation("product");

        assert_eq!(
            drain(&mut receiver),
            vec![
                event("Button", "Click", Some("Start Hunting - hero")),
                event("Form", "Submit Error", Some("ai-copy")),
                event("Registration", "Success", Some("friend")),
                event("Navigation", "Click", Some("product")),
            ]
        );
    }

    #[test]
    fn test_disabled_analytics_swallows_events() {
        let tracker = Analytics::disabled().tracker("visitor-1");
        assert!(!Analytics::disabled().is_enabled());
        tracker.track_page_view("/", Some("Home"));
        tracker.track_modal_open("registration");
    }

    #[test]
    fn test_closed_collector_does_not_panic() {
        let (analytics, receiver) = Analytics::channel();
        drop(receiver);
        analytics.tracker("visitor-1").track_modal_close("registration");
    }

    #[test]
    fn test_measurement_protocol_payload() {
        let hit = Hit {
            client_id: "abc".to_string(),
            event: AnalyticsEvent::Event {
                category: "Form".to_string(),
                action: "Submit Success".to_string(),
                label: Some("registration".to_string()),
                value: Some(1),
            },
        };
        assert_eq!(
            hit.to_payload(None),
            json!({
                "client_id": "abc",
                "events": [{
                    "name": "submit_success",
                    "params": { "event_category": "Form", "event_label": "registration", "value": 1 }
                }]
            })
        );

        let hit = Hit {
            client_id: "abc".to_string(),
            event: AnalyticsEvent::PageView {
                path: "/product".to_string(),
                title: None,
            },
        };
        assert_eq!(
            hit.to_payload(None)["events"][0],
            json!({ "name": "page_view", "params": { "page_path": "/product" } })
        );

        let site = url::Url::parse("https://glitchhunt.io").unwrap();
        assert_eq!(
            hit.to_payload(Some(&site))["events"][0]["params"],
            json!({ "page_path": "/product", "page_location": "https://glitchhunt.io/product" })
        );
    }

    #[test]
    fn test_collect_endpoint_carries_credentials() {
        let url = collect_endpoint("G-ABC123", "s3cret").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.google-analytics.com/mp/collect?measurement_id=G-ABC123&api_secret=s3cret"
        );
    }

    #[tokio::test]
    async fn test_missing_measurement_id_disables() {
        let analytics = Analytics::connect(&AnalyticsConfig::default(), Duration::from_secs(1));
        assert!(!analytics.is_enabled());

        let placeholder = AnalyticsConfig {
            measurement_id: Some(crate::config::GA_PLACEHOLDER_ID.to_string()),
            api_secret: Some("s3cret".to_string()),
            ..Default::default()
        };
        assert!(!Analytics::connect(&placeholder, Duration::from_secs(1)).is_enabled());
    }
}
