// src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MAX_NICHE_LEN: usize = 120;

/// How a registrant says they found GlitchHunt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralSource {
    Social,
    Search,
    Friend,
    Blog,
    Other,
}

impl ReferralSource {
    pub const ALL: [ReferralSource; 5] = [
        ReferralSource::Social,
        ReferralSource::Search,
        ReferralSource::Friend,
        ReferralSource::Blog,
        ReferralSource::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralSource::Social => "social",
            ReferralSource::Search => "search",
            ReferralSource::Friend => "friend",
            ReferralSource::Blog => "blog",
            ReferralSource::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReferralSource::Social => "Social Media",
            ReferralSource::Search => "Search Engine",
            ReferralSource::Friend => "Friend",
            ReferralSource::Blog => "Blog",
            ReferralSource::Other => "Other",
        }
    }
}

impl fmt::Display for ReferralSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferralSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReferralSource::ALL
            .into_iter()
            .find(|source| source.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown referral source: {}", s))
    }
}

/// A validated registration, ready for the persistence gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub referral_source: ReferralSource,
}

/// Result of one submission attempt. Consumed once to drive the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_duplicate: bool,
}

impl RegistrationOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            error: None,
            is_duplicate: false,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            is_duplicate: false,
        }
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            is_duplicate: true,
        }
    }
}

/// Hero copy, either the built-in default or a generated suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopySuggestion {
    pub headline: String,
    pub subheadline: String,
    pub cta: String,
}

impl CopySuggestion {
    /// What the hero shows before anyone asks the copywriter.
    pub fn landing_default() -> Self {
        Self {
            headline: "Where Bugs Go To Die.".to_string(),
            subheadline: "The front page of the broken internet. Join thousands of users reporting and fixing glitches in your favorite apps.".to_string(),
            cta: "Start Hunting".to_string(),
        }
    }

    /// Returned by the copywriter whenever generation fails.
    pub fn fallback() -> Self {
        Self {
            headline: "Track Bugs. Improve the Web.".to_string(),
            subheadline: "Join the community helping companies squash bugs and improve user experience.".to_string(),
            cta: "Join the Hunt".to_string(),
        }
    }
}

impl Default for CopySuggestion {
    fn default() -> Self {
        Self::landing_default()
    }
}

/// The three mock dashboards the hero demo cycles through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemoView {
    Docs,
    Feed,
    Forum,
}

impl DemoView {
    /// Rotation order. The first entry is the initial view.
    pub const CYCLE: [DemoView; 3] = [DemoView::Docs, DemoView::Feed, DemoView::Forum];

    pub fn next(self) -> DemoView {
        match self {
            DemoView::Docs => DemoView::Feed,
            DemoView::Feed => DemoView::Forum,
            DemoView::Forum => DemoView::Docs,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DemoView::Docs => "docs",
            DemoView::Feed => "feed",
            DemoView::Forum => "forum",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DemoView::Docs => "Docs",
            DemoView::Feed => "Updates",
            DemoView::Forum => "Discussions",
        }
    }
}

impl Default for DemoView {
    fn default() -> Self {
        DemoView::CYCLE[0]
    }
}

impl FromStr for DemoView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DemoView::CYCLE
            .into_iter()
            .find(|view| view.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown demo view: {}", s))
    }
}

/// Top-level pages reachable from the navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Home,
    Product,
    Solutions,
    Privacy,
    Terms,
}

impl Page {
    pub fn path(&self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Product => "/product",
            Page::Solutions => "/solutions",
            Page::Privacy => "/privacy",
            Page::Terms => "/terms",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::Product => "Product",
            Page::Solutions => "Solutions",
            Page::Privacy => "Privacy Policy",
            Page::Terms => "Terms of Service",
        }
    }
}

// Request/Response types
#[derive(Debug, Deserialize)]
pub struct CopyRequest {
    pub niche: String,
    #[serde(default = "default_style")]
    pub style: String,
}

pub fn default_style() -> String {
    "clean-saas".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoState {
    pub view: DemoView,
    pub auto_rotate: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectViewRequest {
    pub view: DemoView,
}

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub persistence: bool,
    pub copywriter: bool,
    pub analytics: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_cycle_returns_to_start() {
        let start = DemoView::default();
        assert_eq!(start, DemoView::Docs);
        assert_eq!(start.next(), DemoView::Feed);
        assert_eq!(start.next().next().next(), start);
    }

    #[test]
    fn test_referral_source_parsing() {
        assert_eq!("friend".parse::<ReferralSource>(), Ok(ReferralSource::Friend));
        assert!("".parse::<ReferralSource>().is_err());
        assert!("newspaper".parse::<ReferralSource>().is_err());
    }

    #[test]
    fn test_outcome_serialization_omits_absent_fields() {
        let json = serde_json::to_value(RegistrationOutcome::success()).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true }));

        let json = serde_json::to_value(RegistrationOutcome::duplicate("taken")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "success": false, "error": "taken", "isDuplicate": true })
        );
    }
}
