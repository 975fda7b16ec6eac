// src/config.rs
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const GA_PLACEHOLDER_ID: &str = "your_ga_measurement_id_here";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub supabase: Option<SupabaseConfig>,
    pub gemini: Option<GeminiConfig>,
    pub analytics: AnalyticsConfig,
    pub rotation_interval: Duration,
    pub session_idle: Duration,
    pub http_timeout: Duration,
    pub register_rate_limit: usize,
    pub register_rate_window_secs: u64,
    pub enable_hsts: bool,
}

#[derive(Clone, Debug)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
}

#[derive(Clone, Debug, Default)]
pub struct AnalyticsConfig {
    pub measurement_id: Option<String>,
    pub api_secret: Option<String>,
    /// Public origin the pages are served from, e.g. `https://glitchhunt.io`.
    pub site_url: Option<url::Url>,
}

impl AnalyticsConfig {
    /// The id only counts when it is set to something other than the
    /// `.env.example` placeholder.
    pub fn usable_measurement_id(&self) -> Option<&str> {
        self.measurement_id
            .as_deref()
            .filter(|id| *id != GA_PLACEHOLDER_ID)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty strings behave like unset variables
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let supabase = match (get("SUPABASE_URL"), get("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(SupabaseConfig { url, anon_key }),
            _ => None,
        };

        let rotation_secs: u64 = parse_or(&get, "DEMO_ROTATION_SECS", 3)?;
        if rotation_secs == 0 {
            anyhow::bail!("DEMO_ROTATION_SECS must be at least 1");
        }

        let site_url = get("SITE_URL")
            .map(|raw| {
                url::Url::parse(&raw)
                    .with_context(|| format!("SITE_URL must be an absolute URL, got {:?}", raw))
            })
            .transpose()?;

        let gemini = get("GEMINI_API_KEY").map(|api_key| GeminiConfig {
            api_key,
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
        });

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 3000)?,
            supabase,
            gemini,
            analytics: AnalyticsConfig {
                measurement_id: get("GA_MEASUREMENT_ID"),
                api_secret: get("GA_API_SECRET"),
                site_url,
            },
            rotation_interval: Duration::from_secs(rotation_secs),
            session_idle: Duration::from_secs(parse_or::<u64, _>(&get, "SESSION_IDLE_MINUTES", 30)? * 60),
            http_timeout: Duration::from_secs(parse_or(&get, "HTTP_TIMEOUT_SECS", 10)?),
            register_rate_limit: parse_or(&get, "REGISTER_RATE_LIMIT", 10)?,
            register_rate_window_secs: parse_or(&get, "REGISTER_RATE_WINDOW_SECS", 300)?,
            enable_hsts: get("ENABLE_HSTS").as_deref() == Some("true"),
        })
    }

    pub fn server_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid server address {}:{}", self.host, self.port))
    }

    /// Logs one warning per missing integration.
    pub fn warn_missing(&self) {
        if self.supabase.is_none() {
            tracing::warn!(
                "Missing SUPABASE_URL or SUPABASE_ANON_KEY. Registrations will not be saved."
            );
        }
        if self.gemini.is_none() {
            tracing::warn!("Missing GEMINI_API_KEY. The copywriter will serve fallback copy.");
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a number, got {:?}", key, raw)),
        None => Ok(default),
    }
}
