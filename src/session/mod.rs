// src/session/mod.rs
pub mod visitor;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use moka::future::Cache;
use rand::rngs::OsRng;
use rand::RngCore;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::services::analytics::Analytics;
use crate::AppState;
use visitor::VisitorSession;

pub const SESSION_COOKIE: &str = "glitchhunt_session";
const MAX_SESSIONS: u64 = 100_000;

pub type SharedVisitor = Arc<Mutex<VisitorSession>>;

fn generate_id(len: usize) -> String {
    let mut random_bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut random_bytes);
    hex::encode(random_bytes)
}

/// In-memory visitor sessions, evicted after a period without requests.
/// Evicting a session drops its demo rotator, which stops the timer.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<String, SharedVisitor>,
    analytics: Analytics,
    rotation_interval: Duration,
}

impl SessionStore {
    pub fn new(idle: Duration, analytics: Analytics, rotation_interval: Duration) -> Self {
        let sessions = Cache::<String, SharedVisitor>::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_idle(idle)
            .eviction_listener(|_id, _session, cause| {
                debug!(?cause, "Visitor session evicted");
            })
            .build();

        Self {
            sessions,
            analytics,
            rotation_interval,
        }
    }

    pub async fn get(&self, session_id: &str) -> Option<SharedVisitor> {
        self.sessions.get(session_id).await
    }

    /// Starts a new session and returns its id. The analytics client id is
    /// separate so the session id never leaves the server.
    pub async fn create(&self) -> (String, SharedVisitor) {
        let session_id = generate_id(32);
        let tracker = self.analytics.tracker(generate_id(16));
        let session = Arc::new(Mutex::new(VisitorSession::new(tracker, self.rotation_interval)));

        self.sessions.insert(session_id.clone(), Arc::clone(&session)).await;
        debug!("Created visitor session");
        (session_id, session)
    }

    /// Looks up the session named by the cookie, starting a new one (and
    /// setting the cookie) when it is missing or expired.
    pub async fn resolve(&self, jar: CookieJar) -> Visitor {
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            if let Some(session) = self.get(cookie.value()).await {
                return Visitor { jar, session };
            }
        }

        let (session_id, session) = self.create().await;
        let cookie = Cookie::build((SESSION_COOKIE, session_id))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        Visitor {
            jar: jar.add(cookie),
            session,
        }
    }

    pub async fn cleanup_expired(&self) {
        self.sessions.run_pending_tasks().await;
    }

    pub fn session_count(&self) -> u64 {
        self.sessions.entry_count()
    }
}

/// The requesting visitor's session. Handlers return `jar` so a freshly
/// issued cookie reaches the browser.
pub struct Visitor {
    pub jar: CookieJar,
    pub session: SharedVisitor,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Visitor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        Ok(state.sessions.resolve(jar).await)
    }
}
