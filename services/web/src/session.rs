//! Server-side sessions persisted in the database
//!
//! The browser only holds an opaque session id in the `recipes_session`
//! cookie. Handlers get a [`Session`] handle from the request extensions,
//! mutate it, and [`SessionManager::commit`] writes it back once the response
//! is produced.

use anyhow::Result;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{FlashMessage, SessionRecord},
    repositories::SessionRepository,
};

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "recipes_session";

/// Longest accepted session lifetime, ten years
pub const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug)]
struct SessionState {
    id: Uuid,
    user_id: Option<i64>,
    flashes: Vec<FlashMessage>,
    created_at: DateTime<Utc>,
    /// A row with the current id exists
    persisted: bool,
    /// Row to delete after the id was rotated
    replaced: Option<Uuid>,
    modified: bool,
}

/// Per-request handle on the visitor's session
#[derive(Debug, Clone)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    /// Anonymous session that is only stored once something is written to it
    pub fn fresh() -> Self {
        Self::from_state(SessionState {
            id: Uuid::new_v4(),
            user_id: None,
            flashes: Vec::new(),
            created_at: Utc::now(),
            persisted: false,
            replaced: None,
            modified: false,
        })
    }

    fn from_record(record: SessionRecord) -> Result<Self> {
        let id = Uuid::parse_str(&record.id)?;
        let flashes = serde_json::from_str(&record.flashes)?;
        Ok(Self::from_state(SessionState {
            id,
            user_id: record.user_id,
            flashes,
            created_at: record.created_at,
            persisted: true,
            replaced: None,
            modified: false,
        }))
    }

    fn from_state(state: SessionState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Current session id
    pub async fn id(&self) -> Uuid {
        self.state.lock().await.id
    }

    /// ID of the logged-in user, if any
    pub async fn user_id(&self) -> Option<i64> {
        self.state.lock().await.user_id
    }

    /// Attach a user to the session under a new session id
    pub async fn login(&self, user_id: i64) {
        let mut state = self.state.lock().await;
        if state.persisted && state.replaced.is_none() {
            state.replaced = Some(state.id);
        }
        state.id = Uuid::new_v4();
        state.created_at = Utc::now();
        state.persisted = false;
        state.user_id = Some(user_id);
        state.modified = true;
    }

    /// Detach the user, keeping pending flash messages
    pub async fn logout(&self) {
        let mut state = self.state.lock().await;
        state.user_id = None;
        state.modified = true;
    }

    /// Queue a notification for the next rendered page
    pub async fn flash(&self, message: FlashMessage) {
        let mut state = self.state.lock().await;
        state.flashes.push(message);
        state.modified = true;
    }

    /// Drain the pending notifications
    pub async fn take_flashes(&self) -> Vec<FlashMessage> {
        let mut state = self.state.lock().await;
        if state.flashes.is_empty() {
            return Vec::new();
        }
        state.modified = true;
        std::mem::take(&mut state.flashes)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session>().cloned().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("session middleware is not installed"))
        })
    }
}

/// Loads and stores sessions
#[derive(Clone)]
pub struct SessionManager {
    repository: SessionRepository,
    ttl: Duration,
    secure_cookies: bool,
}

impl SessionManager {
    /// Create a new session manager
    ///
    /// Lifetimes above [`MAX_SESSION_TTL_SECS`] are clamped to it.
    pub fn new(repository: SessionRepository, ttl_secs: u64, secure_cookies: bool) -> Self {
        if ttl_secs > MAX_SESSION_TTL_SECS {
            warn!(
                "Session lifetime of {}s is too long, using {}s",
                ttl_secs, MAX_SESSION_TTL_SECS
            );
        }
        let ttl_secs = ttl_secs.min(MAX_SESSION_TTL_SECS) as i64;

        Self {
            repository,
            ttl: Duration::seconds(ttl_secs),
            secure_cookies,
        }
    }

    /// Resolve the session named by the cookie, or start an anonymous one
    pub async fn load(&self, cookie_value: Option<&str>) -> Result<Session> {
        let Some(id) = cookie_value else {
            return Ok(Session::fresh());
        };

        match self.repository.find_active(id, Utc::now()).await? {
            Some(record) => match Session::from_record(record) {
                Ok(session) => Ok(session),
                Err(e) => {
                    warn!("Discarding unreadable session {}: {}", id, e);
                    Ok(Session::fresh())
                }
            },
            None => Ok(Session::fresh()),
        }
    }

    /// Persist the session if it changed
    ///
    /// Returns the cookie to send when the browser does not know the
    /// current session id yet.
    pub async fn commit(&self, session: &Session) -> Result<Option<Cookie<'static>>> {
        let mut state = session.state.lock().await;
        if !state.modified {
            return Ok(None);
        }

        if let Some(old_id) = state.replaced.take() {
            self.repository.delete(&old_id.to_string()).await?;
        }

        let record = SessionRecord {
            id: state.id.to_string(),
            user_id: state.user_id,
            flashes: serde_json::to_string(&state.flashes)?,
            created_at: state.created_at,
            expires_at: Utc::now() + self.ttl,
        };
        self.repository.save(&record).await?;

        let is_new = !state.persisted;
        state.persisted = true;
        state.modified = false;

        Ok(is_new.then(|| self.cookie(record.id)))
    }

    /// Delete expired sessions
    pub async fn cleanup_expired_sessions(&self) -> Result<u64> {
        let removed = self.repository.delete_expired(Utc::now()).await?;
        info!("Removed {} expired sessions", removed);
        Ok(removed)
    }

    // No max-age: the browser drops the cookie on exit, the server enforces the TTL.
    fn cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .build()
    }
}
