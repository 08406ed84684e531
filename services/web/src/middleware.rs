//! Session middleware and user extractors

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::{
    error::AppError,
    models::User,
    session::{SESSION_COOKIE, Session},
    state::AppState,
};

/// Page unauthenticated visitors are sent to
pub const LOGIN_PATH: &str = "/input_user/";

/// Session middleware
///
/// Loads the visitor's session before the handler runs and stores it after,
/// adding the session cookie when a new id was issued.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let cookie_value = jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_owned());
    let session = state.sessions.load(cookie_value.as_deref()).await?;

    // Insert the session into the request extensions
    req.extensions_mut().insert(session.clone());

    let response = next.run(req).await;

    match state.sessions.commit(&session).await? {
        Some(cookie) => Ok((jar.add(cookie), response).into_response()),
        None => Ok(response),
    }
}

/// Resolve the user attached to the session
///
/// A session pointing at a user that no longer exists counts as anonymous.
async fn session_user(parts: &mut Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let session = Session::from_request_parts(parts, state).await?;
    let Some(user_id) = session.user_id().await else {
        return Ok(None);
    };

    let user = state.user_repository.find_by_id(user_id).await?;
    if user.is_none() {
        warn!("Session refers to missing user {}", user_id);
    }
    Ok(user)
}

/// Rejection of [`CurrentUser`]
pub enum AuthRejection {
    /// Nobody is logged in
    LoginRequired,
    /// Looking up the session user failed
    Failure(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::LoginRequired => Redirect::to(LOGIN_PATH).into_response(),
            AuthRejection::Failure(e) => e.into_response(),
        }
    }
}

/// Logged-in user; anonymous visitors are redirected to the login page
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match session_user(parts, state).await {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => Err(AuthRejection::LoginRequired),
            Err(e) => Err(AuthRejection::Failure(e)),
        }
    }
}

/// Logged-in user if there is one
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        session_user(parts, state).await.map(MaybeUser)
    }
}
