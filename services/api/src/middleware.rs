//! Middleware for session-cookie authentication

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{AppState, config::SESSION_COOKIE_NAME, error::ApiError};

/// Authenticate the session cookie and expose the user to handlers
///
/// Absence of the cookie or any store failure blocks the request before
/// it reaches a protected handler; on success the resolved `User` is
/// inserted into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = jar
        .get(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
        .ok_or(ApiError::Unauthenticated)?;

    let user = state.auth.authenticate(&bearer).await?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
