//! Magic-link authentication flow
//!
//! Orchestrates the login-token and session stores: request-link issues a
//! single-use token embedded in a verification URL, verify-link consumes
//! it and mints a session, and every protected request authenticates the
//! session cookie. Delivery of the link (email) is an external concern;
//! this service only produces the URL.

use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use tracing::{error, info};

use crate::config::{AppConfig, SESSION_COOKIE_NAME};
use crate::error::{ApiError, ApiResult};
use crate::models::User;
use crate::repositories::{LoginTokenRepository, SessionRepository, UserRepository};
use crate::token;

/// A freshly issued magic link
#[derive(Debug, Clone)]
pub struct MagicLink {
    pub user: User,
    pub url: String,
}

/// A freshly issued session, ready for cookie delivery
#[derive(Debug, Clone)]
pub struct SessionGrant {
    pub bearer: String,
    pub max_age_seconds: i64,
}

/// Authentication service
///
/// Stores are injected explicitly; there is no ambient global state.
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    login_tokens: LoginTokenRepository,
    sessions: SessionRepository,
    base_url: String,
    login_link_ttl: Duration,
    session_ttl: Duration,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        users: UserRepository,
        login_tokens: LoginTokenRepository,
        sessions: SessionRepository,
        config: &AppConfig,
    ) -> Self {
        Self {
            users,
            login_tokens,
            sessions,
            base_url: config.base_url.clone(),
            login_link_ttl: config.login_link_ttl(),
            session_ttl: config.session_ttl(),
        }
    }

    /// Find-or-create the user for an email and issue a magic link
    pub async fn request_link(&self, email: &str, pseudo: &str) -> ApiResult<MagicLink> {
        let user = self
            .users
            .find_or_create(email, pseudo)
            .await
            .map_err(storage_failure)?;

        let raw = self
            .login_tokens
            .issue(user.id, self.login_link_ttl)
            .await
            .map_err(storage_failure)?;

        let url = verify_url(&self.base_url, &raw);
        Ok(MagicLink { user, url })
    }

    /// Consume a magic-link token and mint a session for its owner
    ///
    /// Any verification failure propagates without a session being
    /// created. The consume step is an atomic conditional update, so two
    /// concurrent verifications of the same token yield exactly one
    /// session.
    pub async fn verify_link(&self, raw: &str) -> ApiResult<SessionGrant> {
        let token_hash = token::fingerprint(raw);

        let login_token = self
            .login_tokens
            .find_by_hash(&token_hash)
            .await
            .map_err(storage_failure)?
            .ok_or(ApiError::InvalidToken)?;

        if login_token.used_at.is_some() {
            return Err(ApiError::TokenAlreadyUsed);
        }

        if Utc::now() > login_token.expires_at {
            return Err(ApiError::TokenExpired);
        }

        let consumed = self
            .login_tokens
            .consume(login_token.id, Utc::now())
            .await
            .map_err(storage_failure)?;

        if !consumed {
            // A concurrent verification won the conditional update.
            return Err(ApiError::TokenAlreadyUsed);
        }

        let bearer = self
            .sessions
            .issue(login_token.user_id, self.session_ttl)
            .await
            .map_err(storage_failure)?;

        info!("Verified magic link for user {}", login_token.user_id);

        Ok(SessionGrant {
            bearer,
            max_age_seconds: self.session_ttl.num_seconds(),
        })
    }

    /// Resolve a session bearer value to its owning user
    pub async fn authenticate(&self, raw: &str) -> ApiResult<User> {
        let token_hash = token::fingerprint(raw);

        let session = self
            .sessions
            .find_by_hash(&token_hash)
            .await
            .map_err(storage_failure)?
            .ok_or(ApiError::Unauthenticated)?;

        if Utc::now() > session.expires_at {
            return Err(ApiError::SessionExpired);
        }

        self.users
            .find_by_id(session.user_id)
            .await
            .map_err(storage_failure)?
            .ok_or(ApiError::Unauthenticated)
    }

    /// Revoke the session behind a bearer value
    ///
    /// Idempotent; unknown bearers are ignored.
    pub async fn logout(&self, raw: &str) -> ApiResult<()> {
        let token_hash = token::fingerprint(raw);
        self.sessions
            .revoke_by_hash(&token_hash)
            .await
            .map_err(storage_failure)
    }
}

fn storage_failure(e: anyhow::Error) -> ApiError {
    error!("Auth storage failure: {:#}", e);
    ApiError::InternalServerError
}

/// Build the magic-link verification URL for a raw token
pub fn verify_url(base_url: &str, raw_token: &str) -> String {
    format!(
        "{}/auth/verify?token={}",
        base_url.trim_end_matches('/'),
        raw_token
    )
}

/// Build the session cookie carrying a raw bearer value
pub fn session_cookie(bearer: String, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, bearer))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(max_age_seconds))
        .build()
}

/// Build the expired cookie that instructs the browser to drop the session
pub fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}
