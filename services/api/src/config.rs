//! Application configuration for the API service

use anyhow::Result;
use std::env;

/// Name of the session cookie delivered to browsers
pub const SESSION_COOKIE_NAME: &str = "tablier_session";

/// Valid range for review scores
///
/// The scale is deployment configuration rather than a hard-coded constant;
/// the default is 0 to 5.
#[derive(Debug, Clone, Copy)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for ScoreRange {
    fn default() -> Self {
        ScoreRange { min: 0.0, max: 5.0 }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Public base URL used to build magic-link verification URLs
    pub base_url: String,
    /// Lifetime of a magic-link token in minutes
    pub login_link_ttl_minutes: i64,
    /// Lifetime of a session in days
    pub session_ttl_days: i64,
    /// Valid score range for reviews
    pub score_range: ScoreRange,
    /// API key for the place-lookup proxy, if configured
    pub places_api_key: Option<String>,
}

impl AppConfig {
    /// Create a new AppConfig from environment variables
    ///
    /// # Environment Variables
    /// - `BIND_ADDR`: listen address (default: "0.0.0.0:3000")
    /// - `BASE_URL`: public base URL (default: "http://localhost:3000")
    /// - `LOGIN_LINK_TTL_MINUTES`: magic-link lifetime (default: 10)
    /// - `SESSION_TTL_DAYS`: session lifetime (default: 30)
    /// - `SCORE_MIN` / `SCORE_MAX`: review score range (default: 0 / 5)
    /// - `PLACES_API_KEY`: key for the place-lookup proxy (optional)
    pub fn from_env() -> Result<Self> {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let base_url = env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let login_link_ttl_minutes = env::var("LOGIN_LINK_TTL_MINUTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let session_ttl_days = env::var("SESSION_TTL_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let score_min = env::var("SCORE_MIN")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0);

        let score_max = env::var("SCORE_MAX")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5.0);

        if score_min >= score_max {
            anyhow::bail!(
                "Invalid score range: SCORE_MIN ({}) must be below SCORE_MAX ({})",
                score_min,
                score_max
            );
        }

        if login_link_ttl_minutes <= 0 || session_ttl_days <= 0 {
            anyhow::bail!("Token lifetimes must be positive");
        }

        let places_api_key = env::var("PLACES_API_KEY").ok().filter(|k| !k.is_empty());

        Ok(AppConfig {
            bind_addr,
            base_url,
            login_link_ttl_minutes,
            session_ttl_days,
            score_range: ScoreRange {
                min: score_min,
                max: score_max,
            },
            places_api_key,
        })
    }

    /// Lifetime of a magic-link token
    pub fn login_link_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.login_link_ttl_minutes)
    }

    /// Lifetime of a session
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.session_ttl_days)
    }
}
