//! Tablier API service
//!
//! Magic-link authentication and the establishment/review engine behind
//! the Tablier workplace-review application. The binary in `main.rs` wires
//! this library to a listening socket; everything else lives here so the
//! integration tests can exercise the flows directly.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod places;
pub mod repositories;
pub mod routes;
pub mod stats;
pub mod token;
pub mod validation;

use anyhow::Result;
use sqlx::PgPool;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::places::PlacesClient;
use crate::repositories::{
    EstablishmentRepository, LoginTokenRepository, ReviewRepository, SessionRepository,
    UserRepository,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db_pool: PgPool,
    pub auth: AuthService,
    pub establishments: EstablishmentRepository,
    pub reviews: ReviewRepository,
    pub places: PlacesClient,
}

impl AppState {
    /// Assemble the application state over a connection pool
    pub fn new(pool: PgPool, config: AppConfig) -> Result<Self> {
        let users = UserRepository::new(pool.clone());
        let login_tokens = LoginTokenRepository::new(pool.clone());
        let sessions = SessionRepository::new(pool.clone());
        let auth = AuthService::new(users, login_tokens, sessions, &config);

        let establishments = EstablishmentRepository::new(pool.clone());
        let reviews = ReviewRepository::new(pool.clone());
        let places = PlacesClient::new(config.places_api_key.clone())?;

        Ok(AppState {
            config,
            db_pool: pool,
            auth,
            establishments,
            reviews,
            places,
        })
    }
}
