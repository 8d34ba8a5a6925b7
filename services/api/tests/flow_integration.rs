//! Integration tests for the authentication flow and the review engine
//!
//! These tests require `DATABASE_URL` to point at a running PostgreSQL
//! instance; the schema is created on first use. Run them with
//! `cargo test -- --ignored`.

use api::config::{AppConfig, ScoreRange};
use api::error::ApiError;
use api::models::{NewEstablishment, ReviewFields};
use api::repositories::{LoginTokenRepository, SessionRepository, UserRepository};
use api::{AppState, stats, token};
use chrono::{Duration, Utc};
use common::database::{DatabaseConfig, init_pool};
use uuid::Uuid;

async fn test_state() -> AppState {
    let db_config = DatabaseConfig::from_env().expect("DATABASE_URL must be set");
    let pool = init_pool(&db_config).await.expect("failed to connect");
    api::database::init_schema(&pool)
        .await
        .expect("failed to initialize schema");

    let config = AppConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        base_url: "http://localhost:3000".to_string(),
        login_link_ttl_minutes: 10,
        session_ttl_days: 30,
        score_range: ScoreRange::default(),
        places_api_key: None,
    };

    AppState::new(pool, config).expect("failed to build state")
}

fn unique_email() -> String {
    format!("{}@example.com", Uuid::new_v4())
}

fn unique_place() -> NewEstablishment {
    NewEstablishment {
        place_id: format!("place-{}", Uuid::new_v4()),
        name: "Le Petit Zinc".to_string(),
        address: Some("12 rue des Martyrs, Paris".to_string()),
        external_rating: Some(4.2),
        tags: vec!["restaurant".to_string()],
    }
}

fn token_from_link(url: &str) -> &str {
    url.split("token=").nth(1).expect("link carries a token")
}

fn fields(score: Option<f64>, comment: &str) -> ReviewFields {
    ReviewFields {
        score,
        comment: comment.to_string(),
        ..ReviewFields::default()
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_magic_link_end_to_end() {
    let state = test_state().await;

    // Request a link and use it
    let link = state
        .auth
        .request_link(&unique_email(), "anna")
        .await
        .expect("request_link failed");
    let raw = token_from_link(&link.url);

    let grant = state.auth.verify_link(raw).await.expect("verify failed");
    let user = state
        .auth
        .authenticate(&grant.bearer)
        .await
        .expect("authenticate failed");
    assert_eq!(user.id, link.user.id);

    // Submit a review and read the aggregate
    let establishment = state
        .establishments
        .create_or_get(&unique_place())
        .await
        .expect("create_or_get failed");

    let first = state
        .reviews
        .upsert(establishment.id, user.id, &fields(Some(5.0), "great team"))
        .await
        .expect("upsert failed");

    let reviews = state
        .reviews
        .list_for_establishment(establishment.id)
        .await
        .expect("list failed");
    let aggregate = stats::compute(reviews.iter().map(|r| &r.review));
    assert_eq!(aggregate.average, Some(5.0));
    assert_eq!(aggregate.scored_count, 1);
    assert_eq!(aggregate.total_count, 1);

    // Replacing the review must not create a second row
    let second = state
        .reviews
        .upsert(establishment.id, user.id, &fields(Some(3.0), "new manager"))
        .await
        .expect("second upsert failed");
    assert_eq!(second.id, first.id);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.comment, "new manager");

    let reviews = state
        .reviews
        .list_for_establishment(establishment.id)
        .await
        .expect("list failed");
    let aggregate = stats::compute(reviews.iter().map(|r| &r.review));
    assert_eq!(aggregate.average, Some(3.0));
    assert_eq!(aggregate.scored_count, 1);
    assert_eq!(aggregate.total_count, 1);

    // Logout revokes the session server-side
    state.auth.logout(&grant.bearer).await.expect("logout failed");
    let err = state.auth.authenticate(&grant.bearer).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated));

    // Logout is idempotent
    state
        .auth
        .logout(&grant.bearer)
        .await
        .expect("second logout failed");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_login_token_is_single_use() {
    let state = test_state().await;

    let link = state
        .auth
        .request_link(&unique_email(), "bruno")
        .await
        .expect("request_link failed");
    let raw = token_from_link(&link.url);

    state.auth.verify_link(raw).await.expect("first verify failed");

    let err = state.auth.verify_link(raw).await.unwrap_err();
    assert!(matches!(err, ApiError::TokenAlreadyUsed));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_consume_is_first_writer_wins() {
    let state = test_state().await;

    let users = UserRepository::new(state.db_pool.clone());
    let login_tokens = LoginTokenRepository::new(state.db_pool.clone());

    let user = users
        .find_or_create(&unique_email(), "iris")
        .await
        .expect("find_or_create failed");
    let raw = login_tokens
        .issue(user.id, Duration::minutes(10))
        .await
        .expect("issue failed");
    let stored = login_tokens
        .find_by_hash(&token::fingerprint(&raw))
        .await
        .expect("lookup failed")
        .expect("token must exist");

    let now = Utc::now();
    let first = login_tokens.consume(stored.id, now).await.expect("consume failed");
    let second = login_tokens.consume(stored.id, now).await.expect("consume failed");

    assert!(first);
    assert!(!second);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_concurrent_verifications_yield_one_session() {
    let state = test_state().await;

    let link = state
        .auth
        .request_link(&unique_email(), "jonas")
        .await
        .expect("request_link failed");
    let raw = token_from_link(&link.url).to_string();

    let (a, b) = tokio::join!(state.auth.verify_link(&raw), state.auth.verify_link(&raw));

    let mut grants = 0;
    for outcome in [a, b] {
        match outcome {
            Ok(_) => grants += 1,
            Err(err) => assert!(matches!(err, ApiError::TokenAlreadyUsed)),
        }
    }
    assert_eq!(grants, 1);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_unknown_login_token_rejected() {
    let state = test_state().await;

    let err = state
        .auth
        .verify_link("definitely-not-a-token")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidToken));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_expired_login_token_rejected() {
    let state = test_state().await;

    let users = UserRepository::new(state.db_pool.clone());
    let login_tokens = LoginTokenRepository::new(state.db_pool.clone());

    let user = users
        .find_or_create(&unique_email(), "clara")
        .await
        .expect("find_or_create failed");
    let raw = login_tokens
        .issue(user.id, Duration::minutes(-1))
        .await
        .expect("issue failed");

    let err = state.auth.verify_link(&raw).await.unwrap_err();
    assert!(matches!(err, ApiError::TokenExpired));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_expired_session_rejected() {
    let state = test_state().await;

    let users = UserRepository::new(state.db_pool.clone());
    let sessions = SessionRepository::new(state.db_pool.clone());

    let user = users
        .find_or_create(&unique_email(), "diego")
        .await
        .expect("find_or_create failed");
    let bearer = sessions
        .issue(user.id, Duration::days(-1))
        .await
        .expect("issue failed");

    let err = state.auth.authenticate(&bearer).await.unwrap_err();
    assert!(matches!(err, ApiError::SessionExpired));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_establishment_create_is_idempotent() {
    let state = test_state().await;

    let new = unique_place();
    let first = state
        .establishments
        .create_or_get(&new)
        .await
        .expect("first create failed");

    let resubmitted = NewEstablishment {
        name: "Different Name".to_string(),
        ..new.clone()
    };
    let second = state
        .establishments
        .create_or_get(&resubmitted)
        .await
        .expect("second create failed");

    // The existing row wins, unchanged
    assert_eq!(second.id, first.id);
    assert_eq!(second.name, first.name);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_establishment_delete_cascades_reviews() {
    let state = test_state().await;

    let users = UserRepository::new(state.db_pool.clone());
    let establishment = state
        .establishments
        .create_or_get(&unique_place())
        .await
        .expect("create failed");

    for pseudo in ["emma", "felix"] {
        let user = users
            .find_or_create(&unique_email(), pseudo)
            .await
            .expect("find_or_create failed");
        state
            .reviews
            .upsert(establishment.id, user.id, &fields(Some(4.0), "fine"))
            .await
            .expect("upsert failed");
    }

    let deleted = state
        .establishments
        .delete(establishment.id)
        .await
        .expect("delete failed");
    assert!(deleted);

    let reviews = state
        .reviews
        .list_for_establishment(establishment.id)
        .await
        .expect("list failed");
    assert!(reviews.is_empty());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_review_for_vanished_establishment_maps_to_not_found() {
    let state = test_state().await;

    let users = UserRepository::new(state.db_pool.clone());
    let user = users
        .find_or_create(&unique_email(), "karim")
        .await
        .expect("find_or_create failed");

    let establishment = state
        .establishments
        .create_or_get(&unique_place())
        .await
        .expect("create failed");
    assert!(
        state
            .establishments
            .delete(establishment.id)
            .await
            .expect("delete failed")
    );

    let err = state
        .reviews
        .upsert(establishment.id, user.id, &fields(Some(4.0), "too late"))
        .await
        .unwrap_err();
    assert!(matches!(ApiError::storage(err), ApiError::NotFound));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_user_delete_cascades_sessions_and_reviews() {
    let state = test_state().await;

    let users = UserRepository::new(state.db_pool.clone());
    let sessions = SessionRepository::new(state.db_pool.clone());

    let user = users
        .find_or_create(&unique_email(), "greta")
        .await
        .expect("find_or_create failed");
    let bearer = sessions
        .issue(user.id, Duration::days(30))
        .await
        .expect("issue failed");

    let establishment = state
        .establishments
        .create_or_get(&unique_place())
        .await
        .expect("create failed");
    state
        .reviews
        .upsert(establishment.id, user.id, &fields(Some(2.0), "rough season"))
        .await
        .expect("upsert failed");

    assert!(users.delete(user.id).await.expect("delete failed"));

    let err = state.auth.authenticate(&bearer).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthenticated));

    let reviews = state
        .reviews
        .list_for_establishment(establishment.id)
        .await
        .expect("list failed");
    assert!(reviews.is_empty());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_find_or_create_reuses_existing_user() {
    let state = test_state().await;
    let users = UserRepository::new(state.db_pool.clone());

    let email = unique_email();
    let first = users
        .find_or_create(&email, "hana")
        .await
        .expect("first call failed");
    let second = users
        .find_or_create(&email, "other-pseudo")
        .await
        .expect("second call failed");

    assert_eq!(second.id, first.id);
    assert_eq!(second.pseudo, "hana");
}
