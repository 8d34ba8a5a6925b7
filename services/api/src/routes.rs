//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect},
    routing::{delete, get, post},
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    AppState, auth,
    config::SESSION_COOKIE_NAME,
    error::ApiError,
    middleware::auth_middleware,
    models::{
        Establishment, Housing, HousingQuality, NewEstablishment, ReviewFields, ReviewWithAuthor,
        User,
    },
    stats::{self, ReviewStats},
    validation,
};

/// Request for a magic link
#[derive(Deserialize)]
pub struct MagicLinkRequest {
    pub email: String,
    pub pseudo: String,
}

/// Response for a magic-link request
///
/// `dev_link` echoes the verification URL; production deployments deliver
/// it by email instead of reading it from the response.
#[derive(Serialize)]
pub struct MagicLinkResponse {
    pub ok: bool,
    pub dev_link: String,
}

/// Query parameters for magic-link verification
#[derive(Deserialize)]
pub struct VerifyQuery {
    pub token: String,
}

/// Public view of a user
#[derive(Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub pseudo: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            pseudo: user.pseudo,
            created_at: user.created_at,
        }
    }
}

/// Request to create an establishment from place-lookup data
#[derive(Deserialize)]
pub struct CreateEstablishmentRequest {
    pub place_id: String,
    pub name: String,
    pub address: Option<String>,
    pub external_rating: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Establishment together with its reviews and aggregated stats
#[derive(Serialize)]
pub struct EstablishmentWithStats {
    pub establishment: Establishment,
    pub reviews: Vec<ReviewWithAuthor>,
    pub stats: ReviewStats,
}

/// Request to submit or replace a review
#[derive(Deserialize)]
pub struct ReviewRequest {
    pub establishment_id: Uuid,
    pub score: Option<f64>,
    pub comment: String,
    pub role: Option<String>,
    pub contract: Option<String>,
    pub housing: Option<Housing>,
    pub housing_quality: Option<HousingQuality>,
    #[serde(default)]
    pub split_shift: bool,
    #[serde(default)]
    pub unpaid_overtime: bool,
    #[serde(default)]
    pub toxic_manager: bool,
    #[serde(default)]
    pub harassment: bool,
    #[serde(default)]
    pub recommend: bool,
}

/// Query parameters for place autocomplete
#[derive(Deserialize)]
pub struct AutocompleteQuery {
    pub q: String,
}

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/me", get(me))
        .route("/reviews", post(submit_review))
        .route("/reviews/:id", delete(delete_review))
        .route("/establishments/:id", delete(delete_establishment))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/magic-link", post(request_magic_link))
        .route("/auth/verify", get(verify_magic_link))
        .route("/auth/logout", post(logout))
        .route("/api/places/autocomplete", get(places_autocomplete))
        .route("/api/places/:place_id", get(place_details))
        .route("/establishments", post(create_establishment))
        .route("/establishments/by_place/:place_id", get(get_establishment_by_place))
        .route("/establishments/:id", get(get_establishment))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "tablier-api"
    }))
}

/// Request a magic link for an email, creating the user if needed
pub async fn request_magic_link(
    State(state): State<AppState>,
    Json(payload): Json<MagicLinkRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_email(&payload.email).map_err(ApiError::BadRequest)?;
    validation::validate_pseudo(&payload.pseudo).map_err(ApiError::BadRequest)?;

    let link = state
        .auth
        .request_link(&payload.email, &payload.pseudo)
        .await?;

    info!("Magic link issued for user {}", link.user.id);

    Ok(Json(MagicLinkResponse {
        ok: true,
        dev_link: link.url,
    }))
}

/// Verify a magic-link token and install the session cookie
pub async fn verify_magic_link(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let grant = state.auth.verify_link(&query.token).await?;

    let jar = jar.add(auth::session_cookie(grant.bearer, grant.max_age_seconds));

    Ok((jar, Redirect::to("/")))
}

/// Log out: revoke the session server-side and clear the cookie
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE_NAME) {
        state.auth.logout(cookie.value()).await?;
    }

    let jar = jar.add(auth::clear_session_cookie());

    Ok((jar, Json(json!({"ok": true}))))
}

/// Current authenticated user
pub async fn me(Extension(user): Extension<User>) -> impl IntoResponse {
    Json(json!({"user": UserResponse::from(user)}))
}

/// Place autocomplete passthrough
pub async fn places_autocomplete(
    State(state): State<AppState>,
    Query(query): Query<AutocompleteQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.q.is_empty() {
        return Err(ApiError::BadRequest("Query must not be empty".to_string()));
    }

    let suggestions = state.places.autocomplete(&query.q).await?;

    Ok(Json(suggestions))
}

/// Place details passthrough
pub async fn place_details(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let details = state.places.details(&place_id).await?;

    Ok(Json(details))
}

/// Create an establishment, or return the existing one for the place id
pub async fn create_establishment(
    State(state): State<AppState>,
    Json(payload): Json<CreateEstablishmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_establishment_name(&payload.name).map_err(ApiError::BadRequest)?;
    if payload.place_id.is_empty() {
        return Err(ApiError::BadRequest("Place id is required".to_string()));
    }

    let new = NewEstablishment {
        place_id: payload.place_id,
        name: payload.name,
        address: payload.address,
        external_rating: payload.external_rating,
        tags: payload.tags,
    };

    let establishment = state
        .establishments
        .create_or_get(&new)
        .await
        .map_err(ApiError::storage)?;

    Ok(Json(establishment))
}

/// Get an establishment with its reviews and stats
pub async fn get_establishment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let establishment = state
        .establishments
        .find_by_id(id)
        .await
        .map_err(ApiError::storage)?
        .ok_or(ApiError::NotFound)?;

    let response = establishment_with_stats(&state, establishment).await?;

    Ok(Json(response))
}

/// Get an establishment by its external place id
pub async fn get_establishment_by_place(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let establishment = state
        .establishments
        .find_by_place_id(&place_id)
        .await
        .map_err(ApiError::storage)?
        .ok_or(ApiError::NotFound)?;

    let response = establishment_with_stats(&state, establishment).await?;

    Ok(Json(response))
}

/// Delete an establishment, cascading to its reviews
pub async fn delete_establishment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .establishments
        .delete(id)
        .await
        .map_err(ApiError::storage)?;

    if !deleted {
        return Err(ApiError::NotFound);
    }

    Ok(Json(json!({"ok": true})))
}

/// Submit a review, replacing the author's previous review of the same
/// establishment if any
pub async fn submit_review(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::validate_comment(&payload.comment).map_err(ApiError::BadRequest)?;
    if let Some(score) = payload.score {
        validation::validate_score(score, &state.config.score_range)
            .map_err(ApiError::BadRequest)?;
    }
    if let Some(role) = &payload.role {
        validation::validate_role(role).map_err(ApiError::BadRequest)?;
    }
    if let Some(contract) = &payload.contract {
        validation::validate_contract(contract).map_err(ApiError::BadRequest)?;
    }

    state
        .establishments
        .find_by_id(payload.establishment_id)
        .await
        .map_err(ApiError::storage)?
        .ok_or(ApiError::NotFound)?;

    let fields = ReviewFields {
        score: payload.score,
        comment: payload.comment,
        role: payload.role,
        contract: payload.contract,
        housing: payload.housing,
        housing_quality: payload.housing_quality,
        split_shift: payload.split_shift,
        unpaid_overtime: payload.unpaid_overtime,
        toxic_manager: payload.toxic_manager,
        harassment: payload.harassment,
        recommend: payload.recommend,
    };

    // The existence check above is advisory; if the establishment is
    // deleted before the write lands, the foreign-key violation comes
    // back here and maps to NotFound.
    let review = state
        .reviews
        .upsert(payload.establishment_id, user.id, &fields)
        .await
        .map_err(ApiError::storage)?;

    Ok((
        StatusCode::OK,
        Json(ReviewWithAuthor {
            review,
            author_pseudo: user.pseudo,
        }),
    ))
}

/// Delete a review; only its author may do so
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let review = state
        .reviews
        .find_by_id(id)
        .await
        .map_err(ApiError::storage)?
        .ok_or(ApiError::NotFound)?;

    if review.user_id != user.id {
        return Err(ApiError::Forbidden);
    }

    state.reviews.delete(id).await.map_err(ApiError::storage)?;

    Ok(Json(json!({"ok": true})))
}

async fn establishment_with_stats(
    state: &AppState,
    establishment: Establishment,
) -> Result<EstablishmentWithStats, ApiError> {
    let reviews = state
        .reviews
        .list_for_establishment(establishment.id)
        .await
        .map_err(ApiError::storage)?;

    let stats = stats::compute(reviews.iter().map(|r| &r.review));

    Ok(EstablishmentWithStats {
        establishment,
        reviews,
        stats,
    })
}
