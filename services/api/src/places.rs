//! Place-lookup proxy
//!
//! Thin client for the Google Places API, exposed so the UI can search for
//! establishments. The output of `details` is exactly the input shape of
//! `EstablishmentRepository::create_or_get`.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::error;

use crate::error::{ApiError, ApiResult};

const AUTOCOMPLETE_URL: &str = "https://maps.googleapis.com/maps/api/place/autocomplete/json";
const DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";

/// Autocomplete suggestion returned to the client
#[derive(Debug, Clone, Serialize)]
pub struct PlaceSuggestion {
    pub place_id: String,
    pub description: String,
}

/// Place details returned to the client
#[derive(Debug, Clone, Serialize)]
pub struct PlaceDetails {
    pub place_id: String,
    pub name: String,
    pub address: Option<String>,
    pub rating: Option<f64>,
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<Prediction>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    place_id: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<DetailsResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResult {
    place_id: String,
    name: String,
    formatted_address: Option<String>,
    rating: Option<f64>,
    #[serde(default)]
    types: Vec<String>,
}

/// Client for the place-lookup service
#[derive(Clone)]
pub struct PlacesClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl PlacesClient {
    /// Create a new places client
    ///
    /// A missing API key is not an error at construction time; lookups
    /// fail with a configuration error instead, so deployments without a
    /// key still serve everything else.
    pub fn new(api_key: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self { http, api_key })
    }

    fn key(&self) -> ApiResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ApiError::Configuration("PLACES_API_KEY is not set".to_string()))
    }

    /// Search establishments by free text
    pub async fn autocomplete(&self, query: &str) -> ApiResult<Vec<PlaceSuggestion>> {
        let key = self.key()?;

        let response: AutocompleteResponse = self
            .http
            .get(AUTOCOMPLETE_URL)
            .query(&[
                ("input", query),
                ("types", "establishment"),
                ("language", "fr"),
                ("key", key),
            ])
            .send()
            .await
            .map_err(upstream_failure)?
            .json()
            .await
            .map_err(upstream_failure)?;

        match response.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(response
                .predictions
                .into_iter()
                .map(|p| PlaceSuggestion {
                    place_id: p.place_id,
                    description: p.description,
                })
                .collect()),
            status => Err(upstream_status(status, response.error_message)),
        }
    }

    /// Fetch details for a single place
    pub async fn details(&self, place_id: &str) -> ApiResult<PlaceDetails> {
        let key = self.key()?;

        let response: DetailsResponse = self
            .http
            .get(DETAILS_URL)
            .query(&[
                ("place_id", place_id),
                ("fields", "place_id,name,formatted_address,rating,types"),
                ("language", "fr"),
                ("key", key),
            ])
            .send()
            .await
            .map_err(upstream_failure)?
            .json()
            .await
            .map_err(upstream_failure)?;

        match response.status.as_str() {
            "OK" => {
                let result = response.result.ok_or_else(|| {
                    ApiError::Upstream("place details response missing result".to_string())
                })?;

                Ok(PlaceDetails {
                    place_id: result.place_id,
                    name: result.name,
                    address: result.formatted_address,
                    rating: result.rating,
                    tags: result.types,
                })
            }
            "NOT_FOUND" | "ZERO_RESULTS" => Err(ApiError::NotFound),
            status => Err(upstream_status(status, response.error_message)),
        }
    }
}

fn upstream_failure(e: reqwest::Error) -> ApiError {
    error!("Place lookup request failed: {}", e);
    ApiError::Upstream("place lookup request failed".to_string())
}

fn upstream_status(status: &str, message: Option<String>) -> ApiError {
    error!(
        "Place lookup returned status {}: {}",
        status,
        message.as_deref().unwrap_or("no message")
    );
    ApiError::Upstream(format!("place lookup returned status {status}"))
}
