// Copyright 2026 Innsight Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP REST API.
//!
//! Thin layer over a [`HotelSource`]: API-key auth, a response cache,
//! and the optional mock fallback. Handlers never surface scraping
//! faults as 5xx; a fetch that yields nothing is a 404.

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::engine::{resolve_dates, HotelSource};
use crate::mock;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use url::Url;

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub source: Arc<dyn HotelSource>,
    pub cache: Arc<Mutex<ResponseCache>>,
}

impl AppState {
    pub fn new(config: Arc<Config>, source: Arc<dyn HotelSource>) -> Self {
        let cache = Arc::new(Mutex::new(ResponseCache::new(
            config.cache_ttl,
            config.cache_max_entries,
        )));
        Self {
            config,
            source,
            cache,
        }
    }
}

/// Build the axum Router with all REST endpoints.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/hotels/search", get(search_hotels))
        .route("/hotels/details", get(hotel_details))
        .layer(cors)
        .with_state(state)
}

/// Start the REST API server on the given port.
pub async fn start(port: u16, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("REST API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

type ApiResult = Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)>;

/// Validate the `access_token` header against the configured keys.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let token = headers
        .get("access_token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if token.is_empty() || !state.config.api_keys.iter().any(|k| k == token) {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "detail": "Invalid or missing API key" })),
        ));
    }
    Ok(())
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Welcome to Hotel Data API",
        "version": API_VERSION,
        "endpoints": {
            "search_hotels": "/hotels/search?city={city_name}&checkin={YYYY-MM-DD}&checkout={YYYY-MM-DD}",
            "hotel_details": "/hotels/details?hotel_url={booking_url}",
        },
        "features": [
            "Real-time hotel data",
            "API key authentication",
            "Automatic caching (1 hour TTL)",
            "Fallback to mock data if scraping fails",
        ],
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "version": API_VERSION }))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    city: String,
    checkin: Option<String>,
    checkout: Option<String>,
}

async fn search_hotels(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> ApiResult {
    authorize(&state, &headers)?;

    let city = params.city.trim().to_string();
    if city.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "city must not be empty" })),
        ));
    }

    let (checkin, checkout) = resolve_dates(
        &state.config,
        params.checkin.as_deref(),
        params.checkout.as_deref(),
    );
    info!(%city, %checkin, %checkout, "search request");

    let cache_key = format!("search:{}:{checkin}:{checkout}", city.to_lowercase());
    if let Some(hit) = state.cache.lock().await.get(&cache_key) {
        info!(%city, "serving search from cache");
        return Ok((StatusCode::OK, Json(hit)));
    }

    let scraped = match state.source.search(&city, &checkin, &checkout).await {
        Ok(listings) => listings,
        Err(e) => {
            warn!(%city, error = %e, "search fetch failed");
            Vec::new()
        }
    };

    let listings = if scraped.is_empty() && state.config.enable_mock_fallback {
        warn!(%city, "serving mock listings");
        mock::listings_for_city(&city)
    } else {
        scraped
    };

    if listings.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "No hotels found for this city" })),
        ));
    }

    let payload = serde_json::to_value(&listings).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": format!("serialization failed: {e}") })),
        )
    })?;
    state
        .cache
        .lock()
        .await
        .put(cache_key, payload.clone());

    Ok((StatusCode::OK, Json(payload)))
}

#[derive(Debug, Deserialize)]
struct DetailsParams {
    hotel_url: String,
}

async fn hotel_details(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DetailsParams>,
) -> ApiResult {
    authorize(&state, &headers)?;

    let hotel_url = params.hotel_url.trim().to_string();
    if Url::parse(&hotel_url).is_err() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "hotel_url must be an absolute URL" })),
        ));
    }
    info!(url = %hotel_url, "details request");

    let cache_key = format!("details:{hotel_url}");
    if let Some(hit) = state.cache.lock().await.get(&cache_key) {
        info!(url = %hotel_url, "serving details from cache");
        return Ok((StatusCode::OK, Json(hit)));
    }

    let detail = match state.source.fetch_details(&hotel_url).await {
        Ok(detail) => detail,
        Err(e) => {
            warn!(url = %hotel_url, error = %e, "detail fetch failed");
            None
        }
    };

    let Some(detail) = detail else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Hotel details not found" })),
        ));
    };

    let payload = serde_json::to_value(&detail).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": format!("serialization failed: {e}") })),
        )
    })?;
    state
        .cache
        .lock()
        .await
        .put(cache_key, payload.clone());

    Ok((StatusCode::OK, Json(payload)))
}
