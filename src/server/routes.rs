//! HTTP routes for the document server.
//!
//! - `GET /health`: health check (no auth required)
//! - `GET /document`: the whole document, `null` before the first write
//! - `PUT /document`: unconditional replacement
//! - `PUT /collections/{name}`: conditional collection write keyed on
//!   `If-Match: <version>`

use std::sync::Arc;

use agua_core::remote::{CommitBody, ConflictBody};
use agua_core::{validate_collection_name, PutOutcome, Record, RemoteDocument};
use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use super::storage::DocumentStore;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    store: Arc<DocumentStore>,
    token: Option<Arc<str>>,
}

impl AppState {
    /// Creates the state. With a token, every route but `/health` requires
    /// `Authorization: Bearer <token>`.
    pub fn new(store: DocumentStore, token: Option<String>) -> Self {
        Self {
            store: Arc::new(store),
            token: token.map(Arc::from),
        }
    }
}

/// Error response body
#[derive(Serialize)]
struct ApiError {
    error: &'static str,
    message: String,
}

fn api_error(status: StatusCode, error: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiError {
            error,
            message: message.into(),
        }),
    )
        .into_response()
}

/// Builds the router.
pub fn app(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(health));

    let protected_routes = Router::new()
        .route("/document", get(get_document).put(put_document))
        .route("/collections/{name}", put(put_collection))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.token.as_deref() else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) if token == expected => next.run(request).await,
        Some(_) => api_error(StatusCode::UNAUTHORIZED, "invalid_token", "Invalid token"),
        None => api_error(
            StatusCode::UNAUTHORIZED,
            "missing_auth",
            "Bearer authorization required",
        ),
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn get_document(State(state): State<AppState>) -> Json<Option<RemoteDocument>> {
    Json(state.store.get().await)
}

async fn put_document(State(state): State<AppState>, Json(doc): Json<RemoteDocument>) -> Response {
    if let Some(name) = doc
        .collections
        .keys()
        .find(|name| validate_collection_name(name).is_err())
    {
        return api_error(
            StatusCode::BAD_REQUEST,
            "invalid_name",
            format!("Invalid collection name: {:?}", name),
        );
    }

    match state.store.replace(doc).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Failed to store document: {}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "storage", e.to_string())
        }
    }
}

async fn put_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(records): Json<Vec<Record>>,
) -> Response {
    if let Err(e) = validate_collection_name(&name) {
        return api_error(StatusCode::BAD_REQUEST, "invalid_name", e.to_string());
    }

    let Some(expected_version) = parse_if_match(&headers) else {
        return api_error(
            StatusCode::BAD_REQUEST,
            "missing_if_match",
            "If-Match header with the expected collection version required",
        );
    };

    match state
        .store
        .put_collection(&name, &records, expected_version)
        .await
    {
        Ok(PutOutcome::Committed {
            version,
            updated_at,
        }) => (
            StatusCode::OK,
            Json(CommitBody {
                version,
                updated_at,
            }),
        )
            .into_response(),
        Ok(PutOutcome::Conflict { current_version }) => {
            tracing::debug!(
                "Rejected write to '{}': expected {}, current {}",
                name,
                expected_version,
                current_version
            );
            (
                StatusCode::PRECONDITION_FAILED,
                Json(ConflictBody { current_version }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to store collection '{}': {}", name, e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "storage", e.to_string())
        }
    }
}

/// Reads the expected version from `If-Match`, accepting a quoted value.
fn parse_if_match(headers: &HeaderMap) -> Option<u64> {
    let value = headers.get(header::IF_MATCH)?.to_str().ok()?;
    value.trim().trim_matches('"').parse().ok()
}
