//! HTTP routes for the record resources.
//!
//! Each resource exposes `create`, `list`, `get`, `update` and `delete`
//! actions under `/api/<resource>/`. The lookup email travels in the
//! `email` query parameter (`contactEmail` is accepted too); record payloads
//! travel as JSON bodies. Every error, extractor rejections included, is
//! answered with a JSON `{"error": ...}` body.

use crate::state::{AppState, SharedService};
use addressbook_core::{core_version, Contact, RepoError, RepoResult};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use log::error;
use serde::Deserialize;
use serde_json::json;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .nest("/api/addressbook", resource_routes(state.contacts))
        .nest("/api/customer", resource_routes(state.customers))
}

fn resource_routes(service: SharedService) -> Router {
    Router::new()
        .route("/create", post(create_record))
        .route("/list", get(list_records))
        .route("/get", get(get_record))
        .route("/update", put(update_record))
        .route("/delete", delete(delete_record))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct EmailQuery {
    #[serde(default, alias = "contactEmail")]
    email: String,
}

/// Store failure translated for the transport.
#[derive(Debug)]
pub enum ApiError {
    Repo(RepoError),
    /// Request could not be decoded into a record or lookup key.
    BadRequest(String),
    Worker(String),
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Repo(
                err @ (RepoError::Validation(_)
                | RepoError::InvalidKey { .. }
                | RepoError::DuplicateEmail { .. }),
            ) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Repo(err @ RepoError::NotFound { .. }) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::BadRequest(details) => (StatusCode::BAD_REQUEST, details.clone()),
            Self::Repo(err) => {
                error!(
                    "event=http_response module=server status=error error_code={} error={}",
                    err.code(),
                    err
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "record storage is unavailable".to_string(),
                )
            }
            Self::Worker(details) => {
                error!(
                    "event=http_response module=server status=error error_code=worker_failed error={details}"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "request could not be completed".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": core_version() }))
}

async fn create_record(
    State(service): State<SharedService>,
    payload: Result<Json<Contact>, JsonRejection>,
) -> Result<(StatusCode, Json<Contact>), ApiError> {
    let Json(candidate) = payload?;
    let created = run_blocking(service, move |service| service.create_contact(&candidate)).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn list_records(
    State(service): State<SharedService>,
) -> Result<Json<Vec<Contact>>, ApiError> {
    let contacts = run_blocking(service, |service| service.list_contacts()).await?;
    Ok(Json(contacts))
}

async fn get_record(
    State(service): State<SharedService>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<Contact>, ApiError> {
    let Query(query) = query?;
    let contact = run_blocking(service, move |service| service.get_contact(&query.email)).await?;
    Ok(Json(contact))
}

async fn update_record(
    State(service): State<SharedService>,
    query: Result<Query<EmailQuery>, QueryRejection>,
    payload: Result<Json<Contact>, JsonRejection>,
) -> Result<Json<Contact>, ApiError> {
    let Query(query) = query?;
    let Json(candidate) = payload?;
    let updated = run_blocking(service, move |service| {
        service.update_contact(&query.email, &candidate)
    })
    .await?;
    Ok(Json(updated))
}

async fn delete_record(
    State(service): State<SharedService>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<StatusCode, ApiError> {
    let Query(query) = query?;
    run_blocking(service, move |service| service.delete_contact(&query.email)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Runs a store call on the blocking pool; stores do synchronous I/O.
async fn run_blocking<T, F>(service: SharedService, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&SharedService) -> RepoResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&service))
        .await
        .map_err(|err| ApiError::Worker(err.to_string()))?
        .map_err(ApiError::from)
}
