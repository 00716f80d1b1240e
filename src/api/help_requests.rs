//! Help request endpoints
//!
//! - `POST /api/v1/helpreq` - submit a question out of band
//! - `GET /api/v1/helpreq` - every request keyed by id, oldest first
//! - `GET /api/v1/helpreq/:id`
//! - `PATCH /api/v1/helpreq/:id` - answer a request (same path as the
//!   supervisor channel)

use axum::{
    extract::{rejection::JsonRejection, Path},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use helpdesk_core::{EscalationCoordinator, HelpRequest, NewHelpRequest};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;

use super::error::ApiError;

/// Submission body
#[derive(Debug, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub caller_id: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Submission response
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub request_id: String,
    pub status: String,
    pub id: String,
}

/// Resolution body
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    #[serde(default)]
    pub answer: String,
}

/// Requests serialized as a JSON object keyed by id, in insertion order
pub struct RequestIndex(pub Vec<HelpRequest>);

impl Serialize for RequestIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for request in &self.0 {
            map.serialize_entry(&request.id, request)?;
        }
        map.end()
    }
}

async fn submit(
    Extension(coordinator): Extension<Arc<EscalationCoordinator>>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmitResponse>), ApiError> {
    let Json(body) = body?;
    let request = coordinator
        .submit_request(NewHelpRequest {
            request_id: body.request_id,
            question: body.question.unwrap_or_default(),
            caller_id: body.caller_id,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            request_id: request.id.clone(),
            status: "created".to_string(),
            id: request.id,
        }),
    ))
}

async fn list(Extension(coordinator): Extension<Arc<EscalationCoordinator>>) -> Json<RequestIndex> {
    Json(RequestIndex(coordinator.store().list().await))
}

async fn get_one(
    Extension(coordinator): Extension<Arc<EscalationCoordinator>>,
    Path(id): Path<String>,
) -> Result<Json<HelpRequest>, ApiError> {
    Ok(Json(coordinator.store().get(&id).await?))
}

async fn resolve(
    Extension(coordinator): Extension<Arc<EscalationCoordinator>>,
    Path(id): Path<String>,
    body: Result<Json<ResolveRequest>, JsonRejection>,
) -> Result<Json<HelpRequest>, ApiError> {
    let Json(body) = body?;
    let outcome = coordinator
        .handle_supervisor_resolution(&id, &body.answer)
        .await?;
    Ok(Json(outcome.request))
}

/// Create help request routes
pub fn help_request_routes() -> Router {
    Router::new()
        .route("/api/v1/helpreq", post(submit).get(list))
        .route("/api/v1/helpreq/:id", get(get_one).patch(resolve))
}
