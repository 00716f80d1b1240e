//! Knowledge base endpoints

use axum::{
    extract::{rejection::JsonRejection, Path},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use helpdesk_core::EscalationCoordinator;
use helpdesk_knowledge::{KnowledgeBase, KnowledgeEntry};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::error::ApiError;

/// New entry body
#[derive(Debug, Deserialize)]
pub struct CreateEntry {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub help_request_id: Option<String>,
}

/// Entry update body
#[derive(Debug, Deserialize)]
pub struct UpdateEntry {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
}

async fn list(Extension(kb): Extension<Arc<KnowledgeBase>>) -> Json<Vec<KnowledgeEntry>> {
    Json(kb.entries().await)
}

async fn create(
    Extension(kb): Extension<Arc<KnowledgeBase>>,
    body: Result<Json<CreateEntry>, JsonRejection>,
) -> Result<(StatusCode, Json<KnowledgeEntry>), ApiError> {
    let Json(body) = body?;
    let entry = kb
        .add(&body.question, &body.answer, body.source, body.help_request_id)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update(
    Extension(kb): Extension<Arc<KnowledgeBase>>,
    Path(id): Path<String>,
    body: Result<Json<UpdateEntry>, JsonRejection>,
) -> Result<Json<KnowledgeEntry>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::bad_request(format!("invalid entry id: {id}")))?;
    let Json(body) = body?;
    Ok(Json(kb.update(id, &body.question, &body.answer).await?))
}

async fn learn(
    Extension(kb): Extension<Arc<KnowledgeBase>>,
    Extension(coordinator): Extension<Arc<EscalationCoordinator>>,
    Path(request_id): Path<String>,
) -> Result<(StatusCode, Json<KnowledgeEntry>), ApiError> {
    let request = coordinator.store().get(&request_id).await?;
    let entry = kb.learn_from(&request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Create knowledge base routes
pub fn knowledge_routes() -> Router {
    Router::new()
        .route("/api/v1/knowledge", get(list).post(create))
        .route("/api/v1/knowledge/:id", put(update))
        .route("/api/v1/knowledge/learn/:request_id", post(learn))
}
