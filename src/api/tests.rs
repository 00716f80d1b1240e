use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use helpdesk_core::{ConnectionRole, RequestStatus};
use helpdesk_knowledge::KnowledgeBase;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use crate::server::config::AppConfig;
use crate::server::{build_router, Components};
use crate::websocket::SocketContext;

fn components() -> Components {
    let kb = KnowledgeBase::from_seed([(
        "What are your opening hours?",
        "We are open 9am to 7pm, Tuesday to Saturday.",
    )]);
    Components::new(&AppConfig::default(), Arc::new(kb))
}

fn app(components: &Components) -> Router {
    let sockets = SocketContext {
        settings: Arc::new(AppConfig::default().websocket),
        shutdown: CancellationToken::new(),
    };
    build_router(components, sockets)
}

async fn call(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let components = components();
    let (tx, _rx) = mpsc::channel(4);
    components
        .coordinator
        .registry()
        .register("agent", ConnectionRole::Relay, tx);

    let (status, body) = call(app(&components), Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["relay_connections"], 1);
    assert_eq!(body["caller_connections"], 0);
    assert_eq!(body["pending_requests"], 0);
}

#[tokio::test]
async fn test_submit_and_fetch_help_request() {
    let components = components();

    let (status, body) = call(
        app(&components),
        Method::POST,
        "/api/v1/helpreq",
        Some(json!({"question": "Do you do balayage?", "caller_id": "c1"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "created");
    let id = body["request_id"].as_str().unwrap().to_string();
    assert_eq!(body["id"], id.as_str());

    let (status, body) = call(
        app(&components),
        Method::GET,
        &format!("/api/v1/helpreq/{id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["question"], "Do you do balayage?");
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn test_submit_validation_errors() {
    let components = components();

    let (status, body) = call(
        app(&components),
        Method::POST,
        "/api/v1/helpreq",
        Some(json!({"caller_id": "c1"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_message");
    assert!(body["error"].is_string());

    let submission = json!({"question": "q", "request_id": "req-1"});
    let (status, _) = call(app(&components), Method::POST, "/api/v1/helpreq", Some(submission.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = call(app(&components), Method::POST, "/api/v1/helpreq", Some(submission)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "duplicate_id");
}

#[tokio::test]
async fn test_list_is_keyed_by_id_in_order() {
    let components = components();
    for id in ["req-b", "req-a", "req-c"] {
        call(
            app(&components),
            Method::POST,
            "/api/v1/helpreq",
            Some(json!({"question": format!("question {id}"), "request_id": id})),
        )
        .await;
    }

    let response = app(&components)
        .oneshot(
            Request::builder()
                .uri("/api/v1/helpreq")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();

    let b = text.find("\"req-b\"").unwrap();
    let a = text.find("\"req-a\"").unwrap();
    let c = text.find("\"req-c\"").unwrap();
    assert!(b < a && a < c);

    let body: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(body["req-a"]["question"], "question req-a");
}

#[tokio::test]
async fn test_patch_resolves_and_delivers() {
    let components = components();
    let (tx, mut caller) = mpsc::channel(4);
    components
        .coordinator
        .registry()
        .register("c1", ConnectionRole::Caller, tx);

    call(
        app(&components),
        Method::POST,
        "/api/v1/helpreq",
        Some(json!({"question": "q", "caller_id": "c1", "request_id": "req-1"})),
    )
    .await;

    let (status, body) = call(
        app(&components),
        Method::PATCH,
        "/api/v1/helpreq/req-1",
        Some(json!({"answer": "Yes we do"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "answered");
    assert_eq!(body["answer"], "Yes we do");
    assert_eq!(
        caller.recv().await.as_deref(),
        Some("[Supervisor Answer]: Yes we do")
    );
}

#[tokio::test]
async fn test_patch_unknown_and_invalid() {
    let components = components();

    let (status, body) = call(
        app(&components),
        Method::PATCH,
        "/api/v1/helpreq/missing",
        Some(json!({"answer": "a"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, _) = call(
        app(&components),
        Method::PATCH,
        "/api/v1/helpreq/missing",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(app(&components), Method::GET, "/api/v1/helpreq/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_knowledge_crud() {
    let components = components();

    let (status, body) = call(app(&components), Method::GET, "/api/v1/knowledge", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = call(
        app(&components),
        Method::POST,
        "/api/v1/knowledge",
        Some(json!({"question": "Is there parking?", "answer": "Behind the salon."})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = call(
        app(&components),
        Method::POST,
        "/api/v1/knowledge",
        Some(json!({"question": "IS THERE PARKING?", "answer": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "duplicate_question");

    let (status, body) = call(
        app(&components),
        Method::PUT,
        &format!("/api/v1/knowledge/{id}"),
        Some(json!({"question": "Is there parking?", "answer": "Free, behind the salon."})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Free, behind the salon.");

    let (status, _) = call(
        app(&components),
        Method::PUT,
        &format!("/api/v1/knowledge/{}", uuid::Uuid::new_v4()),
        Some(json!({"question": "q", "answer": "a"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        app(&components),
        Method::PUT,
        "/api/v1/knowledge/not-a-uuid",
        Some(json!({"question": "q", "answer": "a"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_learn_from_answered_request() {
    let components = components();
    call(
        app(&components),
        Method::POST,
        "/api/v1/helpreq",
        Some(json!({"question": "Do you sell gift cards?", "request_id": "req-9"})),
    )
    .await;

    let (status, _) = call(app(&components), Method::POST, "/api/v1/knowledge/learn/req-9", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let outcome = components
        .coordinator
        .handle_supervisor_resolution("req-9", "Yes, at the front desk.")
        .await
        .unwrap();
    assert_eq!(outcome.request.status, RequestStatus::Answered);

    let (status, body) = call(app(&components), Method::POST, "/api/v1/knowledge/learn/req-9", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["source"], "learned-from-request-req-9");

    let (status, _) = call(app(&components), Method::POST, "/api/v1/knowledge/learn/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(
        components
            .knowledge
            .find_answer("do you sell gift cards?")
            .await
            .as_deref(),
        Some("Yes, at the front desk.")
    );
}
