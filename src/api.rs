//! HTTP surface: one endpoint accepting inbound conversation updates, plus a
//! health check.
//!
//! Updates are acknowledged as soon as they are queued; processing happens on
//! the per-conversation dispatch workers.

use crate::dispatch::{DispatcherManager, OutputSink, Persistence};
use crate::state_machine::{InboundEvent, Incoming};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    /// Free text or a slash command typed by the user.
    Text,
    /// Callback data from a pressed button.
    Button,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub chat_id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    pub kind: UpdateKind,
    pub payload: String,
}

#[derive(Debug, Serialize)]
struct UpdateAccepted {
    status: &'static str,
}

pub fn router<P, O>(manager: Arc<DispatcherManager<P, O>>) -> Router
where
    P: Persistence + 'static,
    O: OutputSink + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/v1/updates", post(submit_update::<P, O>))
        .with_state(manager)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn submit_update<P, O>(
    State(manager): State<Arc<DispatcherManager<P, O>>>,
    Json(request): Json<UpdateRequest>,
) -> (StatusCode, Json<UpdateAccepted>)
where
    P: Persistence + 'static,
    O: OutputSink + 'static,
{
    let incoming = match request.kind {
        UpdateKind::Text => Incoming::from_text(request.payload),
        UpdateKind::Button => Incoming::from_button(&request.payload),
    };
    manager
        .submit(InboundEvent {
            chat_id: request.chat_id,
            sender_name: request.first_name,
            incoming,
        })
        .await;
    (StatusCode::ACCEPTED, Json(UpdateAccepted { status: "accepted" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::testing::{MemoryStore, RecordingSink};
    use crate::dispatch::Dispatcher;
    use crate::session::SessionStore;
    use crate::state_machine::Registry;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router() -> (Router, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let dispatcher = Dispatcher::new(
            Arc::new(Registry::new()),
            Arc::new(SessionStore::new()),
            Arc::new(MemoryStore::default()),
            Arc::clone(&sink),
        );
        (router(Arc::new(DispatcherManager::new(dispatcher))), sink)
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (router, _) = test_router();
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn update_is_accepted_and_processed() {
        let (router, sink) = test_router();
        let request = Request::post("/v1/updates")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"chat_id": 100, "first_name": "Alex", "kind": "text", "payload": "/help"}"#,
            ))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        // The worker runs off the request path; give it a moment.
        for _ in 0..50 {
            if !sink.texts(100).is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(sink.texts(100).iter().any(|t| t.contains("Commands")));
    }

    #[tokio::test]
    async fn malformed_update_is_rejected() {
        let (router, _) = test_router();
        let request = Request::post("/v1/updates")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"chat_id": 100, "kind": "poke"}"#))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
