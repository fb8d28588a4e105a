use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use showroom_agent::AgentRuntime;
use showroom_core::dialogue::DialogueStage;
use showroom_core::errors::InterfaceError;
use tracing::warn;
use uuid::Uuid;

/// Session used when the caller does not send one, so a single-user client
/// keeps one running conversation.
pub const DEFAULT_SESSION_ID: &str = "default";

#[derive(Clone)]
pub struct ChatState {
    runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub bot_response: String,
    pub session_id: String,
    pub stage: DialogueStage,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub correlation_id: String,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/reset", post(reset))
        .route("/session/{session_id}", delete(end_session))
        .with_state(ChatState { runtime })
}

pub async fn chat(
    State(state): State<ChatState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    if body.user_message.trim().is_empty() {
        return Err(reject(InterfaceError::bad_request(
            "user_message must not be empty",
            Uuid::new_v4().to_string(),
        )));
    }

    let session_id = session_or_default(body.session_id);
    let outcome = state.runtime.process_turn(&session_id, &body.user_message).await;

    Ok(Json(ChatResponse { bot_response: outcome.reply, session_id, stage: outcome.stage }))
}

/// Accepts an empty body, which resets the default session.
pub async fn reset(
    State(state): State<ChatState>,
    body: Bytes,
) -> Result<Json<ResetResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ResetRequest::default()
    } else {
        serde_json::from_slice::<ResetRequest>(&body).map_err(|error| {
            reject(InterfaceError::bad_request(
                format!("invalid reset body: {error}"),
                Uuid::new_v4().to_string(),
            ))
        })?
    };

    let session_id = session_or_default(request.session_id);
    let message = state.runtime.reset_session(&session_id).await;
    Ok(Json(ResetResponse { message }))
}

/// Ends a conversation and frees its state. Unknown sessions are a 404 so a
/// client can tell a typo from a successful goodbye.
pub async fn end_session(
    State(state): State<ChatState>,
    Path(session_id): Path<String>,
) -> Result<Json<ResetResponse>, (StatusCode, Json<ErrorResponse>)> {
    if !state.runtime.has_session(&session_id).await {
        return Err(reject(InterfaceError::not_found(
            format!("session {session_id}"),
            Uuid::new_v4().to_string(),
        )));
    }

    let message = state.runtime.end_session(&session_id).await;
    Ok(Json(ResetResponse { message }))
}

fn session_or_default(session_id: Option<String>) -> String {
    session_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string())
}

fn reject(error: InterfaceError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
    };
    warn!(
        event_name = "server.chat.rejected",
        correlation_id = error.correlation_id(),
        error = %error,
        "chat request rejected"
    );
    (
        status,
        Json(ErrorResponse {
            error: error.user_message().to_string(),
            correlation_id: error.correlation_id().to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use showroom_agent::{AgentRuntime, UnavailableLlm};
    use showroom_core::config::AppConfig;
    use showroom_core::dialogue::DialogueStage;
    use showroom_core::CatalogItem;
    use showroom_db::InMemoryCatalogRepository;
    use tower::ServiceExt;

    use super::{router, ChatResponse, ErrorResponse, ResetResponse};

    fn app() -> Router {
        let brezza = CatalogItem {
            model: "Brezza".to_string(),
            seats: Some(5),
            fuel_type: Some("Diesel".to_string()),
            body_type: Some("SUV".to_string()),
            price: Some(850_000),
            mileage: Some("24.3 km/l".to_string()),
            mileage_value: Some(24.3),
            ..CatalogItem::default()
        };
        let runtime = AgentRuntime::from_config(
            &AppConfig::default(),
            Arc::new(InMemoryCatalogRepository::new(vec![brezza])),
            Arc::new(UnavailableLlm),
        );
        router(Arc::new(runtime))
    }

    async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
        send(app, "POST", uri, body).await
    }

    async fn send(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, bytes.to_vec())
    }

    async fn chat(app: &Router, session: &str, message: &str) -> ChatResponse {
        let body = serde_json::json!({ "user_message": message, "session_id": session }).to_string();
        let (status, bytes) = post(app, "/chat", &body).await;
        assert_eq!(status, StatusCode::OK);
        serde_json::from_slice(&bytes).expect("chat response")
    }

    #[tokio::test]
    async fn chat_walks_through_slot_filling_to_a_listing() {
        let app = app();

        let greeting = chat(&app, "web-1", "hi").await;
        assert!(greeting.bot_response.starts_with("Hello! Welcome to Maruti Suzuki."));
        assert_eq!(greeting.stage, DialogueStage::CollectingFamilySize);

        chat(&app, "web-1", "we are 5 people").await;
        chat(&app, "web-1", "diesel please").await;
        chat(&app, "web-1", "suv").await;
        let listing = chat(&app, "web-1", "8 lakhs").await;

        assert_eq!(listing.stage, DialogueStage::Ready);
        assert_eq!(listing.session_id, "web-1");
        assert!(listing.bot_response.contains("Brezza | Diesel | 5 seats | 24.3 km/l | ₹850,000"));
    }

    #[tokio::test]
    async fn missing_session_id_uses_the_default_session() {
        let app = app();
        let (status, bytes) = post(&app, "/chat", r#"{"user_message":"we are 4"}"#).await;
        assert_eq!(status, StatusCode::OK);

        let response: ChatResponse = serde_json::from_slice(&bytes).expect("chat response");
        assert_eq!(response.session_id, "default");
        assert_eq!(response.stage, DialogueStage::CollectingFuel);
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let app = app();
        let (status, bytes) = post(&app, "/chat", r#"{"user_message":"   "}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorResponse = serde_json::from_slice(&bytes).expect("error response");
        assert!(!error.correlation_id.is_empty());
    }

    #[tokio::test]
    async fn reset_with_empty_body_resets_default_session() {
        let app = app();
        post(&app, "/chat", r#"{"user_message":"we are 4"}"#).await;

        let (status, bytes) = post(&app, "/reset", "").await;
        assert_eq!(status, StatusCode::OK);
        let reset: ResetResponse = serde_json::from_slice(&bytes).expect("reset response");
        assert_eq!(reset.message, "Conversation reset successfully!");

        let (_, bytes) = post(&app, "/chat", r#"{"user_message":"diesel"}"#).await;
        let response: ChatResponse = serde_json::from_slice(&bytes).expect("chat response");
        assert_eq!(response.stage, DialogueStage::CollectingFamilySize);
    }

    #[tokio::test]
    async fn reset_only_touches_the_named_session() {
        let app = app();
        chat(&app, "a", "we are 4").await;
        chat(&app, "b", "we are 4").await;

        let (status, _) = post(&app, "/reset", r#"{"session_id":"a"}"#).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(chat(&app, "a", "petrol").await.stage, DialogueStage::CollectingFamilySize);
        assert_eq!(chat(&app, "b", "petrol").await.stage, DialogueStage::CollectingCarType);
    }

    #[tokio::test]
    async fn delete_session_says_goodbye_once() {
        let app = app();
        chat(&app, "kiosk-7", "we are 4").await;

        let (status, bytes) = send(&app, "DELETE", "/session/kiosk-7", "").await;
        assert_eq!(status, StatusCode::OK);
        let farewell: ResetResponse = serde_json::from_slice(&bytes).expect("farewell");
        assert!(farewell.message.starts_with("Thanks for visiting Maruti Suzuki!"));

        let (status, bytes) = send(&app, "DELETE", "/session/kiosk-7", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: ErrorResponse = serde_json::from_slice(&bytes).expect("error response");
        assert!(!error.correlation_id.is_empty());

        // A later message starts from scratch.
        assert_eq!(chat(&app, "kiosk-7", "petrol").await.stage, DialogueStage::CollectingFamilySize);
    }
}
