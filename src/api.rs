//! HTTP surface for the chat backend.
//!
//! - `GET /` – Static chat page.
//! - `GET|POST /get` – Answer a question. Accepts `{ "msg": string, "language": string }` and
//!   returns `{ "response": string }`. An empty `msg` yields `400 { "error": "Message is required" }`;
//!   any failure while parsing the body, retrieving context, or generating yields
//!   `500 { "error": string }`.
//!
//! CORS is permissive so the standalone frontend can call the API from another origin.

use crate::chain::{ChainError, ChatApi};
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

const CHAT_PAGE: &str = include_str!("../static/chat.html");
const DEFAULT_LANGUAGE: &str = "en";
const MESSAGE_REQUIRED: &str = "Message is required";

/// Build the HTTP router around a shared answering pipeline.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: ChatApi + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/get", get(chat::<S>).post(chat::<S>))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Request body for `/get`.
///
/// Fields are raw JSON; falsy values such as `0`, `false`, `[]` or `{}` count as missing.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// User question; absent or empty is rejected.
    #[serde(default)]
    msg: Option<Value>,
    /// Answer language passed to the prompt (defaults to `"en"`).
    #[serde(default)]
    language: Option<Value>,
}

/// Success response for `/get`.
#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

async fn index() -> Html<&'static str> {
    Html(CHAT_PAGE)
}

async fn chat<S>(
    State(service): State<Arc<S>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError>
where
    S: ChatApi,
{
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection.body_text(), "Rejected chat request body");
        AppError::Internal(rejection.body_text())
    })?;
    tracing::debug!(?request, "Received chat request");

    let Some(message) = request.msg.and_then(non_empty_text) else {
        return Err(AppError::BadRequest(MESSAGE_REQUIRED.to_string()));
    };
    let language = request
        .language
        .and_then(non_empty_text)
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

    tracing::info!(language = %language, chars = message.len(), "Processing chat input");
    let answer = service.answer(&message, &language).await?;
    tracing::info!(chars = answer.len(), "Chat answer ready");
    Ok(Json(ChatResponse { response: answer }))
}

/// Text of a JSON field, or `None` when the value is empty or falsy.
///
/// Non-empty numbers, booleans, arrays, and objects are passed on in their JSON form.
fn non_empty_text(value: Value) -> Option<String> {
    let empty = match &value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    };
    match value {
        _ if empty => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            Self::BadRequest(error) => (StatusCode::BAD_REQUEST, error),
            Self::Internal(error) => (StatusCode::INTERNAL_SERVER_ERROR, error),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

impl From<ChainError> for AppError {
    fn from(inner: ChainError) -> Self {
        tracing::error!(error = %inner, "Chat request failed");
        Self::Internal(inner.to_string())
    }
}
