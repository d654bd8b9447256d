use crate::api::{ApiError, state::AppState};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{
        HeaderMap, HeaderName, HeaderValue,
        header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use echochat_core::{ChatRequest, REQUEST_ID_HEADER};
use futures::StreamExt;
use std::convert::Infallible;

// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request_id = request_id_from(&headers);

    let request = ChatRequest::from_json(&body)
        .and_then(|request| request.validate(state.max_message_chars).map(|_| request))
        .map_err(|e| {
            tracing::warn!(request_id, error = %e, "Rejected chat request");
            ApiError(e)
        })?;

    tracing::info!(
        request_id,
        chars = request.message.chars().count(),
        delay_ms = state.emitter.delay().as_millis() as u64,
        "Streaming echo reply"
    );

    // The body owns the stream: a dropped connection drops the emitter.
    let stream = state
        .emitter
        .emit(request.message, state.shutdown.child_token())
        .map(Ok::<_, Infallible>);

    let mut response = Body::from_stream(stream).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    response_headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response_headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response_headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }

    Ok(response)
}

fn request_id_from(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
