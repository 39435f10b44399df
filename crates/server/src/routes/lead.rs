use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{ALLOW, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use catalogue_pdf::lead::{parse_lead_body, submit_lead, LEAD_METHOD_NOT_ALLOWED_MESSAGE};

use crate::state::AppState;

/// `POST /api/lead`: map the contact form onto the upstream schema and forward it.
pub async fn submit(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let received = match parse_lead_body(content_type, &body) {
        Ok(received) => received,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "error": err.to_string() })),
            )
                .into_response()
        }
    };

    match submit_lead(state.upstream.as_ref(), received).await {
        Ok(outcome) => {
            let (status, body) = outcome.response();
            let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
            (status, Json(body)).into_response()
        }
        Err(err) => {
            tracing::warn!("lead forwarding failed: {err}");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "ok": false, "error": "Upstream error" })),
            )
                .into_response()
        }
    }
}

/// `GET /api/lead`.
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(ALLOW, "POST")],
        Json(json!({ "ok": false, "error": LEAD_METHOD_NOT_ALLOWED_MESSAGE })),
    )
        .into_response()
}
