use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CACHE_CONTROL;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

use catalogue_pdf::related::{related_products as select, RelatedQuery};

use crate::state::AppState;

fn failure(status: StatusCode, error: &str) -> Response {
    (
        status,
        [(CACHE_CONTROL, "no-store")],
        Json(json!({ "items": [], "total": 0, "error": error })),
    )
        .into_response()
}

/// `POST /api/related-products` with `{ids, offset, limit}`.
pub async fn related_products(State(state): State<AppState>, body: Bytes) -> Response {
    let query = match serde_json::from_slice::<Value>(&body)
        .map_err(|err| err.to_string())
        .and_then(|value| RelatedQuery::from_json(&value).map_err(|err| err.to_string()))
    {
        Ok(query) => query,
        Err(err) => {
            tracing::debug!("rejecting related-products body: {err}");
            return failure(StatusCode::BAD_REQUEST, "bad-request");
        }
    };

    match select(state.upstream.as_ref(), &query).await {
        Ok(page) => (StatusCode::OK, [(CACHE_CONTROL, "no-store")], Json(page)).into_response(),
        Err(err) => {
            tracing::warn!("related products unavailable: {err}");
            failure(StatusCode::BAD_GATEWAY, "upstream-failed")
        }
    }
}
