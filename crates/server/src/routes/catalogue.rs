use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use catalogue_pdf::catalogue::{
    render_catalogue, CatalogueRequest, CATALOGUE_CACHE_CONTROL, MISSING_SLUG_MESSAGE,
    PDF_CONTENT_TYPE,
};

use crate::error::ApiError;
use crate::state::AppState;

/// First value of a possibly comma-separated forwarding header.
fn forwarded(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Scheme and host the client used to reach the site.
///
/// Proxy headers win over `Host`; without any host the configured site URL is used.
pub fn request_origin(headers: &HeaderMap, fallback: &str) -> String {
    let host = forwarded(headers, "x-forwarded-host").or_else(|| forwarded(headers, HOST.as_str()));
    match host {
        Some(host) => {
            let proto = forwarded(headers, "x-forwarded-proto").unwrap_or_else(|| "http".to_string());
            format!("{proto}://{host}")
        }
        None => fallback.trim_end_matches('/').to_string(),
    }
}

/// `GET /catalogue/{slug}`: the product's one-page PDF catalogue.
pub async fn catalogue_pdf(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let origin = request_origin(&headers, &state.config.site_url);
    let request = CatalogueRequest::new(slug, origin);
    let document = render_catalogue(state.upstream.as_ref(), &state.config, &request).await?;
    tracing::info!(
        filename = %document.filename,
        bytes = document.bytes.len(),
        "rendered catalogue"
    );

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (CONTENT_DISPOSITION, document.content_disposition()),
            (CACHE_CONTROL, CATALOGUE_CACHE_CONTROL.to_string()),
        ],
        document.bytes,
    )
        .into_response())
}

/// `GET /catalogue` and `GET /catalogue/`.
pub async fn missing_slug() -> ApiError {
    ApiError::BadRequest(MISSING_SLUG_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn origin_prefers_forwarded_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("internal:8080"));
        assert_eq!(request_origin(&headers, "https://site.com"), "http://internal:8080");

        headers.insert("x-forwarded-host", HeaderValue::from_static("shop.example.com, proxy"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        assert_eq!(request_origin(&headers, "https://site.com"), "https://shop.example.com");
    }

    #[test]
    fn origin_falls_back_to_the_site_url() {
        assert_eq!(
            request_origin(&HeaderMap::new(), "https://site.com/"),
            "https://site.com"
        );
    }
}
