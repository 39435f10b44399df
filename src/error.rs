//! Error types shared by the catalogue pipeline and the content endpoints.

use thiserror::Error;

/// Failures surfaced by the catalogue pipeline.
///
/// Only [`CatalogueError::BadRequest`] and [`CatalogueError::NotFound`] are expected to reach a
/// caller in practice. Upstream and asset failures are logged and replaced with defaults where
/// they happen; the variants exist so those call sites have something typed to log.
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] UpstreamError),

    #[error("asset unavailable: {0}")]
    AssetUnavailable(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// Transport-level failures talking to the upstream content API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}
