//! HTTP surface of the catalogue service.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

pub use config::ConfigOverrides;
pub use state::AppState;

/// Builds the application router with tracing and permissive CORS.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        // Catalogue
        .route("/catalogue", get(routes::catalogue::missing_slug))
        .route("/catalogue/", get(routes::catalogue::missing_slug))
        .route("/catalogue/{slug}", get(routes::catalogue::catalogue_pdf))
        // Sitemaps
        .route("/sitemap.xml", get(routes::sitemap::seo_sitemap))
        .route(
            "/sitemap-dynamic.xml",
            get(routes::sitemap::product_city_sitemap),
        )
        // Form and widget endpoints
        .route(
            "/api/related-products",
            axum::routing::post(routes::related::related_products),
        )
        .route(
            "/api/lead",
            axum::routing::post(routes::lead::submit).get(routes::lead::method_not_allowed),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Installs the global tracing subscriber; `log` records from the library are captured too.
///
/// The filter comes from `RUST_LOG` and defaults to `info`.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
