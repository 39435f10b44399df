use axum::extract::State;
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::IntoResponse;
use chrono::Utc;

use catalogue_pdf::sitemap::{
    self, DYNAMIC_SITEMAP_CACHE_CONTROL, SEO_SITEMAP_CACHE_CONTROL, SITEMAP_CONTENT_TYPE,
};

use crate::state::AppState;

/// `GET /sitemap.xml`: home page plus the SEO slugs.
pub async fn seo_sitemap(State(state): State<AppState>) -> impl IntoResponse {
    let xml = sitemap::seo_sitemap(state.upstream.as_ref(), &state.config, Utc::now()).await;
    (
        [
            (CONTENT_TYPE, SITEMAP_CONTENT_TYPE),
            (CACHE_CONTROL, SEO_SITEMAP_CACHE_CONTROL),
        ],
        xml,
    )
}

/// `GET /sitemap-dynamic.xml`: core pages plus every product x city landing page.
pub async fn product_city_sitemap(State(state): State<AppState>) -> impl IntoResponse {
    let xml =
        sitemap::product_city_sitemap(state.upstream.as_ref(), &state.config, Utc::now()).await;
    (
        [
            (CONTENT_TYPE, SITEMAP_CONTENT_TYPE),
            (CACHE_CONTROL, DYNAMIC_SITEMAP_CACHE_CONTROL),
        ],
        xml,
    )
}
