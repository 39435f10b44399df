//! Lookup and candidate-selection helpers shared by the pipeline stages.

use std::future::Future;

use url::Url;

use crate::config::{CatalogueConfig, LOGO_ASSET_PATHS};
use crate::model::{ProductRecord, SeoRecord};

/// Maximum number of gallery images per page.
pub const MAX_GALLERY_IMAGES: usize = 3;

/// Runs `attempt` over `candidates` in order and returns the first success.
///
/// When every candidate fails the errors are returned in candidate order; an empty error list
/// means there was nothing to try.
pub fn first_success<I, T, E, F>(candidates: I, mut attempt: F) -> Result<T, Vec<E>>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Result<T, E>,
{
    let mut errors = Vec::new();
    for candidate in candidates {
        match attempt(candidate) {
            Ok(value) => return Ok(value),
            Err(err) => errors.push(err),
        }
    }
    Err(errors)
}

/// Asynchronous form of [`first_success`]. Candidates are tried one after another.
pub async fn first_success_async<I, T, E, F, Fut>(candidates: I, mut attempt: F) -> Result<T, Vec<E>>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut errors = Vec::new();
    for candidate in candidates {
        match attempt(candidate).await {
            Ok(value) => return Ok(value),
            Err(err) => errors.push(err),
        }
    }
    Err(errors)
}

/// Slug comparison key: trimmed and lowercased.
pub fn normalize_slug(slug: &str) -> String {
    slug.trim().to_lowercase()
}

/// Finds the product addressed by `slug`.
///
/// A product's own slug wins. Otherwise the SEO table is consulted: the first SEO row with a
/// matching slug names a product id, which is compared against each product's `_id`. Empty ids
/// never match.
pub fn find_product<'a>(
    products: &'a [ProductRecord],
    seo: &[SeoRecord],
    slug: &str,
) -> Option<&'a ProductRecord> {
    let wanted = normalize_slug(slug);
    if wanted.is_empty() {
        return None;
    }

    if let Some(product) = products
        .iter()
        .find(|product| normalize_slug(&product.slug_text()) == wanted)
    {
        return Some(product);
    }

    let row = seo.iter().find(|row| {
        let row_slug = row.slug.as_ref().map(|slug| slug.display()).unwrap_or_default();
        normalize_slug(&row_slug) == wanted
    })?;
    let product_id = row.product.as_ref()?.canonical();
    if product_id.is_empty() {
        return None;
    }
    products
        .iter()
        .find(|product| product.canonical_id() == product_id)
}

/// Resolves `raw` against `origin` when it is not already absolute.
pub fn absolutize(raw: &str, origin: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(raw) {
        return Some(url.to_string());
    }
    let base = Url::parse(origin).ok()?;
    base.join(raw).ok().map(|url| url.to_string())
}

/// Asks the image CDN for a JPEG transcode of an uploaded asset.
pub fn prefer_jpeg_transcode(url: &str) -> String {
    if url.contains("res.cloudinary.com") && url.contains("/upload/") {
        url.replacen("/upload/", "/upload/f_jpg/", 1)
    } else {
        url.to_string()
    }
}

/// True for URLs whose path ends in `.webp`, which the page cannot embed.
pub fn is_webp(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.to_ascii_lowercase().ends_with(".webp")
}

/// Turns the product's raw image references into at most three fetchable URLs.
///
/// Order is preserved. Relative references are resolved against `origin`, CDN uploads are
/// rewritten to JPEG, and WebP images are skipped.
pub fn image_candidates(raw_urls: &[String], origin: &str) -> Vec<String> {
    raw_urls
        .iter()
        .filter_map(|raw| absolutize(raw, origin))
        .map(|url| prefer_jpeg_transcode(&url))
        .filter(|url| !is_webp(url))
        .take(MAX_GALLERY_IMAGES)
        .collect()
}

/// Brand-mark URLs in the order they should be tried.
pub fn logo_candidates(config: &CatalogueConfig, origin: &str) -> Vec<String> {
    let origin = origin.trim_end_matches('/');
    let configured = config
        .logo_url
        .as_deref()
        .and_then(|logo| absolutize(logo, origin));
    configured
        .into_iter()
        .chain(
            LOGO_ASSET_PATHS
                .iter()
                .map(|path| format!("{origin}{path}")),
        )
        .collect()
}
