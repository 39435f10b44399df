//! The catalogue pipeline: slug in, one-page PDF out.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use futures::future::join_all;
use log::{debug, info, warn};

use crate::builder::DocumentBuilder;
use crate::config::CatalogueConfig;
use crate::elements::{EmbeddedImage, ImageAsset};
use crate::error::CatalogueError;
use crate::layout::{compose, PageContent};
use crate::model::{OfficeRecord, ProductRecord, SeoRecord, ShapedOffice, ShapedProduct};
use crate::resolve::{find_product, first_success_async, image_candidates, logo_candidates};
use crate::text::{catalogue_filename, sanitize};
use crate::upstream::{fetch_collection, Upstream};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const CATALOGUE_CACHE_CONTROL: &str =
    "public, max-age=0, s-maxage=86400, stale-while-revalidate=86400";
pub const MISSING_SLUG_MESSAGE: &str = "Missing slug";
pub const PRODUCT_NOT_FOUND_MESSAGE: &str = "Product not found for slug";

/// Inputs for one catalogue render.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogueRequest {
    pub slug: String,
    /// Scheme and host of the requesting site, used to resolve relative asset URLs.
    pub origin: String,
    /// Date printed in the footer and used in the filename.
    pub date: NaiveDate,
}

impl CatalogueRequest {
    /// A request dated today in local time.
    pub fn new(slug: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            origin: origin.into(),
            date: Local::now().date_naive(),
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }
}

/// A finished catalogue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
}

impl RenderedDocument {
    /// `Content-Disposition` value offering the document as a download.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }
}

async fn fetch_asset(upstream: &dyn Upstream, url: &str) -> Result<ImageAsset, CatalogueError> {
    let bytes = upstream
        .get_bytes(url)
        .await
        .map_err(|err| CatalogueError::AssetUnavailable(err.to_string()))?;
    Ok(ImageAsset::new(url, bytes))
}

async fn load_image(upstream: &dyn Upstream, url: &str) -> Result<EmbeddedImage, CatalogueError> {
    fetch_asset(upstream, url).await?.embed()
}

/// First brand-mark candidate that both downloads and decodes.
async fn load_logo(upstream: &dyn Upstream, candidates: Vec<String>) -> Option<Arc<EmbeddedImage>> {
    match first_success_async(candidates, |url| async move { load_image(upstream, &url).await }).await
    {
        Ok(logo) => Some(Arc::new(logo)),
        Err(errors) => {
            debug!("no usable logo ({} candidates failed)", errors.len());
            None
        }
    }
}

/// Downloads and decodes every gallery image concurrently, keeping candidate order.
async fn load_gallery(upstream: &dyn Upstream, urls: &[String]) -> Vec<Option<Arc<EmbeddedImage>>> {
    let loads = urls.iter().map(|url| async move {
        match load_image(upstream, url).await {
            Ok(image) => Some(Arc::new(image)),
            Err(err) => {
                warn!("skipping gallery image {url}: {err}");
                None
            }
        }
    });
    join_all(loads).await
}

/// Renders the catalogue page for `request.slug`.
///
/// Only a blank slug and an unknown product end the render early. Metadata that cannot be
/// fetched is treated as empty and images that cannot be used leave their panels empty.
pub async fn render_catalogue(
    upstream: &dyn Upstream,
    config: &CatalogueConfig,
    request: &CatalogueRequest,
) -> Result<RenderedDocument, CatalogueError> {
    let slug = request.slug.trim();
    if slug.is_empty() {
        return Err(CatalogueError::BadRequest(MISSING_SLUG_MESSAGE.to_string()));
    }

    let (products, seo, offices) = futures::join!(
        fetch_collection::<ProductRecord>(upstream, "product"),
        fetch_collection::<SeoRecord>(upstream, "seo"),
        fetch_collection::<OfficeRecord>(upstream, "officeinformation"),
    );
    let Some(record) = find_product(&products, &seo, slug) else {
        info!("no product matches slug {slug:?}");
        return Err(CatalogueError::NotFound(
            PRODUCT_NOT_FOUND_MESSAGE.to_string(),
        ));
    };

    let product = ShapedProduct::from_record(record);
    let office = ShapedOffice::from_record(offices.first(), &config.company_name);
    let image_urls = image_candidates(&product.images, &request.origin);
    debug!(
        "rendering {slug:?} with {} gallery candidates",
        image_urls.len()
    );

    let (logo, gallery) = futures::join!(
        load_logo(upstream, logo_candidates(config, &request.origin)),
        load_gallery(upstream, &image_urls),
    );

    let content = PageContent {
        product,
        office,
        logo,
        gallery,
        date: request.date,
    };
    let layout = compose(&content);
    let bytes = DocumentBuilder::new()
        .with_title(sanitize(&content.product.name))
        .render(&layout)?;

    Ok(RenderedDocument {
        bytes,
        filename: catalogue_filename(&content.product.name, slug, request.date),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_quotes_the_filename() {
        let document = RenderedDocument {
            bytes: Vec::new(),
            filename: "Linen-linen-2024-03-09.pdf".into(),
        };
        assert_eq!(
            document.content_disposition(),
            "attachment; filename=\"Linen-linen-2024-03-09.pdf\""
        );
    }

    #[test]
    fn requests_can_be_pinned_to_a_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let request = CatalogueRequest::new("linen", "https://x.com").with_date(date);
        assert_eq!(request.date, date);
        assert_eq!(request.slug, "linen");
    }
}
