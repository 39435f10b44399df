//! Product catalogue PDFs and the content endpoints of the marketing site.
//!
//! The crate is transport-agnostic: every operation takes an [`upstream::Upstream`] and a
//! [`config::CatalogueConfig`] and returns plain values, leaving HTTP to `catalogue_server`.
//!
//! ```no_run
//! # async fn run() -> Result<(), catalogue_pdf::error::CatalogueError> {
//! use catalogue_pdf::catalogue::{render_catalogue, CatalogueRequest};
//! use catalogue_pdf::config::CatalogueConfig;
//! use catalogue_pdf::upstream::HttpUpstream;
//!
//! let config = CatalogueConfig::from_env();
//! let upstream = HttpUpstream::new(config.clone())?;
//! let request = CatalogueRequest::new("majestic-linen", config.site_url.clone());
//! let document = render_catalogue(&upstream, &config, &request).await?;
//! std::fs::write(&document.filename, &document.bytes).ok();
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod catalogue;
pub mod config;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod lead;
pub mod model;
pub mod related;
pub mod resolve;
pub mod sitemap;
pub mod text;
pub mod upstream;

pub use catalogue::{render_catalogue, CatalogueRequest, RenderedDocument};
pub use config::CatalogueConfig;
pub use error::{CatalogueError, UpstreamError};
