//! Runtime configuration for the catalogue service.
//!
//! Values come from environment variables with the defaults listed on each field. The
//! `with_*` methods override single values on top of that, as the server's command-line flags
//! do.

use std::env;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "https://test.amrita-fashions.com/landing";
const DEFAULT_SITE_URL: &str = "https://astro-landing-page-rho.vercel.app";
const DEFAULT_COMPANY_NAME: &str = "Amrita Global Enterprises";
const DEFAULT_API_KEY_HEADER: &str = "x-api-key";
const DEFAULT_ADMIN_EMAIL_HEADER: &str = "x-admin-email";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 12;
const DEFAULT_SITEMAP_MAX_PRODUCTS: usize = 200;
const DEFAULT_SITEMAP_MAX_CITIES: usize = 200;
const DEFAULT_SITEMAP_HARD_LIMIT: usize = 48_000;

/// Conventional brand-mark locations on the site origin, tried after the configured logo URL.
pub const LOGO_ASSET_PATHS: &[&str] = &[
    "/images/brand/age.jpg",
    "/images/brand/age.png",
    "/amrita.png",
];

#[derive(Clone, Debug, PartialEq)]
pub struct CatalogueConfig {
    /// Upstream content API root without a trailing slash (`CATALOGUE_API_BASE_URL`).
    pub api_base_url: String,
    /// Static API key forwarded upstream (`CATALOGUE_API_KEY`).
    pub api_key: Option<String>,
    /// Header name carrying the API key (`CATALOGUE_API_KEY_HEADER`, default `x-api-key`).
    pub api_key_header: String,
    /// Admin email forwarded upstream (`CATALOGUE_ADMIN_EMAIL`).
    pub admin_email: Option<String>,
    /// Header name carrying the admin email (`CATALOGUE_ADMIN_EMAIL_HEADER`).
    pub admin_email_header: String,
    /// Explicit brand mark, absolute or origin-relative (`CATALOGUE_LOGO_URL`).
    pub logo_url: Option<String>,
    /// Public site root used by sitemaps and as the fallback origin (`CATALOGUE_SITE_URL`).
    pub site_url: String,
    /// Company name printed when the office record has none (`CATALOGUE_COMPANY_NAME`).
    pub company_name: String,
    /// Deadline for each upstream request (`CATALOGUE_UPSTREAM_TIMEOUT_SECS`).
    pub upstream_timeout: Duration,
    pub sitemap_max_products: usize,
    pub sitemap_max_cities: usize,
    pub sitemap_hard_limit: usize,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            admin_email: None,
            admin_email_header: DEFAULT_ADMIN_EMAIL_HEADER.to_string(),
            logo_url: None,
            site_url: DEFAULT_SITE_URL.to_string(),
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            sitemap_max_products: DEFAULT_SITEMAP_MAX_PRODUCTS,
            sitemap_max_cities: DEFAULT_SITEMAP_MAX_CITIES,
            sitemap_hard_limit: DEFAULT_SITEMAP_HARD_LIMIT,
        }
    }
}

impl CatalogueConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset. Numeric values that fail to parse, or are zero, fall back to
    /// the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            api_base_url: get("CATALOGUE_API_BASE_URL")
                .map(|url| trim_trailing_slashes(&url))
                .unwrap_or(defaults.api_base_url),
            api_key: get("CATALOGUE_API_KEY"),
            api_key_header: get("CATALOGUE_API_KEY_HEADER").unwrap_or(defaults.api_key_header),
            admin_email: get("CATALOGUE_ADMIN_EMAIL"),
            admin_email_header: get("CATALOGUE_ADMIN_EMAIL_HEADER")
                .unwrap_or(defaults.admin_email_header),
            logo_url: get("CATALOGUE_LOGO_URL"),
            site_url: get("CATALOGUE_SITE_URL")
                .map(|url| trim_trailing_slashes(&url))
                .unwrap_or(defaults.site_url),
            company_name: get("CATALOGUE_COMPANY_NAME").unwrap_or(defaults.company_name),
            upstream_timeout: positive(get("CATALOGUE_UPSTREAM_TIMEOUT_SECS"))
                .map(Duration::from_secs)
                .unwrap_or(defaults.upstream_timeout),
            sitemap_max_products: positive(get("SITEMAP_MAX_PRODUCTS"))
                .map(|n| n as usize)
                .unwrap_or(defaults.sitemap_max_products),
            sitemap_max_cities: positive(get("SITEMAP_MAX_CITIES"))
                .map(|n| n as usize)
                .unwrap_or(defaults.sitemap_max_cities),
            sitemap_hard_limit: positive(get("SITEMAP_HARD_LIMIT"))
                .map(|n| n as usize)
                .unwrap_or(defaults.sitemap_hard_limit),
        }
    }

    /// Sets the upstream API root and returns the updated configuration.
    pub fn with_api_base_url(mut self, url: impl AsRef<str>) -> Self {
        self.api_base_url = trim_trailing_slashes(url.as_ref());
        self
    }

    /// Sets the public site root and returns the updated configuration.
    pub fn with_site_url(mut self, url: impl AsRef<str>) -> Self {
        self.site_url = trim_trailing_slashes(url.as_ref());
        self
    }

    /// Sets the explicit logo URL and returns the updated configuration.
    pub fn with_logo_url(mut self, url: impl Into<Option<String>>) -> Self {
        self.logo_url = url.into();
        self
    }

    /// Sets the upstream request deadline and returns the updated configuration.
    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    /// Static headers forwarded with every upstream JSON request.
    pub fn auth_headers(&self) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if let Some(key) = &self.api_key {
            headers.push((self.api_key_header.clone(), key.clone()));
        }
        if let Some(email) = &self.admin_email {
            headers.push((self.admin_email_header.clone(), email.clone()));
        }
        headers
    }

    /// Absolute URL of an upstream collection such as `product` or `seo`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }
}

fn trim_trailing_slashes(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn positive(value: Option<String>) -> Option<u64> {
    value
        .and_then(|raw| raw.parse::<u64>().ok())
        .filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> CatalogueConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CatalogueConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(config_from(&[]), CatalogueConfig::default());
    }

    #[test]
    fn base_urls_lose_trailing_slashes() {
        let config = config_from(&[
            ("CATALOGUE_API_BASE_URL", "https://api.example.com/landing///"),
            ("CATALOGUE_SITE_URL", "https://shop.example.com/"),
        ]);
        assert_eq!(config.api_base_url, "https://api.example.com/landing");
        assert_eq!(config.site_url, "https://shop.example.com");
        assert_eq!(
            config.endpoint("/product"),
            "https://api.example.com/landing/product"
        );
    }

    #[test]
    fn auth_headers_are_omitted_when_unset() {
        assert!(config_from(&[("CATALOGUE_API_KEY", "   ")])
            .auth_headers()
            .is_empty());

        let config = config_from(&[
            ("CATALOGUE_API_KEY", "secret"),
            ("CATALOGUE_ADMIN_EMAIL", "admin@example.com"),
            ("CATALOGUE_ADMIN_EMAIL_HEADER", "x-owner"),
        ]);
        assert_eq!(
            config.auth_headers(),
            vec![
                ("x-api-key".to_string(), "secret".to_string()),
                ("x-owner".to_string(), "admin@example.com".to_string()),
            ]
        );
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let config = config_from(&[
            ("SITEMAP_MAX_PRODUCTS", "0"),
            ("SITEMAP_MAX_CITIES", "many"),
            ("SITEMAP_HARD_LIMIT", "10"),
            ("CATALOGUE_UPSTREAM_TIMEOUT_SECS", "3"),
        ]);
        assert_eq!(config.sitemap_max_products, 200);
        assert_eq!(config.sitemap_max_cities, 200);
        assert_eq!(config.sitemap_hard_limit, 10);
        assert_eq!(config.upstream_timeout, Duration::from_secs(3));
    }
}
