//! XML sitemaps for the public site.
//!
//! Two documents are produced: a product x city cross join used for the localized landing
//! pages, and a list of the SEO slugs. Both degrade to their static pages when the upstream
//! collections cannot be fetched.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use log::debug;
use unicode_normalization::UnicodeNormalization;

use crate::config::CatalogueConfig;
use crate::model::{CityRecord, FlexText, ProductRecord, SeoRecord};
use crate::upstream::{fetch_collection, Upstream};

pub const SITEMAP_CONTENT_TYPE: &str = "application/xml; charset=utf-8";
pub const DYNAMIC_SITEMAP_CACHE_CONTROL: &str =
    "public, max-age=3600, s-maxage=3600, stale-while-revalidate=86400";
pub const SEO_SITEMAP_CACHE_CONTROL: &str = "public, max-age=0, s-maxage=3600";

/// Static pages listed ahead of the product x city entries.
pub const CORE_PAGES: &[&str] = &["/", "/about", "/products", "/gallery", "/updates", "/contact"];

const CHANGE_FREQUENCY: &str = "weekly";

#[derive(Clone, Debug, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: DateTime<Utc>,
    pub priority: &'static str,
}

/// Escapes the five XML special characters.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// URL slug: accents removed, lowercase, `&` spelled out, other runs collapsed to `-`.
pub fn slugify(input: &str) -> String {
    let folded: String = input
        .nfkd()
        .filter(|ch| !('\u{0300}'..='\u{036F}').contains(ch))
        .collect::<String>()
        .to_lowercase()
        .replace('&', " and ");

    let mut slug = String::with_capacity(folded.len());
    for ch in folded.chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Parses an upstream `updatedAt` value (RFC 3339 or a bare date).
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
}

fn text(field: &Option<FlexText>) -> String {
    field
        .as_ref()
        .map(|value| value.display().trim().to_string())
        .unwrap_or_default()
}

fn first_present(candidates: [String; 2]) -> Option<String> {
    candidates.into_iter().find(|value| !value.is_empty())
}

/// Path segment used for a product: its slug, else its SEO slug, else its slugified name.
pub fn product_slug(product: &ProductRecord) -> String {
    first_present([text(&product.slug), text(&product.seo_slug)]).unwrap_or_else(|| {
        let label = first_present([text(&product.name), text(&product.title)]).unwrap_or_default();
        slugify(&label)
    })
}

/// Path segment used for a city: its slug, else its code, else its slugified name.
pub fn city_slug(city: &CityRecord) -> String {
    first_present([text(&city.slug), text(&city.code)]).unwrap_or_else(|| slugify(&text(&city.name)))
}

/// Collapses repeated slashes except the pair following the scheme.
pub fn collapse_slashes(url: &str) -> String {
    let (scheme, rest) = match url.find("://") {
        Some(index) => url.split_at(index + 3),
        None => ("", url),
    };
    let mut out = String::with_capacity(url.len());
    out.push_str(scheme);
    for ch in rest.chars() {
        if ch == '/' && out.ends_with('/') && out.len() > scheme.len() {
            continue;
        }
        out.push(ch);
    }
    out
}

fn is_http_location(loc: &str) -> bool {
    let lower = loc.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"));
    matches!(rest, Some(rest) if !rest.is_empty() && !rest.chars().any(char::is_whitespace))
}

/// Serializes entries into a `<urlset>` document.
pub fn render_urlset(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        xml.push_str(&format!(
            "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>\n",
            escape_xml(&entry.loc),
            entry.lastmod.to_rfc3339_opts(SecondsFormat::Millis, true),
            CHANGE_FREQUENCY,
            entry.priority,
        ));
    }
    xml.push_str("</urlset>\n");
    xml
}

/// Limits applied to the product x city sitemap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SitemapLimits {
    pub max_products: usize,
    pub max_cities: usize,
    pub hard_limit: usize,
}

impl From<&CatalogueConfig> for SitemapLimits {
    fn from(config: &CatalogueConfig) -> Self {
        Self {
            max_products: config.sitemap_max_products,
            max_cities: config.sitemap_max_cities,
            hard_limit: config.sitemap_hard_limit,
        }
    }
}

/// Entries for the core pages followed by one entry per product and city pair.
///
/// The total, core pages included, never exceeds `limits.hard_limit`.
pub fn product_city_entries(
    site: &str,
    products: &[ProductRecord],
    cities: &[CityRecord],
    limits: SitemapLimits,
    now: DateTime<Utc>,
) -> Vec<SitemapEntry> {
    let site = site.trim_end_matches('/');
    let mut entries: Vec<SitemapEntry> = CORE_PAGES
        .iter()
        .map(|page| SitemapEntry {
            loc: format!("{site}{page}"),
            lastmod: now,
            priority: "0.6",
        })
        .take(limits.hard_limit)
        .collect();

    let city_slugs: Vec<String> = cities
        .iter()
        .take(limits.max_cities)
        .map(city_slug)
        .filter(|slug| !slug.is_empty())
        .collect();

    for product in products.iter().take(limits.max_products) {
        let product_slug = product_slug(product);
        if product_slug.is_empty() {
            continue;
        }
        let lastmod = product
            .updated_at
            .as_ref()
            .and_then(|value| parse_timestamp(&value.display()))
            .unwrap_or(now);

        for city in &city_slugs {
            if entries.len() >= limits.hard_limit {
                return entries;
            }
            entries.push(SitemapEntry {
                loc: format!("{site}/{product_slug}/{city}/"),
                lastmod,
                priority: "0.8",
            });
        }
    }
    entries
}

/// Home page plus one entry per distinct SEO slug.
pub fn seo_entries(site: &str, records: &[SeoRecord], now: DateTime<Utc>) -> Vec<SitemapEntry> {
    let site = site.trim_end_matches('/');
    let mut seen = HashSet::new();
    let mut entries = vec![SitemapEntry {
        loc: format!("{site}/"),
        lastmod: now,
        priority: "1",
    }];

    for record in records {
        let raw = text(&record.slug);
        let path = raw
            .split('#')
            .next()
            .unwrap_or_default()
            .trim()
            .trim_start_matches('/');
        if path.is_empty() {
            continue;
        }
        let loc = collapse_slashes(&format!("{site}/{path}"));
        if !seen.insert(loc.clone()) {
            continue;
        }
        let lastmod = record
            .updated_at
            .as_ref()
            .and_then(|value| parse_timestamp(&value.display()))
            .unwrap_or(now);
        entries.push(SitemapEntry {
            loc,
            lastmod,
            priority: "0.7",
        });
    }

    entries.retain(|entry| is_http_location(&entry.loc));
    entries
}

/// Builds the product x city sitemap from the upstream collections.
pub async fn product_city_sitemap(
    upstream: &dyn Upstream,
    config: &CatalogueConfig,
    now: DateTime<Utc>,
) -> String {
    let (products, cities) = futures::join!(
        fetch_collection::<ProductRecord>(upstream, "product"),
        fetch_collection::<CityRecord>(upstream, "cities"),
    );
    let entries = product_city_entries(&config.site_url, &products, &cities, config.into(), now);
    debug!("product x city sitemap with {} entries", entries.len());
    render_urlset(&entries)
}

/// Builds the SEO sitemap from the upstream SEO collection.
pub async fn seo_sitemap(
    upstream: &dyn Upstream,
    config: &CatalogueConfig,
    now: DateTime<Utc>,
) -> String {
    let records = fetch_collection::<SeoRecord>(upstream, "seo").await;
    let entries = seo_entries(&config.site_url, &records, now);
    debug!("SEO sitemap with {} entries", entries.len());
    render_urlset(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_records;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn limits(max_products: usize, max_cities: usize, hard_limit: usize) -> SitemapLimits {
        SitemapLimits {
            max_products,
            max_cities,
            hard_limit,
        }
    }

    #[test]
    fn slugify_folds_accents_and_ampersands() {
        assert_eq!(slugify("Crème Brûlée & Co."), "creme-brulee-and-co");
        assert_eq!(slugify("  --Linen 60's--  "), "linen-60-s");
        assert_eq!(slugify("\u{4E2D}\u{6587}"), "");
    }

    #[test]
    fn xml_text_is_escaped() {
        assert_eq!(escape_xml("a&b<c>\"d'"), "a&amp;b&lt;c&gt;&quot;d&apos;");
        let xml = render_urlset(&[SitemapEntry {
            loc: "https://x.com/?a=1&b=2".into(),
            lastmod: now(),
            priority: "0.6",
        }]);
        assert!(xml.contains("<loc>https://x.com/?a=1&amp;b=2</loc>"));
        assert!(xml.contains("<lastmod>2024-05-01T12:00:00.000Z</lastmod>"));
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset"));
    }

    #[test]
    fn timestamps_accept_rfc3339_and_dates() {
        assert_eq!(
            parse_timestamp("2024-03-09T10:00:00+05:30"),
            Some(Utc.with_ymd_and_hms(2024, 3, 9, 4, 30, 0).unwrap())
        );
        assert_eq!(
            parse_timestamp("2024-03-09"),
            Some(Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap())
        );
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn products_cross_join_cities() {
        let products: Vec<ProductRecord> = parse_records(&json!([
            { "slug": "linen", "updatedAt": "2024-03-09T00:00:00Z" },
            { "seoSlug": "twill" },
            { "name": "Oxford & Poplin" },
            { "title": "" }
        ]));
        let cities: Vec<CityRecord> = parse_records(&json!([
            { "slug": "surat" },
            { "code": "BOM" },
            { "name": "New Delhi" },
            {}
        ]));

        let entries = product_city_entries("https://x.com/", &products, &cities, limits(10, 10, 100), now());
        assert_eq!(entries.len(), CORE_PAGES.len() + 3 * 3);
        assert_eq!(entries[0].loc, "https://x.com/");
        assert_eq!(entries[6].loc, "https://x.com/linen/surat/");
        assert_eq!(entries[6].lastmod, Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap());
        assert_eq!(entries[7].loc, "https://x.com/linen/BOM/");
        assert_eq!(entries[8].loc, "https://x.com/linen/new-delhi/");
        assert_eq!(entries[9].lastmod, now());
        assert_eq!(entries[14].loc, "https://x.com/oxford-and-poplin/new-delhi/");
    }

    #[test]
    fn limits_cap_products_cities_and_total() {
        let products: Vec<ProductRecord> =
            parse_records(&json!([{ "slug": "a" }, { "slug": "b" }, { "slug": "c" }]));
        let cities: Vec<CityRecord> =
            parse_records(&json!([{ "slug": "x" }, { "slug": "y" }, { "slug": "z" }]));

        let entries = product_city_entries("https://x.com", &products, &cities, limits(2, 1, 100), now());
        assert_eq!(entries.len(), 6 + 2);

        let entries = product_city_entries("https://x.com", &products, &cities, limits(3, 3, 10), now());
        assert_eq!(entries.len(), 10);
        assert_eq!(entries[9].loc, "https://x.com/b/x/");
    }

    #[test]
    fn slash_collapse_preserves_the_scheme() {
        assert_eq!(collapse_slashes("https://x.com//a///b/"), "https://x.com/a/b/");
        assert_eq!(collapse_slashes("x//y"), "x/y");
    }

    #[test]
    fn seo_entries_are_normalized_and_deduplicated() {
        let records: Vec<SeoRecord> = parse_records(&json!({ "data": [
            { "slug": "/linen-shirts#top", "updatedAt": "2024-02-01" },
            { "slug": "linen-shirts" },
            { "slug": "fabrics//cotton" },
            { "slug": "bad slug" },
            { "slug": "#only-fragment" },
            {}
        ]}));
        let entries = seo_entries("https://x.com/", &records, now());
        let locs: Vec<&str> = entries.iter().map(|entry| entry.loc.as_str()).collect();
        assert_eq!(
            locs,
            vec!["https://x.com/", "https://x.com/linen-shirts", "https://x.com/fabrics/cotton"]
        );
        assert_eq!(entries[0].priority, "1");
        assert_eq!(entries[1].lastmod, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
    }
}
