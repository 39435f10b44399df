use std::time::Duration;

use clap::Args;

use catalogue_pdf::CatalogueConfig;

/// Command-line overrides applied on top of the environment configuration.
#[derive(Args, Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Upstream content API root.
    #[arg(long, global = true)]
    pub api_base_url: Option<String>,

    /// Public site root used by sitemaps and as the fallback origin.
    #[arg(long, global = true)]
    pub site_url: Option<String>,

    /// Brand mark URL, absolute or relative to the request origin.
    #[arg(long, global = true)]
    pub logo_url: Option<String>,

    /// Deadline for each upstream request, in seconds.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    pub fn apply(self, mut config: CatalogueConfig) -> CatalogueConfig {
        if let Some(url) = self.api_base_url {
            config = config.with_api_base_url(url);
        }
        if let Some(url) = self.site_url {
            config = config.with_site_url(url);
        }
        if let Some(url) = self.logo_url {
            config = config.with_logo_url(Some(url));
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_upstream_timeout(Duration::from_secs(secs));
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Flags {
        #[command(flatten)]
        overrides: ConfigOverrides,
    }

    fn parse(args: &[&str]) -> ConfigOverrides {
        Flags::try_parse_from(std::iter::once("catalogue-server").chain(args.iter().copied()))
            .expect("valid flags")
            .overrides
    }

    #[test]
    fn flags_override_the_environment_values() {
        let overrides = parse(&[
            "--api-base-url",
            "https://api.example.com/landing/",
            "--site-url",
            "https://shop.example.com/",
            "--logo-url",
            "/brand.png",
            "--timeout-secs",
            "3",
        ]);
        let config = overrides.apply(CatalogueConfig::default());

        assert_eq!(config.api_base_url, "https://api.example.com/landing");
        assert_eq!(config.site_url, "https://shop.example.com");
        assert_eq!(config.logo_url.as_deref(), Some("/brand.png"));
        assert_eq!(config.upstream_timeout, Duration::from_secs(3));
    }

    #[test]
    fn absent_flags_keep_the_configuration() {
        let base = CatalogueConfig::default().with_site_url("https://shop.example.com");
        assert_eq!(parse(&[]).apply(base.clone()), base);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let flags = ["catalogue-server", "--timeout-secs", "0"];
        assert!(Flags::try_parse_from(flags).is_err());
    }
}
