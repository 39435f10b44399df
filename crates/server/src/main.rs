use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use eyre::WrapErr;

use catalogue_pdf::catalogue::{render_catalogue, CatalogueRequest};
use catalogue_pdf::upstream::HttpUpstream;
use catalogue_pdf::CatalogueConfig;
use catalogue_server::{init_tracing, router, AppState, ConfigOverrides};

/// Serves product catalogue PDFs and the site's content endpoints.
///
/// Upstream access is configured through the `CATALOGUE_*` and `SITEMAP_*` environment
/// variables; the global flags override the most common of them.
#[derive(Parser)]
#[command(author, version, about = "Product catalogue PDF service")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(flatten)]
    overrides: ConfigOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "CATALOGUE_ADDR", default_value = "0.0.0.0:8080")]
        addr: SocketAddr,
    },

    /// Render one catalogue to a PDF file.
    Render {
        /// Product slug to render.
        slug: String,

        /// Origin used to resolve relative image and logo URLs. Defaults to the site URL.
        #[arg(long)]
        origin: Option<String>,

        /// Output path. Defaults to the derived download filename.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = cli.overrides.apply(CatalogueConfig::from_env());
    let upstream = HttpUpstream::new(config.clone()).wrap_err("failed to build HTTP client")?;

    match cli.command {
        Commands::Serve { addr } => {
            let state = AppState::new(config, Arc::new(upstream));
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .wrap_err_with(|| format!("failed to bind {addr}"))?;
            tracing::info!(%addr, "listening");
            axum::serve(listener, router(state))
                .with_graceful_shutdown(shutdown_signal())
                .await
                .wrap_err("server error")?;
        }
        Commands::Render { slug, origin, out } => {
            let origin = origin.unwrap_or_else(|| config.site_url.clone());
            let request = CatalogueRequest::new(slug, origin);
            let document = render_catalogue(&upstream, &config, &request)
                .await
                .wrap_err_with(|| format!("failed to render catalogue for {:?}", request.slug))?;
            let path = out.unwrap_or_else(|| PathBuf::from(&document.filename));
            tokio::fs::write(&path, &document.bytes)
                .await
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = document.bytes.len(), "catalogue written");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for shutdown signal: {err}");
    }
}
