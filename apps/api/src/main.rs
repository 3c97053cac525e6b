mod analysis;
mod auth;
mod companies;
mod config;
mod db;
mod documents;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;
mod users;
mod webhooks;

#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::orchestrator::{AnalysisSettings, Analyzer};
use crate::config::{Config, StoreBackend};
use crate::db::create_pool;
use crate::documents::PdfExtractor;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first; a missing required variable aborts startup
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HireReady API v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres store")?;
            Arc::new(PgStore::new(create_pool(database_url).await?))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized (bucket: {})", config.s3_bucket);

    let generator = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.model_call_timeout,
    )?;
    info!("Gemini client initialized (model: {})", config.gemini_model);

    let extractor = PdfExtractor::new(
        s3.clone(),
        config.document_fetch_timeout,
        config.document_max_redirects,
    )?;

    let analyzer = Analyzer::new(
        Arc::new(generator),
        Arc::new(extractor),
        AnalysisSettings {
            model_call_timeout: config.model_call_timeout,
            significant_gap_threshold: config.significant_gap_threshold,
        },
    );
    info!(
        "Significant gap threshold: {}%, model deadline: {}s",
        config.significant_gap_threshold,
        config.model_call_timeout.as_secs()
    );

    let state = AppState {
        store,
        analyzer,
        s3,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client for AWS, or for MinIO when `S3_ENDPOINT` is set.
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "hireready-static",
    );

    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.aws_region.clone()))
        .credentials_provider(credentials);
    if let Some(endpoint) = &config.s3_endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    let shared = loader.load().await;

    let s3_config = aws_sdk_s3::config::Builder::from(&shared)
        .force_path_style(config.s3_endpoint.is_some())
        .build();
    aws_sdk_s3::Client::from_conf(s3_config)
}
