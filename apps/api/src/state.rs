use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;

use crate::analysis::orchestrator::Analyzer;
use crate::config::Config;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Postgres in production, in-memory for tests and `STORE_BACKEND=memory`.
    pub store: Arc<dyn Store>,
    pub analyzer: Analyzer,
    pub s3: S3Client,
    pub config: Config,
}
