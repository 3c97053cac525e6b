use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::DEFAULT_MODEL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("STORE_BACKEND must be 'postgres' or 'memory', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    /// Required only for the Postgres backend.
    pub database_url: Option<String>,
    pub s3_bucket: String,
    pub aws_region: String,
    /// Custom endpoint (MinIO, localstack). `None` means AWS proper.
    pub s3_endpoint: Option<String>,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub model_call_timeout: Duration,
    pub document_fetch_timeout: Duration,
    pub document_max_redirects: usize,
    pub significant_gap_threshold: u8,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let store_backend: StoreBackend = parse_env("STORE_BACKEND", "postgres")?;
        let database_url = match store_backend {
            StoreBackend::Postgres => Some(require_env("DATABASE_URL")?),
            StoreBackend::Memory => optional_env("DATABASE_URL"),
        };

        let significant_gap_threshold: u8 = parse_env("SIGNIFICANT_GAP_THRESHOLD", "60")?;
        if significant_gap_threshold > 100 {
            bail!("SIGNIFICANT_GAP_THRESHOLD must be between 0 and 100");
        }

        Ok(Config {
            store_backend,
            database_url,
            s3_bucket: require_env("S3_BUCKET")?,
            aws_region: require_env("AWS_REGION")?,
            s3_endpoint: optional_env("S3_ENDPOINT"),
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: optional_env("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            model_call_timeout: Duration::from_secs(parse_env("MODEL_CALL_TIMEOUT_SECS", "30")?),
            document_fetch_timeout: Duration::from_secs(parse_env(
                "DOCUMENT_FETCH_TIMEOUT_SECS",
                "30",
            )?),
            document_max_redirects: parse_env("DOCUMENT_MAX_REDIRECTS", "5")?,
            significant_gap_threshold,
            port: parse_env("PORT", "8080")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            store_backend: StoreBackend::Memory,
            database_url: None,
            s3_bucket: "hireready-test".to_string(),
            aws_region: "us-east-1".to_string(),
            s3_endpoint: None,
            aws_access_key_id: "test".to_string(),
            aws_secret_access_key: "test".to_string(),
            gemini_api_key: "test".to_string(),
            gemini_model: DEFAULT_MODEL.to_string(),
            model_call_timeout: Duration::from_secs(30),
            document_fetch_timeout: Duration::from_secs(30),
            document_max_redirects: 5,
            significant_gap_threshold: 60,
            port: 0,
            rust_log: "info".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("{key} has invalid value '{raw}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parses_case_insensitively() {
        assert_eq!("Memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("postgres".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert!("mongo".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn test_parse_env_falls_back_to_default() {
        let value: u64 = parse_env("HIREREADY_TEST_UNSET_VARIABLE", "30").unwrap();
        assert_eq!(value, 30);
    }

    #[test]
    fn test_parse_env_rejects_garbage_default() {
        let result: Result<u16> = parse_env("HIREREADY_TEST_UNSET_VARIABLE_2", "eighty");
        assert!(result.is_err());
    }
}
