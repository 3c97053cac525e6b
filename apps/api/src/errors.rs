use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::orchestrator::AnalysisError;
use crate::llm_client::LlmError;
use crate::models::target_job::AnalysisStatus;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller must upload a resume before this operation makes sense.
    #[error("Resume required")]
    ResumeRequired,

    /// The target job exists but has no completed analysis yet.
    #[error("Analysis not ready (status {0:?})")]
    AnalysisNotReady(AnalysisStatus),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Analysis service unavailable: {0}")]
    AnalysisUnavailable(String),

    #[error("Analysis timed out: {0}")]
    AnalysisTimeout(String),

    #[error("Analysis rejected: {0}")]
    AnalysisRejected(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("S3 error: {0}")]
    S3(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => AppError::NotFound(format!("{what} not found")),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Database(e) => AppError::Database(e),
            StoreError::Corrupt(msg) => AppError::Internal(anyhow::anyhow!("corrupt record: {msg}")),
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::Timeout { .. } => AppError::AnalysisTimeout(e.to_string()),
            AnalysisError::Parse(_) => AppError::AnalysisRejected(e.to_string()),
            AnalysisError::Model(LlmError::Blocked { .. }) => {
                AppError::AnalysisRejected(e.to_string())
            }
            AnalysisError::Model(_) => AppError::AnalysisUnavailable(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details = None;
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::ResumeRequired => (
                StatusCode::BAD_REQUEST,
                "RESUME_REQUIRED",
                "Please upload your resume first before applying.".to_string(),
            ),
            AppError::AnalysisNotReady(status) => {
                details = Some(json!({ "status": status }));
                (
                    StatusCode::NOT_FOUND,
                    "ANALYSIS_NOT_READY",
                    "No analysis found for this job. Please run analysis first.".to_string(),
                )
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Access denied".to_string(),
            ),
            AppError::AnalysisUnavailable(msg) => {
                tracing::error!("Analysis unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "ANALYSIS_UNAVAILABLE",
                    msg.clone(),
                )
            }
            AppError::AnalysisTimeout(msg) => {
                tracing::error!("Analysis timed out: {msg}");
                (StatusCode::GATEWAY_TIMEOUT, "ANALYSIS_TIMEOUT", msg.clone())
            }
            AppError::AnalysisRejected(msg) => {
                tracing::error!("Analysis rejected: {msg}");
                (StatusCode::BAD_GATEWAY, "ANALYSIS_REJECTED", msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::S3(msg) => {
                tracing::error!("S3 error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "S3_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let (Some(details), Some(obj)) = (details, error.as_object_mut()) {
            obj.insert("details".to_string(), details);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::parser::ParseError;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_precondition_transient_and_missing_are_distinguishable() {
        let (status, body) = render(AppError::ResumeRequired).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "RESUME_REQUIRED");

        let (status, body) = render(AnalysisError::Model(LlmError::EmptyContent).into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "ANALYSIS_UNAVAILABLE");

        let (status, body) = render(AppError::NotFound("Job not found".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_analysis_error_mapping() {
        let (status, _) = render(AnalysisError::Timeout { secs: 30 }.into()).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);

        let (status, body) = render(AnalysisError::Parse(ParseError::Empty).into()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "ANALYSIS_REJECTED");
    }

    #[tokio::test]
    async fn test_not_ready_carries_status() {
        let (status, body) = render(AppError::AnalysisNotReady(AnalysisStatus::Failed)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["details"]["status"], "Failed");
    }

    #[tokio::test]
    async fn test_store_conflict_maps_to_409() {
        let (status, body) =
            render(StoreError::Conflict("You have already applied to this job".to_string()).into())
                .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["message"], "You have already applied to this job");
    }

    #[tokio::test]
    async fn test_database_details_are_not_leaked() {
        let (status, body) = render(AppError::Database(sqlx::Error::RowNotFound)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "A database error occurred");
    }
}
