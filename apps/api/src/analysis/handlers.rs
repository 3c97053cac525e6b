//! Axum route handlers for the Analysis API.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analysis::service::{analyze_resume, analyze_target_job};
use crate::auth::Candidate;
use crate::errors::AppError;
use crate::models::profile::ResumeAnalysis;
use crate::models::target_job::{GapAnalysis, TargetJobRecord};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ResumeAnalysisResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub analysis: ResumeAnalysis,
}

/// The seven analysis fields plus when they were produced.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredGapAnalysis {
    #[serde(flatten)]
    pub analysis: GapAnalysis,
    pub analyzed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct GapAnalysisResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub analysis: StoredGapAnalysis,
}

fn stored_analysis(record: &TargetJobRecord) -> Result<StoredGapAnalysis, AppError> {
    let analysis = record
        .completed_analysis()
        .ok_or(AppError::AnalysisNotReady(record.analysis_status))?;
    Ok(StoredGapAnalysis {
        analysis,
        analyzed_at: record.analyzed_at,
    })
}

fn parse_target_job_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Target job not found".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/analysis/resume
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    Candidate(profile): Candidate,
) -> Result<Json<ResumeAnalysisResponse>, AppError> {
    let analysis = analyze_resume(&state, &profile).await?;
    Ok(Json(ResumeAnalysisResponse {
        message: Some("Resume analysis completed successfully"),
        analysis,
    }))
}

/// GET /api/analysis/resume
pub async fn handle_get_resume_analysis(
    Candidate(profile): Candidate,
) -> Result<Json<ResumeAnalysisResponse>, AppError> {
    let analysis = profile.resume_analysis.ok_or_else(|| {
        AppError::NotFound("No resume analysis found. Please run analysis first.".to_string())
    })?;
    Ok(Json(ResumeAnalysisResponse {
        message: None,
        analysis,
    }))
}

/// POST /api/analysis/jobs/:target_job_id
///
/// Runs a fresh gap analysis. On failure the target job is left Failed and
/// the error is returned; a later call may succeed.
pub async fn handle_analyze_target_job(
    State(state): State<AppState>,
    Candidate(profile): Candidate,
    Path(target_job_id): Path<String>,
) -> Result<Json<GapAnalysisResponse>, AppError> {
    let id = parse_target_job_id(&target_job_id)?;
    let record = analyze_target_job(&state, &profile, id).await?;
    Ok(Json(GapAnalysisResponse {
        message: Some("Job analysis completed successfully"),
        analysis: stored_analysis(&record)?,
    }))
}

/// GET /api/analysis/jobs/:target_job_id
pub async fn handle_get_target_job_analysis(
    State(state): State<AppState>,
    Candidate(profile): Candidate,
    Path(target_job_id): Path<String>,
) -> Result<Json<GapAnalysisResponse>, AppError> {
    let id = parse_target_job_id(&target_job_id)?;
    let record = state
        .store
        .find_target_job(profile.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Target job not found".to_string()))?;
    Ok(Json(GapAnalysisResponse {
        message: None,
        analysis: stored_analysis(&record)?,
    }))
}
