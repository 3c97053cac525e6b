//! Axum route handlers for the job board.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::analysis::service::{evaluate_job, JobEvaluation};
use crate::auth::{Candidate, CompanyAccount};
use crate::errors::AppError;
use crate::jobs::service::{
    apply_to_job, company_applicants, company_jobs, compute_stats, job_applicants, owned_job,
    ApplicantView, CompanyApplicants, CompanyStats, JobBrief,
};
use crate::models::job::{ApplicantStatus, JobFilter, JobPosting, JobUpdate, NewJob};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobPosting>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub job: JobPosting,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResponse {
    pub message: &'static str,
    pub job_id: Uuid,
    pub job_title: String,
}

#[derive(Debug, Serialize)]
pub struct JobApplicantsResponse {
    pub job: JobBrief,
    pub applicants: Vec<ApplicantView>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct ApplicantStatusRequest {
    pub status: ApplicantStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantStatusResponse {
    pub message: &'static str,
    pub user_id: Uuid,
    pub new_status: ApplicantStatus,
}

fn parse_job_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Job not found".to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Public
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(filter): Query<JobFilter>,
) -> Result<Json<JobListResponse>, AppError> {
    let jobs = state.store.list_jobs(&filter).await?;
    Ok(Json(JobListResponse {
        count: jobs.len(),
        jobs,
    }))
}

/// GET /api/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, AppError> {
    let job = state
        .store
        .record_job_view(parse_job_id(&id)?)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;
    Ok(Json(JobResponse { message: None, job }))
}

// ────────────────────────────────────────────────────────────────────────────
// Candidates
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/jobs/:id/evaluate
pub async fn handle_evaluate_job(
    State(state): State<AppState>,
    Candidate(profile): Candidate,
    Path(id): Path<String>,
) -> Result<Json<JobEvaluation>, AppError> {
    let evaluation = evaluate_job(&state, &profile, parse_job_id(&id)?).await?;
    Ok(Json(evaluation))
}

/// POST /api/jobs/:id/apply
pub async fn handle_apply_to_job(
    State(state): State<AppState>,
    Candidate(profile): Candidate,
    Path(id): Path<String>,
) -> Result<Json<ApplyResponse>, AppError> {
    let job = apply_to_job(&state, &profile, parse_job_id(&id)?).await?;
    Ok(Json(ApplyResponse {
        message: "Application submitted successfully",
        job_id: job.id,
        job_title: job.title,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Companies
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    CompanyAccount(company): CompanyAccount,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<JobResponse>), AppError> {
    let new: NewJob = serde_json::from_value(body)
        .map_err(|e| AppError::Validation(format!("Invalid job: {e}")))?;
    if new.title.trim().is_empty() || new.description.trim().is_empty() {
        return Err(AppError::Validation(
            "Title and description are required".to_string(),
        ));
    }

    let job = state
        .store
        .create_job(JobPosting::new(company.id, Some(company.company_name), new))
        .await?;
    tracing::info!("Company {} created job {}", company.id, job.id);

    Ok((
        StatusCode::CREATED,
        Json(JobResponse {
            message: Some("Job created successfully"),
            job,
        }),
    ))
}

/// PUT /api/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    CompanyAccount(company): CompanyAccount,
    Path(id): Path<String>,
    Json(update): Json<JobUpdate>,
) -> Result<Json<JobResponse>, AppError> {
    let job = owned_job(&state, &company, parse_job_id(&id)?).await?;
    let job = state
        .store
        .update_job(job.id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;
    Ok(Json(JobResponse {
        message: Some("Job updated successfully"),
        job,
    }))
}

/// DELETE /api/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    CompanyAccount(company): CompanyAccount,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let job = owned_job(&state, &company, parse_job_id(&id)?).await?;
    state.store.delete_job(job.id).await?;
    Ok(Json(MessageResponse {
        message: "Job deleted successfully",
    }))
}

/// GET /api/jobs/company/my-jobs
pub async fn handle_company_jobs(
    State(state): State<AppState>,
    CompanyAccount(company): CompanyAccount,
) -> Result<Json<JobListResponse>, AppError> {
    let jobs = company_jobs(&state, &company).await?;
    Ok(Json(JobListResponse {
        count: jobs.len(),
        jobs,
    }))
}

/// GET /api/jobs/company/applicants
pub async fn handle_company_applicants(
    State(state): State<AppState>,
    CompanyAccount(company): CompanyAccount,
) -> Result<Json<CompanyApplicants>, AppError> {
    Ok(Json(company_applicants(&state, &company).await?))
}

/// GET /api/jobs/company/stats
pub async fn handle_company_stats(
    State(state): State<AppState>,
    CompanyAccount(company): CompanyAccount,
) -> Result<Json<CompanyStats>, AppError> {
    let jobs = company_jobs(&state, &company).await?;
    Ok(Json(compute_stats(&jobs, Utc::now())))
}

/// GET /api/jobs/:id/applicants
pub async fn handle_job_applicants(
    State(state): State<AppState>,
    CompanyAccount(company): CompanyAccount,
    Path(id): Path<String>,
) -> Result<Json<JobApplicantsResponse>, AppError> {
    let job = owned_job(&state, &company, parse_job_id(&id)?).await?;
    let applicants = job_applicants(&state, &job).await?;
    Ok(Json(JobApplicantsResponse {
        job: JobBrief::from(&job),
        count: applicants.len(),
        applicants,
    }))
}

/// PUT /api/jobs/:id/applicants/:user_id/status
pub async fn handle_update_applicant_status(
    State(state): State<AppState>,
    CompanyAccount(company): CompanyAccount,
    Path((id, user_id)): Path<(String, String)>,
    Json(request): Json<ApplicantStatusRequest>,
) -> Result<Json<ApplicantStatusResponse>, AppError> {
    let job = owned_job(&state, &company, parse_job_id(&id)?).await?;
    let user_id = Uuid::parse_str(&user_id)
        .map_err(|_| AppError::NotFound("Applicant not found".to_string()))?;

    state
        .store
        .update_applicant_status(job.id, user_id, request.status)
        .await?;

    Ok(Json(ApplicantStatusResponse {
        message: "Applicant status updated successfully",
        user_id,
        new_status: request.status,
    }))
}
