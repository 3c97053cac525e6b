//! Axum route handlers for candidate profiles and their target jobs.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{AuthSubject, Candidate};
use crate::errors::AppError;
use crate::models::profile::{CandidateProfile, NewProfile, ProfileUpdate};
use crate::models::target_job::{AnalysisStatus, TargetJobPatch, TargetJobRecord, TargetJobSeed};
use crate::state::AppState;
use crate::store::StoreError;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UserResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub user: CandidateProfile,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub user: CandidateProfile,
    pub target_jobs: Vec<TargetJobRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddTargetJobRequest {
    pub job_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTargetJobStatusRequest {
    pub analysis_status: AnalysisStatus,
    pub skill_gaps: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetJobResponse {
    pub message: &'static str,
    pub target_job: TargetJobRecord,
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/users/sync
///
/// Find-or-create from the session claims. Safe to call on every sign-in.
pub async fn handle_sync_user(
    State(state): State<AppState>,
    auth: AuthSubject,
) -> Result<Json<UserResponse>, AppError> {
    if let Some(user) = state.store.find_profile(&auth.subject).await? {
        return Ok(Json(UserResponse {
            message: Some("User synced successfully"),
            user,
        }));
    }

    let email = auth
        .email
        .clone()
        .ok_or_else(|| AppError::Validation("An email claim is required to create a profile".to_string()))?;

    let new = NewProfile {
        subject: auth.subject.clone(),
        email,
        full_name: auth.name.clone(),
        username: auth.username.clone(),
    };

    let user = match state.store.create_profile(new).await {
        Ok(user) => {
            info!("Created profile for {}", user.subject);
            user
        }
        // Either a concurrent sync created it, or the email belongs to
        // another subject.
        Err(StoreError::Conflict(msg)) => state
            .store
            .find_profile(&auth.subject)
            .await?
            .ok_or(AppError::Conflict(msg))?,
        Err(e) => return Err(e.into()),
    };

    Ok(Json(UserResponse {
        message: Some("User synced successfully"),
        user,
    }))
}

/// GET /api/users/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Candidate(user): Candidate,
) -> Result<Json<ProfileResponse>, AppError> {
    let target_jobs = state.store.list_target_jobs(user.id).await?;
    Ok(Json(ProfileResponse { user, target_jobs }))
}

/// PUT /api/users/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    auth: AuthSubject,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .store
        .update_profile(&auth.subject, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse {
        message: Some("Profile updated successfully"),
        user,
    }))
}

/// POST /api/users/target-jobs
///
/// With a `jobId` the record is keyed by it, so re-adding the same job is a
/// no-op. Without one it is a free-standing entry.
pub async fn handle_add_target_job(
    State(state): State<AppState>,
    Candidate(user): Candidate,
    Json(request): Json<AddTargetJobRequest>,
) -> Result<Json<TargetJobResponse>, AppError> {
    let (Some(title), Some(description)) = (required(request.title), required(request.description))
    else {
        return Err(AppError::Validation(
            "Title and description are required".to_string(),
        ));
    };

    let seed = TargetJobSeed {
        title,
        description,
        company: required(request.company),
    };

    let target_job = match required(request.job_id) {
        Some(job_key) => {
            state
                .store
                .upsert_target_job(user.id, &job_key, seed, &TargetJobPatch::default())
                .await?
        }
        None => state.store.create_target_job(user.id, seed).await?,
    };

    Ok(Json(TargetJobResponse {
        message: "Target job added successfully",
        target_job,
    }))
}

/// PUT /api/users/target-jobs/:id/analysis
///
/// Manual status override. Analysis fields are only written by analysis runs.
pub async fn handle_update_target_job_status(
    State(state): State<AppState>,
    Candidate(user): Candidate,
    Path(id): Path<String>,
    Json(request): Json<UpdateTargetJobStatusRequest>,
) -> Result<Json<TargetJobResponse>, AppError> {
    let not_found = || AppError::NotFound("User or job not found".to_string());
    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;

    let patch = TargetJobPatch {
        analysis_status: Some(request.analysis_status),
        skill_gaps: request.skill_gaps,
        ..Default::default()
    };

    let target_job = state
        .store
        .update_target_job(user.id, id, &patch)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(TargetJobResponse {
        message: "Job analysis updated successfully",
        target_job,
    }))
}
