//! Drives analysis runs against the store.
//!
//! The orchestrator never persists anything; these functions decide what a
//! run's outcome means for the stored records. A failed gap analysis marks
//! its target job Failed and leaves every other field as it was.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::orchestrator::{AnalysisError, GapAssessment};
use crate::analysis::prompts::JobContext;
use crate::errors::AppError;
use crate::models::job::JobPosting;
use crate::models::profile::{CandidateProfile, ResumeAnalysis};
use crate::models::target_job::{AnalysisStatus, TargetJobPatch, TargetJobRecord, TargetJobSeed};
use crate::state::AppState;

/// Result of evaluating a candidate against a posting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobEvaluation {
    #[serde(flatten)]
    pub assessment: GapAssessment,
    pub job_id: Uuid,
    pub job_title: String,
    pub company_name: Option<String>,
    pub target_job_id: Uuid,
}

pub fn seed_from_posting(job: &JobPosting) -> TargetJobSeed {
    TargetJobSeed {
        title: job.title.clone(),
        description: job.description.clone(),
        company: job.company_name.clone(),
    }
}

/// Reviews the candidate's resume and replaces any stored review.
pub async fn analyze_resume(
    state: &AppState,
    profile: &CandidateProfile,
) -> Result<ResumeAnalysis, AppError> {
    let analysis = state.analyzer.run_resume_analysis(profile).await?;
    state
        .store
        .save_resume_analysis(&profile.subject, &analysis)
        .await?;
    info!("Stored resume analysis for {}", profile.subject);
    Ok(analysis)
}

/// Runs a gap analysis for one of the candidate's target jobs.
///
/// When the record's job key names a posting that still exists, the full
/// posting (requirements, level) is analysed; otherwise the record's own
/// title, description and company are used.
pub async fn analyze_target_job(
    state: &AppState,
    profile: &CandidateProfile,
    target_job_id: Uuid,
) -> Result<TargetJobRecord, AppError> {
    let record = state
        .store
        .find_target_job(profile.id, target_job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Target job not found".to_string()))?;

    let job = resolve_job_context(state, &record).await?;

    match state
        .analyzer
        .run_gap_analysis(profile, &job, profile.resume_analysis.as_ref())
        .await
    {
        Ok(assessment) => {
            let patch = TargetJobPatch::completed(assessment.analysis, Utc::now());
            state
                .store
                .update_target_job(profile.id, record.id, &patch)
                .await?
                .ok_or_else(|| AppError::NotFound("Target job not found".to_string()))
        }
        Err(e) => {
            mark_failed(state, profile, record.id, &e).await;
            Err(e.into())
        }
    }
}

/// Evaluates the candidate against a posting they have not yet applied to,
/// and records the result as a Completed target job keyed by the posting.
pub async fn evaluate_job(
    state: &AppState,
    profile: &CandidateProfile,
    job_id: Uuid,
) -> Result<JobEvaluation, AppError> {
    if profile.resume.as_deref().map_or(true, |r| r.trim().is_empty()) {
        return Err(AppError::ResumeRequired);
    }

    let job = state
        .store
        .find_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job not found".to_string()))?;

    if job.has_applicant(profile.id) {
        return Err(AppError::Conflict(
            "You have already applied to this job".to_string(),
        ));
    }

    let job_key = job.id.to_string();
    let result = state
        .analyzer
        .run_gap_analysis(
            profile,
            &JobContext::from(&job),
            profile.resume_analysis.as_ref(),
        )
        .await;

    match result {
        Ok(assessment) => {
            let patch = TargetJobPatch::completed(assessment.analysis.clone(), Utc::now());
            let record = state
                .store
                .upsert_target_job(profile.id, &job_key, seed_from_posting(&job), &patch)
                .await?;
            Ok(JobEvaluation {
                assessment,
                job_id: job.id,
                job_title: job.title,
                company_name: job.company_name,
                target_job_id: record.id,
            })
        }
        Err(e) => {
            let failed = TargetJobPatch::status(AnalysisStatus::Failed);
            if let Err(store_err) = state
                .store
                .upsert_target_job(profile.id, &job_key, seed_from_posting(&job), &failed)
                .await
            {
                warn!("Could not mark target job {job_key} as failed: {store_err}");
            }
            Err(e.into())
        }
    }
}

async fn resolve_job_context(
    state: &AppState,
    record: &TargetJobRecord,
) -> Result<JobContext, AppError> {
    let posting_id = record
        .job_id
        .as_deref()
        .and_then(|key| Uuid::parse_str(key).ok());

    if let Some(id) = posting_id {
        if let Some(posting) = state.store.find_job(id).await? {
            return Ok(JobContext::from(&posting));
        }
    }
    Ok(JobContext::from(record))
}

async fn mark_failed(state: &AppState, profile: &CandidateProfile, id: Uuid, cause: &AnalysisError) {
    warn!("Gap analysis for target job {id} failed: {cause}");
    let patch = TargetJobPatch::status(AnalysisStatus::Failed);
    if let Err(e) = state.store.update_target_job(profile.id, id, &patch).await {
        warn!("Could not mark target job {id} as failed: {e}");
    }
}
