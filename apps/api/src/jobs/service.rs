//! Job board operations that span more than one store call.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::service::seed_from_posting;
use crate::errors::AppError;
use crate::models::company::Company;
use crate::models::job::{
    ApplicantStatus, EmploymentType, JobFilter, JobPosting, JobStatus,
};
use crate::models::profile::{CandidateProfile, ExperienceLevel};
use crate::models::target_job::TargetJobPatch;
use crate::state::AppState;

const ACCESS_DENIED: &str = "Job not found or access denied";

/// Loads a posting only if `company` owns it. Other companies' jobs look
/// exactly like missing ones.
pub async fn owned_job(
    state: &AppState,
    company: &Company,
    job_id: Uuid,
) -> Result<JobPosting, AppError> {
    match state.store.find_job(job_id).await? {
        Some(job) if job.company_id == company.id => Ok(job),
        _ => Err(AppError::NotFound(ACCESS_DENIED.to_string())),
    }
}

/// Records an application and starts tracking the job as a Pending target.
/// An existing target job for the posting is left as it is.
pub async fn apply_to_job(
    state: &AppState,
    profile: &CandidateProfile,
    job_id: Uuid,
) -> Result<JobPosting, AppError> {
    let job = state.store.add_applicant(job_id, profile.id).await?;
    // The application is already recorded; a missing target job is recoverable
    // through a later evaluate or add.
    if let Err(e) = state
        .store
        .upsert_target_job(
            profile.id,
            &job.id.to_string(),
            seed_from_posting(&job),
            &TargetJobPatch::default(),
        )
        .await
    {
        warn!(
            "{} applied to job {} but tracking it failed: {}",
            profile.subject, job.id, e
        );
    }
    info!("{} applied to job {}", profile.subject, job.id);
    Ok(job)
}

// ────────────────────────────────────────────────────────────────────────────
// Applicant views
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantSummary {
    pub full_name: Option<String>,
    pub email: String,
    pub skills: Vec<String>,
    pub experience_level: ExperienceLevel,
    pub resume: Option<String>,
    pub linkedin_profile: Option<String>,
    pub github_profile: Option<String>,
    pub portfolio: Option<String>,
    pub career_level: Option<String>,
    pub strengths: Vec<String>,
}

impl From<&CandidateProfile> for ApplicantSummary {
    fn from(p: &CandidateProfile) -> Self {
        let overall = p.resume_analysis.as_ref().map(|a| &a.review.overall_assessment);
        Self {
            full_name: p.full_name.clone(),
            email: p.email.clone(),
            skills: p.skills.clone(),
            experience_level: p.experience_level,
            resume: p.resume.clone(),
            linkedin_profile: p.linkedin_profile.clone(),
            github_profile: p.github_profile.clone(),
            portfolio: p.portfolio.clone(),
            career_level: overall.map(|o| o.career_level.clone()),
            strengths: overall.map(|o| o.strengths.clone()).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobBrief {
    pub id: Uuid,
    pub title: String,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
}

impl From<&JobPosting> for JobBrief {
    fn from(job: &JobPosting) -> Self {
        Self {
            id: job.id,
            title: job.title.clone(),
            location: job.location.clone(),
            employment_type: job.employment_type,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantView {
    pub user_id: Uuid,
    pub applied_at: DateTime<Utc>,
    pub status: ApplicantStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<JobBrief>,
    /// `None` when the applicant's profile has since been removed.
    pub user: Option<ApplicantSummary>,
}

async fn profiles_by_id(
    state: &AppState,
    jobs: &[JobPosting],
) -> Result<HashMap<Uuid, CandidateProfile>, AppError> {
    let mut ids: Vec<Uuid> = jobs
        .iter()
        .flat_map(|j| j.applicants.iter().map(|a| a.user_id))
        .collect();
    ids.sort_unstable();
    ids.dedup();
    let profiles = state.store.find_profiles_by_ids(&ids).await?;
    Ok(profiles.into_iter().map(|p| (p.id, p)).collect())
}

/// Applicants of one posting, joined with their profile summaries.
pub async fn job_applicants(
    state: &AppState,
    job: &JobPosting,
) -> Result<Vec<ApplicantView>, AppError> {
    let profiles = profiles_by_id(state, std::slice::from_ref(job)).await?;
    Ok(job
        .applicants
        .iter()
        .map(|a| ApplicantView {
            user_id: a.user_id,
            applied_at: a.applied_at,
            status: a.status,
            job: None,
            user: profiles.get(&a.user_id).map(ApplicantSummary::from),
        })
        .collect())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyApplicants {
    pub applicants: Vec<ApplicantView>,
    pub count: usize,
    pub unique_candidates: usize,
}

/// Every applicant across the company's postings, most recent first.
pub async fn company_applicants(
    state: &AppState,
    company: &Company,
) -> Result<CompanyApplicants, AppError> {
    let jobs = company_jobs(state, company).await?;
    let profiles_map = profiles_by_id(state, &jobs).await?;
    let profiles = &profiles_map;

    let mut applicants: Vec<ApplicantView> = jobs
        .iter()
        .flat_map(|job| {
            job.applicants.iter().filter_map(move |a| {
                let user = profiles.get(&a.user_id)?;
                Some(ApplicantView {
                    user_id: a.user_id,
                    applied_at: a.applied_at,
                    status: a.status,
                    job: Some(JobBrief::from(job)),
                    user: Some(ApplicantSummary::from(user)),
                })
            })
        })
        .collect();
    applicants.sort_by(|a, b| b.applied_at.cmp(&a.applied_at));

    Ok(CompanyApplicants {
        count: applicants.len(),
        unique_candidates: profiles.len(),
        applicants,
    })
}

pub async fn company_jobs(state: &AppState, company: &Company) -> Result<Vec<JobPosting>, AppError> {
    let filter = JobFilter {
        company_id: Some(company.id),
        ..Default::default()
    };
    Ok(state.store.list_jobs(&filter).await?)
}

// ────────────────────────────────────────────────────────────────────────────
// Dashboard stats
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct StatusBreakdown {
    pub applied: usize,
    pub reviewed: usize,
    pub shortlisted: usize,
    pub rejected: usize,
    pub hired: usize,
}

impl StatusBreakdown {
    fn record(&mut self, status: ApplicantStatus) {
        match status {
            ApplicantStatus::Applied => self.applied += 1,
            ApplicantStatus::Reviewed => self.reviewed += 1,
            ApplicantStatus::Shortlisted => self.shortlisted += 1,
            ApplicantStatus::Rejected => self.rejected += 1,
            ApplicantStatus::Hired => self.hired += 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobApplicantCount {
    pub id: Uuid,
    pub title: String,
    pub applicants: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStats {
    pub total_jobs: usize,
    pub active_jobs: usize,
    pub total_views: i64,
    pub total_applicants: usize,
    pub recent_applicants: usize,
    pub status_breakdown: StatusBreakdown,
    pub jobs_with_most_applicants: Vec<JobApplicantCount>,
}

/// Aggregates a company's postings. "Recent" means applied within the
/// seven days before `now`.
pub fn compute_stats(jobs: &[JobPosting], now: DateTime<Utc>) -> CompanyStats {
    let since = now - Duration::days(7);
    let mut breakdown = StatusBreakdown::default();
    let mut total_applicants = 0;
    let mut recent_applicants = 0;

    for job in jobs {
        total_applicants += job.applicants.len();
        for applicant in &job.applicants {
            breakdown.record(applicant.status);
            if applicant.applied_at >= since {
                recent_applicants += 1;
            }
        }
    }

    let mut top: Vec<JobApplicantCount> = jobs
        .iter()
        .map(|j| JobApplicantCount {
            id: j.id,
            title: j.title.clone(),
            applicants: j.applicants.len(),
        })
        .collect();
    top.sort_by(|a, b| b.applicants.cmp(&a.applicants));
    top.truncate(5);

    CompanyStats {
        total_jobs: jobs.len(),
        active_jobs: jobs.iter().filter(|j| j.status == JobStatus::Active).count(),
        total_views: jobs.iter().map(|j| j.views).sum(),
        total_applicants,
        recent_applicants,
        status_breakdown: breakdown,
        jobs_with_most_applicants: top,
    }
}
