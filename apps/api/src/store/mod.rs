//! Persistence boundary.
//!
//! Handlers and services only ever see `Arc<dyn Store>`. The operations are
//! find-by-key, create and field-level update; there are no raw queries above
//! this layer. `PgStore` backs production, `MemoryStore` backs tests and
//! local runs without a database.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::company::{Company, CompanyDetails};
use crate::models::job::{ApplicantStatus, JobFilter, JobPosting, JobUpdate};
use crate::models::profile::{CandidateProfile, NewProfile, ProfileUpdate, ResumeAnalysis};
use crate::models::target_job::{TargetJobPatch, TargetJobRecord, TargetJobSeed};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // ── Candidate profiles ──────────────────────────────────────────────────

    async fn find_profile(&self, subject: &str) -> StoreResult<Option<CandidateProfile>>;

    async fn find_profiles_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<CandidateProfile>>;

    /// Fails with `Conflict` if the subject already has a profile or the email
    /// belongs to another one.
    async fn create_profile(&self, new: NewProfile) -> StoreResult<CandidateProfile>;

    /// Creates the profile, or overwrites email, name and username of the
    /// existing one. Everything else on the profile is left alone.
    async fn upsert_identity(&self, identity: NewProfile) -> StoreResult<CandidateProfile>;

    /// Removes the profile with its target jobs and applications. `false` if
    /// the subject had no profile.
    async fn delete_profile(&self, subject: &str) -> StoreResult<bool>;

    async fn update_profile(
        &self,
        subject: &str,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<CandidateProfile>>;

    /// Replaces any previous analysis wholesale in a single write.
    async fn save_resume_analysis(
        &self,
        subject: &str,
        analysis: &ResumeAnalysis,
    ) -> StoreResult<CandidateProfile>;

    // ── Target jobs ─────────────────────────────────────────────────────────

    async fn list_target_jobs(&self, profile_id: Uuid) -> StoreResult<Vec<TargetJobRecord>>;

    async fn find_target_job(
        &self,
        profile_id: Uuid,
        id: Uuid,
    ) -> StoreResult<Option<TargetJobRecord>>;

    async fn find_target_job_by_key(
        &self,
        profile_id: Uuid,
        job_key: &str,
    ) -> StoreResult<Option<TargetJobRecord>>;

    /// Adds a free-standing target job with no job key. Starts Pending.
    async fn create_target_job(
        &self,
        profile_id: Uuid,
        seed: TargetJobSeed,
    ) -> StoreResult<TargetJobRecord>;

    /// Finds the record for `(profile_id, job_key)`, creating it Pending from
    /// `seed` when absent, then applies `patch` in place. At most one record
    /// exists per key; concurrent callers race and the last write wins.
    async fn upsert_target_job(
        &self,
        profile_id: Uuid,
        job_key: &str,
        seed: TargetJobSeed,
        patch: &TargetJobPatch,
    ) -> StoreResult<TargetJobRecord>;

    async fn update_target_job(
        &self,
        profile_id: Uuid,
        id: Uuid,
        patch: &TargetJobPatch,
    ) -> StoreResult<Option<TargetJobRecord>>;

    // ── Job postings ────────────────────────────────────────────────────────

    /// Matching postings, newest first.
    async fn list_jobs(&self, filter: &JobFilter) -> StoreResult<Vec<JobPosting>>;

    async fn find_job(&self, id: Uuid) -> StoreResult<Option<JobPosting>>;

    /// Increments the view counter and returns the updated posting.
    async fn record_job_view(&self, id: Uuid) -> StoreResult<Option<JobPosting>>;

    async fn create_job(&self, job: JobPosting) -> StoreResult<JobPosting>;

    async fn update_job(&self, id: Uuid, update: &JobUpdate) -> StoreResult<Option<JobPosting>>;

    async fn delete_job(&self, id: Uuid) -> StoreResult<bool>;

    /// Appends an applicant. `Conflict` if the user already applied.
    async fn add_applicant(&self, job_id: Uuid, user_id: Uuid) -> StoreResult<JobPosting>;

    async fn update_applicant_status(
        &self,
        job_id: Uuid,
        user_id: Uuid,
        status: ApplicantStatus,
    ) -> StoreResult<JobPosting>;

    // ── Companies ───────────────────────────────────────────────────────────

    async fn find_company(&self, subject: &str) -> StoreResult<Option<Company>>;

    /// `Conflict` if the subject, company name or email is already registered.
    async fn create_company(&self, company: Company) -> StoreResult<Company>;

    async fn update_company(
        &self,
        subject: &str,
        details: &CompanyDetails,
    ) -> StoreResult<Option<Company>>;
}
