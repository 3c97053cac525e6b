use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::company::{Company, CompanyDetails};
use crate::models::job::{Applicant, ApplicantStatus, JobFilter, JobPosting, JobUpdate};
use crate::models::profile::{CandidateProfile, NewProfile, ProfileUpdate, ResumeAnalysis};
use crate::models::target_job::{TargetJobPatch, TargetJobRecord, TargetJobSeed};

#[derive(Default)]
struct Inner {
    /// Keyed by identity-provider subject.
    profiles: HashMap<String, CandidateProfile>,
    /// Per-profile target jobs in insertion order. Records are only removed
    /// together with their profile's index entries, so positions stay valid
    /// for `target_job_index`.
    target_jobs: HashMap<Uuid, Vec<TargetJobRecord>>,
    target_job_index: HashMap<(Uuid, String), usize>,
    /// Newest first.
    jobs: Vec<JobPosting>,
    companies: HashMap<String, Company>,
}

impl Inner {
    fn job_mut(&mut self, id: Uuid) -> Option<&mut JobPosting> {
        self.jobs.iter_mut().find(|j| j.id == id)
    }
}

/// In-process store behind a single `RwLock`. Each trait call is one critical
/// section; there is no locking across calls.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_profile(&self, subject: &str) -> StoreResult<Option<CandidateProfile>> {
        Ok(self.inner.read().await.profiles.get(subject).cloned())
    }

    async fn find_profiles_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<CandidateProfile>> {
        let inner = self.inner.read().await;
        Ok(inner
            .profiles
            .values()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn create_profile(&self, new: NewProfile) -> StoreResult<CandidateProfile> {
        let mut inner = self.inner.write().await;
        if inner.profiles.contains_key(&new.subject) {
            return Err(StoreError::Conflict(format!(
                "Profile for {} already exists",
                new.subject
            )));
        }
        if inner.profiles.values().any(|p| p.email == new.email) {
            return Err(StoreError::Conflict(format!(
                "Email {} is already registered",
                new.email
            )));
        }
        let profile = CandidateProfile::new(new);
        inner
            .profiles
            .insert(profile.subject.clone(), profile.clone());
        Ok(profile)
    }

    async fn upsert_identity(&self, identity: NewProfile) -> StoreResult<CandidateProfile> {
        let mut inner = self.inner.write().await;
        if inner
            .profiles
            .values()
            .any(|p| p.email == identity.email && p.subject != identity.subject)
        {
            return Err(StoreError::Conflict(format!(
                "Email {} is already registered",
                identity.email
            )));
        }
        let profile = match inner.profiles.get_mut(&identity.subject) {
            Some(profile) => {
                profile.email = identity.email;
                profile.full_name = identity.full_name;
                profile.username = identity.username;
                profile.updated_at = Utc::now();
                profile.clone()
            }
            None => {
                let profile = CandidateProfile::new(identity);
                inner
                    .profiles
                    .insert(profile.subject.clone(), profile.clone());
                profile
            }
        };
        Ok(profile)
    }

    async fn delete_profile(&self, subject: &str) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let Some(profile) = inner.profiles.remove(subject) else {
            return Ok(false);
        };
        inner.target_jobs.remove(&profile.id);
        inner.target_job_index.retain(|(owner, _), _| *owner != profile.id);
        for job in inner.jobs.iter_mut() {
            job.applicants.retain(|a| a.user_id != profile.id);
        }
        Ok(true)
    }

    async fn update_profile(
        &self,
        subject: &str,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<CandidateProfile>> {
        let mut inner = self.inner.write().await;
        Ok(inner.profiles.get_mut(subject).map(|profile| {
            profile.apply(update);
            profile.clone()
        }))
    }

    async fn save_resume_analysis(
        &self,
        subject: &str,
        analysis: &ResumeAnalysis,
    ) -> StoreResult<CandidateProfile> {
        let mut inner = self.inner.write().await;
        let profile = inner
            .profiles
            .get_mut(subject)
            .ok_or_else(|| StoreError::NotFound("User".to_string()))?;
        profile.resume_analysis = Some(analysis.clone());
        profile.updated_at = Utc::now();
        Ok(profile.clone())
    }

    async fn list_target_jobs(&self, profile_id: Uuid) -> StoreResult<Vec<TargetJobRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .target_jobs
            .get(&profile_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn find_target_job(
        &self,
        profile_id: Uuid,
        id: Uuid,
    ) -> StoreResult<Option<TargetJobRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .target_jobs
            .get(&profile_id)
            .and_then(|records| records.iter().find(|r| r.id == id))
            .cloned())
    }

    async fn find_target_job_by_key(
        &self,
        profile_id: Uuid,
        job_key: &str,
    ) -> StoreResult<Option<TargetJobRecord>> {
        let inner = self.inner.read().await;
        let Some(&position) = inner
            .target_job_index
            .get(&(profile_id, job_key.to_string()))
        else {
            return Ok(None);
        };
        Ok(inner
            .target_jobs
            .get(&profile_id)
            .and_then(|records| records.get(position))
            .cloned())
    }

    async fn create_target_job(
        &self,
        profile_id: Uuid,
        seed: TargetJobSeed,
    ) -> StoreResult<TargetJobRecord> {
        let record = TargetJobRecord::new(None, seed);
        let mut inner = self.inner.write().await;
        inner
            .target_jobs
            .entry(profile_id)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn upsert_target_job(
        &self,
        profile_id: Uuid,
        job_key: &str,
        seed: TargetJobSeed,
        patch: &TargetJobPatch,
    ) -> StoreResult<TargetJobRecord> {
        let mut inner = self.inner.write().await;
        let Inner {
            target_jobs,
            target_job_index,
            ..
        } = &mut *inner;

        let records = target_jobs.entry(profile_id).or_default();
        let position = *target_job_index
            .entry((profile_id, job_key.to_string()))
            .or_insert_with(|| {
                records.push(TargetJobRecord::new(Some(job_key.to_string()), seed));
                records.len() - 1
            });

        let record = records
            .get_mut(position)
            .ok_or_else(|| StoreError::Corrupt(format!("target job index for {job_key}")))?;
        record.apply(patch);
        Ok(record.clone())
    }

    async fn update_target_job(
        &self,
        profile_id: Uuid,
        id: Uuid,
        patch: &TargetJobPatch,
    ) -> StoreResult<Option<TargetJobRecord>> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .target_jobs
            .get_mut(&profile_id)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
            .map(|record| {
                record.apply(patch);
                record.clone()
            }))
    }

    async fn list_jobs(&self, filter: &JobFilter) -> StoreResult<Vec<JobPosting>> {
        let inner = self.inner.read().await;
        Ok(inner
            .jobs
            .iter()
            .filter(|j| filter.matches(j))
            .cloned()
            .collect())
    }

    async fn find_job(&self, id: Uuid) -> StoreResult<Option<JobPosting>> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn record_job_view(&self, id: Uuid) -> StoreResult<Option<JobPosting>> {
        let mut inner = self.inner.write().await;
        Ok(inner.job_mut(id).map(|job| {
            job.views += 1;
            job.clone()
        }))
    }

    async fn create_job(&self, job: JobPosting) -> StoreResult<JobPosting> {
        let mut inner = self.inner.write().await;
        inner.jobs.insert(0, job.clone());
        Ok(job)
    }

    async fn update_job(&self, id: Uuid, update: &JobUpdate) -> StoreResult<Option<JobPosting>> {
        let mut inner = self.inner.write().await;
        Ok(inner.job_mut(id).map(|job| {
            job.apply(update);
            job.clone()
        }))
    }

    async fn delete_job(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.jobs.len();
        inner.jobs.retain(|j| j.id != id);
        Ok(inner.jobs.len() != before)
    }

    async fn add_applicant(&self, job_id: Uuid, user_id: Uuid) -> StoreResult<JobPosting> {
        let mut inner = self.inner.write().await;
        let job = inner
            .job_mut(job_id)
            .ok_or_else(|| StoreError::NotFound("Job".to_string()))?;
        if job.has_applicant(user_id) {
            return Err(StoreError::Conflict(
                "You have already applied to this job".to_string(),
            ));
        }
        job.applicants.push(Applicant {
            user_id,
            applied_at: Utc::now(),
            status: ApplicantStatus::Applied,
        });
        Ok(job.clone())
    }

    async fn update_applicant_status(
        &self,
        job_id: Uuid,
        user_id: Uuid,
        status: ApplicantStatus,
    ) -> StoreResult<JobPosting> {
        let mut inner = self.inner.write().await;
        let job = inner
            .job_mut(job_id)
            .ok_or_else(|| StoreError::NotFound("Job".to_string()))?;
        let applicant = job
            .applicants
            .iter_mut()
            .find(|a| a.user_id == user_id)
            .ok_or_else(|| StoreError::NotFound("Applicant".to_string()))?;
        applicant.status = status;
        Ok(job.clone())
    }

    async fn find_company(&self, subject: &str) -> StoreResult<Option<Company>> {
        Ok(self.inner.read().await.companies.get(subject).cloned())
    }

    async fn create_company(&self, company: Company) -> StoreResult<Company> {
        let mut inner = self.inner.write().await;
        let taken = inner.companies.values().any(|c| {
            c.subject == company.subject
                || c.company_name == company.company_name
                || c.email == company.email
        });
        if taken {
            return Err(StoreError::Conflict("Company already registered".to_string()));
        }
        inner
            .companies
            .insert(company.subject.clone(), company.clone());
        Ok(company)
    }

    async fn update_company(
        &self,
        subject: &str,
        details: &CompanyDetails,
    ) -> StoreResult<Option<Company>> {
        let mut inner = self.inner.write().await;
        Ok(inner.companies.get_mut(subject).map(|company| {
            company.apply(details);
            company.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::target_job::{AnalysisStatus, GapAnalysis};
    use crate::testing::{gap_analysis_json, new_profile};

    fn seed() -> TargetJobSeed {
        TargetJobSeed {
            title: "Backend Engineer".to_string(),
            description: "APIs".to_string(),
            company: Some("Acme".to_string()),
        }
    }

    fn analysis(pct: u8) -> GapAnalysis {
        serde_json::from_str(&gap_analysis_json(pct)).unwrap()
    }

    #[tokio::test]
    async fn test_duplicate_profile_is_conflict() {
        let store = MemoryStore::new();
        store.create_profile(new_profile("user_1")).await.unwrap();
        let result = store.create_profile(new_profile("user_1")).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_second_subject_with_same_email_is_conflict() {
        let store = MemoryStore::new();
        let mut first = new_profile("user_1");
        first.email = "same@example.com".to_string();
        store.create_profile(first).await.unwrap();

        let mut second = new_profile("user_2");
        second.email = "same@example.com".to_string();
        let result = store.create_profile(second).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
        assert!(store.find_profile("user_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_identity_overwrites_claims_only() {
        let store = MemoryStore::new();
        let created = store.upsert_identity(new_profile("user_1")).await.unwrap();
        store
            .update_profile(
                "user_1",
                &ProfileUpdate {
                    skills: Some(vec!["Rust".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let mut renamed = new_profile("user_1");
        renamed.email = "new@example.com".to_string();
        renamed.username = Some("ferris".to_string());
        let updated = store.upsert_identity(renamed).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.username.as_deref(), Some("ferris"));
        assert_eq!(updated.skills, vec!["Rust".to_string()]);
    }

    #[tokio::test]
    async fn test_upsert_identity_rejects_email_of_other_subject() {
        let store = MemoryStore::new();
        store.create_profile(new_profile("user_1")).await.unwrap();
        store.create_profile(new_profile("user_2")).await.unwrap();

        let mut clash = new_profile("user_2");
        clash.email = "user_1@example.com".to_string();
        let result = store.upsert_identity(clash).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_profile_drops_target_jobs_and_applications() {
        let store = MemoryStore::new();
        let profile = store.create_profile(new_profile("user_1")).await.unwrap();
        store
            .upsert_target_job(profile.id, "job-1", seed(), &TargetJobPatch::default())
            .await
            .unwrap();
        let job = store
            .create_job(JobPosting::new(
                Uuid::new_v4(),
                None,
                serde_json::from_str(r#"{"title": "t", "description": "d"}"#).unwrap(),
            ))
            .await
            .unwrap();
        store.add_applicant(job.id, profile.id).await.unwrap();

        assert!(store.delete_profile("user_1").await.unwrap());
        assert!(!store.delete_profile("user_1").await.unwrap());
        assert!(store.find_profile("user_1").await.unwrap().is_none());
        assert!(store.list_target_jobs(profile.id).await.unwrap().is_empty());
        assert!(store
            .find_target_job_by_key(profile.id, "job-1")
            .await
            .unwrap()
            .is_none());
        let job = store.find_job(job.id).await.unwrap().unwrap();
        assert!(job.applicants.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_twice_yields_one_record_with_second_fields() {
        let store = MemoryStore::new();
        let profile = store.create_profile(new_profile("user_1")).await.unwrap();

        let first = store
            .upsert_target_job(
                profile.id,
                "job-1",
                seed(),
                &TargetJobPatch::completed(analysis(40), Utc::now()),
            )
            .await
            .unwrap();
        let second = store
            .upsert_target_job(
                profile.id,
                "job-1",
                seed(),
                &TargetJobPatch::completed(analysis(85), Utc::now()),
            )
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.match_percentage.map(|m| m.value()), Some(85));
        assert_eq!(second.revision, 2);
        assert_eq!(store.list_target_jobs(profile.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_with_empty_patch_creates_pending_once() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();

        let created = store
            .upsert_target_job(owner, "job-1", seed(), &TargetJobPatch::default())
            .await
            .unwrap();
        assert_eq!(created.analysis_status, AnalysisStatus::Pending);
        assert_eq!(created.job_id.as_deref(), Some("job-1"));

        let again = store
            .upsert_target_job(owner, "job-1", seed(), &TargetJobPatch::default())
            .await
            .unwrap();
        assert_eq!(again.id, created.id);
        assert_eq!(again.revision, 0);
    }

    #[tokio::test]
    async fn test_keys_are_scoped_per_candidate() {
        let store = MemoryStore::new();
        let a = store
            .upsert_target_job(Uuid::new_v4(), "job-1", seed(), &TargetJobPatch::default())
            .await
            .unwrap();
        let b = store
            .upsert_target_job(Uuid::new_v4(), "job-1", seed(), &TargetJobPatch::default())
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_never_duplicate() {
        let store = Arc::new(MemoryStore::new());
        let owner = Uuid::new_v4();

        let mut handles = Vec::new();
        for pct in [10u8, 90] {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .upsert_target_job(
                        owner,
                        "job-1",
                        seed(),
                        &TargetJobPatch::completed(analysis(pct), Utc::now()),
                    )
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let records = store.list_target_jobs(owner).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].revision, 2);
    }

    #[tokio::test]
    async fn test_free_standing_target_jobs_are_not_keyed() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        store.create_target_job(owner, seed()).await.unwrap();
        store.create_target_job(owner, seed()).await.unwrap();
        assert_eq!(store.list_target_jobs(owner).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_second_application_is_conflict() {
        let store = MemoryStore::new();
        let job = store
            .create_job(JobPosting::new(
                Uuid::new_v4(),
                None,
                serde_json::from_str(r#"{"title": "t", "description": "d"}"#).unwrap(),
            ))
            .await
            .unwrap();
        let user = Uuid::new_v4();

        store.add_applicant(job.id, user).await.unwrap();
        let second = store.add_applicant(job.id, user).await;

        assert!(matches!(second, Err(StoreError::Conflict(_))));
        let stored = store.find_job(job.id).await.unwrap().unwrap();
        assert_eq!(stored.applicants.len(), 1);
    }

    #[tokio::test]
    async fn test_jobs_listed_newest_first() {
        let store = MemoryStore::new();
        let company = Uuid::new_v4();
        for title in ["first", "second"] {
            let new = serde_json::from_value(serde_json::json!({
                "title": title,
                "description": "d"
            }))
            .unwrap();
            store
                .create_job(JobPosting::new(company, None, new))
                .await
                .unwrap();
        }
        let jobs = store.list_jobs(&JobFilter::default()).await.unwrap();
        assert_eq!(jobs[0].title, "second");
        assert_eq!(jobs[1].title, "first");
    }

    #[tokio::test]
    async fn test_company_name_must_be_unique() {
        let store = MemoryStore::new();
        let details = CompanyDetails::default();
        store
            .create_company(Company::new(
                "c1".to_string(),
                "a@acme.io".to_string(),
                "Acme".to_string(),
                details.clone(),
            ))
            .await
            .unwrap();
        let result = store
            .create_company(Company::new(
                "c2".to_string(),
                "b@acme.io".to_string(),
                "Acme".to_string(),
                details,
            ))
            .await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }
}
