//! PostgreSQL-backed store.
//!
//! Enum columns hold the same strings the JSON wire format uses; nested
//! analysis structures are JSONB. Writes that start from an existing row are
//! read-modify-write with no row lock, so concurrent writers race and the last
//! one wins. The `(user_id, job_key)` unique key keeps target jobs from
//! duplicating even then.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::models::company::{Company, CompanyDetails};
use crate::models::job::{
    Applicant, ApplicantStatus, JobFilter, JobPosting, JobUpdate, SalaryRange,
};
use crate::models::profile::{CandidateProfile, NewProfile, ProfileUpdate, ResumeAnalysis};
use crate::models::target_job::{
    CriticalGap, MatchPercentage, ProficiencyGap, RecommendedAction, SkillStrength,
    TargetJobPatch, TargetJobRecord, TargetJobSeed, TimelineAssessment,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Column codecs
// ────────────────────────────────────────────────────────────────────────────

/// Renders a unit enum as its serde string.
fn to_text<T: Serialize>(value: &T) -> StoreResult<String> {
    match serde_json::to_value(value) {
        Ok(Value::String(s)) => Ok(s),
        Ok(other) => Err(StoreError::Corrupt(format!("expected a string enum, got {other}"))),
        Err(e) => Err(StoreError::Corrupt(e.to_string())),
    }
}

fn from_text<T: DeserializeOwned>(text: &str) -> StoreResult<T> {
    serde_json::from_value(Value::String(text.to_string()))
        .map_err(|e| StoreError::Corrupt(format!("unexpected enum value '{text}': {e}")))
}

fn opt_to_text<T: Serialize>(value: Option<&T>) -> StoreResult<Option<String>> {
    value.map(to_text).transpose()
}

fn opt_from_text<T: DeserializeOwned>(text: Option<&str>) -> StoreResult<Option<T>> {
    text.map(from_text).transpose()
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

// ────────────────────────────────────────────────────────────────────────────
// Rows
// ────────────────────────────────────────────────────────────────────────────

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    subject: String,
    email: String,
    full_name: Option<String>,
    username: Option<String>,
    role: String,
    profile_completed: bool,
    resume: Option<String>,
    github_id: Option<String>,
    github_profile: Option<String>,
    linkedin_profile: Option<String>,
    portfolio: Option<String>,
    skills: Vec<String>,
    experience_level: String,
    resume_analysis: Option<Json<ResumeAnalysis>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for CandidateProfile {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(CandidateProfile {
            id: row.id,
            subject: row.subject,
            email: row.email,
            full_name: row.full_name,
            username: row.username,
            role: from_text(&row.role)?,
            profile_completed: row.profile_completed,
            resume: row.resume,
            github_id: row.github_id,
            github_profile: row.github_profile,
            linkedin_profile: row.linkedin_profile,
            portfolio: row.portfolio,
            skills: row.skills,
            experience_level: from_text(&row.experience_level)?,
            resume_analysis: row.resume_analysis.map(|Json(a)| a),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CompanyRow {
    id: Uuid,
    subject: String,
    company_name: String,
    email: String,
    website: Option<String>,
    description: Option<String>,
    logo: Option<String>,
    industry: Option<String>,
    size: Option<String>,
    verified: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CompanyRow> for Company {
    type Error = StoreError;

    fn try_from(row: CompanyRow) -> StoreResult<Self> {
        Ok(Company {
            id: row.id,
            subject: row.subject,
            company_name: row.company_name,
            email: row.email,
            website: row.website,
            description: row.description,
            logo: row.logo,
            industry: row.industry,
            size: opt_from_text(row.size.as_deref())?,
            verified: row.verified,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct JobRow {
    id: Uuid,
    company_id: Uuid,
    company_name: Option<String>,
    title: String,
    description: String,
    requirements: Vec<String>,
    location: Option<String>,
    employment_type: String,
    experience_level: Option<String>,
    salary: Option<String>,
    salary_range: Option<Json<SalaryRange>>,
    status: String,
    views: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl JobRow {
    fn into_posting(self, applicants: Vec<Applicant>) -> StoreResult<JobPosting> {
        Ok(JobPosting {
            id: self.id,
            company_id: self.company_id,
            company_name: self.company_name,
            title: self.title,
            description: self.description,
            requirements: self.requirements,
            location: self.location,
            employment_type: from_text(&self.employment_type)?,
            experience_level: opt_from_text(self.experience_level.as_deref())?,
            salary: self.salary,
            salary_range: self.salary_range.map(|Json(r)| r),
            status: from_text(&self.status)?,
            applicants,
            views: self.views,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ApplicantRow {
    job_id: Uuid,
    user_id: Uuid,
    applied_at: DateTime<Utc>,
    status: String,
}

#[derive(FromRow)]
struct TargetJobRow {
    id: Uuid,
    job_key: Option<String>,
    title: String,
    description: String,
    company: Option<String>,
    analysis_status: String,
    skill_gaps: Vec<String>,
    match_percentage: Option<i16>,
    match_summary: Option<String>,
    strengths: Json<Vec<SkillStrength>>,
    critical_gaps: Json<Vec<CriticalGap>>,
    proficiency_gaps: Json<Vec<ProficiencyGap>>,
    recommended_actions: Json<Vec<RecommendedAction>>,
    timeline_assessment: Option<Json<TimelineAssessment>>,
    analyzed_at: Option<DateTime<Utc>>,
    revision: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TargetJobRow> for TargetJobRecord {
    type Error = StoreError;

    fn try_from(row: TargetJobRow) -> StoreResult<Self> {
        let match_percentage = row
            .match_percentage
            .map(|v| {
                u8::try_from(v)
                    .ok()
                    .and_then(|v| MatchPercentage::try_from(v).ok())
                    .ok_or_else(|| StoreError::Corrupt(format!("match_percentage {v}")))
            })
            .transpose()?;

        Ok(TargetJobRecord {
            id: row.id,
            job_id: row.job_key,
            title: row.title,
            description: row.description,
            company: row.company,
            analysis_status: from_text(&row.analysis_status)?,
            skill_gaps: row.skill_gaps,
            match_percentage,
            match_summary: row.match_summary,
            strengths: row.strengths.0,
            critical_gaps: row.critical_gaps.0,
            proficiency_gaps: row.proficiency_gaps.0,
            recommended_actions: row.recommended_actions.0,
            timeline_assessment: row.timeline_assessment.map(|Json(t)| t),
            analyzed_at: row.analyzed_at,
            revision: row.revision,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Bind values for a target job patch. `None` keeps the stored column.
struct PatchColumns {
    analysis_status: Option<String>,
    match_percentage: Option<i16>,
    match_summary: Option<String>,
    strengths: Option<Json<Vec<SkillStrength>>>,
    critical_gaps: Option<Json<Vec<CriticalGap>>>,
    proficiency_gaps: Option<Json<Vec<ProficiencyGap>>>,
    recommended_actions: Option<Json<Vec<RecommendedAction>>>,
    timeline_assessment: Option<Json<TimelineAssessment>>,
    analyzed_at: Option<DateTime<Utc>>,
    skill_gaps: Option<Vec<String>>,
}

impl PatchColumns {
    fn from_patch(patch: &TargetJobPatch) -> StoreResult<Self> {
        let analysis = patch.analysis.as_ref();
        Ok(Self {
            analysis_status: opt_to_text(patch.analysis_status.as_ref())?,
            match_percentage: analysis.map(|a| i16::from(a.match_percentage.value())),
            match_summary: analysis.map(|a| a.match_summary.clone()),
            strengths: analysis.map(|a| Json(a.strengths.clone())),
            critical_gaps: analysis.map(|a| Json(a.critical_gaps.clone())),
            proficiency_gaps: analysis.map(|a| Json(a.proficiency_gaps.clone())),
            recommended_actions: analysis.map(|a| Json(a.recommended_actions.clone())),
            timeline_assessment: analysis.map(|a| Json(a.timeline_assessment.clone())),
            analyzed_at: patch.analyzed_at,
            skill_gaps: patch.skill_gaps.clone(),
        })
    }
}

const TARGET_JOB_PATCH_SET: &str = r#"
    analysis_status     = COALESCE($3, analysis_status),
    match_percentage    = COALESCE($4, match_percentage),
    match_summary       = COALESCE($5, match_summary),
    strengths           = COALESCE($6, strengths),
    critical_gaps       = COALESCE($7, critical_gaps),
    proficiency_gaps    = COALESCE($8, proficiency_gaps),
    recommended_actions = COALESCE($9, recommended_actions),
    timeline_assessment = COALESCE($10, timeline_assessment),
    analyzed_at         = COALESCE($11, analyzed_at),
    skill_gaps          = COALESCE($12, skill_gaps),
    revision            = revision + 1,
    updated_at          = now()
"#;

enum TargetJobSelector<'a> {
    Id(Uuid),
    Key(&'a str),
}

impl PgStore {
    async fn load_applicants(&self, job_ids: &[Uuid]) -> StoreResult<Vec<ApplicantRow>> {
        let rows = sqlx::query_as::<_, ApplicantRow>(
            "SELECT job_id, user_id, applied_at, status FROM job_applicants \
             WHERE job_id = ANY($1) ORDER BY applied_at",
        )
        .bind(job_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn hydrate_jobs(&self, rows: Vec<JobRow>) -> StoreResult<Vec<JobPosting>> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let applicants = self.load_applicants(&ids).await?;

        rows.into_iter()
            .map(|row| -> StoreResult<JobPosting> {
                let mine = applicants
                    .iter()
                    .filter(|a| a.job_id == row.id)
                    .map(|a| -> StoreResult<Applicant> {
                        Ok(Applicant {
                            user_id: a.user_id,
                            applied_at: a.applied_at,
                            status: from_text(&a.status)?,
                        })
                    })
                    .collect::<StoreResult<Vec<_>>>()?;
                row.into_posting(mine)
            })
            .collect()
    }

    async fn hydrate_job(&self, row: Option<JobRow>) -> StoreResult<Option<JobPosting>> {
        match row {
            Some(row) => Ok(self.hydrate_jobs(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn write_profile(&self, p: &CandidateProfile) -> StoreResult<CandidateProfile> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users SET
                full_name = $2, username = $3, profile_completed = $4, resume = $5,
                github_id = $6, github_profile = $7, linkedin_profile = $8, portfolio = $9,
                skills = $10, experience_level = $11, updated_at = $12
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(p.id)
        .bind(&p.full_name)
        .bind(&p.username)
        .bind(p.profile_completed)
        .bind(&p.resume)
        .bind(&p.github_id)
        .bind(&p.github_profile)
        .bind(&p.linkedin_profile)
        .bind(&p.portfolio)
        .bind(&p.skills)
        .bind(to_text(&p.experience_level)?)
        .bind(p.updated_at)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn write_job(&self, job: &JobPosting) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE jobs SET
                title = $2, description = $3, requirements = $4, location = $5,
                employment_type = $6, experience_level = $7, salary = $8,
                salary_range = $9, status = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(job.id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.requirements)
        .bind(&job.location)
        .bind(to_text(&job.employment_type)?)
        .bind(opt_to_text(job.experience_level.as_ref())?)
        .bind(&job.salary)
        .bind(job.salary_range.clone().map(Json))
        .bind(to_text(&job.status)?)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn patch_target_job(
        &self,
        profile_id: Uuid,
        selector: TargetJobSelector<'_>,
        patch: &TargetJobPatch,
    ) -> StoreResult<Option<TargetJobRecord>> {
        let column = match selector {
            TargetJobSelector::Id(_) => "id",
            TargetJobSelector::Key(_) => "job_key",
        };

        if patch.is_empty() {
            let sql = format!("SELECT * FROM target_jobs WHERE user_id = $1 AND {column} = $2");
            let query = sqlx::query_as::<_, TargetJobRow>(&sql).bind(profile_id);
            let query = match selector {
                TargetJobSelector::Id(id) => query.bind(id),
                TargetJobSelector::Key(key) => query.bind(key.to_string()),
            };
            return query
                .fetch_optional(&self.pool)
                .await?
                .map(TargetJobRecord::try_from)
                .transpose();
        }

        let cols = PatchColumns::from_patch(patch)?;
        let sql = format!(
            "UPDATE target_jobs SET {TARGET_JOB_PATCH_SET} \
             WHERE user_id = $1 AND {column} = $2 RETURNING *"
        );
        let query = sqlx::query_as::<_, TargetJobRow>(&sql).bind(profile_id);
        let query = match selector {
            TargetJobSelector::Id(id) => query.bind(id),
            TargetJobSelector::Key(key) => query.bind(key.to_string()),
        };
        let row = query
            .bind(cols.analysis_status)
            .bind(cols.match_percentage)
            .bind(cols.match_summary)
            .bind(cols.strengths)
            .bind(cols.critical_gaps)
            .bind(cols.proficiency_gaps)
            .bind(cols.recommended_actions)
            .bind(cols.timeline_assessment)
            .bind(cols.analyzed_at)
            .bind(cols.skill_gaps)
            .fetch_optional(&self.pool)
            .await?;

        row.map(TargetJobRecord::try_from).transpose()
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_profile(&self, subject: &str) -> StoreResult<Option<CandidateProfile>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE subject = $1")
            .bind(subject)
            .fetch_optional(&self.pool)
            .await?
            .map(CandidateProfile::try_from)
            .transpose()
    }

    async fn find_profiles_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<CandidateProfile>> {
        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(CandidateProfile::try_from)
            .collect()
    }

    async fn create_profile(&self, new: NewProfile) -> StoreResult<CandidateProfile> {
        let p = CandidateProfile::new(new);
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users
                (id, subject, email, full_name, username, role, profile_completed,
                 skills, experience_level, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (subject) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(p.id)
        .bind(&p.subject)
        .bind(&p.email)
        .bind(&p.full_name)
        .bind(&p.username)
        .bind(to_text(&p.role)?)
        .bind(p.profile_completed)
        .bind(&p.skills)
        .bind(to_text(&p.experience_level)?)
        .bind(p.created_at)
        .bind(p.updated_at)
        .fetch_optional(&self.pool)
        .await;

        match row {
            Ok(Some(row)) => row.try_into(),
            Ok(None) => Err(StoreError::Conflict(format!(
                "Profile for {} already exists",
                p.subject
            ))),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict(format!(
                "Email {} is already registered",
                p.email
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn upsert_identity(&self, identity: NewProfile) -> StoreResult<CandidateProfile> {
        let p = CandidateProfile::new(identity);
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users
                (id, subject, email, full_name, username, role, profile_completed,
                 skills, experience_level, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (subject) DO UPDATE SET
                email = EXCLUDED.email,
                full_name = EXCLUDED.full_name,
                username = EXCLUDED.username,
                updated_at = EXCLUDED.updated_at
            RETURNING *
            "#,
        )
        .bind(p.id)
        .bind(&p.subject)
        .bind(&p.email)
        .bind(&p.full_name)
        .bind(&p.username)
        .bind(to_text(&p.role)?)
        .bind(p.profile_completed)
        .bind(&p.skills)
        .bind(to_text(&p.experience_level)?)
        .bind(p.created_at)
        .bind(p.updated_at)
        .fetch_one(&self.pool)
        .await;

        match row {
            Ok(row) => row.try_into(),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict(format!(
                "Email {} is already registered",
                p.email
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_profile(&self, subject: &str) -> StoreResult<bool> {
        // target_jobs and job_applicants cascade
        let deleted = sqlx::query("DELETE FROM users WHERE subject = $1")
            .bind(subject)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn update_profile(
        &self,
        subject: &str,
        update: &ProfileUpdate,
    ) -> StoreResult<Option<CandidateProfile>> {
        let Some(mut profile) = self.find_profile(subject).await? else {
            return Ok(None);
        };
        profile.apply(update);
        self.write_profile(&profile).await.map(Some)
    }

    async fn save_resume_analysis(
        &self,
        subject: &str,
        analysis: &ResumeAnalysis,
    ) -> StoreResult<CandidateProfile> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET resume_analysis = $2, updated_at = now() \
             WHERE subject = $1 RETURNING *",
        )
        .bind(subject)
        .bind(Json(analysis))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("User".to_string()))?;
        row.try_into()
    }

    async fn list_target_jobs(&self, profile_id: Uuid) -> StoreResult<Vec<TargetJobRecord>> {
        sqlx::query_as::<_, TargetJobRow>(
            "SELECT * FROM target_jobs WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(TargetJobRecord::try_from)
        .collect()
    }

    async fn find_target_job(
        &self,
        profile_id: Uuid,
        id: Uuid,
    ) -> StoreResult<Option<TargetJobRecord>> {
        self.patch_target_job(profile_id, TargetJobSelector::Id(id), &TargetJobPatch::default())
            .await
    }

    async fn find_target_job_by_key(
        &self,
        profile_id: Uuid,
        job_key: &str,
    ) -> StoreResult<Option<TargetJobRecord>> {
        self.patch_target_job(
            profile_id,
            TargetJobSelector::Key(job_key),
            &TargetJobPatch::default(),
        )
        .await
    }

    async fn create_target_job(
        &self,
        profile_id: Uuid,
        seed: TargetJobSeed,
    ) -> StoreResult<TargetJobRecord> {
        let record = TargetJobRecord::new(None, seed);
        sqlx::query_as::<_, TargetJobRow>(
            r#"
            INSERT INTO target_jobs (id, user_id, title, description, company, analysis_status)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(profile_id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.company)
        .bind(to_text(&record.analysis_status)?)
        .fetch_one(&self.pool)
        .await?
        .try_into()
    }

    async fn upsert_target_job(
        &self,
        profile_id: Uuid,
        job_key: &str,
        seed: TargetJobSeed,
        patch: &TargetJobPatch,
    ) -> StoreResult<TargetJobRecord> {
        let record = TargetJobRecord::new(Some(job_key.to_string()), seed);
        let inserted = sqlx::query(
            r#"
            INSERT INTO target_jobs
                (id, user_id, job_key, title, description, company, analysis_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, job_key) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(profile_id)
        .bind(job_key)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.company)
        .bind(to_text(&record.analysis_status)?)
        .execute(&self.pool)
        .await?
        .rows_affected();
        debug!("Target job upsert for {profile_id}/{job_key}: inserted={}", inserted > 0);

        self.patch_target_job(profile_id, TargetJobSelector::Key(job_key), patch)
            .await?
            .ok_or_else(|| StoreError::NotFound("Target job".to_string()))
    }

    async fn update_target_job(
        &self,
        profile_id: Uuid,
        id: Uuid,
        patch: &TargetJobPatch,
    ) -> StoreResult<Option<TargetJobRecord>> {
        self.patch_target_job(profile_id, TargetJobSelector::Id(id), patch)
            .await
    }

    async fn list_jobs(&self, filter: &JobFilter) -> StoreResult<Vec<JobPosting>> {
        let rows = sqlx::query_as::<_, JobRow>(
            r#"
            SELECT * FROM jobs
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR employment_type = $2)
              AND ($3::text IS NULL OR experience_level = $3)
              AND ($4::uuid IS NULL OR company_id = $4)
            ORDER BY created_at DESC
            "#,
        )
        .bind(opt_to_text(filter.status.as_ref())?)
        .bind(opt_to_text(filter.employment_type.as_ref())?)
        .bind(opt_to_text(filter.experience_level.as_ref())?)
        .bind(filter.company_id)
        .fetch_all(&self.pool)
        .await?;
        self.hydrate_jobs(rows).await
    }

    async fn find_job(&self, id: Uuid) -> StoreResult<Option<JobPosting>> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        self.hydrate_job(row).await
    }

    async fn record_job_view(&self, id: Uuid) -> StoreResult<Option<JobPosting>> {
        let row = sqlx::query_as::<_, JobRow>(
            "UPDATE jobs SET views = views + 1 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        self.hydrate_job(row).await
    }

    async fn create_job(&self, job: JobPosting) -> StoreResult<JobPosting> {
        sqlx::query(
            r#"
            INSERT INTO jobs
                (id, company_id, company_name, title, description, requirements, location,
                 employment_type, experience_level, salary, salary_range, status, views,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(job.id)
        .bind(job.company_id)
        .bind(&job.company_name)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.requirements)
        .bind(&job.location)
        .bind(to_text(&job.employment_type)?)
        .bind(opt_to_text(job.experience_level.as_ref())?)
        .bind(&job.salary)
        .bind(job.salary_range.clone().map(Json))
        .bind(to_text(&job.status)?)
        .bind(job.views)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(job)
    }

    async fn update_job(&self, id: Uuid, update: &JobUpdate) -> StoreResult<Option<JobPosting>> {
        let Some(mut job) = self.find_job(id).await? else {
            return Ok(None);
        };
        job.apply(update);
        self.write_job(&job).await?;
        Ok(Some(job))
    }

    async fn delete_job(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_applicant(&self, job_id: Uuid, user_id: Uuid) -> StoreResult<JobPosting> {
        if self.find_job(job_id).await?.is_none() {
            return Err(StoreError::NotFound("Job".to_string()));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO job_applicants (job_id, user_id, applied_at, status)
            VALUES ($1, $2, now(), $3)
            ON CONFLICT (job_id, user_id) DO NOTHING
            "#,
        )
        .bind(job_id)
        .bind(user_id)
        .bind(to_text(&ApplicantStatus::Applied)?)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if inserted == 0 {
            return Err(StoreError::Conflict(
                "You have already applied to this job".to_string(),
            ));
        }

        self.find_job(job_id)
            .await?
            .ok_or_else(|| StoreError::NotFound("Job".to_string()))
    }

    async fn update_applicant_status(
        &self,
        job_id: Uuid,
        user_id: Uuid,
        status: ApplicantStatus,
    ) -> StoreResult<JobPosting> {
        let updated = sqlx::query(
            "UPDATE job_applicants SET status = $3 WHERE job_id = $1 AND user_id = $2",
        )
        .bind(job_id)
        .bind(user_id)
        .bind(to_text(&status)?)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let job = self
            .find_job(job_id)
            .await?
            .ok_or_else(|| StoreError::NotFound("Job".to_string()))?;
        if updated == 0 {
            return Err(StoreError::NotFound("Applicant".to_string()));
        }
        Ok(job)
    }

    async fn find_company(&self, subject: &str) -> StoreResult<Option<Company>> {
        sqlx::query_as::<_, CompanyRow>("SELECT * FROM companies WHERE subject = $1")
            .bind(subject)
            .fetch_optional(&self.pool)
            .await?
            .map(Company::try_from)
            .transpose()
    }

    async fn create_company(&self, company: Company) -> StoreResult<Company> {
        let result = sqlx::query(
            r#"
            INSERT INTO companies
                (id, subject, company_name, email, website, description, logo, industry,
                 size, verified, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(company.id)
        .bind(&company.subject)
        .bind(&company.company_name)
        .bind(&company.email)
        .bind(&company.website)
        .bind(&company.description)
        .bind(&company.logo)
        .bind(&company.industry)
        .bind(opt_to_text(company.size.as_ref())?)
        .bind(company.verified)
        .bind(company.created_at)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(company),
            Err(e) if is_unique_violation(&e) => {
                Err(StoreError::Conflict("Company already registered".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update_company(
        &self,
        subject: &str,
        details: &CompanyDetails,
    ) -> StoreResult<Option<Company>> {
        let Some(mut company) = self.find_company(subject).await? else {
            return Ok(None);
        };
        company.apply(details);

        let result = sqlx::query(
            r#"
            UPDATE companies SET
                company_name = $2, website = $3, description = $4, logo = $5,
                industry = $6, size = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(company.id)
        .bind(&company.company_name)
        .bind(&company.website)
        .bind(&company.description)
        .bind(&company.logo)
        .bind(&company.industry)
        .bind(opt_to_text(company.size.as_ref())?)
        .bind(company.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(Some(company)),
            Err(e) if is_unique_violation(&e) => Err(StoreError::Conflict(
                "Company name already taken".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}
