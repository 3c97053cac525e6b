use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentType {
    #[default]
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Internship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobExperienceLevel {
    Entry,
    Mid,
    Senior,
    Lead,
}

impl JobExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobExperienceLevel::Entry => "Entry",
            JobExperienceLevel::Mid => "Mid",
            JobExperienceLevel::Senior => "Senior",
            JobExperienceLevel::Lead => "Lead",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    #[default]
    Active,
    Closed,
    Draft,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicantStatus {
    #[default]
    Applied,
    Reviewed,
    Shortlisted,
    Rejected,
    Hired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub user_id: Uuid,
    pub applied_at: DateTime<Utc>,
    pub status: ApplicantStatus,
}

/// A posting owned by a company. The analysis core only reads it, apart from
/// appending to `applicants`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: Option<String>,
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub employment_type: EmploymentType,
    pub experience_level: Option<JobExperienceLevel>,
    pub salary: Option<String>,
    pub salary_range: Option<SalaryRange>,
    pub status: JobStatus,
    pub applicants: Vec<Applicant>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobPosting {
    pub fn has_applicant(&self, user_id: Uuid) -> bool {
        self.applicants.iter().any(|a| a.user_id == user_id)
    }
}

/// Request body for creating a posting.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub location: Option<String>,
    #[serde(rename = "type", default)]
    pub employment_type: EmploymentType,
    pub experience_level: Option<JobExperienceLevel>,
    pub salary: Option<String>,
    pub salary_range: Option<SalaryRange>,
    #[serde(default)]
    pub status: JobStatus,
}

impl JobPosting {
    pub fn new(company_id: Uuid, company_name: Option<String>, new: NewJob) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            company_id,
            company_name,
            title: new.title,
            description: new.description,
            requirements: new.requirements,
            location: new.location,
            employment_type: new.employment_type,
            experience_level: new.experience_level,
            salary: new.salary,
            salary_range: new.salary_range,
            status: new.status,
            applicants: Vec::new(),
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, update: &JobUpdate) {
        if let Some(v) = &update.title {
            self.title = v.clone();
        }
        if let Some(v) = &update.description {
            self.description = v.clone();
        }
        if let Some(v) = &update.requirements {
            self.requirements = v.clone();
        }
        if let Some(v) = &update.location {
            self.location = Some(v.clone());
        }
        if let Some(v) = update.employment_type {
            self.employment_type = v;
        }
        if let Some(v) = update.experience_level {
            self.experience_level = Some(v);
        }
        if let Some(v) = &update.salary {
            self.salary = Some(v.clone());
        }
        if let Some(v) = &update.salary_range {
            self.salary_range = Some(v.clone());
        }
        if let Some(v) = update.status {
            self.status = v;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update of a posting. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub employment_type: Option<EmploymentType>,
    pub experience_level: Option<JobExperienceLevel>,
    pub salary: Option<String>,
    pub salary_range: Option<SalaryRange>,
    pub status: Option<JobStatus>,
}

/// Listing filter; every field narrows the result when present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    #[serde(rename = "type")]
    pub employment_type: Option<EmploymentType>,
    pub experience_level: Option<JobExperienceLevel>,
    pub company_id: Option<Uuid>,
}

impl JobFilter {
    pub fn matches(&self, job: &JobPosting) -> bool {
        self.status.map_or(true, |s| job.status == s)
            && self
                .employment_type
                .map_or(true, |t| job.employment_type == t)
            && self
                .experience_level
                .map_or(true, |l| job.experience_level == Some(l))
            && self.company_id.map_or(true, |c| job.company_id == c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job() -> NewJob {
        serde_json::from_str(r#"{"title": "Rust Engineer", "description": "Systems work"}"#)
            .unwrap()
    }

    #[test]
    fn test_new_job_defaults() {
        let job = JobPosting::new(Uuid::new_v4(), Some("Acme".to_string()), new_job());
        assert_eq!(job.employment_type, EmploymentType::FullTime);
        assert_eq!(job.status, JobStatus::Active);
        assert!(job.requirements.is_empty());
        assert!(job.applicants.is_empty());
    }

    #[test]
    fn test_employment_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&EmploymentType::PartTime).unwrap(),
            r#""Part-time""#
        );
        let parsed: EmploymentType = serde_json::from_str(r#""Full-time""#).unwrap();
        assert_eq!(parsed, EmploymentType::FullTime);
    }

    #[test]
    fn test_filter_matches_all_present_fields() {
        let company = Uuid::new_v4();
        let job = JobPosting::new(company, None, new_job());

        let filter = JobFilter {
            status: Some(JobStatus::Active),
            company_id: Some(company),
            ..Default::default()
        };
        assert!(filter.matches(&job));

        let filter = JobFilter {
            experience_level: Some(JobExperienceLevel::Lead),
            ..Default::default()
        };
        assert!(!filter.matches(&job));
    }

    #[test]
    fn test_salary_range_currency_defaults_to_usd() {
        let range: SalaryRange = serde_json::from_str(r#"{"min": 100000, "max": null}"#).unwrap();
        assert_eq!(range.currency, "USD");
    }
}
