use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Self-reported seniority of a candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExperienceLevel {
    #[default]
    Beginner,
    Intermediate,
    Senior,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Beginner => "Beginner",
            ExperienceLevel::Intermediate => "Intermediate",
            ExperienceLevel::Senior => "Senior",
        }
    }
}

impl fmt::Display for ExperienceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    #[default]
    User,
    Company,
}

/// A candidate account. `subject` is the opaque key handed to us by the
/// identity provider; `id` is our own stable identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateProfile {
    pub id: Uuid,
    pub subject: String,
    pub email: String,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub role: AccountRole,
    pub profile_completed: bool,
    /// URI of the uploaded resume document.
    pub resume: Option<String>,
    pub github_id: Option<String>,
    pub github_profile: Option<String>,
    pub linkedin_profile: Option<String>,
    pub portfolio: Option<String>,
    pub skills: Vec<String>,
    pub experience_level: ExperienceLevel,
    pub resume_analysis: Option<ResumeAnalysis>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when a profile is first synced from the identity provider.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub subject: String,
    pub email: String,
    pub full_name: Option<String>,
    pub username: Option<String>,
}

impl CandidateProfile {
    pub fn new(new: NewProfile) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            subject: new.subject,
            email: new.email,
            full_name: new.full_name,
            username: new.username,
            role: AccountRole::User,
            profile_completed: false,
            resume: None,
            github_id: None,
            github_profile: None,
            linkedin_profile: None,
            portfolio: None,
            skills: Vec::new(),
            experience_level: ExperienceLevel::default(),
            resume_analysis: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a profile update. `None` leaves the stored value untouched.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(v) = &update.full_name {
            self.full_name = Some(v.clone());
        }
        if let Some(v) = &update.username {
            self.username = Some(v.clone());
        }
        if let Some(v) = &update.resume {
            self.resume = Some(v.clone());
        }
        if let Some(v) = &update.github_id {
            self.github_id = Some(v.clone());
        }
        if let Some(v) = &update.github_profile {
            self.github_profile = Some(v.clone());
        }
        if let Some(v) = &update.linkedin_profile {
            self.linkedin_profile = Some(v.clone());
        }
        if let Some(v) = &update.portfolio {
            self.portfolio = Some(v.clone());
        }
        if let Some(v) = &update.skills {
            self.skills = v.clone();
        }
        if let Some(v) = update.experience_level {
            self.experience_level = v;
        }
        if let Some(v) = update.profile_completed {
            self.profile_completed = v;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial profile update as accepted by `PUT /api/users/profile`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub resume: Option<String>,
    pub github_id: Option<String>,
    pub github_profile: Option<String>,
    pub linkedin_profile: Option<String>,
    pub portfolio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience_level: Option<ExperienceLevel>,
    pub profile_completed: Option<bool>,
}

// ────────────────────────────────────────────────────────────────────────────
// Resume analysis
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrongSkill {
    pub skill: String,
    pub evidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakSkill {
    pub skill: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillTarget {
    pub skill: String,
    pub current: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillsReview {
    pub strong: Vec<StrongSkill>,
    pub weak: Vec<WeakSkill>,
    pub to_improve: Vec<SkillTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectReview {
    pub project_name: String,
    pub description: String,
    pub strong: Vec<String>,
    pub weak: Vec<String>,
    pub to_improve: Vec<String>,
    pub skills_demonstrated: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallAssessment {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub career_level: String,
    pub recommendations: Vec<String>,
}

/// The shape the model is asked to return for a resume review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeReview {
    pub skills_review: SkillsReview,
    pub projects_review: Vec<ProjectReview>,
    pub overall_assessment: OverallAssessment,
}

/// A stored resume review. Each successful run replaces the previous one whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeAnalysis {
    #[serde(flatten)]
    pub review: ResumeReview,
    pub analyzed_at: DateTime<Utc>,
}

impl ResumeAnalysis {
    pub fn strong_skill_names(&self) -> Vec<&str> {
        self.review
            .skills_review
            .strong
            .iter()
            .map(|s| s.skill.as_str())
            .collect()
    }

    pub fn weak_skill_names(&self) -> Vec<&str> {
        self.review
            .skills_review
            .weak
            .iter()
            .map(|s| s.skill.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experience_level_default_is_beginner() {
        assert_eq!(ExperienceLevel::default(), ExperienceLevel::Beginner);
    }

    #[test]
    fn test_experience_level_rejects_unknown_value() {
        let result: Result<ExperienceLevel, _> = serde_json::from_str(r#""Expert""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_resume_analysis_serializes_flat_camel_case() {
        let analysis = ResumeAnalysis {
            review: ResumeReview {
                skills_review: SkillsReview {
                    strong: vec![StrongSkill {
                        skill: "Rust".to_string(),
                        evidence: "Built a compiler".to_string(),
                    }],
                    weak: vec![],
                    to_improve: vec![],
                },
                projects_review: vec![],
                overall_assessment: OverallAssessment {
                    strengths: vec![],
                    weaknesses: vec![],
                    career_level: "Junior".to_string(),
                    recommendations: vec![],
                },
            },
            analyzed_at: Utc::now(),
        };

        let value = serde_json::to_value(&analysis).unwrap();
        assert!(value.get("skillsReview").is_some());
        assert!(value.get("projectsReview").is_some());
        assert!(value.get("analyzedAt").is_some());
        assert!(value["skillsReview"].get("toImprove").is_some());
        assert_eq!(analysis.strong_skill_names(), vec!["Rust"]);
    }

    #[test]
    fn test_apply_update_leaves_unset_fields_alone() {
        let mut profile = CandidateProfile::new(NewProfile {
            subject: "user_1".to_string(),
            email: "a@example.com".to_string(),
            full_name: Some("Ada".to_string()),
            username: None,
        });
        profile.apply(&ProfileUpdate {
            skills: Some(vec!["Go".to_string(), "Go".to_string()]),
            experience_level: Some(ExperienceLevel::Senior),
            ..Default::default()
        });

        assert_eq!(profile.full_name.as_deref(), Some("Ada"));
        assert_eq!(profile.skills, vec!["Go", "Go"]);
        assert_eq!(profile.experience_level, ExperienceLevel::Senior);
    }
}
