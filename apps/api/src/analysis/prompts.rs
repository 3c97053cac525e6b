// Prompt templates for resume review and skill-gap analysis.
// Placeholders are `{name}` tokens filled by `fill_template` in one pass, so
// text pasted from a resume can never be mistaken for another placeholder.

use crate::llm_client::prompts::JSON_ONLY_FOOTER;
use crate::models::job::JobPosting;
use crate::models::profile::{CandidateProfile, ResumeAnalysis};
use crate::models::target_job::TargetJobRecord;

pub const NO_RESUME_TEXT: &str = "No resume text provided";
pub const NO_SKILLS: &str = "None specified";
pub const NOT_PROVIDED: &str = "Not provided";
pub const NOT_SPECIFIED: &str = "Not specified";
pub const NOT_ANALYZED: &str = "Not analyzed";

/// Resume review prompt. Fill `{resume_text}`, `{skills}`,
/// `{experience_level}`, `{portfolio}`, `{github}` and `{footer}`.
pub const RESUME_PROMPT_TEMPLATE: &str = r#"You are an expert technical recruiter and career coach. Analyze the following resume/profile comprehensively.

**Resume Content:**
{resume_text}

**User's Self-Reported Skills:**
{skills}

**Experience Level:** {experience_level}
**Portfolio:** {portfolio}
**GitHub:** {github}

**Task:**
Provide a detailed analysis in valid JSON format with this EXACT structure:

{
  "skillsReview": {
    "strong": [
      {"skill": "string", "evidence": "string"}
    ],
    "weak": [
      {"skill": "string", "reason": "string"}
    ],
    "toImprove": [
      {"skill": "string", "current": "string", "target": "string"}
    ]
  },
  "projectsReview": [
    {
      "projectName": "string",
      "description": "string",
      "strong": ["string"],
      "weak": ["string"],
      "toImprove": ["string"],
      "skillsDemonstrated": ["string"]
    }
  ],
  "overallAssessment": {
    "strengths": ["string"],
    "weaknesses": ["string"],
    "careerLevel": "string",
    "recommendations": ["string"]
  }
}

Analyze the resume content carefully. Extract all projects, work experience, and skills demonstrated. Be specific and provide evidence from the resume.

{footer}"#;

/// Gap analysis prompt. Fill `{job_title}`, `{job_company}`,
/// `{job_experience_level}`, `{job_description}`, `{job_requirements}`,
/// `{experience_level}`, `{skills}`, `{strong_skills}`, `{weak_skills}` and
/// `{footer}`.
pub const GAP_ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are an expert technical recruiter specializing in skill gap analysis. Compare a candidate's profile against a job description to identify gaps and provide actionable recommendations.

**Context:**
- This is for a user trying to determine if they're ready for a role
- Be honest but constructive
- Provide specific, actionable guidance

**Job Posting:**
Title: {job_title}
Company: {job_company}
Experience Level: {job_experience_level}

Description:
{job_description}

Requirements:
{job_requirements}

**Candidate Profile:**
Experience Level: {experience_level}
Skills: {skills}

Resume Analysis - Strong Skills: {strong_skills}
Resume Analysis - Weak Skills: {weak_skills}

**Task:**
Provide a comprehensive gap analysis in valid JSON format with this EXACT structure:

{
  "matchPercentage": 0-100,
  "matchSummary": "string (2-3 sentences)",
  "strengths": [
    {
      "skill": "string",
      "evidence": "string",
      "relevance": "string"
    }
  ],
  "criticalGaps": [
    {
      "requirement": "string",
      "priority": "Critical|High|Medium",
      "impact": "string",
      "difficulty": "Easy|Medium|Hard"
    }
  ],
  "proficiencyGaps": [
    {
      "skill": "string",
      "userLevel": "string",
      "requiredLevel": "string",
      "evidence": "string"
    }
  ],
  "recommendedActions": [
    {
      "action": "string",
      "skill": "string",
      "estimatedTime": "string",
      "priority": 1-5,
      "resources": ["string"]
    }
  ],
  "timelineAssessment": {
    "estimatedTimeToReady": "string",
    "confidence": "High|Medium|Low",
    "assumptions": "string"
  }
}

Be realistic about matchPercentage. Identify concrete gaps and provide specific resources.

{footer}"#;

/// The job side of a gap analysis. Either a full posting or the
/// title/description/company a candidate typed in by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct JobContext {
    pub title: String,
    pub company: Option<String>,
    pub experience_level: Option<String>,
    pub description: String,
    pub requirements: Vec<String>,
}

impl From<&JobPosting> for JobContext {
    fn from(job: &JobPosting) -> Self {
        Self {
            title: job.title.clone(),
            company: job.company_name.clone(),
            experience_level: job.experience_level.map(|l| l.as_str().to_string()),
            description: job.description.clone(),
            requirements: job.requirements.clone(),
        }
    }
}

impl From<&TargetJobRecord> for JobContext {
    fn from(record: &TargetJobRecord) -> Self {
        Self {
            title: record.title.clone(),
            company: record.company.clone(),
            experience_level: None,
            description: record.description.clone(),
            requirements: Vec::new(),
        }
    }
}

pub fn build_resume_prompt(profile: &CandidateProfile, extracted_text: Option<&str>) -> String {
    let resume_text = non_blank(extracted_text).unwrap_or(NO_RESUME_TEXT);
    let skills = join_or(&profile.skills, NO_SKILLS);
    let experience_level = profile.experience_level.as_str();
    let portfolio = non_blank(profile.portfolio.as_deref()).unwrap_or(NOT_PROVIDED);
    let github = non_blank(profile.github_profile.as_deref()).unwrap_or(NOT_PROVIDED);

    fill_template(
        RESUME_PROMPT_TEMPLATE,
        &[
            ("resume_text", resume_text),
            ("skills", skills.as_str()),
            ("experience_level", experience_level),
            ("portfolio", portfolio),
            ("github", github),
            ("footer", JSON_ONLY_FOOTER),
        ],
    )
}

pub fn build_gap_analysis_prompt(
    profile: &CandidateProfile,
    job: &JobContext,
    prior: Option<&ResumeAnalysis>,
) -> String {
    let (strong_skills, weak_skills) = match prior {
        Some(analysis) => (
            join_or(&analysis.strong_skill_names(), NOT_ANALYZED),
            join_or(&analysis.weak_skill_names(), NOT_ANALYZED),
        ),
        None => (NOT_ANALYZED.to_string(), NOT_ANALYZED.to_string()),
    };

    let company = non_blank(job.company.as_deref()).unwrap_or(NOT_SPECIFIED);
    let job_experience_level = non_blank(job.experience_level.as_deref()).unwrap_or(NOT_SPECIFIED);
    let requirements = join_or(&job.requirements, NOT_SPECIFIED);
    let skills = join_or(&profile.skills, NO_SKILLS);

    fill_template(
        GAP_ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("job_title", job.title.as_str()),
            ("job_company", company),
            ("job_experience_level", job_experience_level),
            ("job_description", job.description.as_str()),
            ("job_requirements", requirements.as_str()),
            ("experience_level", profile.experience_level.as_str()),
            ("skills", skills.as_str()),
            ("strong_skills", strong_skills.as_str()),
            ("weak_skills", weak_skills.as_str()),
            ("footer", JSON_ONLY_FOOTER),
        ],
    )
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn join_or<S: AsRef<str>>(items: &[S], fallback: &str) -> String {
    if items.is_empty() {
        return fallback.to_string();
    }
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Replaces every known `{name}` token in a single left-to-right pass.
/// Unknown tokens (the JSON schema braces) are copied through untouched.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 1024);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let replacement = after.find('}').and_then(|end| {
            let name = &after[..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (end, *value))
        });
        match replacement {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::{JobExperienceLevel, NewJob};
    use crate::models::profile::{
        ExperienceLevel, NewProfile, OverallAssessment, ResumeReview, SkillsReview, StrongSkill,
        WeakSkill,
    };
    use crate::models::target_job::TargetJobSeed;
    use chrono::Utc;
    use uuid::Uuid;

    fn profile() -> CandidateProfile {
        let mut profile = CandidateProfile::new(NewProfile {
            subject: "user_1".to_string(),
            email: "dev@example.com".to_string(),
            full_name: Some("Dev".to_string()),
            username: None,
        });
        profile.skills = vec!["Rust".to_string(), "SQL".to_string(), "Rust".to_string()];
        profile.experience_level = ExperienceLevel::Intermediate;
        profile.github_profile = Some("https://github.com/dev".to_string());
        profile
    }

    fn prior_analysis() -> ResumeAnalysis {
        ResumeAnalysis {
            review: ResumeReview {
                skills_review: SkillsReview {
                    strong: vec![StrongSkill {
                        skill: "Rust".to_string(),
                        evidence: "Built a queue".to_string(),
                    }],
                    weak: vec![WeakSkill {
                        skill: "Kubernetes".to_string(),
                        reason: "No evidence".to_string(),
                    }],
                    to_improve: vec![],
                },
                projects_review: vec![],
                overall_assessment: OverallAssessment {
                    strengths: vec![],
                    weaknesses: vec![],
                    career_level: "Mid".to_string(),
                    recommendations: vec![],
                },
            },
            analyzed_at: Utc::now(),
        }
    }

    fn posting() -> JobPosting {
        JobPosting::new(
            Uuid::new_v4(),
            Some("Acme".to_string()),
            NewJob {
                title: "Backend Engineer".to_string(),
                description: "Build APIs".to_string(),
                requirements: vec!["Rust".to_string(), "Postgres".to_string()],
                location: None,
                employment_type: Default::default(),
                experience_level: Some(JobExperienceLevel::Mid),
                salary: None,
                salary_range: None,
                status: Default::default(),
            },
        )
    }

    #[test]
    fn test_resume_prompt_embeds_profile_fields() {
        let prompt = build_resume_prompt(&profile(), Some("Jane Doe\nRust engineer"));
        assert!(prompt.contains("**Resume Content:**\nJane Doe\nRust engineer"));
        assert!(prompt.contains("Rust, SQL, Rust"));
        assert!(prompt.contains("**Experience Level:** Intermediate"));
        assert!(prompt.contains("**Portfolio:** Not provided"));
        assert!(prompt.contains("**GitHub:** https://github.com/dev"));
        assert!(prompt.contains("\"skillsReview\""));
        assert!(prompt.ends_with(JSON_ONLY_FOOTER));
    }

    #[test]
    fn test_resume_prompt_uses_sentinels_when_empty() {
        let mut p = profile();
        p.skills.clear();
        let prompt = build_resume_prompt(&p, None);
        assert!(prompt.contains(NO_RESUME_TEXT));
        assert!(prompt.contains(&format!("**User's Self-Reported Skills:**\n{NO_SKILLS}")));
    }

    #[test]
    fn test_resume_prompt_is_deterministic() {
        let p = profile();
        assert_eq!(
            build_resume_prompt(&p, Some("text")),
            build_resume_prompt(&p, Some("text"))
        );
    }

    #[test]
    fn test_resume_text_cannot_inject_placeholders() {
        let prompt = build_resume_prompt(&profile(), Some("I like {skills} and {footer}"));
        assert!(prompt.contains("I like {skills} and {footer}"));
    }

    #[test]
    fn test_gap_prompt_without_prior_analysis_says_not_analyzed() {
        let job = JobContext::from(&posting());
        let prompt = build_gap_analysis_prompt(&profile(), &job, None);
        assert!(prompt.contains("Resume Analysis - Strong Skills: Not analyzed"));
        assert!(prompt.contains("Resume Analysis - Weak Skills: Not analyzed"));
        assert!(prompt.contains("Title: Backend Engineer"));
        assert!(prompt.contains("Company: Acme"));
        assert!(prompt.contains("Experience Level: Mid"));
        assert!(prompt.contains("Requirements:\nRust, Postgres"));
        assert!(prompt.contains("\"matchPercentage\": 0-100"));
    }

    #[test]
    fn test_gap_prompt_with_prior_analysis_lists_skills() {
        let job = JobContext::from(&posting());
        let prior = prior_analysis();
        let prompt = build_gap_analysis_prompt(&profile(), &job, Some(&prior));
        assert!(prompt.contains("Resume Analysis - Strong Skills: Rust"));
        assert!(prompt.contains("Resume Analysis - Weak Skills: Kubernetes"));
    }

    #[test]
    fn test_gap_prompt_for_free_standing_target_job() {
        let record = TargetJobRecord::new(
            None,
            TargetJobSeed {
                title: "Data Engineer".to_string(),
                description: "Pipelines".to_string(),
                company: None,
            },
        );
        let prompt = build_gap_analysis_prompt(&profile(), &JobContext::from(&record), None);
        assert!(prompt.contains("Company: Not specified"));
        assert!(prompt.contains("Experience Level: Not specified"));
        assert!(prompt.contains("Requirements:\nNot specified"));
    }

    #[test]
    fn test_fill_template_leaves_unknown_braces() {
        let out = fill_template("{ \"a\": {x} } {y", &[("x", "1")]);
        assert_eq!(out, "{ \"a\": 1 } {y");
    }
}
