use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a target job's gap analysis. Failed is not terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// Integer match score, 0 – 100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct MatchPercentage(u8);

impl MatchPercentage {
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for MatchPercentage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 100 {
            return Err(format!("matchPercentage {value} is outside 0-100"));
        }
        Ok(Self(value))
    }
}

impl From<MatchPercentage> for u8 {
    fn from(value: MatchPercentage) -> Self {
        value.0
    }
}

/// Action priority, 1 (most urgent) – 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ActionPriority(u8);

impl ActionPriority {
    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for ActionPriority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if !(1..=5).contains(&value) {
            return Err(format!("action priority {value} is outside 1-5"));
        }
        Ok(Self(value))
    }
}

impl From<ActionPriority> for u8 {
    fn from(value: ActionPriority) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GapPriority {
    Critical,
    High,
    Medium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillStrength {
    pub skill: String,
    pub evidence: String,
    pub relevance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalGap {
    pub requirement: String,
    pub priority: GapPriority,
    pub impact: String,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProficiencyGap {
    pub skill: String,
    pub user_level: String,
    pub required_level: String,
    pub evidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedAction {
    pub action: String,
    pub skill: String,
    pub estimated_time: String,
    pub priority: ActionPriority,
    pub resources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineAssessment {
    pub estimated_time_to_ready: String,
    pub confidence: Confidence,
    pub assumptions: String,
}

/// The seven fields a gap analysis produces. This is also the exact shape the
/// model is asked to return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapAnalysis {
    pub match_percentage: MatchPercentage,
    pub match_summary: String,
    pub strengths: Vec<SkillStrength>,
    pub critical_gaps: Vec<CriticalGap>,
    pub proficiency_gaps: Vec<ProficiencyGap>,
    pub recommended_actions: Vec<RecommendedAction>,
    pub timeline_assessment: TimelineAssessment,
}

/// A job a candidate is tracking, with its own analysis state.
///
/// `job_id` is the job reference key: it usually names a `JobPosting`, but may
/// be absent for a free-standing title/description/company triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetJobRecord {
    pub id: Uuid,
    pub job_id: Option<String>,
    pub title: String,
    pub description: String,
    pub company: Option<String>,
    pub analysis_status: AnalysisStatus,
    /// Legacy flat gap list, only written through the manual status endpoint.
    pub skill_gaps: Vec<String>,
    pub match_percentage: Option<MatchPercentage>,
    pub match_summary: Option<String>,
    pub strengths: Vec<SkillStrength>,
    pub critical_gaps: Vec<CriticalGap>,
    pub proficiency_gaps: Vec<ProficiencyGap>,
    pub recommended_actions: Vec<RecommendedAction>,
    pub timeline_assessment: Option<TimelineAssessment>,
    pub analyzed_at: Option<DateTime<Utc>>,
    /// Incremented on every write; lets callers notice interleaved writers.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Base fields used when a target job record is created.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TargetJobSeed {
    pub title: String,
    pub description: String,
    pub company: Option<String>,
}

/// Field-level overwrite for a target job. Every present field replaces the
/// stored value wholesale; nothing is appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetJobPatch {
    pub analysis_status: Option<AnalysisStatus>,
    pub analysis: Option<GapAnalysis>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub skill_gaps: Option<Vec<String>>,
}

impl TargetJobPatch {
    pub fn status(status: AnalysisStatus) -> Self {
        Self {
            analysis_status: Some(status),
            ..Default::default()
        }
    }

    pub fn completed(analysis: GapAnalysis, analyzed_at: DateTime<Utc>) -> Self {
        Self {
            analysis_status: Some(AnalysisStatus::Completed),
            analysis: Some(analysis),
            analyzed_at: Some(analyzed_at),
            skill_gaps: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.analysis_status.is_none()
            && self.analysis.is_none()
            && self.analyzed_at.is_none()
            && self.skill_gaps.is_none()
    }
}

impl TargetJobRecord {
    pub fn new(job_id: Option<String>, seed: TargetJobSeed) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            job_id,
            title: seed.title,
            description: seed.description,
            company: seed.company,
            analysis_status: AnalysisStatus::Pending,
            skill_gaps: Vec::new(),
            match_percentage: None,
            match_summary: None,
            strengths: Vec::new(),
            critical_gaps: Vec::new(),
            proficiency_gaps: Vec::new(),
            recommended_actions: Vec::new(),
            timeline_assessment: None,
            analyzed_at: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a patch in place. An empty patch is a no-op and does not bump
    /// the revision.
    pub fn apply(&mut self, patch: &TargetJobPatch) {
        if patch.is_empty() {
            return;
        }
        if let Some(status) = patch.analysis_status {
            self.analysis_status = status;
        }
        if let Some(analysis) = &patch.analysis {
            self.match_percentage = Some(analysis.match_percentage);
            self.match_summary = Some(analysis.match_summary.clone());
            self.strengths = analysis.strengths.clone();
            self.critical_gaps = analysis.critical_gaps.clone();
            self.proficiency_gaps = analysis.proficiency_gaps.clone();
            self.recommended_actions = analysis.recommended_actions.clone();
            self.timeline_assessment = Some(analysis.timeline_assessment.clone());
        }
        if let Some(at) = patch.analyzed_at {
            self.analyzed_at = Some(at);
        }
        if let Some(gaps) = &patch.skill_gaps {
            self.skill_gaps = gaps.clone();
        }
        self.revision += 1;
        self.updated_at = Utc::now();
    }

    /// Returns the stored analysis if the record is Completed.
    pub fn completed_analysis(&self) -> Option<GapAnalysis> {
        if self.analysis_status != AnalysisStatus::Completed {
            return None;
        }
        Some(GapAnalysis {
            match_percentage: self.match_percentage?,
            match_summary: self.match_summary.clone()?,
            strengths: self.strengths.clone(),
            critical_gaps: self.critical_gaps.clone(),
            proficiency_gaps: self.proficiency_gaps.clone(),
            recommended_actions: self.recommended_actions.clone(),
            timeline_assessment: self.timeline_assessment.clone()?,
        })
    }
}
