//! Analysis orchestrator: one resume review or gap analysis per call.
//!
//! Every run is exactly one attempt. Steps are strictly sequential and the
//! only suspension points are the document fetch and the model call, each
//! bounded by its own deadline. Nothing here touches storage; callers decide
//! what to persist based on the returned `Result`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::prompts::{build_gap_analysis_prompt, build_resume_prompt, JobContext};
use crate::documents::TextExtractor;
use crate::llm_client::parser::{parse_model_response, ParseError};
use crate::llm_client::{LlmError, TextGenerator};
use crate::models::profile::{CandidateProfile, ResumeAnalysis, ResumeReview};
use crate::models::target_job::GapAnalysis;

/// Substituted for the resume text when the document cannot be read.
pub const EXTRACTION_FAILED_PLACEHOLDER: &str = "Could not extract resume text";

pub const DEFAULT_SIGNIFICANT_GAP_THRESHOLD: u8 = 60;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("model invocation failed: {0}")]
    Model(#[from] LlmError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("model call timed out after {secs}s")]
    Timeout { secs: u64 },
}

#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub model_call_timeout: Duration,
    /// A match strictly below this percentage is a significant gap.
    pub significant_gap_threshold: u8,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            model_call_timeout: Duration::from_secs(30),
            significant_gap_threshold: DEFAULT_SIGNIFICANT_GAP_THRESHOLD,
        }
    }
}

/// A gap analysis plus the derived, never-persisted significance flag.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GapAssessment {
    #[serde(flatten)]
    pub analysis: GapAnalysis,
    pub has_significant_gap: bool,
}

#[derive(Clone)]
pub struct Analyzer {
    generator: Arc<dyn TextGenerator>,
    extractor: Arc<dyn TextExtractor>,
    settings: AnalysisSettings,
}

impl Analyzer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        extractor: Arc<dyn TextExtractor>,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            generator,
            extractor,
            settings,
        }
    }

    /// Reviews the candidate's resume. An unreadable resume degrades to the
    /// self-reported profile instead of failing the run.
    pub async fn run_resume_analysis(
        &self,
        profile: &CandidateProfile,
    ) -> Result<ResumeAnalysis, AnalysisError> {
        let extracted = match profile.resume.as_deref() {
            Some(uri) if !uri.trim().is_empty() => match self.extractor.extract(uri).await {
                Ok(text) => {
                    info!("Extracted resume text length: {}", text.len());
                    Some(text)
                }
                Err(e) => {
                    warn!("Resume extraction failed for {}: {e}", profile.subject);
                    Some(EXTRACTION_FAILED_PLACEHOLDER.to_string())
                }
            },
            _ => None,
        };

        let prompt = build_resume_prompt(profile, extracted.as_deref());
        let raw = self.invoke(&prompt).await?;
        let review: ResumeReview = parse_model_response(&raw).map_err(|e| {
            warn!("Rejected resume analysis for {}: {e}", profile.subject);
            e
        })?;

        Ok(ResumeAnalysis {
            review,
            analyzed_at: Utc::now(),
        })
    }

    /// Compares the candidate against a job. Uses the prior resume analysis as
    /// evidence; the resume document itself is not re-read.
    pub async fn run_gap_analysis(
        &self,
        profile: &CandidateProfile,
        job: &JobContext,
        prior: Option<&ResumeAnalysis>,
    ) -> Result<GapAssessment, AnalysisError> {
        let prompt = build_gap_analysis_prompt(profile, job, prior);
        let raw = self.invoke(&prompt).await?;
        let analysis: GapAnalysis = parse_model_response(&raw).map_err(|e| {
            warn!("Rejected gap analysis for {} / {}: {e}", profile.subject, job.title);
            e
        })?;

        let has_significant_gap = self.is_significant_gap(analysis.match_percentage.value());
        info!(
            "Gap analysis for {} / {}: {}% match, significant gap: {}",
            profile.subject,
            job.title,
            analysis.match_percentage.value(),
            has_significant_gap
        );

        Ok(GapAssessment {
            analysis,
            has_significant_gap,
        })
    }

    pub fn is_significant_gap(&self, match_percentage: u8) -> bool {
        match_percentage < self.settings.significant_gap_threshold
    }

    async fn invoke(&self, prompt: &str) -> Result<String, AnalysisError> {
        let deadline = self.settings.model_call_timeout;
        match tokio::time::timeout(deadline, self.generator.generate(prompt)).await {
            Ok(result) => Ok(result?),
            Err(_) => {
                warn!("Model call exceeded {}s deadline", deadline.as_secs());
                Err(AnalysisError::Timeout {
                    secs: deadline.as_secs(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        gap_analysis_json, resume_review_json, sample_profile, FakeExtractor, FakeGenerator,
    };

    fn analyzer(generator: FakeGenerator, extractor: FakeExtractor) -> Analyzer {
        Analyzer::new(
            Arc::new(generator),
            Arc::new(extractor),
            AnalysisSettings::default(),
        )
    }

    fn job() -> JobContext {
        JobContext {
            title: "Backend Engineer".to_string(),
            company: Some("Acme".to_string()),
            experience_level: None,
            description: "APIs".to_string(),
            requirements: vec!["Rust".to_string()],
        }
    }

    #[tokio::test]
    async fn test_resume_analysis_uses_extracted_text() {
        let generator = FakeGenerator::replying(&resume_review_json());
        let prompts = generator.prompts();
        let mut profile = sample_profile();
        profile.resume = Some("https://example.com/cv.pdf".to_string());

        let analysis = analyzer(generator, FakeExtractor::text("Jane Doe, Rust"))
            .run_resume_analysis(&profile)
            .await
            .unwrap();

        assert_eq!(analysis.review.skills_review.strong[0].skill, "Rust");
        assert!(prompts.lock().unwrap()[0].contains("Jane Doe, Rust"));
    }

    #[tokio::test]
    async fn test_unreachable_resume_degrades_instead_of_failing() {
        let generator = FakeGenerator::replying(&resume_review_json());
        let prompts = generator.prompts();
        let mut profile = sample_profile();
        profile.resume = Some("http://127.0.0.1:1/cv.pdf".to_string());

        let result = analyzer(generator, FakeExtractor::failing())
            .run_resume_analysis(&profile)
            .await;

        assert!(result.is_ok());
        assert!(prompts.lock().unwrap()[0].contains(EXTRACTION_FAILED_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_resume_analysis_without_resume_skips_extraction() {
        let generator = FakeGenerator::replying(&resume_review_json());
        let prompts = generator.prompts();
        let extractor = FakeExtractor::text("never read");
        let calls = extractor.calls();

        analyzer(generator, extractor)
            .run_resume_analysis(&sample_profile())
            .await
            .unwrap();

        assert_eq!(*calls.lock().unwrap(), 0);
        assert!(prompts.lock().unwrap()[0].contains("No resume text provided"));
    }

    #[tokio::test]
    async fn test_prose_reply_is_parse_error() {
        let generator = FakeGenerator::replying("Sure! Here's the analysis: {}");
        let result = analyzer(generator, FakeExtractor::failing())
            .run_resume_analysis(&sample_profile())
            .await;
        assert!(matches!(result, Err(AnalysisError::Parse(_))));
    }

    #[tokio::test]
    async fn test_model_failure_is_model_error() {
        let result = analyzer(FakeGenerator::failing(), FakeExtractor::failing())
            .run_gap_analysis(&sample_profile(), &job(), None)
            .await;
        assert!(matches!(result, Err(AnalysisError::Model(_))));
    }

    #[tokio::test]
    async fn test_gap_analysis_threshold_is_strict() {
        let below = analyzer(
            FakeGenerator::replying(&gap_analysis_json(59)),
            FakeExtractor::failing(),
        )
        .run_gap_analysis(&sample_profile(), &job(), None)
        .await
        .unwrap();
        assert!(below.has_significant_gap);

        let at = analyzer(
            FakeGenerator::replying(&gap_analysis_json(60)),
            FakeExtractor::failing(),
        )
        .run_gap_analysis(&sample_profile(), &job(), None)
        .await
        .unwrap();
        assert!(!at.has_significant_gap);
    }

    #[tokio::test]
    async fn test_configured_threshold_is_used() {
        let analyzer = Analyzer::new(
            Arc::new(FakeGenerator::replying(&gap_analysis_json(70))),
            Arc::new(FakeExtractor::failing()),
            AnalysisSettings {
                significant_gap_threshold: 75,
                ..Default::default()
            },
        );
        let assessment = analyzer
            .run_gap_analysis(&sample_profile(), &job(), None)
            .await
            .unwrap();
        assert!(assessment.has_significant_gap);
    }

    #[tokio::test]
    async fn test_out_of_range_match_percentage_is_rejected() {
        let raw = gap_analysis_json(60).replace("\"matchPercentage\": 60", "\"matchPercentage\": 140");
        let result = analyzer(FakeGenerator::replying(&raw), FakeExtractor::failing())
            .run_gap_analysis(&sample_profile(), &job(), None)
            .await;
        assert!(matches!(result, Err(AnalysisError::Parse(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_model_call_times_out() {
        let generator = FakeGenerator::replying(&gap_analysis_json(80))
            .with_delay(Duration::from_secs(120));
        let analyzer = Analyzer::new(
            Arc::new(generator),
            Arc::new(FakeExtractor::failing()),
            AnalysisSettings {
                model_call_timeout: Duration::from_secs(30),
                ..Default::default()
            },
        );

        let result = analyzer
            .run_gap_analysis(&sample_profile(), &job(), None)
            .await;
        assert!(matches!(result, Err(AnalysisError::Timeout { secs: 30 })));
    }

    #[test]
    fn test_assessment_serializes_flat() {
        let analysis: GapAnalysis = serde_json::from_str(&gap_analysis_json(42)).unwrap();
        let value = serde_json::to_value(GapAssessment {
            analysis,
            has_significant_gap: true,
        })
        .unwrap();
        assert_eq!(value["matchPercentage"], 42);
        assert_eq!(value["hasSignificantGap"], true);
    }
}
