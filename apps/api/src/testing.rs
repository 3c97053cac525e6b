//! Fakes and fixtures shared by unit and router tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

use crate::analysis::orchestrator::{AnalysisSettings, Analyzer};
use crate::config::Config;
use crate::documents::{ExtractionError, TextExtractor};
use crate::llm_client::{LlmError, TextGenerator};
use crate::models::profile::{CandidateProfile, ExperienceLevel, NewProfile};
use crate::state::AppState;
use crate::store::MemoryStore;

/// An S3 client that is never expected to reach the network.
pub fn offline_s3_client() -> aws_sdk_s3::Client {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("test", "test", None, None, "tests"))
        .endpoint_url("http://127.0.0.1:1")
        .force_path_style(true)
        .retry_config(RetryConfig::disabled())
        .build();
    aws_sdk_s3::Client::from_conf(config)
}

#[derive(Clone)]
enum Reply {
    Text(String),
    Fail(String),
}

/// Canned-text model. Replies are consumed in order; the last one repeats.
#[derive(Clone)]
pub struct FakeGenerator {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    last: Arc<Mutex<Reply>>,
    delay: Option<Duration>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeGenerator {
    fn with_replies(replies: Vec<Reply>) -> Self {
        let last = replies
            .last()
            .cloned()
            .unwrap_or_else(|| Reply::Fail("no reply configured".to_string()));
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            last: Arc::new(Mutex::new(last)),
            delay: None,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with_replies(vec![Reply::Text(text.to_string())])
    }

    pub fn failing() -> Self {
        Self::with_replies(vec![Reply::Fail("model overloaded".to_string())])
    }

    /// Fails once, then replies with `text` from then on.
    pub fn failing_then(text: &str) -> Self {
        Self::with_replies(vec![
            Reply::Fail("model overloaded".to_string()),
            Reply::Text(text.to_string()),
        ])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        self.prompts.clone()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = {
            let mut replies = self.replies.lock().unwrap();
            match replies.pop_front() {
                Some(reply) => {
                    *self.last.lock().unwrap() = reply.clone();
                    reply
                }
                None => self.last.lock().unwrap().clone(),
            }
        };
        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Fail(message) => Err(LlmError::Api {
                status: 503,
                message,
            }),
        }
    }
}

#[derive(Clone)]
pub struct FakeExtractor {
    text: Option<String>,
    calls: Arc<Mutex<usize>>,
}

impl FakeExtractor {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            text: None,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<Mutex<usize>> {
        self.calls.clone()
    }
}

#[async_trait]
impl TextExtractor for FakeExtractor {
    async fn extract(&self, uri: &str) -> Result<String, ExtractionError> {
        *self.calls.lock().unwrap() += 1;
        self.text
            .clone()
            .ok_or_else(|| ExtractionError::Unreachable(format!("{uri}: connection refused")))
    }
}

pub fn new_profile(subject: &str) -> NewProfile {
    NewProfile {
        subject: subject.to_string(),
        email: format!("{subject}@example.com"),
        full_name: Some("Test Candidate".to_string()),
        username: None,
    }
}

pub fn sample_profile() -> CandidateProfile {
    let mut profile = CandidateProfile::new(new_profile("user_test"));
    profile.skills = vec!["Rust".to_string(), "PostgreSQL".to_string()];
    profile.experience_level = ExperienceLevel::Intermediate;
    profile
}

pub fn resume_review_json() -> String {
    r#"```json
{
  "skillsReview": {
    "strong": [{"skill": "Rust", "evidence": "Wrote a storage engine"}],
    "weak": [{"skill": "Kubernetes", "reason": "Not mentioned"}],
    "toImprove": [{"skill": "SQL", "current": "basic joins", "target": "query planning"}]
  },
  "projectsReview": [
    {
      "projectName": "kvstore",
      "description": "Embedded key-value store",
      "strong": ["tests"],
      "weak": ["docs"],
      "toImprove": ["benchmarks"],
      "skillsDemonstrated": ["Rust"]
    }
  ],
  "overallAssessment": {
    "strengths": ["systems depth"],
    "weaknesses": ["cloud exposure"],
    "careerLevel": "Mid-level",
    "recommendations": ["ship a cloud project"]
  }
}
```"#
        .to_string()
}

pub fn gap_analysis_json(match_percentage: u8) -> String {
    format!(
        r#"{{
  "matchPercentage": {match_percentage},
  "matchSummary": "Strong Rust, limited cloud experience.",
  "strengths": [{{"skill": "Rust", "evidence": "kvstore", "relevance": "core language"}}],
  "criticalGaps": [{{"requirement": "AWS", "priority": "High", "impact": "Deploys", "difficulty": "Medium"}}],
  "proficiencyGaps": [{{"skill": "SQL", "userLevel": "basic", "requiredLevel": "advanced", "evidence": "no tuning work"}}],
  "recommendedActions": [{{"action": "Build on AWS", "skill": "AWS", "estimatedTime": "4 weeks", "priority": 1, "resources": ["AWS docs"]}}],
  "timelineAssessment": {{"estimatedTimeToReady": "2 months", "confidence": "Medium", "assumptions": "10h per week"}}
}}"#
    )
}

pub fn test_state(generator: FakeGenerator, extractor: FakeExtractor) -> AppState {
    let config = Config::for_tests();
    let analyzer = Analyzer::new(
        Arc::new(generator),
        Arc::new(extractor),
        AnalysisSettings {
            model_call_timeout: config.model_call_timeout,
            significant_gap_threshold: config.significant_gap_threshold,
        },
    );
    AppState {
        store: Arc::new(MemoryStore::new()),
        analyzer,
        s3: offline_s3_client(),
        config,
    }
}
