//! Report structures wrapping an analysis result for presentation

use crate::feedback::Feedback;
use crate::processing::analyzer::{AnalysisResult, EngineStats};
use crate::processing::cache::CacheStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub result: AnalysisResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub resume_path: String,
    pub job_path: String,
    pub embedding_model: String,
    pub dictionary_version: String,
    pub scoring_policy: String,
    pub processing_time_ms: u64,
    pub cache: CacheStats,
}

impl AnalysisReport {
    pub fn new(
        resume_path: &Path,
        job_path: &Path,
        result: AnalysisResult,
        stats: EngineStats,
        processing_time_ms: u64,
    ) -> Self {
        Self {
            metadata: ReportMetadata {
                generated_at: Utc::now(),
                resume_path: resume_path.display().to_string(),
                job_path: job_path.display().to_string(),
                embedding_model: stats.embedding_model,
                dictionary_version: stats.dictionary_version,
                scoring_policy: result.scoring_policy.clone(),
                processing_time_ms,
                cache: stats.cache,
            },
            result,
            feedback: None,
        }
    }

    pub fn with_feedback(mut self, feedback: Feedback) -> Self {
        self.feedback = Some(feedback);
        self
    }

    /// Short verdict for the headline score.
    pub fn verdict(&self) -> &'static str {
        match self.result.ats_score {
            80..=100 => "Strong match",
            65..=79 => "Good match",
            50..=64 => "Partial match",
            _ => "Weak match",
        }
    }
}
