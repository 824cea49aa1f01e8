//! Main analysis engine combining semantic similarity, skill matching and heuristics

use crate::error::{AtsError, ProviderError, Result};
use crate::processing::ats_matcher::SkillMatcher;
use crate::processing::cache::{CacheKey, CacheSettings, CacheStats, EmbeddingCache};
use crate::processing::dictionary::SkillDictionary;
use crate::processing::document::{ResumeHeuristics, SectionPresence};
use crate::processing::embeddings::{semantic_score, Embedding, EmbeddingProvider};
use crate::processing::scoring::{ScoreAdjustment, ScoreInputs, ScoringPolicy};
use crate::processing::text_processor::{NormalizedText, TextProcessor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(30);

/// Raw resume and job-description text handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub resume_text: String,
    pub job_description: String,
}

impl AnalysisRequest {
    pub fn new(resume_text: impl Into<String>, job_description: impl Into<String>) -> Self {
        Self {
            resume_text: resume_text.into(),
            job_description: job_description.into(),
        }
    }

    /// Both texts must be non-empty after trimming.
    pub fn validate(&self) -> Result<()> {
        if self.resume_text.trim().is_empty() {
            return Err(AtsError::Validation("Resume text is empty".to_string()));
        }
        if self.job_description.trim().is_empty() {
            return Err(AtsError::Validation("Job description text is empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub cache: CacheSettings,
    pub embed_timeout: Duration,
    pub policy: ScoringPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache: CacheSettings::default(),
            embed_timeout: DEFAULT_EMBED_TIMEOUT,
            policy: ScoringPolicy::weighted(),
        }
    }
}

/// Component scores, each in 0..=100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub semantic_score: u8,
    pub skill_match_percentage: u8,
    pub experience_score: u8,
    /// One of 0, 25, 50, 75, 100.
    pub section_score: u8,
}

/// Outcome of one analysis. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ats_score: u8,
    #[serde(flatten)]
    pub breakdown: ScoreBreakdown,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub candidate_years: u32,
    pub required_years: u32,
    pub experience_gap: u32,
    pub sections: SectionPresence,
    pub scoring_policy: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adjustments: Vec<ScoreAdjustment>,
}

impl AnalysisResult {
    pub fn skill_match_percentage(&self) -> u8 {
        self.breakdown.skill_match_percentage
    }

    pub fn semantic_score(&self) -> u8 {
        self.breakdown.semantic_score
    }

    pub fn experience_score(&self) -> u8 {
        self.breakdown.experience_score
    }

    pub fn section_score(&self) -> u8 {
        self.breakdown.section_score
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub cache: CacheStats,
    pub dictionary_version: String,
    pub embedding_model: String,
    pub skill_count: usize,
}

/// Scores resumes against job descriptions. Share it behind an `Arc`; the
/// job-description embedding cache lives here.
pub struct AnalysisEngine {
    matcher: SkillMatcher,
    heuristics: ResumeHeuristics,
    text_processor: TextProcessor,
    provider: Arc<dyn EmbeddingProvider>,
    cache: EmbeddingCache,
    embed_timeout: Duration,
    policy: ScoringPolicy,
    dictionary_version: String,
}

impl AnalysisEngine {
    pub fn new(
        dictionary: &SkillDictionary,
        provider: Arc<dyn EmbeddingProvider>,
        options: EngineOptions,
    ) -> Result<Self> {
        options.policy.validate()?;
        if options.embed_timeout.is_zero() {
            return Err(AtsError::Configuration("Embedding timeout must be positive".to_string()));
        }
        if options.cache.capacity == 0 {
            return Err(AtsError::Configuration("Cache capacity must be positive".to_string()));
        }

        log::info!(
            "Analysis engine using model {}, dictionary {}, policy {}",
            provider.model_name(),
            dictionary.version(),
            options.policy.label()
        );

        Ok(Self {
            matcher: SkillMatcher::new(dictionary)?,
            heuristics: ResumeHeuristics::new(),
            text_processor: TextProcessor::new(),
            provider,
            cache: EmbeddingCache::new(options.cache),
            embed_timeout: options.embed_timeout,
            policy: options.policy,
            dictionary_version: dictionary.version().to_string(),
        })
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    pub fn matcher(&self) -> &SkillMatcher {
        &self.matcher
    }

    /// Analyze under the engine's default scoring policy.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        self.analyze_with_policy(request, &self.policy).await
    }

    pub async fn analyze_with_policy(
        &self,
        request: &AnalysisRequest,
        policy: &ScoringPolicy,
    ) -> Result<AnalysisResult> {
        request.validate()?;
        policy.validate()?;

        let start_time = Instant::now();

        let resume_text = self.matcher.normalize(&request.resume_text);
        let job_text = self.matcher.normalize(&request.job_description);
        let key = CacheKey::for_text(&job_text);

        log::debug!(
            "Normalized resume to {} bytes, job description to {} bytes (key {})",
            resume_text.len(),
            job_text.len(),
            key
        );

        let (resume_embedding, (job_embedding, outcome)) = tokio::try_join!(
            self.embed(&resume_text),
            self.cache.get_or_try_insert_with(&key, || self.embed(&job_text)),
        )?;

        log::debug!(
            "Embeddings ready in {:.2?} (job description: {:?})",
            start_time.elapsed(),
            outcome
        );

        let cosine = resume_embedding.cosine(&job_embedding)?;
        let semantic = semantic_score(cosine);

        let resume_skills = self.matcher.extract_skills(&resume_text);
        let job_skills = self.matcher.extract_skills(&job_text);
        let comparison = self.matcher.compare(&resume_skills, &job_skills);

        let experience = self
            .heuristics
            .match_experience(&request.resume_text, &request.job_description);
        let sections = self.heuristics.detect_sections(&request.resume_text);

        let breakdown = ScoreBreakdown {
            semantic_score: semantic,
            skill_match_percentage: comparison.match_percentage,
            experience_score: experience.score,
            section_score: sections.section_score(),
        };

        let inputs = ScoreInputs {
            semantic_score: breakdown.semantic_score,
            skill_match_percentage: breakdown.skill_match_percentage,
            experience_score: breakdown.experience_score,
            section_score: breakdown.section_score,
            sections,
            resume_word_count: self.text_processor.word_count(&request.resume_text),
            keyword_occurrences: self.matcher.count_occurrences(&resume_text, &job_skills),
            matched_skill_count: comparison.matched.len(),
            jd_skill_count: comparison.jd_skill_count,
            has_email: self.text_processor.has_email(&request.resume_text),
            has_phone: self.text_processor.has_phone(&request.resume_text),
        };
        let composite = policy.compose(&inputs);

        log::debug!(
            "Scored {} under {}: semantic {}, skills {}/{}, experience {}, sections {} in {:.2?}",
            composite.ats_score,
            policy.label(),
            breakdown.semantic_score,
            comparison.matched.len(),
            comparison.jd_skill_count,
            breakdown.experience_score,
            breakdown.section_score,
            start_time.elapsed()
        );

        Ok(AnalysisResult {
            ats_score: composite.ats_score,
            breakdown,
            matched_skills: comparison.matched,
            missing_skills: comparison.missing,
            candidate_years: experience.candidate_years,
            required_years: experience.required_years,
            experience_gap: experience.gap,
            sections,
            scoring_policy: policy.label(),
            adjustments: composite.adjustments,
        })
    }

    async fn embed(&self, text: &NormalizedText) -> std::result::Result<Embedding, ProviderError> {
        let raw = tokio::time::timeout(self.embed_timeout, self.provider.embed(text.as_str()))
            .await
            .map_err(|_| ProviderError::Timeout(self.embed_timeout))??;
        Embedding::from_raw(raw)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            cache: self.cache.stats(),
            dictionary_version: self.dictionary_version.clone(),
            embedding_model: self.provider.model_name().to_string(),
            skill_count: self.matcher.skill_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Letter-frequency embedding: deterministic and good enough for identity checks.
    struct LetterProvider;

    #[async_trait]
    impl EmbeddingProvider for LetterProvider {
        async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError> {
            let mut vector = vec![0.0f32; 27];
            for c in text.chars() {
                let slot = if c.is_ascii_lowercase() { (c as u8 - b'a') as usize } else { 26 };
                vector[slot] += 1.0;
            }
            Ok(vector)
        }

        fn model_name(&self) -> &str {
            "letters"
        }
    }

    fn engine() -> AnalysisEngine {
        AnalysisEngine::new(
            &SkillDictionary::builtin().unwrap(),
            Arc::new(LetterProvider),
            EngineOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_request_validation() {
        assert!(AnalysisRequest::new("resume", "jd").validate().is_ok());
        assert!(matches!(
            AnalysisRequest::new(" \n\t", "jd").validate(),
            Err(AtsError::Validation(_))
        ));
        assert!(matches!(
            AnalysisRequest::new("resume", "").validate(),
            Err(AtsError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_identical_texts_score_full_semantic() {
        let engine = engine();
        let text = "Python developer with 4 years of SQL";
        let result = engine.analyze(&AnalysisRequest::new(text, text)).await.unwrap();
        assert_eq!(result.breakdown.semantic_score, 100);
        assert_eq!(result.skill_match_percentage(), 100);
    }

    #[tokio::test]
    async fn test_result_serializes_flat() {
        let engine = engine();
        let result = engine
            .analyze(&AnalysisRequest::new("Python", "Python and SQL"))
            .await
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        for field in [
            "ats_score",
            "semantic_score",
            "skill_match_percentage",
            "experience_score",
            "section_score",
            "matched_skills",
            "missing_skills",
            "candidate_years",
            "required_years",
            "experience_gap",
        ] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
        assert!(json.get("breakdown").is_none());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let options = EngineOptions {
            embed_timeout: Duration::ZERO,
            ..EngineOptions::default()
        };
        let result = AnalysisEngine::new(&SkillDictionary::builtin().unwrap(), Arc::new(LetterProvider), options);
        assert!(matches!(result, Err(AtsError::Configuration(_))));
    }
}
