//! Narrative feedback built on top of a finished score. Never changes scores.

pub mod client;
pub mod prompts;

use crate::config::FeedbackConfig;
use crate::processing::analyzer::AnalysisResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use client::{ChatFeedback, ChatSettings};
pub use prompts::FeedbackInput;

const MAX_LISTED_SKILLS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeedbackSource {
    Template,
    Model { model: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub text: String,
    pub source: FeedbackSource,
}

#[async_trait]
pub trait FeedbackGenerator: Send + Sync {
    /// Always yields some feedback; implementations fall back rather than fail.
    async fn generate(&self, result: &AnalysisResult) -> Feedback;
}

/// Deterministic feedback assembled from the numeric breakdown.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateFeedback;

impl TemplateFeedback {
    pub fn render(&self, input: &FeedbackInput) -> String {
        let mut parts = vec![format!(
            "Overall: Semantic alignment is {}/100 and skill match is {}/100.",
            input.semantic_score, input.skill_match_percentage
        )];

        if input.missing_skills.is_empty() {
            parts.push("Skills coverage looks strong versus the job description.".to_string());
        } else {
            let listed: Vec<&str> = input
                .missing_skills
                .iter()
                .take(MAX_LISTED_SKILLS)
                .map(String::as_str)
                .collect();
            parts.push(format!(
                "Missing skills to consider adding (only if you genuinely have them): {}.",
                listed.join(", ")
            ));
        }

        if input.experience_gap > 0 {
            parts.push(format!(
                "Experience gap: the job description asks for {} years; your resume states {} years. \
                 If applicable, clarify total years and relevant scope.",
                input.required_years, input.candidate_years
            ));
        }

        if input.section_score < 100 {
            parts.push(format!(
                "Resume structure: your section completeness score is {}/100. \
                 Add standard headings for missing sections (Skills, Experience, Projects, Education).",
                input.section_score
            ));
        }

        parts.push(
            "Improve wording: lead bullets with strong action verbs, add measurable outcomes, \
             and mirror the job description's terminology naturally (without keyword stuffing)."
                .to_string(),
        );

        parts.join("\n\n")
    }
}

#[async_trait]
impl FeedbackGenerator for TemplateFeedback {
    async fn generate(&self, result: &AnalysisResult) -> Feedback {
        Feedback {
            text: self.render(&FeedbackInput::from(result)),
            source: FeedbackSource::Template,
        }
    }
}

/// Chat feedback when an API key and a model are both configured, the
/// template otherwise.
pub fn from_config(config: &FeedbackConfig) -> Arc<dyn FeedbackGenerator> {
    let api_key = std::env::var(&config.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty());

    match (api_key, config.model.as_deref().filter(|m| !m.trim().is_empty())) {
        (Some(api_key), Some(model)) => {
            let settings = ChatSettings {
                base_url: config.api_base_url.clone(),
                model: model.to_string(),
                api_key,
                timeout: config.timeout(),
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            };
            match ChatFeedback::new(settings) {
                Ok(chat) => {
                    log::info!("Narrative feedback via {} ({})", config.api_base_url, model);
                    Arc::new(chat)
                }
                Err(e) => {
                    log::warn!("Chat feedback unavailable, using template: {}", e);
                    Arc::new(TemplateFeedback)
                }
            }
        }
        _ => {
            log::debug!("No feedback model configured, using template feedback");
            Arc::new(TemplateFeedback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> FeedbackInput {
        FeedbackInput {
            semantic_score: 64,
            skill_match_percentage: 50,
            missing_skills: vec!["sql".to_string()],
            experience_gap: 2,
            section_score: 75,
            candidate_years: 3,
            required_years: 5,
        }
    }

    #[test]
    fn test_template_covers_gaps() {
        let text = TemplateFeedback.render(&input());
        let parts: Vec<&str> = text.split("\n\n").collect();

        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0], "Overall: Semantic alignment is 64/100 and skill match is 50/100.");
        assert!(parts[1].ends_with("(only if you genuinely have them): sql."));
        assert!(parts[2].contains("asks for 5 years; your resume states 3 years"));
        assert!(parts[3].contains("75/100"));
        assert!(parts[4].starts_with("Improve wording"));
    }

    #[test]
    fn test_template_when_nothing_missing() {
        let mut complete = input();
        complete.missing_skills.clear();
        complete.experience_gap = 0;
        complete.section_score = 100;

        let text = TemplateFeedback.render(&complete);
        assert_eq!(text.split("\n\n").count(), 3);
        assert!(text.contains("Skills coverage looks strong"));
    }

    #[test]
    fn test_template_lists_at_most_fifteen_skills() {
        let mut many = input();
        many.missing_skills = (0..20).map(|i| format!("skill{:02}", i)).collect();
        let text = TemplateFeedback.render(&many);
        assert!(text.contains("skill14."));
        assert!(!text.contains("skill15"));
    }
}
