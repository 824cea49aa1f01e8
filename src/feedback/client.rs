//! OpenAI-compatible chat-completions client for narrative feedback

use crate::error::{AtsError, Result};
use crate::feedback::prompts::{render_user_prompt, FeedbackInput, SYSTEM_PROMPT};
use crate::feedback::{Feedback, FeedbackGenerator, FeedbackSource, TemplateFeedback};
use crate::processing::analyzer::AnalysisResult;
use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Asks a chat model to phrase the feedback; falls back to the template on
/// any failure or empty reply.
pub struct ChatFeedback {
    settings: ChatSettings,
    client: Client,
    fallback: TemplateFeedback,
}

impl ChatFeedback {
    pub fn new(settings: ChatSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| AtsError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            settings,
            client,
            fallback: TemplateFeedback,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }

    async fn request(&self, input: &FeedbackInput) -> anyhow::Result<String> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", self.settings.api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).context("invalid API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let user_prompt = render_user_prompt(input).context("failed to render feedback prompt")?;
        let body = ChatRequest {
            model: &self.settings.model,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
        };

        let resp = self
            .client
            .post(self.endpoint())
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("failed to call chat completions")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            bail!("chat completions returned {}: {}", status, text);
        }

        let parsed: ChatResponse = resp.json().await.context("failed to parse chat response")?;
        let answer = parsed
            .choices
            .into_iter()
            .filter_map(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .find(|content| !content.is_empty());

        match answer {
            Some(answer) => Ok(answer),
            None => bail!("chat completions returned no content"),
        }
    }
}

#[async_trait]
impl FeedbackGenerator for ChatFeedback {
    async fn generate(&self, result: &AnalysisResult) -> Feedback {
        let input = FeedbackInput::from(result);
        match self.request(&input).await {
            Ok(text) => Feedback {
                text,
                source: FeedbackSource::Model {
                    model: self.settings.model.clone(),
                },
            },
            Err(e) => {
                log::warn!("Falling back to template feedback: {:#}", e);
                Feedback {
                    text: self.fallback.render(&input),
                    source: FeedbackSource::Template,
                }
            }
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::analyzer::ScoreBreakdown;
    use crate::processing::document::SectionPresence;

    fn result() -> AnalysisResult {
        AnalysisResult {
            ats_score: 55,
            breakdown: ScoreBreakdown {
                semantic_score: 60,
                skill_match_percentage: 50,
                experience_score: 60,
                section_score: 50,
            },
            matched_skills: vec!["python".to_string()],
            missing_skills: vec!["sql".to_string()],
            candidate_years: 3,
            required_years: 5,
            experience_gap: 2,
            sections: SectionPresence::default(),
            scoring_policy: "weighted@v1".to_string(),
            adjustments: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back_to_template() {
        let chat = ChatFeedback::new(ChatSettings {
            base_url: "http://127.0.0.1:9/v1/".to_string(),
            model: "test-model".to_string(),
            api_key: "sk-test".to_string(),
            timeout: Duration::from_millis(500),
            temperature: 0.7,
            max_tokens: 650,
        })
        .unwrap();

        assert_eq!(chat.endpoint(), "http://127.0.0.1:9/v1/chat/completions");

        let feedback = chat.generate(&result()).await;
        assert_eq!(feedback.source, FeedbackSource::Template);
        assert!(feedback.text.starts_with("Overall: Semantic alignment is 60/100"));
    }
}
