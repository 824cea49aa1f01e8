//! Prompt construction for narrative feedback

use crate::processing::analyzer::AnalysisResult;
use serde::{Deserialize, Serialize};

pub const SYSTEM_PROMPT: &str = "You are an ATS resume coach. \
You must NOT calculate or change any scores. \
Use ONLY the provided numeric scores and lists. \
Return a single plain-text response (no JSON). \
Be specific, practical, and role-agnostic (no guessing role).";

const USER_PROMPT_TEMPLATE: &str = "Input JSON:
{input}

Write feedback covering:
- Missing skills explanation
- Resume improvement suggestions
- Grammar & wording improvements
- Section recommendations
- Overall evaluation summary";

/// The numeric evidence a feedback writer is allowed to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackInput {
    pub semantic_score: u8,
    pub skill_match_percentage: u8,
    pub missing_skills: Vec<String>,
    pub experience_gap: u32,
    pub section_score: u8,
    pub candidate_years: u32,
    pub required_years: u32,
}

impl From<&AnalysisResult> for FeedbackInput {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            semantic_score: result.semantic_score(),
            skill_match_percentage: result.skill_match_percentage(),
            missing_skills: result.missing_skills.clone(),
            experience_gap: result.experience_gap,
            section_score: result.section_score(),
            candidate_years: result.candidate_years,
            required_years: result.required_years,
        }
    }
}

pub fn render_user_prompt(input: &FeedbackInput) -> serde_json::Result<String> {
    let json = serde_json::to_string_pretty(input)?;
    Ok(USER_PROMPT_TEMPLATE.replace("{input}", &json))
}
