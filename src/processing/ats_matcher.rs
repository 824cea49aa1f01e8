//! ATS (Applicant Tracking System) skill matching against the dictionary

use crate::error::{AtsError, Result};
use crate::processing::dictionary::{SkillCategory, SkillDictionary};
use crate::processing::text_processor::{is_bounded, NormalizedText, TermPattern, TextNormalizer};
use aho_corasick::{AhoCorasick, MatchKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Canonical skill names found in a text. Sorted and unique by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillSet(BTreeSet<String>);

impl SkillSet {
    pub fn contains(&self, skill: &str) -> bool {
        self.0.contains(skill)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0.into_iter().collect()
    }
}

impl FromIterator<String> for SkillSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        SkillSet(iter.into_iter().collect())
    }
}

/// Outcome of comparing a resume's skills with a job description's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillComparison {
    pub matched: Vec<String>,
    pub missing: Vec<String>,
    pub jd_skill_count: usize,
    pub match_percentage: u8,
}

/// Matches the dictionary's canonical skills against normalized text.
/// All patterns are compiled once, here.
pub struct SkillMatcher {
    normalizer: TextNormalizer,
    patterns: Vec<TermPattern>,
    occurrence_matcher: AhoCorasick,
    skills: Vec<String>,
    categories: Vec<SkillCategory>,
}

impl SkillMatcher {
    pub fn new(dictionary: &SkillDictionary) -> Result<Self> {
        let normalizer = TextNormalizer::with_synonyms(dictionary.synonyms())?;

        let skills: Vec<String> = dictionary
            .canonical_skills()
            .into_iter()
            .map(str::to_string)
            .collect();

        let patterns = skills
            .iter()
            .map(|skill| TermPattern::new(skill))
            .collect::<Result<Vec<_>>>()?;

        let categories = skills
            .iter()
            .map(|skill| dictionary.category_of(skill).unwrap_or(SkillCategory::Technical))
            .collect();

        let occurrence_matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&skills)
            .map_err(|e| AtsError::Configuration(format!("Failed to build skill matcher: {}", e)))?;

        log::debug!(
            "Skill matcher ready: {} skills, {} synonyms, dictionary {}",
            skills.len(),
            normalizer.synonym_count(),
            dictionary.version()
        );

        Ok(Self {
            normalizer,
            patterns,
            occurrence_matcher,
            skills,
            categories,
        })
    }

    pub fn normalize(&self, raw: &str) -> NormalizedText {
        self.normalizer.normalize(raw)
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }

    pub fn extract_skills(&self, text: &NormalizedText) -> SkillSet {
        self.patterns
            .iter()
            .filter(|pattern| pattern.is_match(text.as_str()))
            .map(|pattern| pattern.term().to_string())
            .collect()
    }

    /// Skills of one category only.
    pub fn extract_skills_by_category(&self, text: &NormalizedText, category: SkillCategory) -> SkillSet {
        self.patterns
            .iter()
            .zip(&self.categories)
            .filter(|(pattern, cat)| **cat == category && pattern.is_match(text.as_str()))
            .map(|(pattern, _)| pattern.term().to_string())
            .collect()
    }

    pub fn compare(&self, resume: &SkillSet, jd: &SkillSet) -> SkillComparison {
        let (matched, missing): (Vec<&str>, Vec<&str>) = jd.iter().partition(|skill| resume.contains(skill));

        let jd_skill_count = jd.len();
        let match_percentage = if jd_skill_count == 0 {
            0
        } else {
            (100.0 * matched.len() as f64 / jd_skill_count as f64).round() as u8
        };

        SkillComparison {
            matched: matched.into_iter().map(str::to_string).collect(),
            missing: missing.into_iter().map(str::to_string).collect(),
            jd_skill_count,
            match_percentage,
        }
    }

    /// Bounded occurrences of any of `targets` in `text`, counting each
    /// position once (longest skill wins where skills overlap).
    pub fn count_occurrences(&self, text: &NormalizedText, targets: &SkillSet) -> usize {
        let haystack = text.as_str();
        self.occurrence_matcher
            .find_iter(haystack)
            .filter(|m| is_bounded(haystack, m.start(), m.end()))
            .filter(|m| targets.contains(&self.skills[m.pattern().as_usize()]))
            .count()
    }
}
