//! Named, swappable policies that merge the component scores into one ATS score

use crate::error::{AtsError, Result};
use crate::processing::document::SectionPresence;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub semantic: f64,
    pub skill: f64,
    pub experience: f64,
    pub education: f64,
    pub section: f64,
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.semantic + self.skill + self.experience + self.education + self.section
    }
}

/// Upper bounds applied to a component before weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCaps {
    pub semantic: Option<u8>,
    pub skill: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: u8,
    pub max: u8,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self { min: 0, max: 100 }
    }
}

/// Additive point deductions for resume quality problems.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenaltyRules {
    pub min_words: usize,
    pub short_resume_points: f64,
    pub max_words: usize,
    pub long_resume_points: f64,
    /// JD-skill occurrences per resume word above which the resume looks stuffed.
    pub density_threshold: f64,
    pub density_multiplier: f64,
    pub density_max_points: f64,
    pub missing_email_points: f64,
    pub missing_phone_points: f64,
    pub missing_sections_points: f64,
    /// Fraction of JD skills matched above which the resume looks over-optimized.
    pub over_optimization_ratio: f64,
    pub over_optimization_points: f64,
}

impl Default for PenaltyRules {
    fn default() -> Self {
        Self {
            min_words: 150,
            short_resume_points: 8.0,
            max_words: 800,
            long_resume_points: 5.0,
            density_threshold: 0.03,
            density_multiplier: 200.0,
            density_max_points: 15.0,
            missing_email_points: 3.0,
            missing_phone_points: 2.0,
            missing_sections_points: 5.0,
            over_optimization_ratio: 0.8,
            over_optimization_points: 5.0,
        }
    }
}

/// Everything a policy may look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub semantic_score: u8,
    pub skill_match_percentage: u8,
    pub experience_score: u8,
    pub section_score: u8,
    pub sections: SectionPresence,
    pub resume_word_count: usize,
    /// Bounded occurrences of JD skills in the normalized resume.
    pub keyword_occurrences: usize,
    pub matched_skill_count: usize,
    pub jd_skill_count: usize,
    pub has_email: bool,
    pub has_phone: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreAdjustment {
    pub reason: String,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeScore {
    pub ats_score: u8,
    /// Weighted sum before penalties and clamping.
    pub weighted: f64,
    pub adjustments: Vec<ScoreAdjustment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub name: String,
    pub version: u32,
    pub weights: ScoreWeights,
    #[serde(default)]
    pub caps: ScoreCaps,
    #[serde(default)]
    pub penalties: Option<PenaltyRules>,
    #[serde(default)]
    pub range: ScoreRange,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self::weighted()
    }
}

impl ScoringPolicy {
    /// Plain weighted sum: 40% semantic, 30% skills, 20% experience, 10% sections.
    pub fn weighted() -> Self {
        Self {
            name: "weighted".to_string(),
            version: 1,
            weights: ScoreWeights {
                semantic: 0.40,
                skill: 0.30,
                experience: 0.20,
                education: 0.0,
                section: 0.10,
            },
            caps: ScoreCaps::default(),
            penalties: None,
            range: ScoreRange::default(),
        }
    }

    /// Capped components, quality penalties and an output range of 15..=88.
    pub fn strict() -> Self {
        Self {
            name: "strict".to_string(),
            version: 1,
            weights: ScoreWeights {
                semantic: 0.25,
                skill: 0.35,
                experience: 0.15,
                education: 0.10,
                section: 0.15,
            },
            caps: ScoreCaps {
                semantic: Some(70),
                skill: Some(75),
            },
            penalties: Some(PenaltyRules::default()),
            range: ScoreRange { min: 15, max: 88 },
        }
    }

    pub fn label(&self) -> String {
        format!("{}@v{}", self.name, self.version)
    }

    pub fn validate(&self) -> Result<()> {
        let w = &self.weights;
        let weights = [w.semantic, w.skill, w.experience, w.education, w.section];
        if weights.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(AtsError::Configuration(format!(
                "Scoring policy '{}' has a negative or non-finite weight",
                self.name
            )));
        }
        if w.total() > 1.0 + 1e-9 {
            return Err(AtsError::Configuration(format!(
                "Scoring policy '{}' weights sum to {:.3}, more than 1.0",
                self.name,
                w.total()
            )));
        }
        if self.range.min > self.range.max || self.range.max > 100 {
            return Err(AtsError::Configuration(format!(
                "Scoring policy '{}' has an invalid range {}..={}",
                self.name, self.range.min, self.range.max
            )));
        }
        if [self.caps.semantic, self.caps.skill].iter().flatten().any(|cap| *cap > 100) {
            return Err(AtsError::Configuration(format!(
                "Scoring policy '{}' caps must be within 0..=100",
                self.name
            )));
        }
        Ok(())
    }

    /// Weighted sum minus penalties, clamped into the policy range and rounded
    /// half away from zero.
    pub fn compose(&self, inputs: &ScoreInputs) -> CompositeScore {
        let cap = |value: u8, cap: Option<u8>| -> f64 {
            match cap {
                Some(cap) => value.min(cap) as f64,
                None => value as f64,
            }
        };

        let education = if inputs.sections.education { 100.0 } else { 0.0 };

        let w = &self.weights;
        let weighted = w.semantic * cap(inputs.semantic_score, self.caps.semantic)
            + w.skill * cap(inputs.skill_match_percentage, self.caps.skill)
            + w.experience * inputs.experience_score as f64
            + w.education * education
            + w.section * inputs.section_score as f64;

        let adjustments = match &self.penalties {
            Some(rules) => rules.evaluate(inputs),
            None => Vec::new(),
        };
        let penalty: f64 = adjustments.iter().map(|a| a.points).sum();

        let value = (weighted - penalty).clamp(self.range.min as f64, self.range.max as f64);

        CompositeScore {
            ats_score: value.round() as u8,
            weighted,
            adjustments,
        }
    }
}

impl PenaltyRules {
    pub fn evaluate(&self, inputs: &ScoreInputs) -> Vec<ScoreAdjustment> {
        let mut adjustments = Vec::new();
        let mut push = |reason: String, points: f64| {
            adjustments.push(ScoreAdjustment { reason, points });
        };

        let words = inputs.resume_word_count;
        if words < self.min_words {
            push(
                format!("Resume is short ({} words, fewer than {})", words, self.min_words),
                self.short_resume_points,
            );
        }
        if words > self.max_words {
            push(
                format!("Resume is long ({} words, more than {})", words, self.max_words),
                self.long_resume_points,
            );
        }

        if words > 0 {
            let density = inputs.keyword_occurrences as f64 / words as f64;
            if density > self.density_threshold {
                push(
                    format!("Keyword density {:.1}% suggests keyword stuffing", density * 100.0),
                    (density * self.density_multiplier).min(self.density_max_points),
                );
            }
        }

        if !inputs.has_email {
            push("No email address found".to_string(), self.missing_email_points);
        }
        if !inputs.has_phone {
            push("No phone number found".to_string(), self.missing_phone_points);
        }

        let sections = &inputs.sections;
        if !(sections.experience && sections.education && sections.skills) {
            push(
                "Missing an experience, education or skills heading".to_string(),
                self.missing_sections_points,
            );
        }

        if inputs.matched_skill_count as f64 > inputs.jd_skill_count as f64 * self.over_optimization_ratio {
            push(
                format!(
                    "{} of {} job skills matched verbatim, looks over-optimized",
                    inputs.matched_skill_count, inputs.jd_skill_count
                ),
                self.over_optimization_points,
            );
        }

        adjustments
    }
}

/// The built-in policies, selectable by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyPreset {
    #[default]
    Weighted,
    Strict,
}

impl PolicyPreset {
    pub fn policy(&self) -> ScoringPolicy {
        match self {
            PolicyPreset::Weighted => ScoringPolicy::weighted(),
            PolicyPreset::Strict => ScoringPolicy::strict(),
        }
    }
}

impl fmt::Display for PolicyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyPreset::Weighted => write!(f, "weighted"),
            PolicyPreset::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for PolicyPreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weighted" => Ok(PolicyPreset::Weighted),
            "strict" => Ok(PolicyPreset::Strict),
            _ => Err(format!("Invalid scoring policy: {}. Supported: weighted, strict", s)),
        }
    }
}
