//! Resume structure and experience heuristics over raw text

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Skills,
    Experience,
    Projects,
    Education,
}

impl SectionKind {
    pub const ALL: [SectionKind; 4] = [
        SectionKind::Skills,
        SectionKind::Experience,
        SectionKind::Projects,
        SectionKind::Education,
    ];

    /// Heading synonyms recognised for this section.
    pub fn headings(&self) -> &'static [&'static str] {
        match self {
            SectionKind::Skills => &["skills", "technical skills", "core skills", "skill set", "key skills"],
            SectionKind::Experience => &[
                "experience",
                "work experience",
                "employment",
                "employment history",
                "professional experience",
                "work history",
            ],
            SectionKind::Projects => &["projects", "personal projects", "academic projects"],
            SectionKind::Education => &["education", "academic background"],
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionKind::Skills => "Skills",
            SectionKind::Experience => "Experience",
            SectionKind::Projects => "Projects",
            SectionKind::Education => "Education",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPresence {
    pub skills: bool,
    pub experience: bool,
    pub projects: bool,
    pub education: bool,
}

impl SectionPresence {
    pub fn has(&self, kind: SectionKind) -> bool {
        match kind {
            SectionKind::Skills => self.skills,
            SectionKind::Experience => self.experience,
            SectionKind::Projects => self.projects,
            SectionKind::Education => self.education,
        }
    }

    pub fn count(&self) -> u8 {
        SectionKind::ALL.iter().filter(|kind| self.has(**kind)).count() as u8
    }

    /// 25 points per detected section: always one of 0, 25, 50, 75, 100.
    pub fn section_score(&self) -> u8 {
        25 * self.count()
    }

    pub fn missing(&self) -> Vec<SectionKind> {
        SectionKind::ALL.into_iter().filter(|kind| !self.has(*kind)).collect()
    }

    fn set(&mut self, kind: SectionKind) {
        match kind {
            SectionKind::Skills => self.skills = true,
            SectionKind::Experience => self.experience = true,
            SectionKind::Projects => self.projects = true,
            SectionKind::Education => self.education = true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceMatch {
    pub candidate_years: u32,
    pub required_years: u32,
    pub score: u8,
    pub gap: u32,
}

impl ExperienceMatch {
    pub fn new(candidate_years: u32, required_years: u32) -> Self {
        let score = if required_years == 0 {
            100
        } else {
            let ratio = (candidate_years as f64 / required_years as f64).min(1.0);
            (100.0 * ratio).round() as u8
        };

        Self {
            candidate_years,
            required_years,
            score,
            gap: required_years.saturating_sub(candidate_years),
        }
    }
}

/// Regex-driven detection of section headings and stated years of experience.
pub struct ResumeHeuristics {
    section_patterns: Vec<(SectionKind, Regex)>,
    years_regex: Regex,
}

impl Default for ResumeHeuristics {
    fn default() -> Self {
        Self::new()
    }
}

impl ResumeHeuristics {
    pub fn new() -> Self {
        let section_patterns = SectionKind::ALL
            .into_iter()
            .map(|kind| {
                let names: Vec<String> = kind
                    .headings()
                    .iter()
                    .map(|name| name.split(' ').map(regex::escape).collect::<Vec<_>>().join(r"[^\S\n]+"))
                    .collect();
                // Heading alone on its line, optionally wrapped in markup and
                // optionally followed by a colon with inline content.
                let pattern = format!(
                    r"(?im)^[^\p{{L}}\p{{N}}\n]*(?:{})[^\p{{L}}\p{{N}}\n]*(?::.*)?$",
                    names.join("|")
                );
                (kind, Regex::new(&pattern).expect("Invalid section heading regex"))
            })
            .collect();

        let years_regex = Regex::new(r"(?i)([0-9]+)\+?\s*(?:years|yrs)\b")
            .expect("Invalid years regex");

        Self {
            section_patterns,
            years_regex,
        }
    }

    pub fn detect_sections(&self, raw_text: &str) -> SectionPresence {
        let mut presence = SectionPresence::default();
        for (kind, pattern) in &self.section_patterns {
            if pattern.is_match(raw_text) {
                presence.set(*kind);
            }
        }
        presence
    }

    /// Every integer stated as `<n> years`, `<n>+ yrs`, ... in order of
    /// appearance. Figures too large for `u32` saturate.
    pub fn extract_years(&self, raw_text: &str) -> Vec<u32> {
        self.years_regex
            .captures_iter(raw_text)
            .filter_map(|caps| caps.get(1))
            .map(|digits| digits.as_str().parse::<u32>().unwrap_or(u32::MAX))
            .collect()
    }

    /// The highest stated figure, or 0.
    pub fn max_years(&self, raw_text: &str) -> u32 {
        self.extract_years(raw_text).into_iter().max().unwrap_or(0)
    }

    pub fn match_experience(&self, resume_raw: &str, job_raw: &str) -> ExperienceMatch {
        ExperienceMatch::new(self.max_years(resume_raw), self.max_years(job_raw))
    }
}
