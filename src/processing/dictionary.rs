//! Versioned skill dictionary asset

use crate::error::{AtsError, Result};
use crate::processing::text_processor::TextNormalizer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

const BUILTIN_DICTIONARY: &str = include_str!("../../data/skills.dictionary.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Technical,
    Soft,
}

/// Immutable skill table loaded once at start-up. Every entry is already in
/// normalized form; [`SkillDictionary::from_json_str`] refuses anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkillDictionary {
    version: String,
    technical: BTreeSet<String>,
    soft: BTreeSet<String>,
    #[serde(default)]
    synonyms: BTreeMap<String, String>,
}

impl SkillDictionary {
    /// The dictionary compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_DICTIONARY)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AtsError::Configuration(format!(
                "Failed to read skill dictionary {}: {}",
                path.display(),
                e
            ))
        })?;
        log::debug!("Loading skill dictionary from {}", path.display());
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let dictionary: SkillDictionary = serde_json::from_str(json).map_err(|e| {
            AtsError::Configuration(format!("Malformed skill dictionary: {}", e))
        })?;
        dictionary.validate()?;
        Ok(dictionary)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn synonyms(&self) -> &BTreeMap<String, String> {
        &self.synonyms
    }

    pub fn technical(&self) -> impl Iterator<Item = &str> {
        self.technical.iter().map(String::as_str)
    }

    pub fn soft(&self) -> impl Iterator<Item = &str> {
        self.soft.iter().map(String::as_str)
    }

    /// Sorted union of technical and soft skills.
    pub fn canonical_skills(&self) -> Vec<&str> {
        self.technical
            .union(&self.soft)
            .map(String::as_str)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.technical.union(&self.soft).count()
    }

    pub fn is_empty(&self) -> bool {
        self.technical.is_empty() && self.soft.is_empty()
    }

    pub fn category_of(&self, skill: &str) -> Option<SkillCategory> {
        if self.technical.contains(skill) {
            Some(SkillCategory::Technical)
        } else if self.soft.contains(skill) {
            Some(SkillCategory::Soft)
        } else {
            None
        }
    }

    fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(AtsError::Configuration(
                "Skill dictionary version cannot be empty".to_string(),
            ));
        }

        if self.is_empty() {
            return Err(AtsError::Configuration(
                "Skill dictionary must contain at least one skill".to_string(),
            ));
        }

        let plain = TextNormalizer::plain();
        for (key, target) in &self.synonyms {
            if key.is_empty() || plain.normalize(key).as_str() != key {
                return Err(AtsError::Configuration(format!(
                    "Synonym key '{}' is not in normalized form",
                    key
                )));
            }
            if target.is_empty() {
                return Err(AtsError::Configuration(format!(
                    "Synonym '{}' has an empty target",
                    key
                )));
            }
        }

        let normalizer = TextNormalizer::with_synonyms(&self.synonyms)?;
        let entries = self
            .technical
            .iter()
            .chain(self.soft.iter())
            .map(|skill| ("skill", skill))
            .chain(self.synonyms.values().map(|target| ("synonym target", target)));

        for (kind, entry) in entries {
            let normalized = normalizer.normalize(entry);
            if normalized.as_str() != entry {
                return Err(AtsError::Configuration(format!(
                    "Dictionary {} '{}' is not in normalized form (normalizes to '{}')",
                    kind, entry, normalized
                )));
            }
        }

        Ok(())
    }
}
