//! Text processing and normalization

use crate::error::{AtsError, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use unicode_segmentation::UnicodeSegmentation;

const BULLET_GLYPHS: [char; 7] = ['\u{2022}', '\u{25CF}', '\u{25AA}', '\u{2023}', '\u{2043}', '\u{25E6}', '\u{00B7}'];
const NON_BREAKING_SPACES: [char; 3] = ['\u{00A0}', '\u{202F}', '\u{2007}'];

/// Symbols kept by the normalizer because they occur inside skill names
/// (`c++`, `c#`, `node.js`, `ci/cd`, `ci-cd`).
const KEPT_SYMBOLS: [char; 5] = ['+', '#', '.', '/', '-'];

/// Text after [`TextNormalizer::normalize`]. Only the normalizer builds one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_token_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '+' || c == '#'
}

fn is_joiner(c: char) -> bool {
    c == '.' || c == '-'
}

/// True when `text[start..end]` is not glued to a neighbouring token.
pub(crate) fn is_bounded(text: &str, start: usize, end: usize) -> bool {
    let mut before = text[..start].chars().rev();
    let left_ok = match before.next() {
        None => true,
        Some(c) if is_token_char(c) => false,
        Some(c) if is_joiner(c) => !before.next().is_some_and(char::is_alphanumeric),
        Some(_) => true,
    };

    let mut after = text[end..].chars();
    let right_ok = match after.next() {
        None => true,
        Some(c) if is_token_char(c) => false,
        Some(c) if is_joiner(c) => !after.next().is_some_and(char::is_alphanumeric),
        Some(_) => true,
    };

    left_ok && right_ok
}

/// A term (skill or synonym key) matched with flexible internal whitespace
/// and bounded so it never matches inside a longer token.
///
/// `c` does not match in `c++` or `c#`, `js` does not match in `node.js`,
/// while `python` still matches in `python, sql` and `python/sql`.
#[derive(Debug, Clone)]
pub struct TermPattern {
    term: String,
    regex: Regex,
}

impl TermPattern {
    pub fn new(term: &str) -> Result<Self> {
        let words: Vec<String> = term.split_whitespace().map(regex::escape).collect();
        if words.is_empty() {
            return Err(AtsError::Configuration("term pattern cannot be empty".to_string()));
        }

        let regex = Regex::new(&words.join(r"\s+")).map_err(|e| {
            AtsError::Configuration(format!("Failed to compile pattern for '{}': {}", term, e))
        })?;

        Ok(Self {
            term: term.to_string(),
            regex,
        })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.find_bounded(text, 0).is_some()
    }

    /// Number of non-overlapping bounded occurrences.
    pub fn count(&self, text: &str) -> usize {
        self.ranges(text).len()
    }

    pub fn replace_all(&self, text: &str, replacement: &str) -> String {
        let ranges = self.ranges(text);
        if ranges.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for (start, end) in ranges {
            out.push_str(&text[last..start]);
            out.push_str(replacement);
            last = end;
        }
        out.push_str(&text[last..]);
        out
    }

    fn ranges(&self, text: &str) -> Vec<(usize, usize)> {
        let mut ranges = Vec::new();
        let mut at = 0;
        while let Some((start, end)) = self.find_bounded(text, at) {
            ranges.push((start, end));
            at = end;
        }
        ranges
    }

    fn find_bounded(&self, text: &str, mut at: usize) -> Option<(usize, usize)> {
        while at <= text.len() {
            let m = self.regex.find_at(text, at)?;
            if is_bounded(text, m.start(), m.end()) {
                return Some((m.start(), m.end()));
            }
            // Retry one character further along.
            at = match text[m.start()..].chars().next() {
                Some(c) => m.start() + c.len_utf8(),
                None => return None,
            };
        }
        None
    }
}

/// Deterministic cleanup of raw text into the canonical form shared by the
/// skill matcher and the embedding input.
pub struct TextNormalizer {
    dehyphenate_regex: Regex,
    synonyms: Vec<(TermPattern, String)>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::plain()
    }
}

impl TextNormalizer {
    /// A normalizer that performs no synonym substitution.
    pub fn plain() -> Self {
        let dehyphenate_regex = Regex::new(r"(\p{L})-[^\S\n]*\r?\n\s*(\p{L})")
            .expect("Invalid dehyphenation regex");

        Self {
            dehyphenate_regex,
            synonyms: Vec::new(),
        }
    }

    /// Synonyms are applied longest key first, then lexicographically.
    pub fn with_synonyms(synonyms: &BTreeMap<String, String>) -> Result<Self> {
        let mut ordered: Vec<(&String, &String)> = synonyms.iter().collect();
        ordered.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));

        let synonyms = ordered
            .into_iter()
            .map(|(key, target)| Ok((TermPattern::new(key)?, target.clone())))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            synonyms,
            ..Self::plain()
        })
    }

    pub fn synonym_count(&self) -> usize {
        self.synonyms.len()
    }

    pub fn normalize(&self, raw: &str) -> NormalizedText {
        let text = self.dehyphenate_regex.replace_all(raw, "$1$2");

        let text: String = text
            .chars()
            .map(|c| {
                if BULLET_GLYPHS.contains(&c) || NON_BREAKING_SPACES.contains(&c) {
                    ' '
                } else {
                    c
                }
            })
            .collect();

        let text = strip_disallowed(&text.to_lowercase());
        let text = self.apply_synonyms(text);
        let text = strip_disallowed(&text);

        NormalizedText(collapse_whitespace(&text))
    }

    fn apply_synonyms(&self, mut text: String) -> String {
        // Re-run until stable so a substitution can't expose a new key on a second call.
        for _ in 0..=self.synonyms.len() {
            let mut changed = false;
            for (pattern, target) in &self.synonyms {
                if pattern.is_match(&text) {
                    let replaced = pattern.replace_all(&text, target);
                    if replaced != text {
                        text = replaced;
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
        text
    }
}

fn strip_disallowed(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() || KEPT_SYMBOLS.contains(&c) {
                c
            } else {
                ' '
            }
        })
        .collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Raw-text signals used by the strict scoring policy.
pub struct TextProcessor {
    email_regex: Regex,
    phone_regex: Regex,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        let email_regex = Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
            .expect("Invalid email regex");

        let phone_regex = Regex::new(r"(?:\+?\d{1,3}[-. ]?)?\(?\d{3}\)?[-. ]?\d{3}[-. ]?\d{4}\b")
            .expect("Invalid phone regex");

        Self {
            email_regex,
            phone_regex,
        }
    }

    pub fn word_count(&self, text: &str) -> usize {
        text.unicode_words().count()
    }

    pub fn has_email(&self, text: &str) -> bool {
        self.email_regex.is_match(text)
    }

    pub fn has_phone(&self, text: &str) -> bool {
        self.phone_regex.is_match(text)
    }
}
