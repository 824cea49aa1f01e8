//! Output formatters for console and JSON

use crate::config::OutputFormat;
use crate::error::{AtsError, Result};
use crate::feedback::FeedbackSource;
use crate::output::report::AnalysisReport;
use colored::{Color, Colorize};
use std::path::Path;

/// Trait for formatting analysis reports
pub trait OutputFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String>;

    fn format_reports(&self, reports: &[AnalysisReport]) -> Result<String> {
        let rendered = reports
            .iter()
            .map(|report| self.format_report(report))
            .collect::<Result<Vec<_>>>()?;
        Ok(rendered.join("\n"))
    }
}

/// Console formatter with colors
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            3 => "▒",
            _ => "░",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            3 => Color::Yellow,
            _ => Color::White,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_score_badge(&self, score: u8) -> String {
        let (badge, color) = match score {
            80..=100 => ("STRONG", Color::Green),
            65..=79 => ("GOOD", Color::BrightGreen),
            50..=64 => ("PARTIAL", Color::Yellow),
            35..=49 => ("WEAK", Color::Red),
            _ => ("POOR", Color::BrightRed),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    fn format_bar(&self, score: u8) -> String {
        let filled = (score as usize).div_ceil(5).min(20);
        let bar = format!("{}{}", "■".repeat(filled), "·".repeat(20 - filled));
        let color = match score {
            70..=100 => Color::Green,
            40..=69 => Color::Yellow,
            _ => Color::Red,
        };
        self.colorize(&bar, color)
    }

    fn format_skill_list(&self, skills: &[String], color: Color) -> String {
        if skills.is_empty() {
            return "  (none)\n".to_string();
        }
        skills
            .iter()
            .map(|skill| format!("  • {}\n", self.colorize(skill, color)))
            .collect()
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let result = &report.result;
        let meta = &report.metadata;
        let mut output = String::new();

        output.push_str(&self.format_header("📊 ATS MATCH REPORT", 1));
        output.push_str(&format!("Resume: {}\nJob: {}\n", meta.resume_path, meta.job_path));
        output.push_str(&format!(
            "Generated: {} | Processing time: {}ms\n",
            meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            meta.processing_time_ms
        ));

        output.push_str(&self.format_header("Overall", 2));
        output.push_str(&format!(
            "ATS Score: {}/100 {}\n",
            result.ats_score,
            self.format_score_badge(result.ats_score)
        ));
        output.push_str(&format!(
            "Verdict: {}\n",
            self.colorize(report.verdict(), Color::Cyan)
        ));

        output.push_str(&self.format_header("Score Breakdown", 3));
        let rows = [
            ("🎯 Semantic", result.semantic_score()),
            ("🔍 Skills", result.skill_match_percentage()),
            ("⏳ Experience", result.experience_score()),
            ("📑 Sections", result.section_score()),
        ];
        for (label, score) in rows {
            output.push_str(&format!("{:<14} {:>3}  {}\n", label, score, self.format_bar(score)));
        }

        output.push_str(&self.format_header("✅ Matched Skills", 3));
        output.push_str(&self.format_skill_list(&result.matched_skills, Color::Green));

        output.push_str(&self.format_header("❌ Missing Skills", 3));
        output.push_str(&self.format_skill_list(&result.missing_skills, Color::Yellow));

        output.push_str(&self.format_header("Experience", 3));
        output.push_str(&format!(
            "Candidate: {} years | Required: {} years",
            result.candidate_years, result.required_years
        ));
        if result.experience_gap > 0 {
            output.push_str(&format!(
                " | Gap: {}",
                self.colorize(&format!("{} years", result.experience_gap), Color::Red)
            ));
        }
        output.push('\n');

        let missing_sections = result.sections.missing();
        if !missing_sections.is_empty() {
            let names: Vec<String> = missing_sections.iter().map(|s| s.to_string()).collect();
            output.push_str(&format!(
                "Missing sections: {}\n",
                self.colorize(&names.join(", "), Color::Yellow)
            ));
        }

        if !result.adjustments.is_empty() {
            output.push_str(&self.format_header("⚠️ Penalties", 3));
            for adjustment in &result.adjustments {
                output.push_str(&format!(
                    "  -{:.1}  {}\n",
                    adjustment.points,
                    self.colorize(&adjustment.reason, Color::Red)
                ));
            }
        }

        if let Some(feedback) = &report.feedback {
            let title = match &feedback.source {
                FeedbackSource::Model { model } => format!("🤖 Feedback ({})", model),
                FeedbackSource::Template => "💡 Feedback".to_string(),
            };
            output.push_str(&self.format_header(&title, 2));
            output.push_str(&feedback.text);
            output.push('\n');
        }

        if self.detailed {
            output.push_str(&self.format_header("Details", 4));
            output.push_str(&format!("Scoring policy: {}\n", meta.scoring_policy));
            output.push_str(&format!("Embedding model: {}\n", meta.embedding_model));
            output.push_str(&format!("Skill dictionary: {}\n", meta.dictionary_version));
            output.push_str(&format!(
                "Cache: {}/{} entries, {} hits, {} misses, {} joined, {} evicted\n",
                meta.cache.len,
                meta.cache.capacity,
                meta.cache.hits,
                meta.cache.misses,
                meta.cache.joined,
                meta.cache.evictions
            ));
        }

        Ok(output)
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn to_json<T: serde::Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        self.to_json(report)
    }

    /// A single report stays an object; several become an array.
    fn format_reports(&self, reports: &[AnalysisReport]) -> Result<String> {
        match reports {
            [single] => self.to_json(single),
            _ => self.to_json(reports),
        }
    }
}

pub fn formatter_for(format: OutputFormat, use_colors: bool, detailed: bool) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Console => Box::new(ConsoleFormatter::new(use_colors, detailed)),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content).map_err(|e| {
        AtsError::OutputFormatting(format!("Failed to write {}: {}", file_path.display(), e))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Feedback;
    use crate::processing::analyzer::{AnalysisResult, EngineStats, ScoreBreakdown};
    use crate::processing::cache::CacheStats;
    use crate::processing::document::SectionPresence;
    use crate::processing::scoring::ScoreAdjustment;

    fn report() -> AnalysisReport {
        let result = AnalysisResult {
            ats_score: 58,
            breakdown: ScoreBreakdown {
                semantic_score: 64,
                skill_match_percentage: 50,
                experience_score: 60,
                section_score: 50,
            },
            matched_skills: vec!["python".to_string()],
            missing_skills: vec!["sql".to_string()],
            candidate_years: 3,
            required_years: 5,
            experience_gap: 2,
            sections: SectionPresence {
                skills: true,
                experience: true,
                projects: false,
                education: false,
            },
            scoring_policy: "strict@v1".to_string(),
            adjustments: vec![ScoreAdjustment {
                reason: "No phone number found".to_string(),
                points: 2.0,
            }],
        };
        let stats = EngineStats {
            cache: CacheStats::default(),
            dictionary_version: "2024.1".to_string(),
            embedding_model: "test".to_string(),
            skill_count: 84,
        };
        AnalysisReport::new(Path::new("resume.md"), Path::new("job.txt"), result, stats, 12).with_feedback(
            Feedback {
                text: "Add SQL.".to_string(),
                source: FeedbackSource::Template,
            },
        )
    }

    #[test]
    fn test_console_report_without_colors() {
        let output = ConsoleFormatter::new(false, true).format_report(&report()).unwrap();
        assert!(output.contains("ATS Score: 58/100 [PARTIAL]"));
        assert!(output.contains("  • python"));
        assert!(output.contains("  • sql"));
        assert!(output.contains("Gap: 2 years"));
        assert!(output.contains("Missing sections: Projects, Education"));
        assert!(output.contains("-2.0  No phone number found"));
        assert!(output.contains("Add SQL."));
        assert!(output.contains("Scoring policy: strict@v1"));
    }

    #[test]
    fn test_json_report_keeps_flat_result() {
        let output = JsonFormatter::new(true).format_report(&report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["result"]["ats_score"], 58);
        assert_eq!(value["result"]["skill_match_percentage"], 50);
        assert_eq!(value["metadata"]["dictionary_version"], "2024.1");
        assert_eq!(value["feedback"]["source"]["kind"], "template");

        let many = JsonFormatter::new(false).format_reports(&[report(), report()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&many).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }
}
