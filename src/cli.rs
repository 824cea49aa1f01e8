//! CLI interface for the ATS scoring engine

use crate::config::OutputFormat;
use crate::processing::scoring::PolicyPreset;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "resume-ats")]
#[command(about = "Score resumes against a job description")]
#[command(long_about = "Deterministic ATS-style scoring of resumes against a job description using \
semantic embeddings, a versioned skill dictionary and resume structure heuristics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score one or more resumes against a job description
    Analyze {
        /// Resume file(s) (TXT, MD); several are scored concurrently
        #[arg(short, long, num_args = 1.., required = true)]
        resume: Vec<PathBuf>,

        /// Job description file (TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// Scoring policy: weighted, strict
        #[arg(short, long, value_parser = parse_policy)]
        policy: Option<PolicyPreset>,

        /// Output format: console, json
        #[arg(short, long, value_parser = parse_output_format)]
        output: Option<OutputFormat>,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,

        /// Show policy, model, dictionary and cache details
        #[arg(short, long)]
        detailed: bool,

        /// Skip narrative feedback
        #[arg(long)]
        no_feedback: bool,

        /// Embedding model (HuggingFace repo id or local model directory name)
        #[arg(short, long)]
        embedding: Option<String>,
    },

    /// List the skills in the loaded dictionary
    Skills {
        /// Show only technical skills
        #[arg(long)]
        technical: bool,

        /// Show only soft skills
        #[arg(long)]
        soft: bool,
    },

    /// Show or reset configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file path
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(OutputFormat::Console),
        "json" => Ok(OutputFormat::Json),
        _ => Err(format!("Invalid output format: {}. Supported: console, json", format)),
    }
}

pub fn parse_policy(policy: &str) -> Result<PolicyPreset, String> {
    policy.parse()
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}
