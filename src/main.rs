//! resume-ats: score resumes against a job description from the command line

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use resume_ats::cli::{self, Cli, Commands, ConfigAction};
use resume_ats::config::{Config, OutputFormat};
use resume_ats::feedback::{self, FeedbackGenerator};
use resume_ats::input::InputManager;
use resume_ats::output::formatter::{formatter_for, save_report_to_file};
use resume_ats::output::report::AnalysisReport;
use resume_ats::processing::analyzer::{AnalysisEngine, AnalysisRequest};
use resume_ats::processing::dictionary::SkillDictionary;
use resume_ats::processing::embeddings::{Model2VecProvider, ModelSource};
use resume_ats::processing::scoring::PolicyPreset;
use resume_ats::AtsError;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

const INPUT_EXTENSIONS: [&str; 4] = ["txt", "text", "md", "markdown"];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let outcome = if requires_loaded_config(&cli.command) {
        let config = match load_config(cli.config.as_deref()) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                process::exit(1);
            }
        };
        run_command(cli.command, config, cli.config).await
    } else {
        manage_config_file(cli.command, cli.config)
    };

    if let Err(e) = outcome {
        match e.downcast_ref::<AtsError>() {
            Some(ats) if ats.is_client_error() => error!("Invalid input: {}", ats),
            _ => error!("Command failed: {:#}", e),
        }
        process::exit(1);
    }
}

/// `config reset` and `config path` must work even when the file is
/// missing or malformed.
fn requires_loaded_config(command: &Commands) -> bool {
    !matches!(
        command,
        Commands::Config {
            action: Some(ConfigAction::Reset | ConfigAction::Path)
        }
    )
}

fn manage_config_file(command: Commands, config_path: Option<PathBuf>) -> Result<()> {
    let path = config_path.unwrap_or_else(Config::config_path);
    match command {
        Commands::Config {
            action: Some(ConfigAction::Reset),
        } => {
            reset_config(&path)?;
            println!("✅ Configuration reset to defaults: {}", path.display());
        }
        _ => println!("{}", path.display()),
    }
    Ok(())
}

fn reset_config(path: &Path) -> Result<()> {
    Config::default()
        .save_to(path)
        .with_context(|| format!("failed to write {}", path.display()))
}

fn load_config(path: Option<&Path>) -> resume_ats::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

async fn run_command(command: Commands, config: Config, config_path: Option<PathBuf>) -> Result<()> {
    match command {
        Commands::Analyze {
            resume,
            job,
            policy,
            output,
            save,
            detailed,
            no_feedback,
            embedding,
        } => {
            let options = AnalyzeOptions {
                policy,
                format: output.unwrap_or(config.output.format),
                save,
                detailed: detailed || config.output.detailed,
                feedback: !no_feedback && config.feedback.enabled,
                embedding,
            };
            analyze(&config, &resume, &job, options).await
        }
        Commands::Skills { technical, soft } => list_skills(&config, technical, soft),
        Commands::Config { action } => {
            let path = config_path.unwrap_or_else(Config::config_path);
            match action.unwrap_or(ConfigAction::Show) {
                ConfigAction::Show => {
                    println!("{}", "Configuration".bold());
                    println!("{}", path.display().to_string().dimmed());
                    println!();
                    println!("{}", toml::to_string_pretty(&config)?);
                }
                action => return manage_config_file(Commands::Config { action: Some(action) }, Some(path)),
            }
            Ok(())
        }
    }
}

struct AnalyzeOptions {
    policy: Option<PolicyPreset>,
    format: OutputFormat,
    save: Option<PathBuf>,
    detailed: bool,
    feedback: bool,
    embedding: Option<String>,
}

async fn analyze(config: &Config, resumes: &[PathBuf], job: &Path, options: AnalyzeOptions) -> Result<()> {
    let chatty = options.format == OutputFormat::Console && options.save.is_none();

    for path in resumes.iter().map(PathBuf::as_path).chain(std::iter::once(job)) {
        cli::validate_file_extension(path, &INPUT_EXTENSIONS)
            .map_err(|e| AtsError::InvalidInput(format!("{}: {}", path.display(), e)))?;
    }

    let mut input_manager = InputManager::new();
    let job_text = input_manager.extract_text(job).await?;
    let mut requests = Vec::with_capacity(resumes.len());
    for path in resumes {
        let resume_text = input_manager.extract_text(path).await?;
        requests.push((path.clone(), AnalysisRequest::new(resume_text, job_text.clone())));
    }

    let dictionary = match &config.dictionary.path {
        Some(path) => SkillDictionary::load(path)?,
        None => SkillDictionary::builtin()?,
    };
    info!("Skill dictionary {} with {} skills", dictionary.version(), dictionary.len());

    let model = options
        .embedding
        .clone()
        .unwrap_or_else(|| config.embedding.model.clone());
    let source = ModelSource::resolve(&model, config.models_dir());

    let loading = spinner(format!("Loading embedding model {}", source.name()));
    let provider = Model2VecProvider::load(source).await;
    loading.finish_and_clear();
    let provider = provider.context("embedding model could not be loaded")?;

    let mut engine_options = config.engine_options();
    if let Some(preset) = options.policy {
        engine_options.policy = preset.policy();
    }
    let engine = Arc::new(AnalysisEngine::new(&dictionary, Arc::new(provider), engine_options)?);

    let generator: Option<Arc<dyn FeedbackGenerator>> = if options.feedback {
        Some(feedback::from_config(&config.feedback))
    } else {
        None
    };

    if chatty {
        println!("🚀 Scoring {} resume(s) against {}", requests.len(), job.display());
    }

    let analyzing = spinner(format!("Analyzing {} resume(s)", requests.len()));
    let mut tasks = JoinSet::new();
    for (index, (path, request)) in requests.into_iter().enumerate() {
        let engine = Arc::clone(&engine);
        tasks.spawn(async move {
            let start_time = Instant::now();
            let result = engine.analyze(&request).await;
            (index, path, result, start_time.elapsed())
        });
    }

    let mut finished = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        finished.push(joined.context("analysis task panicked")?);
    }
    analyzing.finish_and_clear();
    finished.sort_by_key(|(index, ..)| *index);

    let mut reports = Vec::new();
    let mut failures = 0;
    for (_, path, result, elapsed) in finished {
        let result = match result {
            Ok(result) => result,
            Err(e) => {
                error!("{}: {}", path.display(), e);
                failures += 1;
                continue;
            }
        };

        let mut report = AnalysisReport::new(&path, job, result, engine.stats(), elapsed.as_millis() as u64);
        if let Some(generator) = &generator {
            let feedback = generator.generate(&report.result).await;
            report = report.with_feedback(feedback);
        }
        reports.push(report);
    }

    if !reports.is_empty() {
        let formatter = formatter_for(options.format, config.output.color_output, options.detailed);
        let rendered = formatter.format_reports(&reports)?;

        match &options.save {
            Some(path) => {
                save_report_to_file(&rendered, path)?;
                println!("💾 Report saved to {}", path.display());
            }
            None => println!("{}", rendered),
        }
    }

    let stats = engine.stats();
    info!(
        "Cache: {} hits, {} misses, {} joined in-flight",
        stats.cache.hits, stats.cache.misses, stats.cache.joined
    );

    if failures > 0 {
        anyhow::bail!("{} of {} analyses failed", failures, resumes.len());
    }
    Ok(())
}

fn list_skills(config: &Config, technical: bool, soft: bool) -> Result<()> {
    let dictionary = match &config.dictionary.path {
        Some(path) => SkillDictionary::load(path)?,
        None => SkillDictionary::builtin()?,
    };
    let show_all = technical == soft;

    println!("{} {}", "Skill dictionary".bold(), dictionary.version().dimmed());
    if show_all || technical {
        println!("\n{}", "Technical".green().bold());
        for skill in dictionary.technical() {
            println!("  • {}", skill);
        }
    }
    if show_all || soft {
        println!("\n{}", "Soft".green().bold());
        for skill in dictionary.soft() {
            println!("  • {}", skill);
        }
    }
    if show_all && !dictionary.synonyms().is_empty() {
        println!("\n{}", "Synonyms".green().bold());
        for (from, to) in dictionary.synonyms() {
            println!("  {} → {}", from, to);
        }
    }
    Ok(())
}

fn spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
