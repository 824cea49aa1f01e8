//! Integration tests for input handling, reports and feedback

mod common;

use common::{engine_with, fixture, CountingProvider};
use resume_ats::error::AtsError;
use resume_ats::feedback::{FeedbackGenerator, FeedbackSource, TemplateFeedback};
use resume_ats::input::InputManager;
use resume_ats::output::formatter::{formatter_for, save_report_to_file, OutputFormatter};
use resume_ats::output::report::AnalysisReport;
use resume_ats::processing::analyzer::{AnalysisRequest, EngineOptions};
use resume_ats::processing::dictionary::SkillDictionary;
use resume_ats::config::OutputFormat;
use std::path::Path;
use std::sync::Arc;

#[tokio::test]
async fn test_text_extraction_from_txt() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.txt");

    let text = manager.extract_text(path).await.unwrap();
    assert!(text.contains("Jane Roe"));
    assert!(text.contains("Senior Software Engineer"));
    assert!(text.contains("PostgreSQL"));
}

#[tokio::test]
async fn test_text_extraction_from_markdown() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.md");

    let text = manager.extract_text(path).await.unwrap();
    assert!(text.contains("Jane Roe"));
    assert!(text.contains("Senior Software Engineer"));
    assert!(text.contains("Kubernetes"));
    // Markup is gone
    assert!(!text.contains("**"));
    assert!(!text.contains("##"));
}

#[tokio::test]
async fn test_caching_functionality() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.txt");

    let first = manager.extract_text(path).await.unwrap();
    assert_eq!(manager.cache_size(), 1);

    let second = manager.extract_text(path).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(manager.cache_size(), 1);
}

#[tokio::test]
async fn test_unsupported_file_type() {
    let mut manager = InputManager::new();

    let result = manager.extract_text(Path::new("tests/fixtures/unsupported.xyz")).await;
    assert!(matches!(result, Err(AtsError::UnsupportedFormat(_))));

    let result = manager.extract_text(Path::new("tests/fixtures/resume.pdf")).await;
    assert!(matches!(result, Err(AtsError::UnsupportedFormat(_))));
}

#[tokio::test]
async fn test_nonexistent_file() {
    let mut manager = InputManager::new();
    let result = manager.extract_text(Path::new("tests/fixtures/missing.txt")).await;
    assert!(matches!(result, Err(AtsError::InvalidInput(_))));
}

#[tokio::test]
async fn test_markdown_and_text_resumes_detect_all_sections() {
    let mut manager = InputManager::new();
    let engine = engine_with(Arc::new(CountingProvider::new()), EngineOptions::default());
    let job = fixture("job_description.txt");

    for path in ["tests/fixtures/sample_resume.txt", "tests/fixtures/sample_resume.md"] {
        let resume = manager.extract_text(Path::new(path)).await.unwrap();
        let result = engine.analyze(&AnalysisRequest::new(resume, job.clone())).await.unwrap();

        assert_eq!(result.section_score(), 100, "{}", path);
        assert_eq!(result.required_years, 5);
        assert_eq!(result.candidate_years, 6);
        assert_eq!(result.experience_score(), 100);
        assert!(result.matched_skills.contains(&"python".to_string()));
        assert!(result.matched_skills.contains(&"kubernetes".to_string()));
        assert!(result.missing_skills.contains(&"kafka".to_string()));
    }
}

#[tokio::test]
async fn test_fixture_skill_extraction() {
    let engine = engine_with(Arc::new(CountingProvider::new()), EngineOptions::default());
    let result = engine
        .analyze(&AnalysisRequest::new(
            fixture("sample_resume.txt"),
            fixture("job_description.txt"),
        ))
        .await
        .unwrap();

    assert_eq!(
        result.matched_skills,
        vec!["aws", "communication", "docker", "kubernetes", "python"]
    );
    assert_eq!(result.missing_skills, vec!["collaboration", "kafka", "sql", "terraform"]);
    assert_eq!(result.skill_match_percentage(), 56);
}

#[tokio::test]
async fn test_report_round_trips_through_json() {
    let engine = engine_with(Arc::new(CountingProvider::new()), EngineOptions::default());
    let result = engine
        .analyze(&AnalysisRequest::new(
            fixture("sample_resume.txt"),
            fixture("job_description.txt"),
        ))
        .await
        .unwrap();

    let feedback = TemplateFeedback.generate(&result).await;
    let report = AnalysisReport::new(
        Path::new("tests/fixtures/sample_resume.txt"),
        Path::new("tests/fixtures/job_description.txt"),
        result,
        engine.stats(),
        12,
    )
    .with_feedback(feedback);

    let json = formatter_for(OutputFormat::Json, false, false).format_report(&report).unwrap();
    let parsed: AnalysisReport = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, report);
    assert_eq!(parsed.metadata.embedding_model, "counting-hash");
    assert_eq!(parsed.metadata.scoring_policy, "weighted@v1");

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["result"]["ats_score"].is_u64());
    assert_eq!(value["feedback"]["source"]["kind"], "template");
}

#[tokio::test]
async fn test_console_report_and_save() {
    let engine = engine_with(Arc::new(CountingProvider::new()), EngineOptions::default());
    let result = engine
        .analyze(&AnalysisRequest::new("Python developer", "Python and SQL"))
        .await
        .unwrap();
    let report = AnalysisReport::new(Path::new("cv.txt"), Path::new("jd.txt"), result, engine.stats(), 3);

    let rendered = formatter_for(OutputFormat::Console, false, true)
        .format_reports(std::slice::from_ref(&report))
        .unwrap();
    assert!(rendered.contains("sql"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports").join("cv.txt");
    save_report_to_file(&rendered, &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), rendered);
}

#[tokio::test]
async fn test_template_feedback_content() {
    let engine = engine_with(Arc::new(CountingProvider::new()), EngineOptions::default());
    let result = engine
        .analyze(&AnalysisRequest::new(
            "Python\n3 years experience",
            "Python, SQL required\n5 years required",
        ))
        .await
        .unwrap();

    let feedback = TemplateFeedback.generate(&result).await;
    assert_eq!(feedback.source, FeedbackSource::Template);
    assert!(feedback.text.starts_with("Overall:"));
    assert!(feedback.text.contains("sql"));
    assert!(feedback.text.contains("asks for 5 years; your resume states 3 years"));
    assert!(feedback.text.contains("section completeness score is 0/100"));
    assert!(feedback.text.contains("Improve wording"));
}

#[test]
fn test_builtin_dictionary_loads() {
    let dictionary = SkillDictionary::builtin().unwrap();
    assert!(!dictionary.version().is_empty());
    assert!(dictionary.len() > 50);
}
