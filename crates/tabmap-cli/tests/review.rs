use std::io::Cursor;

use tabmap_cli::config::{AppConfig, load_config, load_optional};
use tabmap_cli::review::{ReviewOutcome, review};
use tabmap_llm::{GenerationError, ScriptedGenerator};
use tabmap_map::{MappingSession, PipelineConfig, Stage};
use tabmap_model::{CellValue, Table};

const PROPOSAL: &str = r#"{"id": 9, "name": "Carol"}"#;
const RESTYLED: &str = r#"{"id": "9", "name": "Carol"}"#;

fn session(generator: ScriptedGenerator) -> MappingSession<ScriptedGenerator> {
    let mut session = MappingSession::new(
        generator,
        PipelineConfig {
            seed: Some(1),
            ..PipelineConfig::default()
        },
    );
    let source = Table::from_columns(vec![
        ("full_name", vec![CellValue::text("Carol")]),
        ("uid", vec![CellValue::Integer(9)]),
    ])
    .unwrap();
    let target =
        Table::from_columns(vec![("id", vec!["1", "2"]), ("name", vec!["Alice", "Bob"])]).unwrap();
    session.register_tables(source, target);
    session
}

fn run(
    session: &mut MappingSession<ScriptedGenerator>,
    answers: &str,
    yes: bool,
) -> (ReviewOutcome, String) {
    let mut input = Cursor::new(answers.to_string());
    let mut out = Vec::new();
    let outcome = review(session, &mut input, &mut out, yes).unwrap();
    (outcome, String::from_utf8(out).unwrap())
}

#[test]
fn auto_confirm_accepts_the_first_proposal() {
    let mut session = session(ScriptedGenerator::with_responses([PROPOSAL, RESTYLED]));
    let (outcome, shown) = run(&mut session, "", true);
    assert_eq!(outcome, ReviewOutcome::Accepted);
    assert_eq!(session.stage(), Stage::AwaitingConfirmation);
    assert!(shown.contains("name <- full_name"));
    assert!(!shown.contains("Accept this mapping?"));
}

#[test]
fn feedback_then_accept() {
    let generator = ScriptedGenerator::with_responses([
        PROPOSAL,
        RESTYLED,
        r#"{"id": "9", "name": "CAROL"}"#,
    ]);
    let mut session = session(generator);
    let (outcome, shown) = run(&mut session, "make the name upper case\ny\n", false);
    assert_eq!(outcome, ReviewOutcome::Accepted);
    assert_eq!(shown.matches("Proposed row:").count(), 2);
    assert!(shown.contains("CAROL"));

    let requests = session.generator().requests();
    assert_eq!(requests.len(), 3);
    assert!(requests[2].human.contains("make the name upper case"));
}

#[test]
fn quitting_abandons() {
    let mut session = session(ScriptedGenerator::with_responses([PROPOSAL, RESTYLED]));
    let (outcome, _) = run(&mut session, "q\n", false);
    assert_eq!(outcome, ReviewOutcome::Abandoned);
}

#[test]
fn failed_proposal_can_be_retried() {
    let generator = ScriptedGenerator::new();
    generator.push_error(GenerationError::Timeout(std::time::Duration::from_secs(5)));
    generator.push_response(PROPOSAL);
    generator.push_response(RESTYLED);
    let mut session = session(generator);
    let (outcome, shown) = run(&mut session, "y\ny\n", false);
    assert_eq!(outcome, ReviewOutcome::Accepted);
    assert!(shown.contains("The service call failed"));
    assert!(shown.contains("Try again?"));
}

#[test]
fn declined_retry_abandons() {
    let generator = ScriptedGenerator::new();
    generator.push_error(GenerationError::EmptyResponse);
    let mut session = session(generator);
    let (outcome, _) = run(&mut session, "n\n", false);
    assert_eq!(outcome, ReviewOutcome::Abandoned);
    assert_eq!(session.stage(), Stage::MappingInProgress);
}

#[test]
fn missing_default_config_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_optional(&dir.path().join("tabmap.toml")).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
fn explicit_config_is_read_and_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tabmap.toml");

    std::fs::write(&path, "[pipeline]\nseed = 42\nnarrate_mapping = true\n").unwrap();
    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.pipeline.seed, Some(42));
    assert!(config.pipeline.narrate_mapping);

    std::fs::write(&path, "[pipeline\nseed = ").unwrap();
    let err = load_config(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("invalid config file"));

    assert!(load_config(Some(&dir.path().join("absent.toml"))).is_err());
}

#[test]
fn example_profiles_are_read_from_nested_tables() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tabmap.toml");
    std::fs::write(&path, "[pipeline.wide]\nfew_shot_count = 2\nretention = 0.5\n").unwrap();
    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.pipeline.narrow, PipelineConfig::default().narrow);
    assert_eq!(config.pipeline.wide.few_shot_count, 2);
    assert_eq!(config.pipeline.example_plan(30).kept_columns, 15);

    std::fs::write(&path, "[pipeline.wide]\nretention = 0.5\n").unwrap();
    assert!(load_config(Some(&path)).is_err());
}
