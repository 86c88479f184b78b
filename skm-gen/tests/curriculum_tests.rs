//! Curriculum orchestrator integration tests
//!
//! Drive full runs against a scripted completion API and check the event
//! sequence, the run registry, and the retry behaviour of the generators.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use helpers::{happy_answer, prompt_kind, competency, FakeCompletion, PromptKind};
use skm_common::models::SkillRow;
use skm_common::GenerationEvent;
use skm_gen::runs::{RunRegistry, RunState};
use skm_gen::services::{
    classify, ChatCompletion, CompletionError, CurriculumOrchestrator, CurriculumRequest,
    LinearRetry, ProfileBuilder, Prompts, SkillGenerator,
};
use uuid::Uuid;

fn orchestrator(client: Arc<dyn ChatCompletion>, registry: &RunRegistry) -> CurriculumOrchestrator {
    let prompts = Prompts::new("English");
    let retry = LinearRetry::new(3, Duration::from_millis(1));
    CurriculumOrchestrator::new(
        SkillGenerator::new(Arc::clone(&client), prompts.clone(), retry),
        ProfileBuilder::new(client, prompts, retry),
        registry.clone(),
    )
}

fn rows(texts: &[&str]) -> Vec<SkillRow> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| SkillRow {
            id: format!("skill_test_{}", i),
            text: text.to_string(),
            source_column: "A".to_string(),
        })
        .collect()
}

fn request(rows: Vec<SkillRow>) -> CurriculumRequest {
    CurriculumRequest {
        run_id: Uuid::new_v4(),
        rows,
        source_file: "skills.csv".to_string(),
        profile_id: "A".to_string(),
        profile_name: "Backend developer".to_string(),
        model_id: "openai/gpt-4o".to_string(),
    }
}

async fn collect(orchestrator: &CurriculumOrchestrator, request: CurriculumRequest) -> Vec<GenerationEvent> {
    let stream = orchestrator.start(request).await;
    tokio::time::timeout(Duration::from_secs(10), stream.collect::<Vec<_>>())
        .await
        .expect("run did not finish")
}

fn types(events: &[GenerationEvent]) -> Vec<&'static str> {
    events.iter().map(|e| e.event_type()).collect()
}

#[tokio::test]
async fn tc_run_001_successful_run_event_order() {
    let fake = FakeCompletion::happy();
    let registry = RunRegistry::new();
    let orchestrator = orchestrator(fake.clone(), &registry);

    let req = request(rows(&["Build REST APIs", "Write SQL", "Deploy containers"]));
    let run_id = req.run_id;
    let events = collect(&orchestrator, req).await;

    assert_eq!(
        types(&events),
        vec![
            "progress", "skill", "progress", "skill", "progress", "skill", "progress", "profile",
            "complete"
        ]
    );

    match &events[0] {
        GenerationEvent::Progress {
            current,
            total,
            skill_name,
        } => {
            assert_eq!((*current, *total), (1, 3));
            assert_eq!(skill_name, "Build REST APIs");
        }
        other => panic!("unexpected first event: {:?}", other),
    }
    match &events[6] {
        GenerationEvent::Progress {
            current,
            total,
            skill_name,
        } => {
            assert_eq!((*current, *total), (3, 3));
            assert_eq!(skill_name, "Building specialist profile...");
        }
        other => panic!("unexpected profile progress: {:?}", other),
    }

    let GenerationEvent::Complete { data } = &events[8] else {
        panic!("last event must be complete");
    };
    assert_eq!(data.skills.len(), 3);
    assert_eq!(data.meta.profile_id, "A");
    assert_eq!(data.meta.source_file_name, "skills.csv");
    assert_eq!(data.meta.model_id, "openai/gpt-4o");
    assert_eq!(data.skills[1].id, "skill_test_1");
    assert_eq!(data.skills[1].source.text, "Write SQL");

    // One completion per row plus the profile
    assert_eq!(fake.calls_of(PromptKind::Skill), 3);
    assert_eq!(fake.calls_of(PromptKind::Profile), 1);

    let run = registry.get(run_id).await.unwrap();
    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.skills.len(), 3);
    assert!(run.result.is_some());
}

#[tokio::test]
async fn tc_run_002_failure_at_row_k_truncates_sequence() {
    // Row 2 never yields valid JSON
    let fake = FakeCompletion::new(|request, _| {
        if competency(request).as_deref() == Some("Write SQL") {
            Ok("not json at all".to_string())
        } else {
            Ok(happy_answer(request))
        }
    });
    let registry = RunRegistry::new();
    let orchestrator = orchestrator(fake.clone(), &registry);

    let req = request(rows(&["Build REST APIs", "Write SQL", "Deploy containers"]));
    let run_id = req.run_id;
    let events = collect(&orchestrator, req).await;

    assert_eq!(types(&events), vec!["progress", "skill", "progress", "error"]);
    let GenerationEvent::Error { message } = &events[3] else {
        panic!("expected error event");
    };
    assert!(message.starts_with("Failed to process skill \"Write SQL\""), "{}", message);

    // All three attempts spent on row 2; row 3 and the profile never requested
    let row_two_calls = fake
        .calls()
        .iter()
        .filter(|r| competency(r).as_deref() == Some("Write SQL"))
        .count();
    assert_eq!(row_two_calls, 3);
    assert_eq!(fake.calls_of(PromptKind::Skill), 4);
    assert_eq!(fake.calls_of(PromptKind::Profile), 0);

    // Row 1 stays inspectable
    let run = registry.get(run_id).await.unwrap();
    assert_eq!(run.state, RunState::Error);
    assert_eq!(run.skills.len(), 1);
    assert_eq!(run.skills[0].source.text, "Build REST APIs");
    assert!(run.result.is_none());
    assert_eq!(registry.last_error().await.as_deref(), Some(message.as_str()));
}

#[tokio::test]
async fn tc_run_003_zero_rows_fails_without_network_calls() {
    let fake = FakeCompletion::happy();
    let registry = RunRegistry::new();
    let orchestrator = orchestrator(fake.clone(), &registry);

    let events = collect(&orchestrator, request(vec![])).await;

    assert_eq!(types(&events), vec!["error"]);
    assert_eq!(fake.call_count(), 0);
}

#[tokio::test]
async fn tc_run_004_auth_failure_is_not_retried() {
    let fake = FakeCompletion::new(|_, _| {
        Err(CompletionError::Auth {
            status: 401,
            body: "invalid key".to_string(),
        })
    });
    let registry = RunRegistry::new();
    let orchestrator = orchestrator(fake.clone(), &registry);

    let events = collect(&orchestrator, request(rows(&["Build REST APIs"]))).await;

    assert_eq!(types(&events), vec!["progress", "error"]);
    assert_eq!(fake.call_count(), 1);
}

#[tokio::test]
async fn tc_run_005_malformed_output_is_retried_then_succeeds() {
    // First skill attempt returns prose, the second a valid object
    let fake = FakeCompletion::new(|request, index| {
        if index == 0 {
            Ok("Sure! Here you go.".to_string())
        } else {
            Ok(happy_answer(request))
        }
    });
    let registry = RunRegistry::new();
    let orchestrator = orchestrator(fake.clone(), &registry);

    let events = collect(&orchestrator, request(rows(&["Build REST APIs"]))).await;

    assert_eq!(
        types(&events),
        vec!["progress", "skill", "progress", "profile", "complete"]
    );
    assert_eq!(fake.calls_of(PromptKind::Skill), 2);
}

#[tokio::test]
async fn tc_run_006_profile_failure_fails_run() {
    let fake = FakeCompletion::new(|request, _| match prompt_kind(request) {
        PromptKind::Profile => Err(CompletionError::Server {
            status: 502,
            body: "bad gateway".to_string(),
        }),
        _ => Ok(happy_answer(request)),
    });
    let registry = RunRegistry::new();
    let orchestrator = orchestrator(fake.clone(), &registry);

    let req = request(rows(&["Build REST APIs"]));
    let run_id = req.run_id;
    let events = collect(&orchestrator, req).await;

    assert_eq!(types(&events), vec!["progress", "skill", "progress", "error"]);
    assert_eq!(fake.calls_of(PromptKind::Profile), 3);
    assert_eq!(registry.get(run_id).await.unwrap().state, RunState::Error);
}

#[tokio::test]
async fn tc_run_007_dropping_stream_cancels_run() {
    let fake = FakeCompletion::with_delay(Duration::from_millis(50), |request, _| {
        Ok(happy_answer(request))
    });
    let registry = RunRegistry::new();
    let orchestrator = orchestrator(fake.clone(), &registry);

    let req = request(rows(&["Build REST APIs", "Write SQL", "Deploy containers"]));
    let run_id = req.run_id;
    let mut stream = orchestrator.start(req).await;

    let first = stream.next().await.unwrap();
    assert_eq!(first.event_type(), "progress");
    drop(stream);

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(run) = registry.get(run_id).await {
            if run.state == RunState::Cancelled {
                break;
            }
        }
        assert!(tokio::time::Instant::now() < deadline, "run was not cancelled");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // No further rows are started after cancellation
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(fake.calls_of(PromptKind::Skill) <= 1);
    assert_eq!(fake.calls_of(PromptKind::Profile), 0);
}

#[tokio::test]
async fn tc_run_008_csv_scenario_generates_one_row() {
    let csv = "Skill,Profile\nBuild REST APIs,X\nDraw UI mockups,\n";
    let classified = classify(csv.as_bytes(), "skills.csv", "A").unwrap();
    assert_eq!(classified.rows.len(), 1);
    assert_eq!(classified.rows[0].text, "Build REST APIs");

    let fake = FakeCompletion::happy();
    let registry = RunRegistry::new();
    let orchestrator = orchestrator(fake.clone(), &registry);

    let events = collect(&orchestrator, request(classified.rows)).await;

    let skills: Vec<_> = events
        .iter()
        .filter(|e| e.event_type() == "skill")
        .collect();
    assert_eq!(skills.len(), 1);
    assert_eq!(fake.calls_of(PromptKind::Skill), 1);
    assert_eq!(events.last().unwrap().event_type(), "complete");
}

#[tokio::test]
async fn tc_run_009_long_row_text_truncated_in_progress() {
    let long_text = "Я".repeat(80);
    let fake = FakeCompletion::happy();
    let registry = RunRegistry::new();
    let orchestrator = orchestrator(fake, &registry);

    let events = collect(&orchestrator, request(rows(&[long_text.as_str()]))).await;

    let GenerationEvent::Progress { skill_name, .. } = &events[0] else {
        panic!("expected progress");
    };
    assert_eq!(skill_name.chars().count(), 50);
}

#[tokio::test(flavor = "current_thread")]
async fn tc_run_010_run_registered_before_first_event() {
    let fake = FakeCompletion::with_delay(Duration::from_millis(200), |request, _| {
        Ok(happy_answer(request))
    });
    let registry = RunRegistry::new();
    let orchestrator = orchestrator(fake.clone(), &registry);

    let req = request(rows(&["Build REST APIs", "Write SQL"]));
    let run_id = req.run_id;
    let stream = orchestrator.start(req).await;

    let run = registry.get(run_id).await.unwrap();
    assert_eq!(run.state, RunState::Generating);
    assert_eq!(run.total, 2);
    assert!(run.skills.is_empty());

    drop(stream);
}
