//! Curriculum orchestrator
//!
//! Drives one run: classified rows → skill generator (sequentially, one row
//! at a time) → profile builder → curriculum result. Every state transition
//! is written to an event channel that the transport layer drains, and mirrored
//! into the run registry so partial results stay inspectable mid-run.
//!
//! **Event order** for a successful run over N rows:
//! progress(1) → skill(1) → … → progress(N) → skill(N) → progress(N, N) →
//! profile → complete. A failure truncates the sequence at the first `error`.
//!
//! **Cancellation:** the run stops at its next suspension point once the
//! event consumer disconnects.

use chrono::Utc;
use futures::stream::{BoxStream, StreamExt};
use skm_common::models::{CurriculumMeta, CurriculumResult, SkillRow};
use skm_common::time::truncate_chars;
use skm_common::GenerationEvent;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::profile_builder::ProfileBuilder;
use super::skill_generator::SkillGenerator;
use crate::runs::{CurriculumRun, RunRegistry, RunState};

/// Characters of row text carried by a progress event
pub const PROGRESS_TEXT_CHARS: usize = 50;

/// Label of the progress event preceding the profile step
pub const PROFILE_STEP_LABEL: &str = "Building specialist profile...";

/// Buffered events between the orchestrator and a slow consumer
const EVENT_BUFFER: usize = 16;

/// Input of one curriculum run
#[derive(Debug, Clone)]
pub struct CurriculumRequest {
    pub run_id: Uuid,
    pub rows: Vec<SkillRow>,
    pub source_file: String,
    /// Profile column marker recorded as `meta.profileId`
    pub profile_id: String,
    pub profile_name: String,
    pub model_id: String,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Failed(String),
    Cancelled,
}

#[derive(Clone)]
pub struct CurriculumOrchestrator {
    skills: SkillGenerator,
    profiles: ProfileBuilder,
    registry: RunRegistry,
}

impl CurriculumOrchestrator {
    pub fn new(skills: SkillGenerator, profiles: ProfileBuilder, registry: RunRegistry) -> Self {
        Self {
            skills,
            profiles,
            registry,
        }
    }

    /// Register a run, spawn it, and return its event stream
    ///
    /// The run is readable from the registry as soon as this returns.
    /// Dropping the stream cancels the run.
    pub async fn start(
        &self,
        request: CurriculumRequest,
    ) -> BoxStream<'static, GenerationEvent> {
        self.registry
            .insert(CurriculumRun::new(
                request.run_id,
                request.profile_name.as_str(),
                request.model_id.as_str(),
                request.source_file.as_str(),
                request.rows.len(),
            ))
            .await;

        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let cancel_token = CancellationToken::new();
        let guard = cancel_token.clone().drop_guard();

        let orchestrator = self.clone();
        let run_id = request.run_id;
        tokio::spawn(async move {
            let outcome = orchestrator.execute(request, tx, cancel_token).await;
            info!(run_id = %run_id, outcome = ?outcome, "Curriculum run finished");
        });

        async_stream::stream! {
            let _guard = guard;
            while let Some(event) = rx.recv().await {
                yield event;
            }
        }
        .boxed()
    }

    /// Execute a registered run to completion, failure, or cancellation
    async fn execute(
        &self,
        request: CurriculumRequest,
        events: mpsc::Sender<GenerationEvent>,
        cancel_token: CancellationToken,
    ) -> RunOutcome {
        let CurriculumRequest {
            run_id,
            rows,
            source_file,
            profile_id,
            profile_name,
            model_id,
        } = request;
        let total = rows.len();

        info!(
            run_id = %run_id,
            rows = total,
            model = %model_id,
            profile = %profile_name,
            "Starting curriculum run"
        );

        if rows.is_empty() {
            return self
                .fail(run_id, &events, "No rows are selected. Nothing to generate".to_string())
                .await;
        }

        let mut skills = Vec::with_capacity(total);

        for (i, row) in rows.iter().enumerate() {
            let progress = GenerationEvent::Progress {
                current: i + 1,
                total,
                skill_name: truncate_chars(&row.text, PROGRESS_TEXT_CHARS).to_string(),
            };
            self.registry.update(run_id, |run| run.current = i + 1).await;
            if !self.emit(&events, progress).await {
                return self.cancel(run_id).await;
            }

            let generated = tokio::select! {
                biased;
                _ = cancel_token.cancelled() => return self.cancel(run_id).await,
                result = self.skills.generate_skill(row, &profile_name, &model_id) => result,
            };

            let skill = match generated {
                Ok(skill) => skill,
                Err(e) => {
                    error!(
                        run_id = %run_id,
                        row = i + 1,
                        row_id = %row.id,
                        attempts = e.attempts,
                        status = ?e.reason.upstream_status(),
                        "Skill generation failed: {}",
                        e
                    );
                    let message = format!(
                        "Failed to process skill \"{}\": {}",
                        truncate_chars(&e.row_text, PROGRESS_TEXT_CHARS),
                        e.reason.short_reason()
                    );
                    return self.fail(run_id, &events, message).await;
                }
            };

            let skill_for_run = skill.clone();
            self.registry
                .update(run_id, move |run| run.skills.push(skill_for_run))
                .await;
            skills.push(skill.clone());
            if !self.emit(&events, GenerationEvent::Skill { data: skill }).await {
                return self.cancel(run_id).await;
            }
        }

        let progress = GenerationEvent::Progress {
            current: total,
            total,
            skill_name: PROFILE_STEP_LABEL.to_string(),
        };
        if !self.emit(&events, progress).await {
            return self.cancel(run_id).await;
        }

        let built = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => return self.cancel(run_id).await,
            result = self.profiles.build_profile(&profile_name, &skills, &model_id) => result,
        };

        let profile = match built {
            Ok(profile) => profile,
            Err(e) => {
                error!(
                    run_id = %run_id,
                    attempts = e.attempts,
                    status = ?e.reason.upstream_status(),
                    "Profile build failed: {}",
                    e
                );
                let message = format!(
                    "Failed to build specialist profile: {}",
                    e.reason.short_reason()
                );
                return self.fail(run_id, &events, message).await;
            }
        };

        let result = CurriculumResult {
            meta: CurriculumMeta {
                profile_id,
                profile_name,
                source_file_name: source_file,
                generated_at: Utc::now(),
                model_id,
            },
            skills,
            specialist_profile: profile.clone(),
        };

        if !self.emit(&events, GenerationEvent::Profile { data: profile }).await {
            return self.cancel(run_id).await;
        }

        let stored = result.clone();
        self.registry
            .update(run_id, move |run| {
                run.result = Some(stored);
                run.transition_to(RunState::Completed);
            })
            .await;

        // The run is complete whether or not the consumer sees the final event
        let _ = self
            .emit(
                &events,
                GenerationEvent::Complete {
                    data: Box::new(result),
                },
            )
            .await;

        RunOutcome::Completed
    }

    async fn emit(&self, events: &mpsc::Sender<GenerationEvent>, event: GenerationEvent) -> bool {
        events.send(event).await.is_ok()
    }

    async fn fail(
        &self,
        run_id: Uuid,
        events: &mpsc::Sender<GenerationEvent>,
        message: String,
    ) -> RunOutcome {
        self.registry.fail(run_id, message.clone()).await;
        let _ = self
            .emit(
                events,
                GenerationEvent::Error {
                    message: message.clone(),
                },
            )
            .await;
        RunOutcome::Failed(message)
    }

    async fn cancel(&self, run_id: Uuid) -> RunOutcome {
        warn!(run_id = %run_id, "Event consumer disconnected, cancelling curriculum run");
        self.registry
            .update(run_id, |run| run.transition_to(RunState::Cancelled))
            .await;
        RunOutcome::Cancelled
    }
}
