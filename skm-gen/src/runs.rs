//! In-memory registry of curriculum runs
//!
//! Each streamed run has a snapshot readable while it is still generating, so
//! partial results can be inspected mid-run. Nothing is persisted; the registry
//! lives as long as the process.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use skm_common::models::{CurriculumResult, Skill};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Runs kept in memory; the oldest finished runs are evicted first
pub const MAX_RETAINED_RUNS: usize = 32;

/// Curriculum run state: `generating → {completed | error | cancelled}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Generating,
    Completed,
    Error,
    /// Stream consumer went away before a terminal event
    Cancelled,
}

/// Snapshot of one run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumRun {
    pub run_id: Uuid,
    pub state: RunState,
    pub profile_name: String,
    pub model_id: String,
    pub source_file: String,
    pub current: usize,
    pub total: usize,
    /// Skills produced so far, in row order
    pub skills: Vec<Skill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CurriculumResult>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl CurriculumRun {
    pub fn new(
        run_id: Uuid,
        profile_name: impl Into<String>,
        model_id: impl Into<String>,
        source_file: impl Into<String>,
        total: usize,
    ) -> Self {
        Self {
            run_id,
            state: RunState::Generating,
            profile_name: profile_name.into(),
            model_id: model_id.into(),
            source_file: source_file.into(),
            current: 0,
            total,
            skills: Vec::new(),
            error: None,
            result: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Move to `new_state`; terminal states record the end time
    pub fn transition_to(&mut self, new_state: RunState) {
        self.state = new_state;
        if self.is_terminal() && self.ended_at.is_none() {
            self.ended_at = Some(Utc::now());
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.state, RunState::Generating)
    }
}

#[derive(Default)]
struct RegistryInner {
    runs: HashMap<Uuid, CurriculumRun>,
    last_error: Option<String>,
}

/// Shared handle to all runs of this process
#[derive(Clone, Default)]
pub struct RunRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new run, evicting old finished runs past the retention limit
    pub async fn insert(&self, run: CurriculumRun) {
        let mut inner = self.inner.write().await;
        inner.runs.insert(run.run_id, run);

        while inner.runs.len() > MAX_RETAINED_RUNS {
            let oldest = inner
                .runs
                .values()
                .filter(|r| r.is_terminal())
                .min_by_key(|r| r.started_at)
                .map(|r| r.run_id);
            match oldest {
                Some(id) => {
                    inner.runs.remove(&id);
                }
                None => break,
            }
        }
    }

    pub async fn get(&self, run_id: Uuid) -> Option<CurriculumRun> {
        self.inner.read().await.runs.get(&run_id).cloned()
    }

    /// Apply `f` to a run that is still generating
    ///
    /// Finished runs are immutable; returns false when the run is unknown or
    /// already terminal.
    pub async fn update<F>(&self, run_id: Uuid, f: F) -> bool
    where
        F: FnOnce(&mut CurriculumRun),
    {
        let mut inner = self.inner.write().await;
        match inner.runs.get_mut(&run_id) {
            Some(run) if !run.is_terminal() => {
                f(run);
                true
            }
            _ => false,
        }
    }

    /// Mark a run failed and remember the message for health reporting
    pub async fn fail(&self, run_id: Uuid, message: String) {
        let mut inner = self.inner.write().await;
        if let Some(run) = inner.runs.get_mut(&run_id) {
            if !run.is_terminal() {
                run.error = Some(message.clone());
                run.transition_to(RunState::Error);
            }
        }
        inner.last_error = Some(message);
    }

    /// Most recent fatal run error
    pub async fn last_error(&self) -> Option<String> {
        self.inner.read().await.last_error.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.runs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_ignores_finished_runs() {
        let registry = RunRegistry::new();
        let id = Uuid::new_v4();
        registry
            .insert(CurriculumRun::new(id, "Backend", "m", "f.csv", 2))
            .await;

        assert!(registry.update(id, |r| r.current = 1).await);
        registry.fail(id, "boom".to_string()).await;
        assert!(!registry.update(id, |r| r.current = 2).await);

        let run = registry.get(id).await.unwrap();
        assert_eq!(run.state, RunState::Error);
        assert_eq!(run.current, 1);
        assert!(run.ended_at.is_some());
        assert_eq!(registry.last_error().await.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_eviction_keeps_generating_runs() {
        let registry = RunRegistry::new();
        let live = Uuid::new_v4();
        registry
            .insert(CurriculumRun::new(live, "p", "m", "f", 1))
            .await;

        for _ in 0..MAX_RETAINED_RUNS + 5 {
            let mut run = CurriculumRun::new(Uuid::new_v4(), "p", "m", "f", 1);
            run.transition_to(RunState::Completed);
            registry.insert(run).await;
        }

        assert_eq!(registry.len().await, MAX_RETAINED_RUNS);
        assert!(registry.get(live).await.is_some());
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let run = CurriculumRun::new(Uuid::nil(), "Backend", "m", "f.csv", 3);
        let value = serde_json::to_value(&run).unwrap();

        assert_eq!(value["state"], "generating");
        assert_eq!(value["runId"], Uuid::nil().to_string());
        assert_eq!(value["total"], 3);
        assert!(value.get("error").is_none());
        assert!(value.get("result").is_none());
    }
}
