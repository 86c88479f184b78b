//! Shared fakes for skm-gen integration tests
//!
//! In-process stand-ins for the completion, speech, and video APIs plus an
//! episode backend with scripted timing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use skm_common::config::TomlConfig;
use skm_gen::config::Credentials;
use skm_gen::player::{EpisodeBackend, Lesson};
use skm_gen::services::{
    ChatCompletion, CompletionError, CompletionRequest, CreatedEpisode, EpisodeError, EpisodeKind,
    MediaError, Role, SpeechSynthesis, VideoJobState, VideoJobStatus, VideoRendering,
};
use skm_gen::{AppState, Clients};

/// Which prompt a completion request carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Skill,
    Profile,
    Script,
    Other,
}

fn user_prompt(request: &CompletionRequest) -> &str {
    request
        .messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

pub fn prompt_kind(request: &CompletionRequest) -> PromptKind {
    let prompt = user_prompt(request);
    if prompt.starts_with("Specialist profile:") {
        PromptKind::Skill
    } else if prompt.starts_with("Profile:") {
        PromptKind::Profile
    } else if prompt.starts_with("Write a one-minute") {
        PromptKind::Script
    } else {
        PromptKind::Other
    }
}

/// Row text quoted on the `Competency:` line of a skill prompt
pub fn competency(request: &CompletionRequest) -> Option<String> {
    user_prompt(request)
        .lines()
        .find_map(|line| line.strip_prefix("Competency: \""))
        .map(|rest| rest.trim_end_matches('"').to_string())
}

pub fn strings(prefix: &str, n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{} {}", prefix, i)).collect()
}

/// Valid skill response for `name`
pub fn skill_json(name: &str) -> Value {
    json!({
        "name": name,
        "summary": format!("What {} is about", name),
        "details": strings("detail", 4),
        "coreTechnologies": strings("tech", 3),
        "checkQuestions": strings("question", 10),
        "project": {
            "title": format!("{} project", name),
            "description": "Build something small",
            "requirements": ["Tests"],
            "deliverables": ["Repository"],
            "focusSkills": [name]
        }
    })
}

/// Valid profile response
pub fn profile_json() -> Value {
    json!({
        "title": "Backend developer",
        "marketNames": {"us": ["Backend Engineer"], "ru": ["Бэкенд-разработчик"], "de": ["Backend-Entwickler"]},
        "avgSalary": {"usdYear": 120000, "rubMonth": null},
        "typicalProjects": strings("project", 3),
        "mustAnswerQuestions": strings("question", 5),
        "testProject": {"title": "URL shortener", "description": "Small service", "requirements": ["Tests"]}
    })
}

type Responder = dyn Fn(&CompletionRequest, usize) -> Result<String, CompletionError> + Send + Sync;

/// Scripted completion API
///
/// The responder receives each request and the 0-based index of the call.
pub struct FakeCompletion {
    responder: Box<Responder>,
    delay: Duration,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl FakeCompletion {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&CompletionRequest, usize) -> Result<String, CompletionError> + Send + Sync + 'static,
    {
        Self::with_delay(Duration::ZERO, responder)
    }

    pub fn with_delay<F>(delay: Duration, responder: F) -> Arc<Self>
    where
        F: Fn(&CompletionRequest, usize) -> Result<String, CompletionError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            delay,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Valid answers for every prompt kind; skill names echo the row text
    pub fn happy() -> Arc<Self> {
        Self::new(|request, _| Ok(happy_answer(request)))
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_of(&self, kind: PromptKind) -> usize {
        self.calls().iter().filter(|r| prompt_kind(r) == kind).count()
    }
}

/// Valid answer for `request`
pub fn happy_answer(request: &CompletionRequest) -> String {
    match prompt_kind(request) {
        PromptKind::Skill => {
            let name = competency(request).unwrap_or_else(|| "Skill".to_string());
            format!("```json\n{}\n```", skill_json(&name))
        }
        PromptKind::Profile => profile_json().to_string(),
        PromptKind::Script => "A one-minute script.".to_string(),
        PromptKind::Other => "OK".to_string(),
    }
}

#[async_trait]
impl ChatCompletion for FakeCompletion {
    async fn generate(&self, request: CompletionRequest) -> Result<String, CompletionError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(request.clone());
            calls.len() - 1
        };
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.responder)(&request, index)
    }
}

/// Speech API returning fixed bytes, or a fixed error
pub struct FakeSpeech {
    pub failure: Option<MediaError>,
    pub calls: AtomicU32,
}

impl FakeSpeech {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self {
            failure: None,
            calls: AtomicU32::new(0),
        })
    }

    pub fn failing(error: MediaError) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(error),
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl SpeechSynthesis for FakeSpeech {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, MediaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(b"abc".to_vec()),
        }
    }
}

/// Video API: `submit` returns `job-<n>`, `status` reports `state`
pub struct FakeVideo {
    pub state: VideoJobState,
    pub submits: AtomicU32,
}

impl FakeVideo {
    pub fn reporting(state: VideoJobState) -> Arc<Self> {
        Arc::new(Self {
            state,
            submits: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl VideoRendering for FakeVideo {
    async fn submit(&self, _script: &str) -> Result<String, MediaError> {
        let n = self.submits.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("job-{}", n))
    }

    async fn status(&self, job_id: &str) -> Result<VideoJobStatus, MediaError> {
        let media_locator = (self.state == VideoJobState::Completed)
            .then(|| format!("https://videos.example/{}.mp4", job_id));
        Ok(VideoJobStatus {
            state: self.state.clone(),
            media_locator,
            error: None,
        })
    }
}

type StatusScript = dyn Fn(&str, u32) -> Result<VideoJobStatus, EpisodeError> + Send + Sync;

/// Episode backend with scripted creation and job status
///
/// The status script receives the job id and the 1-based poll number for
/// that job.
pub struct FakeBackend {
    create_delay: Duration,
    failing_creates: AtomicU32,
    statuses: Box<StatusScript>,
    creates: AtomicU32,
    polls: Mutex<HashMap<String, u32>>,
}

impl FakeBackend {
    pub fn new<F>(statuses: F) -> Arc<Self>
    where
        F: Fn(&str, u32) -> Result<VideoJobStatus, EpisodeError> + Send + Sync + 'static,
    {
        Self::build(Duration::ZERO, 0, statuses)
    }

    /// Backend whose first `failing_creates` creations fail
    pub fn build<F>(create_delay: Duration, failing_creates: u32, statuses: F) -> Arc<Self>
    where
        F: Fn(&str, u32) -> Result<VideoJobStatus, EpisodeError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            create_delay,
            failing_creates: AtomicU32::new(failing_creates),
            statuses: Box::new(statuses),
            creates: AtomicU32::new(0),
            polls: Mutex::new(HashMap::new()),
        })
    }

    pub fn creates(&self) -> u32 {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn polls_of(&self, job_id: &str) -> u32 {
        self.polls.lock().unwrap().get(job_id).copied().unwrap_or(0)
    }

    pub fn total_polls(&self) -> u32 {
        self.polls.lock().unwrap().values().sum()
    }
}

pub fn status(state: VideoJobState) -> VideoJobStatus {
    VideoJobStatus {
        state,
        media_locator: None,
        error: None,
    }
}

pub fn completed(locator: &str) -> VideoJobStatus {
    VideoJobStatus {
        state: VideoJobState::Completed,
        media_locator: Some(locator.to_string()),
        error: None,
    }
}

#[async_trait]
impl EpisodeBackend for FakeBackend {
    async fn create(
        &self,
        lesson: &Lesson,
        kind: EpisodeKind,
        _model_id: Option<&str>,
    ) -> Result<CreatedEpisode, EpisodeError> {
        let n = self.creates.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.create_delay.is_zero() {
            tokio::time::sleep(self.create_delay).await;
        }

        let fail = self
            .failing_creates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if fail {
            return Err(EpisodeError::InvalidInput("script service unavailable".to_string()));
        }

        let script = format!("Script about {}", lesson.skill_name);
        Ok(match kind {
            EpisodeKind::Audio => CreatedEpisode::Audio {
                script,
                audio_locator: format!("data:audio/mpeg;base64,{}", lesson.skill_id),
                ready: true,
            },
            EpisodeKind::Video => CreatedEpisode::Video {
                script,
                external_job_id: format!("job-{}-{}", lesson.skill_id, n),
                ready: false,
            },
        })
    }

    async fn poll(&self, job_id: &str) -> Result<VideoJobStatus, EpisodeError> {
        let n = {
            let mut polls = self.polls.lock().unwrap();
            let count = polls.entry(job_id.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        (self.statuses)(job_id, n)
    }
}

pub fn lessons(n: usize) -> Vec<Lesson> {
    (0..n)
        .map(|i| Lesson {
            skill_id: format!("s{}", i),
            skill_name: format!("Skill {}", i),
            summary: Some(format!("Summary {}", i)),
            details: vec![],
        })
        .collect()
}

/// Config with millisecond retry and poll timings
pub fn fast_config() -> TomlConfig {
    let mut config = TomlConfig::default();
    config.generation.retry_step_ms = 1;
    config.completion.backoff_base_ms = 1;
    config.video.poll_interval_secs = 0;
    config.video.max_poll_attempts = 5;
    config
}

/// App state over fakes; absent clients behave like missing keys
pub fn test_state(clients: Clients) -> AppState {
    AppState::new(fast_config(), Credentials::default(), clients)
}
