//! Media episode player
//!
//! Walks an ordered lesson list and generates one episode per lesson on
//! demand: navigating to a pending episode starts its generation, navigating
//! to an existing one only moves the cursor.
//!
//! **Audio:** script + synthesis complete in one backend call, after which the
//! episode is `ready`.
//!
//! **Video:** script + job submission complete in one backend call, then the
//! job is polled every `interval` (first poll immediately) for at most
//! `max_attempts` polls.
//!
//! **Cancellation:** at most one poll loop is active per player. Starting a
//! new one, navigating away, or shutting the player down cancels it. Every
//! state update checks the relevant token while holding the state lock, so a
//! late response from a cancelled operation never lands. Generation counters
//! per episode discard results of superseded attempts (retry while busy).

pub mod backend;
pub mod episode;

pub use backend::EpisodeBackend;
pub use episode::{Episode, EpisodeState, Lesson, PlayerSnapshot};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use skm_common::config::VideoConfig;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::services::{CreatedEpisode, EpisodeError, EpisodeKind, VideoJobState, VideoJobStatus};

/// Video status polling cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

impl From<&VideoConfig> for PollSettings {
    fn from(config: &VideoConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.poll_interval_secs),
            max_attempts: config.max_poll_attempts.max(1),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("Episode index {index} is out of range (0..{len})")]
    OutOfRange { index: usize, len: usize },

    #[error("The player has been shut down")]
    Closed,
}

struct Slot {
    episode: Episode,
    /// Bumped on every (re)generation; results tagged with an older value are dropped
    generation: u64,
}

struct ActivePoll {
    id: u64,
    index: usize,
    token: CancellationToken,
}

struct PlayerState {
    current_index: usize,
    error: Option<String>,
    slots: Vec<Slot>,
    active_poll: Option<ActivePoll>,
}

impl PlayerState {
    fn stop_polling(&mut self) {
        if let Some(active) = self.active_poll.take() {
            active.token.cancel();
        }
    }

    fn snapshot(&self, kind: EpisodeKind) -> PlayerSnapshot {
        let episodes: Vec<Episode> = self.slots.iter().map(|s| s.episode.clone()).collect();
        PlayerSnapshot {
            kind,
            current_index: self.current_index,
            is_generating: episodes
                .get(self.current_index)
                .is_some_and(|e| e.state == EpisodeState::Generating),
            error: self.error.clone(),
            episodes,
        }
    }
}

enum PollOutcome {
    Ready(String),
    Failed(String),
}

struct PlayerInner {
    kind: EpisodeKind,
    model_id: Option<String>,
    lessons: Vec<Lesson>,
    backend: Arc<dyn EpisodeBackend>,
    poll: PollSettings,
    /// Cancelled on shutdown; parent of every poll token
    session: CancellationToken,
    state: watch::Sender<PlayerState>,
    next_poll_id: AtomicU64,
}

impl PlayerInner {
    fn spawn_creation(self: &Arc<Self>, index: usize, generation: u64) {
        let inner = Arc::clone(self);
        let lesson = self.lessons[index].clone();

        tokio::spawn(async move {
            debug!(kind = inner.kind.as_str(), index, "Generating episode");
            let result = tokio::select! {
                biased;
                _ = inner.session.cancelled() => return,
                result = inner.backend.create(&lesson, inner.kind, inner.model_id.as_deref()) => result,
            };
            inner.finish_creation(index, generation, result);
        });
    }

    fn finish_creation(
        self: &Arc<Self>,
        index: usize,
        generation: u64,
        result: Result<CreatedEpisode, EpisodeError>,
    ) {
        self.state.send_if_modified(|s| {
            if self.session.is_cancelled() {
                return false;
            }
            let slot = &mut s.slots[index];
            if slot.generation != generation {
                debug!(index, "Discarding result of a superseded episode generation");
                return false;
            }

            match result {
                Ok(CreatedEpisode::Audio {
                    script,
                    audio_locator,
                    ..
                }) => {
                    slot.episode.script = script;
                    slot.episode.mark_ready(audio_locator);
                    info!(index, "Audio episode ready");
                }
                Ok(CreatedEpisode::Video {
                    script,
                    external_job_id,
                    ..
                }) => {
                    slot.episode.script = script;
                    slot.episode.external_job_id = Some(external_job_id.clone());
                    if s.current_index == index {
                        self.start_polling(s, index, generation, external_job_id);
                    } else {
                        debug!(index, "Video submitted for a lesson no longer shown; polling deferred");
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!(index, kind = self.kind.as_str(), "Episode generation failed: {}", message);
                    slot.episode.mark_error(message.clone());
                    s.error = Some(message);
                }
            }
            true
        });
    }

    /// Replace the active poll loop with one for `job_id`
    ///
    /// Must be called with the state lock held (from inside a state update).
    fn start_polling(
        self: &Arc<Self>,
        s: &mut PlayerState,
        index: usize,
        generation: u64,
        job_id: String,
    ) {
        s.stop_polling();

        let token = self.session.child_token();
        let id = self.next_poll_id.fetch_add(1, Ordering::Relaxed);
        s.active_poll = Some(ActivePoll {
            id,
            index,
            token: token.clone(),
        });

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            inner.poll_job(index, generation, job_id, id, token).await;
        });
    }

    async fn poll_job(
        &self,
        index: usize,
        generation: u64,
        job_id: String,
        poll_id: u64,
        token: CancellationToken,
    ) {
        let max_attempts = self.poll.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(self.poll.interval) => {}
                }
            }

            let status = tokio::select! {
                biased;
                _ = token.cancelled() => return,
                status = self.backend.poll(&job_id) => status,
            };

            let outcome = match status {
                Ok(VideoJobStatus {
                    state: VideoJobState::Completed,
                    media_locator: Some(locator),
                    ..
                }) => PollOutcome::Ready(locator),
                Ok(VideoJobStatus {
                    state: VideoJobState::Failed,
                    error,
                    ..
                }) => PollOutcome::Failed(
                    error.unwrap_or_else(|| "Video generation failed".to_string()),
                ),
                Ok(status) => {
                    debug!(job_id = %job_id, attempt, state = ?status.state, "Video still rendering");
                    continue;
                }
                Err(e) => PollOutcome::Failed(format!("Video status check failed: {}", e)),
            };

            self.finish_poll(index, generation, poll_id, &token, outcome);
            return;
        }

        warn!(job_id = %job_id, attempts = max_attempts, "Video polling timed out");
        self.finish_poll(
            index,
            generation,
            poll_id,
            &token,
            PollOutcome::Failed(format!(
                "Video generation timed out after {} status checks",
                max_attempts
            )),
        );
    }

    fn finish_poll(
        &self,
        index: usize,
        generation: u64,
        poll_id: u64,
        token: &CancellationToken,
        outcome: PollOutcome,
    ) {
        self.state.send_if_modified(|s| {
            // Navigation and shutdown cancel under the same lock
            if token.is_cancelled() {
                return false;
            }
            if s.active_poll.as_ref().map(|p| p.id) == Some(poll_id) {
                s.active_poll = None;
            }

            let slot = &mut s.slots[index];
            if slot.generation != generation {
                return false;
            }

            match outcome {
                PollOutcome::Ready(locator) => {
                    info!(index, "Video episode ready");
                    slot.episode.mark_ready(locator);
                }
                PollOutcome::Failed(message) => {
                    warn!(index, "Video episode failed: {}", message);
                    slot.episode.mark_error(message.clone());
                    s.error = Some(message);
                }
            }
            true
        });
    }
}

/// Player over one media kind for one session
///
/// Dropping the player shuts it down.
pub struct EpisodePlayer {
    inner: Arc<PlayerInner>,
}

impl EpisodePlayer {
    pub fn new(
        kind: EpisodeKind,
        lessons: Vec<Lesson>,
        model_id: Option<String>,
        backend: Arc<dyn EpisodeBackend>,
        poll: PollSettings,
    ) -> Self {
        let slots = lessons
            .iter()
            .enumerate()
            .map(|(index, lesson)| Slot {
                episode: Episode::pending(index, lesson),
                generation: 0,
            })
            .collect();

        let (state, _) = watch::channel(PlayerState {
            current_index: 0,
            error: None,
            slots,
            active_poll: None,
        });

        Self {
            inner: Arc::new(PlayerInner {
                kind,
                model_id,
                lessons,
                backend,
                poll,
                session: CancellationToken::new(),
                state,
                next_poll_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn kind(&self) -> EpisodeKind {
        self.inner.kind
    }

    pub fn len(&self) -> usize {
        self.inner.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lessons.is_empty()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.inner.state.borrow().snapshot(self.inner.kind)
    }

    /// A poll loop is currently active
    pub fn is_polling(&self) -> bool {
        self.inner.state.borrow().active_poll.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.session.is_cancelled()
    }

    /// Move to episode `index`, generating it if it was never generated
    ///
    /// Leaving an episode cancels its poll loop; returning to a video episode
    /// whose job is still pending resumes polling with a fresh budget.
    pub fn go_to(&self, index: usize) -> Result<PlayerSnapshot, PlayerError> {
        self.check(index)?;
        let inner = &self.inner;
        let mut create_generation = None;

        inner.state.send_modify(|s| {
            if s.active_poll.as_ref().is_some_and(|p| p.index != index) {
                debug!(index, "Navigated away from a rendering video, polling stopped");
                s.stop_polling();
            }
            s.current_index = index;

            let slot = &mut s.slots[index];
            let episode_state = slot.episode.state;
            match episode_state {
                EpisodeState::Pending => {
                    slot.generation += 1;
                    slot.episode.restart();
                    create_generation = Some(slot.generation);
                    s.error = None;
                }
                EpisodeState::Generating => {
                    let resume = slot
                        .episode
                        .external_job_id
                        .clone()
                        .map(|job_id| (slot.generation, job_id));
                    if let Some((generation, job_id)) = resume {
                        if s.active_poll.is_none() {
                            debug!(index, job_id = %job_id, "Resuming video polling");
                            inner.start_polling(s, index, generation, job_id);
                        }
                    }
                }
                EpisodeState::Ready | EpisodeState::Error => {}
            }
        });

        if let Some(generation) = create_generation {
            inner.spawn_creation(index, generation);
        }
        Ok(self.snapshot())
    }

    /// Regenerate episode `index` from scratch and make it current
    pub fn retry(&self, index: usize) -> Result<PlayerSnapshot, PlayerError> {
        self.check(index)?;
        let mut generation = 0;

        self.inner.state.send_modify(|s| {
            s.stop_polling();
            s.current_index = index;
            s.error = None;

            let slot = &mut s.slots[index];
            slot.generation += 1;
            slot.episode.restart();
            generation = slot.generation;
        });

        info!(kind = self.inner.kind.as_str(), index, "Retrying episode");
        self.inner.spawn_creation(index, generation);
        Ok(self.snapshot())
    }

    /// Stop all work; no state changes after this returns
    pub fn shutdown(&self) {
        if self.inner.session.is_cancelled() {
            return;
        }
        self.inner.state.send_modify(|s| {
            self.inner.session.cancel();
            s.active_poll = None;
        });
        info!(kind = self.inner.kind.as_str(), "Episode player shut down");
    }

    /// Wait until `predicate` holds for the player's snapshot
    pub async fn wait_until<F>(&self, mut predicate: F) -> Result<PlayerSnapshot, PlayerError>
    where
        F: FnMut(&PlayerSnapshot) -> bool,
    {
        let kind = self.inner.kind;
        let mut rx = self.inner.state.subscribe();
        let state = rx
            .wait_for(|s| predicate(&s.snapshot(kind)))
            .await
            .map_err(|_| PlayerError::Closed)?;
        Ok(state.snapshot(kind))
    }

    fn check(&self, index: usize) -> Result<(), PlayerError> {
        if self.is_closed() {
            return Err(PlayerError::Closed);
        }
        let len = self.len();
        if index >= len {
            return Err(PlayerError::OutOfRange { index, len });
        }
        Ok(())
    }
}

impl Drop for EpisodePlayer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
