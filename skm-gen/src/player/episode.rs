//! Episode records and player snapshots

use serde::{Deserialize, Serialize};

use crate::services::EpisodeKind;

/// Episode state: `pending → generating → {ready | error}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeState {
    Pending,
    Generating,
    Ready,
    Error,
}

/// One entry of the ordered lesson list a player walks through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub skill_id: String,
    pub skill_name: String,
    /// Falls back to the skill name when absent
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub details: Vec<String>,
}

impl Lesson {
    pub fn summary_or_name(&self) -> &str {
        self.summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.skill_name)
    }
}

/// Per-skill media unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub index: usize,
    pub skill_id: String,
    pub skill_name: String,
    pub script: String,
    pub media_locator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_job_id: Option<String>,
    pub state: EpisodeState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Episode {
    pub(crate) fn pending(index: usize, lesson: &Lesson) -> Self {
        Self {
            index,
            skill_id: lesson.skill_id.clone(),
            skill_name: lesson.skill_name.clone(),
            script: String::new(),
            media_locator: None,
            external_job_id: None,
            state: EpisodeState::Pending,
            error: None,
        }
    }

    /// Clear previous output and enter `generating`
    pub(crate) fn restart(&mut self) {
        self.script.clear();
        self.media_locator = None;
        self.external_job_id = None;
        self.error = None;
        self.state = EpisodeState::Generating;
    }

    pub(crate) fn mark_ready(&mut self, media_locator: String) {
        self.media_locator = Some(media_locator);
        self.error = None;
        self.state = EpisodeState::Ready;
    }

    pub(crate) fn mark_error(&mut self, message: String) {
        self.error = Some(message);
        self.state = EpisodeState::Error;
    }
}

/// Client-visible state of a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub kind: EpisodeKind,
    pub current_index: usize,
    /// The current episode is generating
    pub is_generating: bool,
    /// Most recent episode failure, cleared when a new generation starts
    pub error: Option<String>,
    pub episodes: Vec<Episode>,
}

impl PlayerSnapshot {
    pub fn current(&self) -> Option<&Episode> {
        self.episodes.get(self.current_index)
    }
}
