//! Curriculum generation event envelope
//!
//! One event is emitted per state transition of a curriculum run. On the wire
//! each event is a single JSON object discriminated by `type`:
//!
//! ```json
//! {"type":"progress","current":1,"total":3,"skillName":"Build REST APIs"}
//! {"type":"skill","data":{...}}
//! {"type":"profile","data":{...}}
//! {"type":"complete","data":{...}}
//! {"type":"error","message":"..."}
//! ```
//!
//! A successful run emits `progress`/`skill` pairs in row order, one more
//! `progress`, then `profile` and `complete`. A failed run stops at the first
//! `error`. Exactly one terminal event (`complete` or `error`) is emitted per run.

use serde::{Deserialize, Serialize};

use crate::models::{CurriculumResult, Skill, SpecialistProfile};

/// Event emitted by the curriculum orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GenerationEvent {
    /// Work started on step `current` of `total`
    Progress {
        current: usize,
        total: usize,
        /// Truncated row text, or the profile step label
        #[serde(rename = "skillName")]
        skill_name: String,
    },
    /// A skill was generated and validated
    Skill { data: Skill },
    /// The specialist profile was built
    Profile { data: SpecialistProfile },
    /// Terminal: the run completed
    Complete { data: Box<CurriculumResult> },
    /// Terminal: the run failed
    Error { message: String },
}

impl GenerationEvent {
    /// Wire name of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            GenerationEvent::Progress { .. } => "progress",
            GenerationEvent::Skill { .. } => "skill",
            GenerationEvent::Profile { .. } => "profile",
            GenerationEvent::Complete { .. } => "complete",
            GenerationEvent::Error { .. } => "error",
        }
    }

    /// True for `complete` and `error`
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationEvent::Complete { .. } | GenerationEvent::Error { .. }
        )
    }
}
