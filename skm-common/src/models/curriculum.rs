//! Curriculum result: the unit written to the downloadable artifact

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Skill, SpecialistProfile};
use crate::time::artifact_timestamp;

/// Run metadata stored alongside the generated curriculum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumMeta {
    pub profile_id: String,
    pub profile_name: String,
    pub source_file_name: String,
    /// Wall-clock completion time of the run
    pub generated_at: DateTime<Utc>,
    pub model_id: String,
}

/// Complete output of one curriculum run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumResult {
    pub meta: CurriculumMeta,
    pub skills: Vec<Skill>,
    pub specialist_profile: SpecialistProfile,
}

impl CurriculumResult {
    /// Download file name: `skills_<profileId>_<YYYYMMDD_HHMM>.json`
    pub fn artifact_file_name(&self) -> String {
        format!(
            "skills_{}_{}.json",
            self.meta.profile_id,
            artifact_timestamp(self.meta.generated_at)
        )
    }

    /// Pretty-printed JSON body of the downloadable artifact
    pub fn to_artifact_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse an artifact previously produced by [`CurriculumResult::to_artifact_json`]
    pub fn from_artifact_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
