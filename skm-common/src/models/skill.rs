//! Skill rows and generated skills

use serde::{Deserialize, Serialize};

/// One selected row from the uploaded CSV
///
/// Immutable once classified. `id` is derived from `(text, row index)` so
/// parsing the same file twice yields the same ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRow {
    pub id: String,
    pub text: String,
    /// Marker of the profile column the row was selected from (e.g. "A")
    pub source_column: String,
}

/// Provenance of a generated skill, always copied from the classified row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillSource {
    pub text: String,
    pub source_column: String,
}

/// Practice project attached to a skill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillProject {
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub deliverables: Vec<String>,
    pub focus_skills: Vec<String>,
}

/// Generated curriculum entry for one skill row
///
/// `details` and `core_technologies` hold 3..=15 items, `check_questions`
/// holds exactly 10.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: String,
    pub source: SkillSource,
    pub name: String,
    pub summary: String,
    pub details: Vec<String>,
    pub core_technologies: Vec<String>,
    pub check_questions: Vec<String>,
    pub project: SkillProject,
}

impl SkillRow {
    /// Provenance record for skills generated from this row
    pub fn source(&self) -> SkillSource {
        SkillSource {
            text: self.text.clone(),
            source_column: self.source_column.clone(),
        }
    }
}
