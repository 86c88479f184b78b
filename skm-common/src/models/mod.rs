//! Curriculum data model
//!
//! - `SkillRow`: one selected CSV row, input to skill generation
//! - `Skill`: validated per-row curriculum entry
//! - `SpecialistProfile`: aggregate derived from all skills of a run
//! - `CurriculumResult`: the downloadable artifact

pub mod curriculum;
pub mod profile;
pub mod skill;

pub use curriculum::{CurriculumMeta, CurriculumResult};
pub use profile::{MarketNames, SalaryEstimate, SpecialistProfile, TestProject};
pub use skill::{Skill, SkillProject, SkillRow, SkillSource};
