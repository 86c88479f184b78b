//! Specialist profile aggregated from all skills of one run

use serde::{Deserialize, Serialize};

/// Market job titles per region, each with at least one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketNames {
    pub us: Vec<String>,
    pub ru: Vec<String>,
    pub de: Vec<String>,
}

/// Salary estimate per currency
///
/// Every figure is optional: a missing estimate is valid data, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalaryEstimate {
    pub usd_year: Option<f64>,
    pub rub_month: Option<f64>,
    pub eur_year_de: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Take-home test project for the profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestProject {
    pub title: String,
    pub description: String,
    pub requirements: Vec<String>,
}

/// Specialist profile derived from the generated skills
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialistProfile {
    pub title: String,
    pub market_names: MarketNames,
    pub avg_salary: SalaryEstimate,
    /// At least 3 entries
    pub typical_projects: Vec<String>,
    /// At least 5 entries
    pub must_answer_questions: Vec<String>,
    pub test_project: TestProject,
}
