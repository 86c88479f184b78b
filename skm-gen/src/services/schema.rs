//! Validation of model output against the skill and profile shapes
//!
//! Model text is untrusted input. It is unwrapped from Markdown code fences,
//! parsed as JSON, then checked constraint by constraint; the first failing
//! constraint is named in the error. Only after every constraint holds is the
//! value converted into the typed record.

use serde::Deserialize;
use serde_json::{Map, Value};
use skm_common::models::{SkillProject, SpecialistProfile};
use skm_common::time::preview;
use thiserror::Error;

/// Characters of offending text kept in a malformed-JSON error
pub const MALFORMED_PREVIEW_CHARS: usize = 100;

/// Bounds on `details` and `coreTechnologies`
pub const LIST_MIN: usize = 3;
pub const LIST_MAX: usize = 15;
/// Exact number of `checkQuestions`
pub const CHECK_QUESTIONS: usize = 10;
pub const MIN_TYPICAL_PROJECTS: usize = 3;
pub const MIN_INTERVIEW_QUESTIONS: usize = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Malformed JSON in model response: {reason}. Preview: {preview}")]
    MalformedJson { reason: String, preview: String },

    #[error("Schema violation: {0}")]
    Violation(String),
}

/// Validated skill payload as produced by the model
///
/// Carries no `id` or `source`; those always come from the classified row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillResponse {
    pub name: String,
    pub summary: String,
    pub details: Vec<String>,
    pub core_technologies: Vec<String>,
    pub check_questions: Vec<String>,
    pub project: SkillProject,
}

/// Remove a surrounding ```json / ``` fence, if any
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix("```") {
        // Drop the info string ("json", "JSON", ...) up to the first newline
        body = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }

    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }

    body.trim()
}

/// Parse fenced or bare JSON text
pub fn parse_json(text: &str) -> Result<Value, SchemaError> {
    let body = strip_code_fences(text);
    serde_json::from_str(body).map_err(|e| SchemaError::MalformedJson {
        reason: e.to_string(),
        preview: preview(body, MALFORMED_PREVIEW_CHARS),
    })
}

/// Validate model text against the skill-response shape
pub fn validate_skill_response(text: &str) -> Result<SkillResponse, SchemaError> {
    let value = parse_json(text)?;
    let root = Object::root(&value)?;

    root.string("name")?;
    root.string("summary")?;
    root.string_list("details", LIST_MIN, Some(LIST_MAX))?;
    root.string_list("coreTechnologies", LIST_MIN, Some(LIST_MAX))?;
    root.string_list("checkQuestions", CHECK_QUESTIONS, Some(CHECK_QUESTIONS))?;

    let project = root.object("project")?;
    project.string("title")?;
    project.string("description")?;
    project.string_list("requirements", 1, None)?;
    project.string_list("deliverables", 1, None)?;
    project.string_list("focusSkills", 1, None)?;

    into_record(value)
}

/// Validate model text against the specialist-profile shape
pub fn validate_profile(text: &str) -> Result<SpecialistProfile, SchemaError> {
    let value = parse_json(text)?;
    let root = Object::root(&value)?;

    root.string("title")?;

    let markets = root.object("marketNames")?;
    for region in ["us", "ru", "de"] {
        markets.string_list(region, 1, None)?;
    }

    let salary = root.object("avgSalary")?;
    // Absent or null figures mean "no estimate"
    for figure in ["usdYear", "rubMonth", "eurYearDe"] {
        salary.nullable_number(figure)?;
    }
    salary.optional_string("note")?;

    root.string_list("typicalProjects", MIN_TYPICAL_PROJECTS, None)?;
    root.string_list("mustAnswerQuestions", MIN_INTERVIEW_QUESTIONS, None)?;

    let test_project = root.object("testProject")?;
    test_project.string("title")?;
    test_project.string("description")?;
    test_project.string_list("requirements", 1, None)?;

    into_record(value)
}

fn into_record<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, SchemaError> {
    serde_json::from_value(value).map_err(|e| SchemaError::Violation(e.to_string()))
}

/// JSON object under validation, with its path for error messages
struct Object<'a> {
    path: String,
    map: &'a Map<String, Value>,
}

impl<'a> Object<'a> {
    fn root(value: &'a Value) -> Result<Self, SchemaError> {
        match value {
            Value::Object(map) => Ok(Self {
                path: String::new(),
                map,
            }),
            other => Err(SchemaError::Violation(format!(
                "expected a JSON object at the top level, got {}",
                kind(other)
            ))),
        }
    }

    fn field_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn required(&self, key: &str) -> Result<&'a Value, SchemaError> {
        match self.map.get(key) {
            Some(Value::Null) | None => Err(SchemaError::Violation(format!(
                "{} is required",
                self.field_path(key)
            ))),
            Some(value) => Ok(value),
        }
    }

    fn object(&self, key: &str) -> Result<Object<'a>, SchemaError> {
        match self.required(key)? {
            Value::Object(map) => Ok(Object {
                path: self.field_path(key),
                map,
            }),
            other => Err(SchemaError::Violation(format!(
                "{} must be an object, got {}",
                self.field_path(key),
                kind(other)
            ))),
        }
    }

    fn string(&self, key: &str) -> Result<(), SchemaError> {
        match self.required(key)? {
            Value::String(s) if !s.trim().is_empty() => Ok(()),
            Value::String(_) => Err(SchemaError::Violation(format!(
                "{} must not be empty",
                self.field_path(key)
            ))),
            other => Err(SchemaError::Violation(format!(
                "{} must be a string, got {}",
                self.field_path(key),
                kind(other)
            ))),
        }
    }

    fn optional_string(&self, key: &str) -> Result<(), SchemaError> {
        match self.map.get(key) {
            None | Some(Value::Null) | Some(Value::String(_)) => Ok(()),
            Some(other) => Err(SchemaError::Violation(format!(
                "{} must be a string, got {}",
                self.field_path(key),
                kind(other)
            ))),
        }
    }

    fn nullable_number(&self, key: &str) -> Result<(), SchemaError> {
        match self.map.get(key) {
            None | Some(Value::Null) | Some(Value::Number(_)) => Ok(()),
            Some(other) => Err(SchemaError::Violation(format!(
                "{} must be a number or null, got {}",
                self.field_path(key),
                kind(other)
            ))),
        }
    }

    /// Array of non-empty strings with `min..=max` items
    fn string_list(&self, key: &str, min: usize, max: Option<usize>) -> Result<(), SchemaError> {
        let path = self.field_path(key);
        let items = match self.required(key)? {
            Value::Array(items) => items,
            other => {
                return Err(SchemaError::Violation(format!(
                    "{} must be an array, got {}",
                    path,
                    kind(other)
                )))
            }
        };

        let count = items.len();
        match max {
            Some(max) if min == max && count != min => {
                return Err(SchemaError::Violation(format!(
                    "{} must have exactly {} items, got {}",
                    path, min, count
                )))
            }
            Some(max) if count > max => {
                return Err(SchemaError::Violation(format!(
                    "{} must have at most {} items, got {}",
                    path, max, count
                )))
            }
            _ if count < min => {
                return Err(SchemaError::Violation(format!(
                    "{} must have at least {} items, got {}",
                    path, min, count
                )))
            }
            _ => {}
        }

        for (i, item) in items.iter().enumerate() {
            match item {
                Value::String(s) if !s.trim().is_empty() => {}
                Value::String(_) => {
                    return Err(SchemaError::Violation(format!(
                        "{}[{}] must not be empty",
                        path, i
                    )))
                }
                other => {
                    return Err(SchemaError::Violation(format!(
                        "{}[{}] must be a string, got {}",
                        path,
                        i,
                        kind(other)
                    )))
                }
            }
        }

        Ok(())
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings(prefix: &str, n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("{} {}", prefix, i)).collect()
    }

    fn skill_json() -> Value {
        json!({
            "name": "REST API design",
            "summary": "Designing resource-oriented HTTP APIs",
            "details": strings("detail", 4),
            "coreTechnologies": strings("tech", 3),
            "checkQuestions": strings("question", 10),
            "project": {
                "title": "Bookstore API",
                "description": "CRUD service for books",
                "requirements": ["Pagination"],
                "deliverables": ["OpenAPI document"],
                "focusSkills": ["Resource modelling"]
            }
        })
    }

    fn profile_json() -> Value {
        json!({
            "title": "Backend developer",
            "marketNames": {"us": ["Backend Engineer"], "ru": ["Бэкенд-разработчик"], "de": ["Backend-Entwickler"]},
            "avgSalary": {"usdYear": 120000, "rubMonth": null, "eurYearDe": 65000.5},
            "typicalProjects": strings("project", 3),
            "mustAnswerQuestions": strings("question", 5),
            "testProject": {"title": "URL shortener", "description": "Small service", "requirements": ["Tests"]}
        })
    }

    #[test]
    fn test_accepts_valid_skill() {
        let skill = validate_skill_response(&skill_json().to_string()).unwrap();
        assert_eq!(skill.name, "REST API design");
        assert_eq!(skill.check_questions.len(), 10);
        assert_eq!(skill.project.focus_skills, vec!["Resource modelling"]);
    }

    #[test]
    fn test_accepts_fenced_json() {
        let text = format!("```json\n{}\n```", skill_json());
        assert!(validate_skill_response(&text).is_ok());

        let bare_fence = format!("```\n{}\n```", skill_json());
        assert!(validate_skill_response(&bare_fence).is_ok());
    }

    #[test]
    fn test_rejects_nine_or_eleven_check_questions() {
        for count in [9, 11] {
            let mut value = skill_json();
            value["checkQuestions"] = json!(strings("question", count));

            let err = validate_skill_response(&value.to_string()).unwrap_err();
            assert_eq!(
                err,
                SchemaError::Violation(format!(
                    "checkQuestions must have exactly 10 items, got {}",
                    count
                ))
            );
        }
    }

    #[test]
    fn test_rejects_two_details() {
        let mut value = skill_json();
        value["details"] = json!(strings("detail", 2));

        let err = validate_skill_response(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("details must have at least 3 items"));
    }

    #[test]
    fn test_rejects_sixteen_core_technologies() {
        let mut value = skill_json();
        value["coreTechnologies"] = json!(strings("tech", 16));

        let err = validate_skill_response(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("coreTechnologies must have at most 15"));
    }

    #[test]
    fn test_rejects_missing_project_requirements() {
        let mut value = skill_json();
        value["project"]
            .as_object_mut()
            .unwrap()
            .remove("requirements");

        let err = validate_skill_response(&value.to_string()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::Violation("project.requirements is required".to_string())
        );
    }

    #[test]
    fn test_rejects_empty_name() {
        let mut value = skill_json();
        value["name"] = json!("  ");

        let err = validate_skill_response(&value.to_string()).unwrap_err();
        assert_eq!(err, SchemaError::Violation("name must not be empty".to_string()));
    }

    #[test]
    fn test_model_supplied_identity_is_ignored() {
        let mut value = skill_json();
        value["id"] = json!("forged");
        value["source"] = json!({"text": "forged", "sourceColumn": "Z"});

        // Extra keys are tolerated; the record type has nowhere to put them
        assert!(validate_skill_response(&value.to_string()).is_ok());
    }

    #[test]
    fn test_malformed_json_carries_truncated_preview() {
        let text = format!("Sure! Here is the JSON: {}", "x".repeat(200));
        let err = validate_skill_response(&text).unwrap_err();

        match err {
            SchemaError::MalformedJson { preview, .. } => {
                assert!(preview.starts_with("Sure! Here is the JSON:"));
                assert_eq!(preview.chars().count(), MALFORMED_PREVIEW_CHARS + 3);
                assert!(preview.ends_with("..."));
            }
            other => panic!("expected MalformedJson, got {:?}", other),
        }
    }

    #[test]
    fn test_accepts_profile_with_null_and_missing_salary() {
        let mut value = profile_json();
        value["avgSalary"].as_object_mut().unwrap().remove("eurYearDe");

        let profile = validate_profile(&value.to_string()).unwrap();
        assert_eq!(profile.avg_salary.usd_year, Some(120000.0));
        assert_eq!(profile.avg_salary.rub_month, None);
        assert_eq!(profile.avg_salary.eur_year_de, None);
        assert_eq!(profile.avg_salary.note, None);
    }

    #[test]
    fn test_rejects_profile_constraints() {
        let mut value = profile_json();
        value["marketNames"]["de"] = json!([]);
        let err = validate_profile(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("marketNames.de must have at least 1 items"));

        let mut value = profile_json();
        value["mustAnswerQuestions"] = json!(strings("q", 4));
        let err = validate_profile(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("mustAnswerQuestions must have at least 5"));

        let mut value = profile_json();
        value["avgSalary"]["usdYear"] = json!("a lot");
        let err = validate_profile(&value.to_string()).unwrap_err();
        assert!(err.to_string().contains("avgSalary.usdYear must be a number or null"));
    }

    #[test]
    fn test_strip_code_fences_leaves_plain_text() {
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("```json{}```"), "{}");
    }
}
