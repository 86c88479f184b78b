//! Prompt templates
//!
//! Pure functions of their structured inputs. The wording is free to change;
//! the JSON shapes requested here must match what `schema` validates.

use serde::Serialize;

/// Details included in a script prompt
pub const SCRIPT_DETAIL_LIMIT: usize = 5;

/// Reduced view of a skill used for profile aggregation
#[derive(Debug, Clone, Serialize)]
pub struct SkillDigest<'a> {
    pub name: &'a str,
    pub summary: &'a str,
}

/// Prompt builder bound to the output language
#[derive(Debug, Clone)]
pub struct Prompts {
    language: String,
}

impl Prompts {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }

    pub fn skill_system(&self) -> String {
        format!(
            "You are a senior technical curriculum designer. You turn a single \
             competency statement into a structured learning unit. Write all \
             content in {}. Reply with one JSON object only, no commentary.",
            self.language
        )
    }

    pub fn skill(&self, row_text: &str, profile_name: &str) -> String {
        format!(
            r#"Specialist profile: "{profile_name}"
Competency: "{row_text}"

Return a JSON object with exactly these fields:
{{
  "name": "short skill name",
  "summary": "one or two sentences on what the skill is",
  "details": ["3 to 15 key points"],
  "coreTechnologies": ["3 to 15 tools, libraries or standards"],
  "checkQuestions": ["exactly 10 self-check questions"],
  "project": {{
    "title": "practice project title",
    "description": "what to build",
    "requirements": ["at least 1 requirement"],
    "deliverables": ["at least 1 deliverable"],
    "focusSkills": ["at least 1 sub-skill the project trains"]
  }}
}}"#
        )
    }

    pub fn profile_system(&self) -> String {
        format!(
            "You are a technical recruiter and labour market analyst. You \
             describe a specialist role from the skills it requires. Write all \
             descriptive content in {}. Reply with one JSON object only.",
            self.language
        )
    }

    pub fn profile(&self, profile_name: &str, skills: &[SkillDigest<'_>]) -> String {
        let skills_json =
            serde_json::to_string_pretty(skills).unwrap_or_else(|_| "[]".to_string());

        format!(
            r#"Profile: "{profile_name}"
Skills of this profile:
{skills_json}

Return a JSON object with exactly these fields:
{{
  "title": "role title",
  "marketNames": {{"us": ["job titles in the US"], "ru": ["job titles in Russia"], "de": ["job titles in Germany"]}},
  "avgSalary": {{"usdYear": number or null, "rubMonth": number or null, "eurYearDe": number or null, "note": "optional caveat"}},
  "typicalProjects": ["at least 3 typical projects"],
  "mustAnswerQuestions": ["at least 5 interview questions"],
  "testProject": {{"title": "...", "description": "...", "requirements": ["at least 1"]}}
}}
Use null for any salary you cannot estimate."#
        )
    }

    pub fn script_system(&self) -> String {
        format!(
            "You are a blunt, energetic teacher who explains hard topics in \
             plain words. Speak {} in a conversational tone. Reply with the \
             script text only.",
            self.language
        )
    }

    /// One-minute teaser script; only the first few details are included
    pub fn script(&self, skill_name: &str, summary: &str, details: &[String]) -> String {
        let mut prompt = format!(
            "Write a one-minute spoken script about \"{skill_name}\".\n\n\
             Topic: {summary}\n"
        );

        if !details.is_empty() {
            prompt.push_str("\nKey points:\n");
            for detail in details.iter().take(SCRIPT_DETAIL_LIMIT) {
                prompt.push_str("- ");
                prompt.push_str(detail);
                prompt.push('\n');
            }
        }

        prompt.push_str(
            "\nRequirements:\n\
             1. 130-150 words\n\
             2. Open with a provocative fact, explain the essence in 2-3 sentences, \
             close with a challenge\n\
             3. Plain text, no Markdown",
        );
        prompt
    }
}
