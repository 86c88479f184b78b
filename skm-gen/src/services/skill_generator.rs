//! Skill generation: one classified row → one validated skill

use std::sync::Arc;

use skm_common::models::{Skill, SkillRow};
use thiserror::Error;
use tracing::info;

use super::completion::{ChatCompletion, ChatMessage, CompletionError, CompletionRequest};
use super::prompts::Prompts;
use super::retry::{retry_linear, LinearRetry};
use super::schema::{validate_skill_response, SchemaError};

const SKILL_TEMPERATURE: f32 = 0.7;

/// Failure of a single prompt → complete → validate attempt
#[derive(Debug, Error)]
pub enum AttemptFailure {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl AttemptFailure {
    /// Shape and transient upstream failures may be re-sampled
    pub fn is_retryable(&self) -> bool {
        match self {
            AttemptFailure::Completion(e) => e.is_retryable(),
            AttemptFailure::Schema(_) => true,
        }
    }

    /// Upstream HTTP status, if the failure came from the provider
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            AttemptFailure::Completion(e) => e.status(),
            AttemptFailure::Schema(_) => None,
        }
    }

    /// Short description for end users
    pub fn short_reason(&self) -> String {
        match self {
            AttemptFailure::Completion(CompletionError::Auth { .. }) => {
                "the completion API rejected the API key".to_string()
            }
            AttemptFailure::Completion(CompletionError::RateLimited { .. }) => {
                "the completion API rate limit was exceeded".to_string()
            }
            AttemptFailure::Completion(CompletionError::Network(_)) => {
                "network error while contacting the completion API".to_string()
            }
            AttemptFailure::Completion(e) => e.to_string(),
            AttemptFailure::Schema(SchemaError::MalformedJson { .. }) => {
                "the model did not return valid JSON".to_string()
            }
            AttemptFailure::Schema(e) => e.to_string(),
        }
    }
}

/// All attempts for one row failed
#[derive(Debug, Error)]
#[error("Failed to generate skill after {attempts} attempts: {reason}")]
pub struct SkillGenerationError {
    /// Original row text
    pub row_text: String,
    pub attempts: u32,
    #[source]
    pub reason: AttemptFailure,
}

/// Generates skills from rows with the configured retry policy
#[derive(Clone)]
pub struct SkillGenerator {
    client: Arc<dyn ChatCompletion>,
    prompts: Prompts,
    retry: LinearRetry,
}

impl SkillGenerator {
    pub fn new(client: Arc<dyn ChatCompletion>, prompts: Prompts, retry: LinearRetry) -> Self {
        Self {
            client,
            prompts,
            retry,
        }
    }

    /// Generate the skill for `row`
    ///
    /// `id` and `source` of the result are copied from `row`; the model never
    /// supplies them.
    pub async fn generate_skill(
        &self,
        row: &SkillRow,
        profile_name: &str,
        model_id: &str,
    ) -> Result<Skill, SkillGenerationError> {
        let system = self.prompts.skill_system();
        let prompt = self.prompts.skill(&row.text, profile_name);

        let response = retry_linear(
            "skill generation",
            self.retry,
            AttemptFailure::is_retryable,
            |attempt| {
                let request = CompletionRequest::new(
                    model_id,
                    vec![ChatMessage::system(system.as_str()), ChatMessage::user(prompt.as_str())],
                )
                .with_temperature(SKILL_TEMPERATURE);

                async move {
                    tracing::debug!(row_id = %row.id, attempt, "Generating skill");
                    let text = self.client.generate(request).await?;
                    Ok::<_, AttemptFailure>(validate_skill_response(&text)?)
                }
            },
        )
        .await
        .map_err(|failure| SkillGenerationError {
            row_text: row.text.clone(),
            attempts: failure.attempts,
            reason: failure.last_error,
        })?;

        info!(row_id = %row.id, skill = %response.name, "Skill generated");

        Ok(Skill {
            id: row.id.clone(),
            source: row.source(),
            name: response.name,
            summary: response.summary,
            details: response.details,
            core_technologies: response.core_technologies,
            check_questions: response.check_questions,
            project: response.project,
        })
    }
}
