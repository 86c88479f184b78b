//! Specialist profile aggregation over all skills of a run

use std::sync::Arc;

use skm_common::models::{Skill, SpecialistProfile};
use thiserror::Error;
use tracing::info;

use super::completion::{ChatCompletion, ChatMessage, CompletionRequest};
use super::prompts::{Prompts, SkillDigest};
use super::retry::{retry_linear, LinearRetry};
use super::schema::validate_profile;
use super::skill_generator::AttemptFailure;

const PROFILE_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
#[error("Failed to build specialist profile after {attempts} attempts: {reason}")]
pub struct ProfileBuildError {
    pub attempts: u32,
    #[source]
    pub reason: AttemptFailure,
}

#[derive(Clone)]
pub struct ProfileBuilder {
    client: Arc<dyn ChatCompletion>,
    prompts: Prompts,
    retry: LinearRetry,
}

impl ProfileBuilder {
    pub fn new(client: Arc<dyn ChatCompletion>, prompts: Prompts, retry: LinearRetry) -> Self {
        Self {
            client,
            prompts,
            retry,
        }
    }

    /// Build the profile from a `{name, summary}` digest of `skills`
    pub async fn build_profile(
        &self,
        profile_name: &str,
        skills: &[Skill],
        model_id: &str,
    ) -> Result<SpecialistProfile, ProfileBuildError> {
        let digest: Vec<SkillDigest<'_>> = skills
            .iter()
            .map(|s| SkillDigest {
                name: &s.name,
                summary: &s.summary,
            })
            .collect();

        let system = self.prompts.profile_system();
        let prompt = self.prompts.profile(profile_name, &digest);

        let profile = retry_linear(
            "profile build",
            self.retry,
            AttemptFailure::is_retryable,
            |attempt| {
                let request = CompletionRequest::new(
                    model_id,
                    vec![ChatMessage::system(system.as_str()), ChatMessage::user(prompt.as_str())],
                )
                .with_temperature(PROFILE_TEMPERATURE);

                async move {
                    tracing::debug!(profile = profile_name, attempt, "Building specialist profile");
                    let text = self.client.generate(request).await?;
                    Ok::<_, AttemptFailure>(validate_profile(&text)?)
                }
            },
        )
        .await
        .map_err(|failure| ProfileBuildError {
            attempts: failure.attempts,
            reason: failure.last_error,
        })?;

        info!(profile = profile_name, title = %profile.title, "Specialist profile built");
        Ok(profile)
    }
}
