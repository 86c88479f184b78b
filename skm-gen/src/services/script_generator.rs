//! One-minute narration scripts for media episodes

use std::sync::Arc;

use super::completion::{ChatCompletion, ChatMessage, CompletionError, CompletionRequest};
use super::prompts::Prompts;

const SCRIPT_TEMPERATURE: f32 = 0.8;
const SCRIPT_MAX_TOKENS: u32 = 500;

#[derive(Clone)]
pub struct ScriptGenerator {
    client: Arc<dyn ChatCompletion>,
    prompts: Prompts,
}

impl ScriptGenerator {
    pub fn new(client: Arc<dyn ChatCompletion>, prompts: Prompts) -> Self {
        Self { client, prompts }
    }

    /// Generate a script; code fences are removed and the text trimmed
    pub async fn generate_script(
        &self,
        skill_name: &str,
        summary: &str,
        details: &[String],
        model_id: &str,
    ) -> Result<String, CompletionError> {
        let request = CompletionRequest::new(
            model_id,
            vec![
                ChatMessage::system(self.prompts.script_system()),
                ChatMessage::user(self.prompts.script(skill_name, summary, details)),
            ],
        )
        .with_temperature(SCRIPT_TEMPERATURE)
        .with_max_tokens(SCRIPT_MAX_TOKENS);

        let text = self.client.generate(request).await?;
        let script = clean_script(&text);
        if script.is_empty() {
            return Err(CompletionError::EmptyResponse);
        }

        tracing::debug!(skill = skill_name, words = script.split_whitespace().count(), "Script generated");
        Ok(script)
    }
}

fn clean_script(text: &str) -> String {
    text.replace("```", "").trim().to_string()
}
