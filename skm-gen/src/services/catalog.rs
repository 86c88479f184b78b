//! Selectable completion models

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelOption {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub const AVAILABLE_MODELS: &[ModelOption] = &[
    ModelOption {
        id: "anthropic/claude-3.5-sonnet",
        name: "Claude 3.5 Sonnet",
        description: "Best balance of quality and speed",
    },
    ModelOption {
        id: "anthropic/claude-3-opus",
        name: "Claude 3 Opus",
        description: "Highest quality",
    },
    ModelOption {
        id: "openai/gpt-4o",
        name: "GPT-4o",
        description: "Fast and capable",
    },
    ModelOption {
        id: "google/gemini-pro-1.5",
        name: "Gemini Pro 1.5",
        description: "Google Gemini",
    },
    ModelOption {
        id: "meta-llama/llama-3.1-70b-instruct",
        name: "Llama 3.1 70B",
        description: "Open-weight model",
    },
];

pub fn find_model(id: &str) -> Option<&'static ModelOption> {
    AVAILABLE_MODELS.iter().find(|m| m.id == id)
}
