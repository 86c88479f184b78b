//! Generation and media services

pub mod avatar_video;
pub mod catalog;
pub mod completion;
pub mod curriculum;
pub mod media_error;
pub mod media_service;
pub mod profile_builder;
pub mod prompts;
pub mod retry;
pub mod row_classifier;
pub mod schema;
pub mod script_generator;
pub mod skill_generator;
pub mod speech;

pub use avatar_video::{HeyGenClient, VideoJobState, VideoJobStatus, VideoRendering};
pub use completion::{
    ChatCompletion, ChatMessage, CompletionError, CompletionRequest, OpenRouterClient,
    RateLimitPolicy, Role,
};
pub use curriculum::{CurriculumOrchestrator, CurriculumRequest, RunOutcome};
pub use media_error::{MediaError, MediaErrorCode};
pub use media_service::{CreatedEpisode, EpisodeError, EpisodeKind, EpisodeRequest, MediaService};
pub use profile_builder::{ProfileBuildError, ProfileBuilder};
pub use prompts::Prompts;
pub use retry::LinearRetry;
pub use row_classifier::{classify, ClassifiedRows, CsvError};
pub use schema::SchemaError;
pub use script_generator::ScriptGenerator;
pub use skill_generator::{AttemptFailure, SkillGenerationError, SkillGenerator};
pub use speech::{ElevenLabsClient, SpeechSynthesis};
