//! Media backend seam used by the episode player

use async_trait::async_trait;

use super::episode::Lesson;
use crate::services::{
    CreatedEpisode, EpisodeError, EpisodeKind, EpisodeRequest, MediaService, VideoJobStatus,
};

/// Episode creation and video job status
#[async_trait]
pub trait EpisodeBackend: Send + Sync {
    async fn create(
        &self,
        lesson: &Lesson,
        kind: EpisodeKind,
        model_id: Option<&str>,
    ) -> Result<CreatedEpisode, EpisodeError>;

    async fn poll(&self, job_id: &str) -> Result<VideoJobStatus, EpisodeError>;
}

#[async_trait]
impl EpisodeBackend for MediaService {
    async fn create(
        &self,
        lesson: &Lesson,
        kind: EpisodeKind,
        model_id: Option<&str>,
    ) -> Result<CreatedEpisode, EpisodeError> {
        let request = EpisodeRequest {
            skill_name: lesson.skill_name.clone(),
            summary: lesson.summary_or_name().to_string(),
            details: lesson.details.clone(),
            kind,
            model_id: model_id.map(str::to_string),
        };
        self.create_episode(&request).await
    }

    async fn poll(&self, job_id: &str) -> Result<VideoJobStatus, EpisodeError> {
        self.video_status(job_id).await
    }
}
