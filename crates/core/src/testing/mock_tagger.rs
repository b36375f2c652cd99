//! Mock tagger for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::tagger::{TagError, TagJob, Tagger};

/// Mock implementation of the Tagger trait.
///
/// Copies the input artifact to the output path with a marker suffix and
/// records every job for assertions.
#[derive(Clone)]
pub struct MockTagger {
    jobs: Arc<RwLock<Vec<TagJob>>>,
    error_queue: Arc<RwLock<Vec<TagError>>>,
}

impl Default for MockTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTagger {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(Vec::new())),
            error_queue: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn recorded_jobs(&self) -> Vec<TagJob> {
        self.jobs.read().await.clone()
    }

    pub async fn tag_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Queues an error; each queued error fails exactly one call, in order.
    pub async fn push_error(&self, error: TagError) {
        self.error_queue.write().await.push(error);
    }

    async fn take_error(&self) -> Option<TagError> {
        let mut queue = self.error_queue.write().await;
        if queue.is_empty() {
            None
        } else {
            Some(queue.remove(0))
        }
    }
}

#[async_trait]
impl Tagger for MockTagger {
    fn name(&self) -> &str {
        "mock"
    }

    async fn tag(&self, job: TagJob) -> Result<PathBuf, TagError> {
        self.jobs.write().await.push(job.clone());

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        if !job.input_path.exists() {
            return Err(TagError::InputNotFound {
                path: job.input_path.clone(),
            });
        }

        let mut content = tokio::fs::read(&job.input_path).await?;
        content.extend_from_slice(b"+tagged");
        tokio::fs::write(&job.output_path, content).await?;
        Ok(job.output_path)
    }

    async fn validate(&self) -> Result<(), TagError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tagger::TrackTags;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_tag_records_job_and_writes_output() {
        let work = TempDir::new().unwrap();
        let input = work.path().join("normalized.mp3");
        tokio::fs::write(&input, b"audio").await.unwrap();

        let tagger = MockTagger::new();
        let output = tagger
            .tag(TagJob {
                job_id: "j1".to_string(),
                input_path: input,
                output_path: work.path().join("tagged.mp3"),
                tags: TrackTags {
                    album_artist: "AA".to_string(),
                    album: "AN".to_string(),
                    title: "TT".to_string(),
                    artist: "TA".to_string(),
                    genre: "G".to_string(),
                    year: 2001,
                    comment: "loc".to_string(),
                },
                cover_image: None,
            })
            .await
            .unwrap();

        assert!(output.exists());
        assert_eq!(tagger.tag_count().await, 1);
        assert_eq!(tagger.recorded_jobs().await[0].tags.title, "TT");
    }
}
