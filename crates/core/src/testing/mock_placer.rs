//! Mock placer for testing.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::placer::{destination_dir, Placement, PlacementRequest, Placer, PlacerError};

/// Mock implementation of the Placer trait.
///
/// Computes the same deterministic destination as the real placer, copies
/// the artifact there, and records every request.
#[derive(Clone)]
pub struct MockPlacer {
    output_root: PathBuf,
    requests: Arc<RwLock<Vec<PlacementRequest>>>,
    error_queue: Arc<RwLock<Vec<PlacerError>>>,
}

impl MockPlacer {
    pub fn new(output_root: PathBuf) -> Self {
        Self {
            output_root,
            requests: Arc::new(RwLock::new(Vec::new())),
            error_queue: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn recorded_requests(&self) -> Vec<PlacementRequest> {
        self.requests.read().await.clone()
    }

    pub async fn place_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Queues an error; each queued error fails exactly one call, in order.
    pub async fn push_error(&self, error: PlacerError) {
        self.error_queue.write().await.push(error);
    }

    async fn take_error(&self) -> Option<PlacerError> {
        let mut queue = self.error_queue.write().await;
        if queue.is_empty() {
            None
        } else {
            Some(queue.remove(0))
        }
    }
}

#[async_trait]
impl Placer for MockPlacer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn place(&self, request: PlacementRequest) -> Result<Placement, PlacerError> {
        self.requests.write().await.push(request.clone());

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        let dir = destination_dir(
            &self.output_root,
            &request.album_artist,
            &request.album_name,
            &request.track_title,
        );
        tokio::fs::create_dir_all(&dir).await?;

        let extension = request
            .artifact
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "bin".to_string());
        let destination = dir.join(format!(
            "{}.{}",
            crate::placer::sanitize_segment(&request.track_title),
            extension
        ));

        if destination.exists() && !request.overwrite {
            return Err(PlacerError::DestinationExists { path: destination });
        }

        tokio::fs::copy(&request.artifact, &destination).await?;
        let size_bytes = tokio::fs::metadata(&destination).await?.len();
        Ok(Placement {
            destination,
            size_bytes,
        })
    }

    async fn validate(&self) -> Result<(), PlacerError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_place_records_and_copies() {
        let work = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let artifact = work.path().join("tagged.mp3");
        tokio::fs::write(&artifact, b"audio").await.unwrap();

        let placer = MockPlacer::new(out.path().to_path_buf());
        let placement = placer
            .place(PlacementRequest {
                job_id: "j1".to_string(),
                artifact,
                album_artist: "AA".to_string(),
                album_name: "AN".to_string(),
                track_title: "TT".to_string(),
                overwrite: false,
            })
            .await
            .unwrap();

        assert!(placement.destination.exists());
        assert_eq!(placer.place_count().await, 1);
    }

    #[tokio::test]
    async fn test_collision_without_overwrite() {
        let work = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let artifact = work.path().join("tagged.mp3");
        tokio::fs::write(&artifact, b"audio").await.unwrap();

        let placer = MockPlacer::new(out.path().to_path_buf());
        let request = PlacementRequest {
            job_id: "j1".to_string(),
            artifact,
            album_artist: "AA".to_string(),
            album_name: "AN".to_string(),
            track_title: "TT".to_string(),
            overwrite: false,
        };

        placer.place(request.clone()).await.unwrap();
        let second = placer.place(request).await;
        assert!(matches!(second, Err(PlacerError::DestinationExists { .. })));
    }
}
