//! Mock fetcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::fetcher::{FetchError, FetchRequest, FetchResult, Fetcher};

/// Mock implementation of the Fetcher trait.
///
/// Records every request, writes real (dummy) stream files so downstream
/// stages and completion markers see artifacts, and supports per-call
/// error injection and per-locator latency for scheduling tests.
#[derive(Clone)]
pub struct MockFetcher {
    requests: Arc<RwLock<Vec<FetchRequest>>>,
    error_queue: Arc<RwLock<Vec<FetchError>>>,
    latency: Arc<RwLock<Duration>>,
    latency_by_locator: Arc<RwLock<HashMap<String, Duration>>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(RwLock::new(Vec::new())),
            error_queue: Arc::new(RwLock::new(Vec::new())),
            latency: Arc::new(RwLock::new(Duration::ZERO)),
            latency_by_locator: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// All recorded fetch requests.
    pub async fn recorded_requests(&self) -> Vec<FetchRequest> {
        self.requests.read().await.clone()
    }

    pub async fn fetch_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Queues an error; each queued error fails exactly one fetch call,
    /// in order.
    pub async fn push_error(&self, error: FetchError) {
        self.error_queue.write().await.push(error);
    }

    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = latency;
    }

    /// Overrides latency for a specific locator.
    pub async fn set_latency_for(&self, locator: &str, latency: Duration) {
        self.latency_by_locator
            .write()
            .await
            .insert(locator.to_string(), latency);
    }

    async fn take_error(&self) -> Option<FetchError> {
        let mut queue = self.error_queue.write().await;
        if queue.is_empty() {
            None
        } else {
            Some(queue.remove(0))
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, request: FetchRequest) -> Result<FetchResult, FetchError> {
        self.requests.write().await.push(request.clone());

        let latency = {
            let by_locator = self.latency_by_locator.read().await;
            by_locator
                .get(&request.locator)
                .copied()
                .unwrap_or(*self.latency.read().await)
        };
        if latency > Duration::ZERO {
            tokio::time::sleep(latency).await;
        }

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        tokio::fs::create_dir_all(&request.dest_dir).await?;
        let mut result = FetchResult::default();
        if request.want_audio {
            let path = request.dest_dir.join("source-audio.webm");
            tokio::fs::write(&path, b"mock audio stream").await?;
            result.audio_path = Some(path);
        }
        if request.want_video {
            let path = request.dest_dir.join("source-video.mp4");
            tokio::fs::write(&path, b"mock video stream").await?;
            result.video_path = Some(path);
        }
        Ok(result)
    }

    async fn validate(&self) -> Result<(), FetchError> {
        Ok(())
    }
}
