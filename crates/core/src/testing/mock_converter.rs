//! Mock converter for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{
    ConversionOutput, Converter, ConverterError, MediaInfo, MuxJob, NormalizeJob, TranscodeJob,
};

/// A recorded converter call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedConversion {
    Transcode { job_id: String, output: PathBuf },
    Mux { job_id: String, output: PathBuf },
    Normalize { job_id: String, output: PathBuf },
}

/// Mock implementation of the Converter trait.
///
/// Writes real output files (derived from the input bytes) so markers and
/// downstream stages observe non-empty artifacts, records every call, and
/// fails calls from an injected error queue.
#[derive(Clone)]
pub struct MockConverter {
    calls: Arc<RwLock<Vec<RecordedConversion>>>,
    error_queue: Arc<RwLock<Vec<ConverterError>>>,
    latency: Arc<RwLock<Duration>>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            error_queue: Arc::new(RwLock::new(Vec::new())),
            latency: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedConversion> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    pub async fn transcode_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedConversion::Transcode { .. }))
            .count()
    }

    pub async fn normalize_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedConversion::Normalize { .. }))
            .count()
    }

    pub async fn mux_count(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedConversion::Mux { .. }))
            .count()
    }

    /// Queues an error; each queued error fails exactly one call, in order.
    pub async fn push_error(&self, error: ConverterError) {
        self.error_queue.write().await.push(error);
    }

    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = latency;
    }

    async fn take_error(&self) -> Option<ConverterError> {
        let mut queue = self.error_queue.write().await;
        if queue.is_empty() {
            None
        } else {
            Some(queue.remove(0))
        }
    }

    async fn produce(
        &self,
        inputs: &[&PathBuf],
        output: &Path,
        label: &str,
    ) -> Result<ConversionOutput, ConverterError> {
        let latency = *self.latency.read().await;
        if latency > Duration::ZERO {
            tokio::time::sleep(latency).await;
        }

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        for input in inputs {
            if !input.exists() {
                return Err(ConverterError::InputNotFound {
                    path: input.to_path_buf(),
                });
            }
        }

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut content = Vec::new();
        for input in inputs {
            content.extend(tokio::fs::read(input).await?);
        }
        content.extend(format!("+{label}").into_bytes());
        tokio::fs::write(output, &content).await?;

        Ok(ConversionOutput {
            path: output.to_path_buf(),
            size_bytes: content.len() as u64,
            elapsed_ms: latency.as_millis() as u64,
        })
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError> {
        let size_bytes = tokio::fs::metadata(path).await.map(|m| m.len()).unwrap_or(0);
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("dat");
        let is_video = matches!(extension, "mkv" | "mp4" | "webm" | "avi" | "mov");
        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes,
            duration_secs: 180.0,
            format: extension.to_string(),
            has_audio: true,
            has_video: is_video,
        })
    }

    async fn transcode_audio(&self, job: TranscodeJob) -> Result<ConversionOutput, ConverterError> {
        let result = self
            .produce(&[&job.input_path], &job.output_path, "transcoded")
            .await;
        self.calls.write().await.push(RecordedConversion::Transcode {
            job_id: job.job_id,
            output: job.output_path,
        });
        result
    }

    async fn mux(&self, job: MuxJob) -> Result<ConversionOutput, ConverterError> {
        let result = self
            .produce(
                &[&job.video_path, &job.audio_path],
                &job.output_path,
                "muxed",
            )
            .await;
        self.calls.write().await.push(RecordedConversion::Mux {
            job_id: job.job_id,
            output: job.output_path,
        });
        result
    }

    async fn normalize(&self, job: NormalizeJob) -> Result<ConversionOutput, ConverterError> {
        let result = self
            .produce(&[&job.input_path], &job.output_path, "normalized")
            .await;
        self.calls.write().await.push(RecordedConversion::Normalize {
            job_id: job.job_id,
            output: job.output_path,
        });
        result
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::NormalizeKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_transcode_writes_output() {
        let work = TempDir::new().unwrap();
        let input = work.path().join("in.webm");
        tokio::fs::write(&input, b"audio").await.unwrap();

        let converter = MockConverter::new();
        let output = converter
            .transcode_audio(TranscodeJob {
                job_id: "j1".to_string(),
                input_path: input,
                output_path: work.path().join("out.mp3"),
            })
            .await
            .unwrap();

        assert!(output.path.exists());
        assert_eq!(converter.transcode_count().await, 1);
    }

    #[tokio::test]
    async fn test_error_injection_consumed_in_order() {
        let work = TempDir::new().unwrap();
        let input = work.path().join("in.mp3");
        tokio::fs::write(&input, b"audio").await.unwrap();

        let converter = MockConverter::new();
        converter
            .push_error(ConverterError::conversion_failed("boom", None))
            .await;

        let job = || NormalizeJob {
            job_id: "j1".to_string(),
            input_path: input.clone(),
            output_path: work.path().join("out.mp3"),
            kind: NormalizeKind::Audio,
        };

        assert!(converter.normalize(job()).await.is_err());
        assert!(converter.normalize(job()).await.is_ok());
        assert_eq!(converter.normalize_count().await, 2);
    }
}
