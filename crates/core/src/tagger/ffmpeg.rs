//! FFmpeg-based tagger implementation.
//!
//! Tagging is a stream-copy remux: the audio data is untouched, only the
//! container metadata and the attached cover picture change.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::config::TaggerConfig;
use super::error::TagError;
use super::traits::Tagger;
use super::types::TagJob;

/// FFmpeg-based tagger implementation.
pub struct FfmpegTagger {
    config: TaggerConfig,
}

impl FfmpegTagger {
    /// Creates a new FFmpeg tagger with the given configuration.
    pub fn new(config: TaggerConfig) -> Self {
        Self { config }
    }

    fn build_args(job: &TagJob) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            job.input_path.to_string_lossy().to_string(),
        ];

        if let Some(cover) = &job.cover_image {
            args.extend([
                "-i".to_string(),
                cover.to_string_lossy().to_string(),
                "-map".to_string(),
                "0:a".to_string(),
                "-map".to_string(),
                "1:v".to_string(),
                "-disposition:v:0".to_string(),
                "attached_pic".to_string(),
                "-metadata:s:v".to_string(),
                "title=Cover".to_string(),
            ]);
        } else {
            args.extend(["-map".to_string(), "0:a".to_string()]);
        }

        args.extend([
            "-c".to_string(),
            "copy".to_string(),
            "-id3v2_version".to_string(),
            "3".to_string(),
        ]);
        args.extend(job.tags.to_ffmpeg_args());
        args.extend(["-loglevel".to_string(), "error".to_string()]);
        args.push(job.output_path.to_string_lossy().to_string());
        args
    }
}

#[async_trait]
impl Tagger for FfmpegTagger {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn tag(&self, job: TagJob) -> Result<PathBuf, TagError> {
        if !job.input_path.exists() {
            return Err(TagError::InputNotFound {
                path: job.input_path.clone(),
            });
        }
        if let Some(cover) = &job.cover_image {
            if !cover.exists() {
                return Err(TagError::CoverNotFound {
                    path: cover.clone(),
                });
            }
        }

        let args = Self::build_args(&job);
        tracing::debug!(job_id = %job.job_id, ?args, "spawning ffmpeg for tagging");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TagError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TagError::Io(e)
                }
            })?;

        let mut stderr_pipe = child.stderr.take().expect("stderr is piped");

        let run = async {
            let mut stderr = String::new();
            stderr_pipe.read_to_string(&mut stderr).await?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, stderr))
        };

        let timeout_secs = self.config.timeout_secs;
        let (status, stderr) = match timeout(Duration::from_secs(timeout_secs), run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(TagError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                return Err(TagError::Timeout { timeout_secs });
            }
        };

        if !status.success() {
            return Err(TagError::failed(
                format!("ffmpeg exited with code: {:?}", status.code()),
                if stderr.is_empty() {
                    None
                } else {
                    Some(stderr)
                },
            ));
        }

        let meta = tokio::fs::metadata(&job.output_path)
            .await
            .map_err(|_| TagError::failed("tagged file not created", None))?;
        if meta.len() == 0 {
            return Err(TagError::failed("tagged file is empty", None));
        }

        tracing::info!(
            job_id = %job.job_id,
            title = %job.tags.title,
            album = %job.tags.album,
            "embedded tags"
        );
        Ok(job.output_path)
    }

    async fn validate(&self) -> Result<(), TagError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TagError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TagError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(TagError::failed(
                "ffmpeg -version failed",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }
        Ok(())
    }
}
