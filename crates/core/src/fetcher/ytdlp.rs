//! yt-dlp backed fetcher implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::config::FetcherConfig;
use super::error::FetchError;
use super::traits::Fetcher;
use super::types::{FetchRequest, FetchResult};

/// Which stream a single downloader run acquires.
#[derive(Debug, Clone, Copy)]
enum Stream {
    Audio,
    Video,
}

impl Stream {
    /// Format selector passed to yt-dlp.
    fn selector(&self) -> &'static str {
        match self {
            Stream::Audio => "bestaudio/best",
            Stream::Video => "bestvideo/best",
        }
    }

    fn output_stem(&self) -> &'static str {
        match self {
            Stream::Audio => "source-audio",
            Stream::Video => "source-video",
        }
    }
}

/// Fetcher that shells out to yt-dlp, one invocation per stream.
pub struct YtdlpFetcher {
    config: FetcherConfig,
}

impl YtdlpFetcher {
    /// Creates a new fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Self {
        Self { config }
    }

    fn build_args(&self, request: &FetchRequest, stream: Stream) -> Vec<String> {
        let template = request
            .dest_dir
            .join(format!("{}.%(ext)s", stream.output_stem()));

        let mut args = vec![
            // A locator must resolve to exactly one item
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "-f".to_string(),
            stream.selector().to_string(),
            "-o".to_string(),
            template.to_string_lossy().to_string(),
            "--no-simulate".to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
        ];
        args.extend(self.config.extra_args.iter().cloned());
        args.push(request.locator.clone());
        args
    }

    /// Maps downloader stderr to a failure class.
    fn classify_failure(locator: &str, stderr: &str) -> FetchError {
        let matches = |pattern: &str| {
            Regex::new(pattern)
                .map(|re| re.is_match(stderr))
                .unwrap_or(false)
        };

        if matches(r"(?i)video unavailable|not found|404|does not exist|no video") {
            return FetchError::NotFound {
                locator: locator.to_string(),
            };
        }
        if matches(r"(?i)429|rate.?limit|too many requests") {
            return FetchError::RateLimited {
                locator: locator.to_string(),
            };
        }
        if matches(r"(?i)network|timed? ?out|connection|temporary failure|unable to download") {
            return FetchError::network(last_line(stderr));
        }

        FetchError::tool(
            "yt-dlp exited with an error",
            if stderr.is_empty() {
                None
            } else {
                Some(stderr.to_string())
            },
        )
    }

    async fn fetch_stream(
        &self,
        request: &FetchRequest,
        stream: Stream,
    ) -> Result<PathBuf, FetchError> {
        let args = self.build_args(request, stream);
        tracing::debug!(job_id = %request.job_id, ?args, "spawning yt-dlp");

        let mut child = Command::new(&self.config.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FetchError::DownloaderNotFound {
                        path: self.config.ytdlp_path.clone(),
                    }
                } else {
                    FetchError::Io(e)
                }
            })?;

        let mut stdout_pipe = child.stdout.take().expect("stdout is piped");
        let mut stderr_pipe = child.stderr.take().expect("stderr is piped");

        let run = async {
            let mut stdout = String::new();
            let mut stderr = String::new();
            let (out_read, err_read) = tokio::join!(
                stdout_pipe.read_to_string(&mut stdout),
                stderr_pipe.read_to_string(&mut stderr),
            );
            out_read?;
            err_read?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, stdout, stderr))
        };

        let timeout_secs = self.config.timeout_secs;
        let (status, stdout, stderr) = match timeout(Duration::from_secs(timeout_secs), run).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(FetchError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                return Err(FetchError::Timeout { timeout_secs });
            }
        };

        if !status.success() {
            return Err(Self::classify_failure(&request.locator, &stderr));
        }

        let path = stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| FetchError::tool("yt-dlp did not report an output file", None))?;

        let meta = tokio::fs::metadata(&path)
            .await
            .map_err(|_| FetchError::tool(format!("missing output file {}", path.display()), None))?;
        if meta.len() == 0 {
            return Err(FetchError::tool(
                format!("empty output file {}", path.display()),
                None,
            ));
        }

        tracing::info!(
            job_id = %request.job_id,
            path = %path.display(),
            size_bytes = meta.len(),
            "acquired stream"
        );
        Ok(path)
    }
}

fn last_line(text: &str) -> String {
    text.lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

#[async_trait]
impl Fetcher for YtdlpFetcher {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(&self, request: FetchRequest) -> Result<FetchResult, FetchError> {
        tokio::fs::create_dir_all(&request.dest_dir).await?;

        let mut result = FetchResult::default();
        if request.want_audio {
            result.audio_path = Some(self.fetch_stream(&request, Stream::Audio).await?);
        }
        if request.want_video {
            result.video_path = Some(self.fetch_stream(&request, Stream::Video).await?);
        }
        Ok(result)
    }

    async fn validate(&self) -> Result<(), FetchError> {
        let output = Command::new(&self.config.ytdlp_path)
            .arg("--version")
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FetchError::DownloaderNotFound {
                        path: self.config.ytdlp_path.clone(),
                    }
                } else {
                    FetchError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(FetchError::tool(
                "yt-dlp --version failed",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }
        Ok(())
    }
}
