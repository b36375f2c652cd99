//! FFmpeg-based converter implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{
    ConversionOutput, LoudnessMeasurement, MediaInfo, MuxJob, NormalizeJob, NormalizeKind,
    TranscodeJob, LOUDNESS_RANGE_LU, TARGET_LOUDNESS_LUFS, TRUE_PEAK_DBTP,
};

/// FFmpeg-based converter implementation.
pub struct FfmpegConverter {
    config: ConverterConfig,
}

impl FfmpegConverter {
    /// Creates a new FFmpeg converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Runs ffmpeg to completion, returning captured stderr on success.
    async fn run_ffmpeg(&self, args: &[String]) -> Result<String, ConverterError> {
        tracing::debug!(?args, "spawning ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
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
            Ok(Err(e)) => return Err(ConverterError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                return Err(ConverterError::Timeout { timeout_secs });
            }
        };

        if !status.success() {
            return Err(ConverterError::conversion_failed(
                format!("ffmpeg exited with code: {:?}", status.code()),
                if stderr.is_empty() {
                    None
                } else {
                    Some(stderr)
                },
            ));
        }

        Ok(stderr)
    }

    async fn ensure_output_dir(path: &Path) -> Result<(), ConverterError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|_| ConverterError::OutputDirectoryFailed {
                    path: parent.to_path_buf(),
                })?;
        }
        Ok(())
    }

    async fn output_info(
        path: &Path,
        started: Instant,
    ) -> Result<ConversionOutput, ConverterError> {
        let meta = tokio::fs::metadata(path)
            .await
            .map_err(|_| ConverterError::conversion_failed("output file not created", None))?;
        if meta.len() == 0 {
            return Err(ConverterError::conversion_failed("output file is empty", None));
        }
        Ok(ConversionOutput {
            path: path.to_path_buf(),
            size_bytes: meta.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }

    fn loudnorm_measure_filter() -> String {
        format!(
            "loudnorm=I={TARGET_LOUDNESS_LUFS}:TP={TRUE_PEAK_DBTP}:LRA={LOUDNESS_RANGE_LU}:dual_mono=true:print_format=json"
        )
    }

    fn loudnorm_apply_filter(m: &LoudnessMeasurement) -> String {
        format!(
            "loudnorm=I={TARGET_LOUDNESS_LUFS}:TP={TRUE_PEAK_DBTP}:LRA={LOUDNESS_RANGE_LU}:\
             measured_I={}:measured_TP={}:measured_LRA={}:measured_thresh={}:offset={}:\
             linear=true:dual_mono=true",
            m.input_i, m.input_tp, m.input_lra, m.input_thresh, m.target_offset
        )
    }

    /// Extracts the loudnorm JSON block from pass-one stderr.
    fn parse_measurement(stderr: &str) -> Result<LoudnessMeasurement, ConverterError> {
        let re = Regex::new(r#"(?s)\{[^{}]*"input_i"[^{}]*\}"#)
            .map_err(|e| ConverterError::parse_error(e.to_string()))?;
        let block = re
            .find(stderr)
            .ok_or_else(|| ConverterError::parse_error("no loudnorm statistics in ffmpeg output"))?
            .as_str();
        serde_json::from_str(block).map_err(|e| {
            ConverterError::parse_error(format!("bad loudnorm statistics: {e}"))
        })
    }

    /// First pass: measure the input's loudness without writing output.
    async fn measure_loudness(&self, input: &Path) -> Result<LoudnessMeasurement, ConverterError> {
        let args = vec![
            "-hide_banner".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-af".to_string(),
            Self::loudnorm_measure_filter(),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ];
        let stderr = self.run_ffmpeg(&args).await?;
        Self::parse_measurement(&stderr)
    }

    fn audio_codec_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            self.config.audio_codec.clone(),
            "-b:a".to_string(),
            format!("{}k", self.config.audio_bitrate_kbps),
        ]
    }

    fn common_tail(&self) -> Vec<String> {
        vec![
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
        ]
    }
}

#[async_trait]
impl Converter for FfmpegConverter {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError> {
        if !path.exists() {
            return Err(ConverterError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(ConverterError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        parse_probe_output(path, &String::from_utf8_lossy(&output.stdout))
    }

    async fn transcode_audio(&self, job: TranscodeJob) -> Result<ConversionOutput, ConverterError> {
        let started = Instant::now();
        if !job.input_path.exists() {
            return Err(ConverterError::InputNotFound {
                path: job.input_path.clone(),
            });
        }
        Self::ensure_output_dir(&job.output_path).await?;

        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            job.input_path.to_string_lossy().to_string(),
            // audio output only, drop any attached picture streams
            "-vn".to_string(),
        ];
        args.extend(self.audio_codec_args());
        args.extend(self.common_tail());
        args.push(job.output_path.to_string_lossy().to_string());

        self.run_ffmpeg(&args).await?;
        Self::output_info(&job.output_path, started).await
    }

    async fn mux(&self, job: MuxJob) -> Result<ConversionOutput, ConverterError> {
        let started = Instant::now();
        for input in [&job.video_path, &job.audio_path] {
            if !input.exists() {
                return Err(ConverterError::InputNotFound {
                    path: input.clone(),
                });
            }
        }
        let video_info = self.probe(&job.video_path).await?;
        if !video_info.has_video {
            return Err(ConverterError::UnsupportedFormat {
                format: video_info.format,
                reason: "no video stream to mux".to_string(),
            });
        }
        Self::ensure_output_dir(&job.output_path).await?;

        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            job.video_path.to_string_lossy().to_string(),
            "-i".to_string(),
            job.audio_path.to_string_lossy().to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-c".to_string(),
            "copy".to_string(),
        ];
        args.extend(self.common_tail());
        args.push(job.output_path.to_string_lossy().to_string());

        self.run_ffmpeg(&args).await?;
        Self::output_info(&job.output_path, started).await
    }

    async fn normalize(&self, job: NormalizeJob) -> Result<ConversionOutput, ConverterError> {
        let started = Instant::now();
        if !job.input_path.exists() {
            return Err(ConverterError::InputNotFound {
                path: job.input_path.clone(),
            });
        }
        let info = self.probe(&job.input_path).await?;
        if !info.has_audio {
            return Err(ConverterError::UnsupportedFormat {
                format: info.format,
                reason: "no audio stream to normalize".to_string(),
            });
        }
        Self::ensure_output_dir(&job.output_path).await?;

        let measurement = self.measure_loudness(&job.input_path).await?;
        tracing::debug!(
            job_id = %job.job_id,
            input_i = %measurement.input_i,
            "measured loudness, applying correction"
        );

        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            job.input_path.to_string_lossy().to_string(),
            "-af".to_string(),
            Self::loudnorm_apply_filter(&measurement),
        ];
        if job.kind == NormalizeKind::Video {
            args.extend(["-c:v".to_string(), "copy".to_string()]);
        }
        args.extend(self.audio_codec_args());
        args.extend(self.common_tail());
        args.push(job.output_path.to_string_lossy().to_string());

        self.run_ffmpeg(&args).await?;
        Self::output_info(&job.output_path, started).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        for (binary, not_found) in [
            (
                &self.config.ffmpeg_path,
                ConverterError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                },
            ),
            (
                &self.config.ffprobe_path,
                ConverterError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                },
            ),
        ] {
            let output = Command::new(binary)
                .arg("-version")
                .output()
                .await
                .map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        not_found
                    } else {
                        ConverterError::Io(e)
                    }
                })?;
            if !output.status.success() {
                return Err(ConverterError::conversion_failed(
                    format!("{} -version failed", binary.display()),
                    Some(String::from_utf8_lossy(&output.stderr).to_string()),
                ));
            }
        }
        Ok(())
    }
}

/// Parses ffprobe JSON output into MediaInfo.
fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, ConverterError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        format: ProbeFormat,
        streams: Vec<ProbeStream>,
    }

    #[derive(Deserialize)]
    struct ProbeFormat {
        format_name: String,
        duration: Option<String>,
        size: Option<String>,
    }

    #[derive(Deserialize)]
    struct ProbeStream {
        codec_type: String,
    }

    let probe: ProbeOutput = serde_json::from_str(output)
        .map_err(|e| ConverterError::parse_error(format!("bad ffprobe output: {e}")))?;

    let duration_secs = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let size_bytes = probe
        .format
        .size
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(0);

    let format = probe
        .format
        .format_name
        .split(',')
        .next()
        .unwrap_or("unknown")
        .to_string();

    Ok(MediaInfo {
        path: path.to_path_buf(),
        size_bytes,
        duration_secs,
        format,
        has_audio: probe.streams.iter().any(|s| s.codec_type == "audio"),
        has_video: probe.streams.iter().any(|s| s.codec_type == "video"),
    })
}
