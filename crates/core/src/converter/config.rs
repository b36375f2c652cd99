//! Converter configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the ffmpeg converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Path to the ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to the ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Timeout for a single ffmpeg run in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Target audio codec for assembled and normalized audio.
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Target audio bitrate in kbps.
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate_kbps: u32,

    /// FFmpeg log level.
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_timeout() -> u64 {
    3600
}

fn default_audio_codec() -> String {
    "libmp3lame".to_string()
}

fn default_audio_bitrate() -> u32 {
    320
}

fn default_log_level() -> String {
    "error".to_string()
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_timeout(),
            audio_codec: default_audio_codec(),
            audio_bitrate_kbps: default_audio_bitrate(),
            ffmpeg_log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConverterConfig::default();
        assert_eq!(config.audio_codec, "libmp3lame");
        assert_eq!(config.audio_bitrate_kbps, 320);
        assert_eq!(config.timeout_secs, 3600);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ConverterConfig = toml::from_str("audio_bitrate_kbps = 192").unwrap();
        assert_eq!(config.audio_bitrate_kbps, 192);
        assert_eq!(config.audio_codec, "libmp3lame");
    }
}
