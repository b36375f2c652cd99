//! Fetcher configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the yt-dlp backed fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Path to the yt-dlp binary.
    #[serde(default = "default_ytdlp_path")]
    pub ytdlp_path: PathBuf,

    /// Timeout for a single stream download in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Extra arguments appended to every yt-dlp invocation.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_timeout() -> u64 {
    1800
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: default_ytdlp_path(),
            timeout_secs: default_timeout(),
            extra_args: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetcherConfig::default();
        assert_eq!(config.ytdlp_path, PathBuf::from("yt-dlp"));
        assert_eq!(config.timeout_secs, 1800);
        assert!(config.extra_args.is_empty());
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            ytdlp_path = "/usr/local/bin/yt-dlp"
            extra_args = ["--force-ipv4"]
        "#;
        let config: FetcherConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.ytdlp_path, PathBuf::from("/usr/local/bin/yt-dlp"));
        assert_eq!(config.timeout_secs, 1800);
        assert_eq!(config.extra_args, vec!["--force-ipv4".to_string()]);
    }
}
