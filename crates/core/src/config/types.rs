//! Root configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::converter::ConverterConfig;
use crate::fetcher::FetcherConfig;
use crate::placer::PlacerConfig;
use crate::scheduler::SchedulerConfig;
use crate::tagger::TaggerConfig;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub tagger: TaggerConfig,
    #[serde(default)]
    pub placer: PlacerConfig,
}

/// Directory layout for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory cover image filenames are resolved against.
    #[serde(default = "default_cover_dir")]
    pub cover_dir: PathBuf,

    /// Root for per-job working directories.
    #[serde(default = "default_work_root")]
    pub work_root: PathBuf,
}

fn default_cover_dir() -> PathBuf {
    PathBuf::from("cover")
}

fn default_work_root() -> PathBuf {
    PathBuf::from("work")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cover_dir: default_cover_dir(),
            work_root: default_work_root(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.paths.cover_dir, PathBuf::from("cover"));
        assert_eq!(config.paths.work_root, PathBuf::from("work"));
        assert_eq!(config.scheduler.max_concurrent_fetches, 3);
        assert_eq!(config.placer.output_root, PathBuf::from("output"));
    }

    #[test]
    fn test_deserialize_empty_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.scheduler.max_concurrent_transcodes, 2);
        assert_eq!(config.converter.audio_bitrate_kbps, 320);
    }

    #[test]
    fn test_deserialize_nested_sections() {
        let toml = r#"
[paths]
cover_dir = "/srv/covers"

[scheduler]
max_concurrent_fetches = 6
overwrite = true

[placer]
output_root = "/srv/library"

[converter]
audio_bitrate_kbps = 192
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.paths.cover_dir, PathBuf::from("/srv/covers"));
        assert_eq!(config.scheduler.max_concurrent_fetches, 6);
        assert!(config.scheduler.overwrite);
        assert_eq!(config.placer.output_root, PathBuf::from("/srv/library"));
        assert_eq!(config.converter.audio_bitrate_kbps, 192);
    }
}
