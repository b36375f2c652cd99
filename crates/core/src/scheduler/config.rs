//! Scheduler configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the batch scheduler.
///
/// Concurrency limits are explicit values passed into the scheduler,
/// never process-global state, so concurrent batch runs (e.g. in tests)
/// cannot interfere with each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum simultaneous Acquire stages (network-bound).
    #[serde(default = "default_fetch_slots")]
    pub max_concurrent_fetches: usize,

    /// Maximum simultaneous Assemble/Normalize stages (transcode work).
    #[serde(default = "default_transcode_slots")]
    pub max_concurrent_transcodes: usize,

    /// Extra attempts per stage for transient failures.
    #[serde(default = "default_retries")]
    pub max_stage_retries: u32,

    /// Time budget for a single stage call in seconds.
    #[serde(default = "default_stage_timeout")]
    pub stage_timeout_secs: u64,

    /// Pause between retry attempts in milliseconds.
    #[serde(default = "default_backoff")]
    pub retry_backoff_ms: u64,

    /// Skip stages whose completion markers are still valid.
    #[serde(default = "default_resume")]
    pub resume: bool,

    /// Replace existing destinations instead of failing on collision.
    #[serde(default)]
    pub overwrite: bool,

    /// Remove working directories after success, giving up cheap reruns.
    #[serde(default)]
    pub clean_work_on_success: bool,
}

fn default_fetch_slots() -> usize {
    3
}

fn default_transcode_slots() -> usize {
    2
}

fn default_retries() -> u32 {
    2
}

fn default_stage_timeout() -> u64 {
    3600
}

fn default_backoff() -> u64 {
    500
}

fn default_resume() -> bool {
    true
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: default_fetch_slots(),
            max_concurrent_transcodes: default_transcode_slots(),
            max_stage_retries: default_retries(),
            stage_timeout_secs: default_stage_timeout(),
            retry_backoff_ms: default_backoff(),
            resume: default_resume(),
            overwrite: false,
            clean_work_on_success: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.max_concurrent_fetches, 3);
        assert_eq!(config.max_concurrent_transcodes, 2);
        assert_eq!(config.max_stage_retries, 2);
        assert_eq!(config.stage_timeout_secs, 3600);
        assert!(config.resume);
        assert!(!config.overwrite);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            max_concurrent_fetches = 8
            overwrite = true
        "#;
        let config: SchedulerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_concurrent_fetches, 8);
        assert!(config.overwrite);
        assert_eq!(config.max_concurrent_transcodes, 2);
    }
}
