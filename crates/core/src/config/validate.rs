//! Configuration validation.

use super::{ConfigError, types::Config};

/// Checks cross-field constraints the type system cannot express.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.scheduler.max_concurrent_fetches == 0 {
        return Err(ConfigError::Invalid(
            "scheduler.max_concurrent_fetches must be at least 1".to_string(),
        ));
    }
    if config.scheduler.max_concurrent_transcodes == 0 {
        return Err(ConfigError::Invalid(
            "scheduler.max_concurrent_transcodes must be at least 1".to_string(),
        ));
    }
    if config.scheduler.stage_timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "scheduler.stage_timeout_secs must be at least 1".to_string(),
        ));
    }
    if config.converter.audio_bitrate_kbps == 0 {
        return Err(ConfigError::Invalid(
            "converter.audio_bitrate_kbps must be at least 1".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_fetch_slots_rejected() {
        let mut config = Config::default();
        config.scheduler.max_concurrent_fetches = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_concurrent_fetches"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.scheduler.stage_timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
