//! Configuration loading.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{ConfigError, types::Config};

/// Load configuration from file with environment variable overrides
/// (`PRESLEY_` prefix, `__` as the section separator).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("PRESLEY_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing).
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[scheduler]
max_concurrent_fetches = 5
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.scheduler.max_concurrent_fetches, 5);
    }

    #[test]
    fn test_load_config_from_str_bad_toml() {
        let result = load_config_from_str("scheduler = not-a-table");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/presley.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[paths]
work_root = "/tmp/presley-work"

[scheduler]
max_concurrent_transcodes = 4
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(
            config.paths.work_root,
            std::path::PathBuf::from("/tmp/presley-work")
        );
        assert_eq!(config.scheduler.max_concurrent_transcodes, 4);
    }
}
