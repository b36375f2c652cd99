//! Placer configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the file system placer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacerConfig {
    /// Root of the output tree.
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Buffer size for the cross-device copy fallback.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

fn default_output_root() -> PathBuf {
    PathBuf::from("output")
}

fn default_buffer_size() -> usize {
    64 * 1024
}

impl Default for PlacerConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            buffer_size: default_buffer_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlacerConfig::default();
        assert_eq!(config.output_root, PathBuf::from("output"));
        assert_eq!(config.buffer_size, 64 * 1024);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: PlacerConfig = toml::from_str("output_root = \"/srv/media\"").unwrap();
        assert_eq!(config.output_root, PathBuf::from("/srv/media"));
        assert_eq!(config.buffer_size, 64 * 1024);
    }
}
