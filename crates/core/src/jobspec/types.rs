//! Job model types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which outputs a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    AudioOnly,
    VideoOnly,
    AudioAndVideo,
}

impl JobKind {
    /// Parses the job-list kind column (`a`, `v`, `av`), case-insensitive.
    pub fn parse_column(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "a" => Some(Self::AudioOnly),
            "v" => Some(Self::VideoOnly),
            "av" => Some(Self::AudioAndVideo),
            _ => None,
        }
    }

    /// Whether this kind produces an audio output.
    pub fn wants_audio_output(&self) -> bool {
        matches!(self, Self::AudioOnly | Self::AudioAndVideo)
    }

    /// Whether this kind produces a video output.
    pub fn wants_video_output(&self) -> bool {
        matches!(self, Self::VideoOnly | Self::AudioAndVideo)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AudioOnly => "a",
            Self::VideoOnly => "v",
            Self::AudioAndVideo => "av",
        }
    }
}

/// One validated row of the job list.
///
/// Constructed once by the parser and read-only for the rest of the run;
/// no stage ever mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    /// Position among the valid rows, used for deterministic report ordering.
    pub index: usize,
    pub kind: JobKind,
    /// Must reference exactly one source item, never a collection.
    pub source_locator: String,
    pub album_artist: String,
    pub album_name: String,
    pub track_title: String,
    pub track_artist: String,
    pub genre: String,
    pub year: i32,
    /// Resolved against the cover directory at parse time.
    pub cover_image: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_column_parsing() {
        assert_eq!(JobKind::parse_column("a"), Some(JobKind::AudioOnly));
        assert_eq!(JobKind::parse_column("V"), Some(JobKind::VideoOnly));
        assert_eq!(JobKind::parse_column("Av"), Some(JobKind::AudioAndVideo));
        assert_eq!(JobKind::parse_column("x"), None);
        assert_eq!(JobKind::parse_column(""), None);
    }

    #[test]
    fn test_kind_outputs() {
        assert!(JobKind::AudioOnly.wants_audio_output());
        assert!(!JobKind::AudioOnly.wants_video_output());
        assert!(!JobKind::VideoOnly.wants_audio_output());
        assert!(JobKind::VideoOnly.wants_video_output());
        assert!(JobKind::AudioAndVideo.wants_audio_output());
        assert!(JobKind::AudioAndVideo.wants_video_output());
    }
}
