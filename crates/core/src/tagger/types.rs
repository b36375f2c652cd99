//! Types for the tagger module.

use std::path::PathBuf;

use crate::jobspec::JobSpec;

/// Descriptive tags embedded into an audio artifact.
#[derive(Debug, Clone)]
pub struct TrackTags {
    pub album_artist: String,
    pub album: String,
    pub title: String,
    pub artist: String,
    pub genre: String,
    pub year: i32,
    /// Source locator, kept in the file as a comment for provenance.
    pub comment: String,
}

impl TrackTags {
    /// Builds the tag set from a job's metadata.
    pub fn from_spec(spec: &JobSpec) -> Self {
        Self {
            album_artist: spec.album_artist.clone(),
            album: spec.album_name.clone(),
            title: spec.track_title.clone(),
            artist: spec.track_artist.clone(),
            genre: spec.genre.clone(),
            year: spec.year,
            comment: spec.source_locator.clone(),
        }
    }

    /// Renders the tags as ffmpeg `-metadata` arguments. The year is
    /// written to both the year and date fields.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        let pairs = [
            ("album_artist", self.album_artist.clone()),
            ("album", self.album.clone()),
            ("title", self.title.clone()),
            ("artist", self.artist.clone()),
            ("genre", self.genre.clone()),
            ("year", self.year.to_string()),
            ("date", self.year.to_string()),
            ("comment", self.comment.clone()),
        ];
        for (key, value) in pairs {
            args.push("-metadata".to_string());
            args.push(format!("{key}={value}"));
        }
        args
    }
}

/// Request to tag one audio artifact.
#[derive(Debug, Clone)]
pub struct TagJob {
    pub job_id: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub tags: TrackTags,
    pub cover_image: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> TrackTags {
        TrackTags {
            album_artist: "Queen Singer".to_string(),
            album: "Immortal Songs".to_string(),
            title: "Every Night".to_string(),
            artist: "Queen Singer".to_string(),
            genre: "Pop".to_string(),
            year: 1999,
            comment: "https://example.com/v/1".to_string(),
        }
    }

    #[test]
    fn test_ffmpeg_args_cover_all_fields() {
        let args = tags().to_ffmpeg_args();
        assert_eq!(args.len(), 16);
        assert!(args.contains(&"album_artist=Queen Singer".to_string()));
        assert!(args.contains(&"year=1999".to_string()));
        assert!(args.contains(&"date=1999".to_string()));
        assert!(args.contains(&"comment=https://example.com/v/1".to_string()));
    }
}
