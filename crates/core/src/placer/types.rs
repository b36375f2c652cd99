//! Types for the placer module.

use std::path::{Path, PathBuf};

/// Request to place one finished artifact into the output tree.
#[derive(Debug, Clone)]
pub struct PlacementRequest {
    pub job_id: String,
    /// The finished artifact in the job's working directory.
    pub artifact: PathBuf,
    pub album_artist: String,
    pub album_name: String,
    pub track_title: String,
    /// Replace an existing destination instead of failing on collision.
    pub overwrite: bool,
}

/// A successfully placed file.
#[derive(Debug, Clone)]
pub struct Placement {
    pub destination: PathBuf,
    pub size_bytes: u64,
}

/// Characters that cannot appear in a destination path segment.
const RESERVED: &[char] = &['/', '\\', '\0', '<', '>', ':', '"', '|', '?', '*'];

/// Sanitizes one path segment: path separators and reserved characters
/// become `_`, leading/trailing dots and whitespace are trimmed, and an
/// empty result becomes `_`. Interior spaces are preserved.
pub fn sanitize_segment(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim().trim_matches('.').trim();
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Computes the deterministic destination directory:
/// `root/albumArtist/albumName/trackTitle/`, each segment sanitized.
pub fn destination_dir(root: &Path, artist: &str, album: &str, title: &str) -> PathBuf {
    root.join(sanitize_segment(artist))
        .join(sanitize_segment(album))
        .join(sanitize_segment(title))
}
