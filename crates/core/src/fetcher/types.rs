//! Types for the fetcher module.

use std::path::PathBuf;

/// What acquire should fetch for one job.
///
/// The audio stream is always wanted: audio outputs transcode it and video
/// outputs mux it. The video stream is wanted only for video outputs.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub job_id: String,
    /// Must resolve to exactly one source item, never a collection.
    pub locator: String,
    pub want_audio: bool,
    pub want_video: bool,
    /// Directory owned by the requesting pipeline; all outputs land here.
    pub dest_dir: PathBuf,
}

/// Local stream files produced by one fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    pub audio_path: Option<PathBuf>,
    pub video_path: Option<PathBuf>,
}
