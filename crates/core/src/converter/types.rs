//! Types for the converter module.

use serde::Deserialize;
use std::path::PathBuf;

/// Integrated loudness target for every normalized output, in LUFS,
/// applied with the EBU R128 procedure.
pub const TARGET_LOUDNESS_LUFS: f64 = -14.0;

/// True-peak ceiling used alongside the loudness target, in dBTP.
pub const TRUE_PEAK_DBTP: f64 = -1.5;

/// Loudness range target, in LU.
pub const LOUDNESS_RANGE_LU: f64 = 11.0;

/// Transcode a single audio stream into the target audio codec.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub job_id: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

/// Mux separate video and audio streams into one container.
#[derive(Debug, Clone)]
pub struct MuxJob {
    pub job_id: String,
    pub video_path: PathBuf,
    pub audio_path: PathBuf,
    pub output_path: PathBuf,
}

/// Whether normalization rewrites a bare audio file or the audio track of
/// a video container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeKind {
    Audio,
    Video,
}

/// Rewrite an artifact's audio loudness to the fixed target level.
#[derive(Debug, Clone)]
pub struct NormalizeJob {
    pub job_id: String,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub kind: NormalizeKind,
}

/// Outcome of one converter operation.
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub elapsed_ms: u64,
}

/// Basic media information from a probe.
#[derive(Debug, Clone)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub duration_secs: f64,
    pub format: String,
    pub has_audio: bool,
    pub has_video: bool,
}

/// Loudness statistics measured by the first normalization pass and fed
/// verbatim into the second.
///
/// The loudnorm filter prints every value as a JSON string.
#[derive(Debug, Clone, Deserialize)]
pub struct LoudnessMeasurement {
    pub input_i: String,
    pub input_tp: String,
    pub input_lra: String,
    pub input_thresh: String,
    pub target_offset: String,
}
