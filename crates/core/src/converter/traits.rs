//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ConverterError;
use super::types::{ConversionOutput, MediaInfo, MuxJob, NormalizeJob, TranscodeJob};

/// A converter that can assemble and loudness-normalize media files.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Probes a media file to get its information.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, ConverterError>;

    /// Transcodes a single audio stream into the target audio codec.
    async fn transcode_audio(&self, job: TranscodeJob) -> Result<ConversionOutput, ConverterError>;

    /// Muxes separate video and audio streams into one container with
    /// stream copy.
    async fn mux(&self, job: MuxJob) -> Result<ConversionOutput, ConverterError>;

    /// Rewrites the artifact's audio loudness to the fixed target level
    /// (EBU R128, two passes).
    async fn normalize(&self, job: NormalizeJob) -> Result<ConversionOutput, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}
