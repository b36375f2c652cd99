//! Trait definitions for the tagger module.

use async_trait::async_trait;
use std::path::PathBuf;

use super::error::TagError;
use super::types::TagJob;

/// A tagger that embeds descriptive metadata into audio artifacts.
#[async_trait]
pub trait Tagger: Send + Sync {
    /// Returns the name of this tagger implementation.
    fn name(&self) -> &str;

    /// Writes tags (and the cover image, when present) into a copy of the
    /// input artifact and returns the tagged file's path.
    async fn tag(&self, job: TagJob) -> Result<PathBuf, TagError>;

    /// Validates that the tagger is properly configured and ready.
    async fn validate(&self) -> Result<(), TagError>;
}
