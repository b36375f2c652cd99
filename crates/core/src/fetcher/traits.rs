//! Trait definitions for the fetcher module.

use async_trait::async_trait;

use super::error::FetchError;
use super::types::{FetchRequest, FetchResult};

/// A fetcher that can acquire source streams as local files.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the name of this fetcher implementation.
    fn name(&self) -> &str;

    /// Acquires the requested streams into the request's destination
    /// directory.
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResult, FetchError>;

    /// Validates that the fetcher is properly configured and ready.
    async fn validate(&self) -> Result<(), FetchError>;
}
