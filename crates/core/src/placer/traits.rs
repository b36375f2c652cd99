//! Trait definitions for the placer module.

use async_trait::async_trait;

use super::error::PlacerError;
use super::types::{Placement, PlacementRequest};

/// A placer that can move finished artifacts to their final destinations.
#[async_trait]
pub trait Placer: Send + Sync {
    /// Returns the name of this placer implementation.
    fn name(&self) -> &str;

    /// Places one artifact according to the request.
    ///
    /// The final move must be atomic: the destination either holds the
    /// complete artifact or does not exist.
    async fn place(&self, request: PlacementRequest) -> Result<Placement, PlacerError>;

    /// Validates that the placer is properly configured and ready.
    async fn validate(&self) -> Result<(), PlacerError>;
}
