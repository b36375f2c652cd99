//! Output placement: deterministic destinations and atomic final moves.

mod config;
mod error;
mod fs_placer;
mod traits;
mod types;

pub use config::PlacerConfig;
pub use error::PlacerError;
pub use fs_placer::FsPlacer;
pub use traits::Placer;
pub use types::{destination_dir, sanitize_segment, Placement, PlacementRequest};
