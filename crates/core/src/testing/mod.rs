//! Mock collaborators for tests: controllable stand-ins that never spawn
//! real external processes.

mod mock_converter;
mod mock_fetcher;
mod mock_placer;
mod mock_tagger;

pub use mock_converter::{MockConverter, RecordedConversion};
pub use mock_fetcher::MockFetcher;
pub use mock_placer::MockPlacer;
pub use mock_tagger::MockTagger;
