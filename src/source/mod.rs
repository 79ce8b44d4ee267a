pub mod file;
pub mod synthetic;

pub use file::FileSource;
pub use synthetic::SyntheticSource;

use async_trait::async_trait;
use std::error::Error;

use crate::core::RaceTimeline;

/// Result type for timeline source operations
pub type SourceResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Trait for timeline providers
///
/// A source hands over one complete, immutable timeline per simulation run:
/// - Files exported from a simulator run (JSON or CSV)
/// - A synthetic generator for demos and tests
#[async_trait]
pub trait TimelineSource: Send {
    /// Name/identifier of this source
    fn name(&self) -> &str;

    /// Fetch a complete timeline
    ///
    /// Called once per run; the result replaces any previously fetched
    /// timeline wholesale. There is no incremental append.
    async fn fetch(&mut self) -> SourceResult<RaceTimeline>;
}
