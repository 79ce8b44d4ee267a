use async_trait::async_trait;
use tracing::info;

use crate::core::RaceTimeline;
use crate::input::load_file;
use crate::source::{SourceResult, TimelineSource};

/// Timeline source backed by a simulator export on disk
pub struct FileSource {
    path: String,
}

impl FileSource {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
        }
    }
}

#[async_trait]
impl TimelineSource for FileSource {
    fn name(&self) -> &str {
        &self.path
    }

    async fn fetch(&mut self) -> SourceResult<RaceTimeline> {
        let path = self.path.clone();
        let timeline = tokio::task::spawn_blocking(move || load_file(&path)).await??;
        info!(
            "Loaded {} entries and {} events from {}",
            timeline.entries.len(),
            timeline.events.len(),
            self.path
        );
        Ok(timeline)
    }
}
