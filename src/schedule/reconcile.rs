use std::collections::HashSet;

use crate::db::Repository;
use crate::error::Result;
use crate::models::{DaySelection, UpdateOutcome};

use super::fetcher::ScheduleFetcher;

/// Detects a roster change between the live schedule and the store. Any
/// difference counts as a new season and flushes every show and
/// subscription.
pub struct Reconciler {
    repository: Repository,
    update_id: u64,
}

impl Reconciler {
    pub fn new(repository: Repository) -> Self {
        Self {
            repository,
            update_id: 0,
        }
    }

    /// Number of updates run so far.
    pub fn update_id(&self) -> u64 {
        self.update_id
    }

    /// A failed fetch leaves the counter alone; once the page is in hand
    /// the update counts even if a row then fails to parse or resolve.
    /// Either way nothing is flushed.
    pub async fn update(&mut self, fetcher: &mut ScheduleFetcher) -> Result<UpdateOutcome> {
        fetcher.refresh().await?;
        self.update_id += 1;

        let scraped: HashSet<String> = fetcher
            .resolved(&DaySelection::All)
            .await?
            .into_iter()
            .map(|show| show.title)
            .collect();
        let stored = self.repository.list_all_show_titles().await?;

        if scraped == stored {
            tracing::info!("Update successful, id: {}", self.update_id);
            return Ok(UpdateOutcome::Unchanged);
        }

        tracing::warn!(
            "Show mismatch found ({} scraped, {} stored), flushing old data...",
            scraped.len(),
            stored.len()
        );
        let purged = self.repository.purge_schedule_data().await?;
        tracing::info!(
            "Flushed {} shows and {} subscriptions",
            purged.shows,
            purged.subscriptions
        );
        Ok(UpdateOutcome::MismatchFlushed)
    }
}
