use std::fmt::Write as _;
use std::sync::Arc;

use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{DaySelection, Episode, NewShow, Show, UpdateOutcome};
use crate::schedule::{Reconciler, ScheduleFetcher, ShowResolver};
use crate::services::{HttpClient, LinkShortener, PageSource, ReleaseLookup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    AlreadySubscribed,
}

/// What a front-end needs to announce a new episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseNotice {
    pub title: String,
    pub episode: Episode,
    pub short_720p: String,
    pub short_1080p: String,
    pub subscribers: Vec<i64>,
}

pub struct App {
    pub repository: Repository,
    fetcher: ScheduleFetcher,
    reconciler: Reconciler,
    releases: ReleaseLookup,
    shortener: LinkShortener,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let source: Arc<dyn PageSource> = Arc::new(HttpClient::new(config));
        Self::with_source(config, source).await
    }

    pub async fn with_source(config: &Config, source: Arc<dyn PageSource>) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;
        let endpoints = config.endpoints()?;

        let resolver = ShowResolver::new(repository.clone(), source.clone());
        let fetcher = ScheduleFetcher::new(
            source.clone(),
            endpoints.clone(),
            config.days.clone(),
            resolver,
        );
        let reconciler = Reconciler::new(repository.clone());
        let releases = ReleaseLookup::new(source.clone(), endpoints.clone(), repository.clone());
        let shortener = LinkShortener::new(source, endpoints);

        Ok(Self {
            repository,
            fetcher,
            reconciler,
            releases,
            shortener,
        })
    }

    /// Close the database connection shared by every component.
    pub async fn close(self) -> Result<()> {
        self.repository.close().await
    }

    // Users

    /// Register a user on first contact. Returns true if the user was new.
    pub async fn ensure_user(&self, id: i64, username: &str, first_name: &str) -> Result<bool> {
        if self.repository.check_user_exists(id).await? {
            return Ok(false);
        }
        self.repository.insert_user(id, username, first_name).await?;
        tracing::info!("New user {} ({})", id, username);
        Ok(true)
    }

    pub async fn broadcast_targets(&self) -> Result<Vec<i64>> {
        self.repository.list_all_users().await
    }

    // Subscriptions

    pub async fn subscribe(&self, user_id: i64, title: &str) -> Result<SubscribeOutcome> {
        let show_id = self.stored_show_id(title).await?;
        if self.repository.check_subscribed(user_id, show_id).await? {
            return Ok(SubscribeOutcome::AlreadySubscribed);
        }
        self.repository.insert_subscription(user_id, show_id).await?;
        Ok(SubscribeOutcome::Subscribed)
    }

    /// Returns false when the user was not subscribed.
    pub async fn unsubscribe(&self, user_id: i64, title: &str) -> Result<bool> {
        let show_id = self.stored_show_id(title).await?;
        if !self.repository.check_subscribed(user_id, show_id).await? {
            return Ok(false);
        }
        self.repository.remove_subscription(user_id, show_id).await?;
        Ok(true)
    }

    pub async fn subscriptions(&self, user_id: i64) -> Result<Vec<String>> {
        self.repository.list_subscriptions(user_id).await
    }

    async fn stored_show_id(&self, title: &str) -> Result<i64> {
        self.repository
            .get_show_id_by_title(title)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("show {:?}", title)))
    }

    // Schedule

    pub async fn update(&mut self) -> Result<UpdateOutcome> {
        self.reconciler.update(&mut self.fetcher).await
    }

    /// Store every scheduled show the catalog does not know yet.
    pub async fn sync_catalog(&mut self) -> Result<usize> {
        let shows = self.fetcher.iterate(DaySelection::All).await?;
        let known = self.repository.list_all_show_titles().await?;

        let mut inserted = 0;
        for show in shows.into_iter().filter(|s| !known.contains(&s.title)) {
            tracing::debug!("Adding show {:?} ({})", show.title, show.id);
            self.repository.insert_show(NewShow::from(show)).await?;
            inserted += 1;
        }
        tracing::info!("Catalog sync added {} shows", inserted);
        Ok(inserted)
    }

    /// Shows currently stored, in configured day order then airing time.
    pub async fn catalog(&self) -> Result<Vec<Show>> {
        let mut shows = self.repository.list_shows().await?;
        let days = self.fetcher.days();
        shows.sort_by_key(|s| {
            let day = days.iter().position(|d| *d == s.airing_day).unwrap_or(days.len());
            (day, s.airing_time.clone())
        });
        Ok(shows)
    }

    pub async fn render_schedule(&mut self, days: impl Into<DaySelection>) -> Result<String> {
        let selection = days.into();
        let shows = self.fetcher.iterate(selection.clone()).await?;

        let mut out = String::new();
        for day in selection.resolve(self.fetcher.days()) {
            let _ = writeln!(out, "{}", day);
            for show in shows.iter().filter(|s| s.day == day) {
                let _ = writeln!(out, "• {} @ {} PST", show.title, show.time);
            }
            let _ = writeln!(out, "{}", "-".repeat(41));
        }
        Ok(out)
    }

    // Releases

    pub async fn check_released(&self, title: &str) -> Result<bool> {
        self.releases.check_released(title).await
    }

    pub async fn latest_episode(&self, title: &str) -> Result<Episode> {
        self.releases.get_latest_episode(title).await
    }

    pub async fn shorten_link(&self, magnet: &str) -> Result<String> {
        self.shortener.shorten_link(magnet).await
    }

    /// Everything needed to announce `title`, or `None` if it has not been
    /// released yet.
    pub async fn release_notice(&self, title: &str) -> Result<Option<ReleaseNotice>> {
        if !self.check_released(title).await? {
            return Ok(None);
        }

        let show_id = self.stored_show_id(title).await?;
        let episode = self.latest_episode(title).await?;
        let short_720p = self.shorten_link(&episode.link_720p).await?;
        let short_1080p = self.shorten_link(&episode.link_1080p).await?;
        let subscribers = self.repository.list_subscribers(show_id).await?;

        Ok(Some(ReleaseNotice {
            title: title.to_string(),
            episode,
            short_720p,
            short_1080p,
            subscribers,
        }))
    }
}
