//! Catalog façade
//!
//! Owns the request handler, the process-wide page cache and the request
//! settings, and hands out view-models wired to them.

use std::time::Duration;

use crate::api::{tv_registry, TvMazeClient};
use crate::config::Config;
use crate::models::Show;
use crate::net::handler::DEFAULT_RETRY_DELAY;
use crate::net::{NetworkHandler, PageCache, Registry, RequestOptions};
use crate::reactive::Signal;
use crate::views::{
    CastView, CrewView, EpisodesView, GenreBucketOptions, GenreBucketsView, SearchOptions,
    SearchView, SeasonsView, ShowView, ShowsPage, TopRatedOptions, TopRatedView, DEFAULT_DEBOUNCE,
};

/// Settings applied to every binding the catalog creates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogSettings {
    pub retry: u32,
    pub retry_delay: Duration,
    pub debounce: Duration,
    pub genres: GenreBucketOptions,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            retry: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            debounce: DEFAULT_DEBOUNCE,
            genres: GenreBucketOptions::default(),
        }
    }
}

impl CatalogSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            retry: config.retry(),
            retry_delay: config.retry_delay(),
            debounce: config.debounce(),
            genres: config.genre_options(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Catalog {
    handler: NetworkHandler,
    pages: PageCache<Show>,
    settings: CatalogSettings,
}

impl Catalog {
    pub fn new(registry: Registry) -> Self {
        Self::with_settings(registry, CatalogSettings::default())
    }

    pub fn with_settings(registry: Registry, settings: CatalogSettings) -> Self {
        Self {
            handler: NetworkHandler::new(registry),
            pages: PageCache::new(),
            settings,
        }
    }

    /// Catalog backed by the TVmaze API as configured
    pub fn from_config(config: &Config) -> Self {
        let mut client = TvMazeClient::with_options(config.base_url(), config.timeout());
        if let Some(token) = config.api_token() {
            client = client.with_token(token);
        }
        Self::with_settings(tv_registry(client), CatalogSettings::from_config(config))
    }

    pub fn handler(&self) -> &NetworkHandler {
        &self.handler
    }

    pub fn page_cache(&self) -> &PageCache<Show> {
        &self.pages
    }

    pub fn settings(&self) -> &CatalogSettings {
        &self.settings
    }

    fn options<R>(&self) -> RequestOptions<R> {
        RequestOptions::new()
            .retry(self.settings.retry)
            .retry_delay(self.settings.retry_delay)
    }

    pub fn show(&self, id: Signal<Option<u64>>) -> ShowView {
        ShowView::new(&self.handler, id, self.options())
    }

    pub fn cast(&self, id: Signal<Option<u64>>) -> CastView {
        CastView::new(&self.handler, id, self.options())
    }

    pub fn crew(&self, id: Signal<Option<u64>>) -> CrewView {
        CrewView::new(&self.handler, id, self.options())
    }

    pub fn seasons(&self, id: Signal<Option<u64>>) -> SeasonsView {
        SeasonsView::new(&self.handler, id, self.options())
    }

    pub fn episodes(&self, id: Signal<Option<u64>>) -> EpisodesView {
        EpisodesView::new(&self.handler, id, self.options())
    }

    pub fn season_episodes(&self, season_id: Signal<Option<u64>>) -> EpisodesView {
        EpisodesView::for_season(&self.handler, season_id, self.options())
    }

    pub fn search(&self, initial_query: impl Into<String>) -> SearchView {
        let options = SearchOptions {
            debounce: self.settings.debounce,
            ..Default::default()
        };
        SearchView::new(&self.handler, initial_query, options, self.options())
    }

    /// One index page, served from the shared cache when possible
    pub fn shows_page(&self, page: u32) -> ShowsPage {
        ShowsPage::new(&self.handler, self.pages.clone(), page, self.options())
    }

    fn first_pages(&self, count: u32) -> Vec<ShowsPage> {
        (0..count).map(|page| self.shows_page(page)).collect()
    }

    /// Genre rankings using the configured scan/limit/rating settings
    pub fn genre_buckets(&self, genres: Vec<String>) -> GenreBucketsView {
        self.genre_buckets_with(genres, self.settings.genres)
    }

    pub fn genre_buckets_with(
        &self,
        genres: Vec<String>,
        options: GenreBucketOptions,
    ) -> GenreBucketsView {
        GenreBucketsView::new(self.first_pages(options.pages_to_scan), genres, options)
    }

    pub fn top_rated(&self, options: TopRatedOptions) -> TopRatedView {
        TopRatedView::new(self.first_pages(options.pages_to_scan), options.limit)
    }
}
