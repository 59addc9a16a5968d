//! Debounced show search
//!
//! Edits to the query restart a quiet-period timer; the search runs once the
//! query has been stable for the debounce window. A blank query clears the
//! results without touching the network.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::{SearchParams, SEARCH_SHOWS};
use crate::models::{SearchHit, Show};
use crate::net::{LiveRequest, NetworkError, NetworkHandler, RequestOptions, RunFuture};
use crate::reactive::{Signal, Subscription};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub debounce: Duration,
    /// Result page requested from the search endpoint
    pub page: u32,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            page: 0,
        }
    }
}

pub struct SearchView {
    query: Signal<String>,
    request: LiveRequest<SearchParams, Vec<SearchHit>>,
    page: u32,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
    _watch: Subscription,
}

impl SearchView {
    /// The initial query is recorded but not searched; only later edits (or
    /// an explicit [`SearchView::run`]) trigger a request.
    pub fn new(
        handler: &NetworkHandler,
        initial_query: impl Into<String>,
        options: SearchOptions,
        request_options: RequestOptions<Vec<SearchHit>>,
    ) -> Self {
        let initial = initial_query.into();
        let request = handler.use_request(
            SEARCH_SHOWS,
            Some(SearchParams {
                q: initial.clone(),
                page: options.page,
            }),
            request_options,
        );
        let query = Signal::new(initial);
        let pending: Arc<Mutex<Option<JoinHandle<()>>>> = Arc::new(Mutex::new(None));

        let watch = {
            let request = request.clone();
            let pending = Arc::clone(&pending);
            query.subscribe_changes(move |q: &String| {
                if let Some(timer) = pending.lock().take() {
                    timer.abort();
                }

                if q.trim().is_empty() {
                    debug!("blank query, clearing results");
                    request.cancel();
                    request.data().set(Some(Vec::new()));
                    request.error().set(None);
                    return;
                }

                let params = SearchParams {
                    q: q.clone(),
                    page: options.page,
                };
                let request = request.clone();
                let debounce = options.debounce;
                let timer = tokio::spawn(async move {
                    tokio::time::sleep(debounce).await;
                    debug!(query = %params.q, "debounce elapsed, searching");
                    // Detached so aborting a later timer never aborts this run
                    tokio::spawn(request.run(Some(params), None));
                });
                *pending.lock() = Some(timer);
            })
        };

        Self {
            query,
            request,
            page: options.page,
            pending,
            _watch: watch,
        }
    }

    pub fn query(&self) -> &Signal<String> {
        &self.query
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.query.set(query.into());
    }

    /// Search now, skipping the debounce. `None` searches the current query.
    pub fn run(&self, query: Option<String>) -> RunFuture {
        self.abort_pending();
        let q = query.unwrap_or_else(|| self.query.get());
        self.request.run(
            Some(SearchParams {
                q,
                page: self.page,
            }),
            None,
        )
    }

    /// Drop a pending debounced search and cancel the one in flight
    pub fn cancel(&self) {
        self.abort_pending();
        self.request.cancel();
    }

    fn abort_pending(&self) {
        if let Some(timer) = self.pending.lock().take() {
            timer.abort();
        }
    }

    pub fn data(&self) -> &Signal<Option<Vec<SearchHit>>> {
        self.request.data()
    }

    pub fn loading(&self) -> &Signal<bool> {
        self.request.loading()
    }

    pub fn error(&self) -> &Signal<Option<NetworkError>> {
        self.request.error()
    }

    pub fn status(&self) -> &Signal<Option<u16>> {
        self.request.status()
    }

    pub fn request(&self) -> &LiveRequest<SearchParams, Vec<SearchHit>> {
        &self.request
    }

    /// Hits in the order the API returned them
    pub fn results(&self) -> Vec<SearchHit> {
        self.request.data().get().unwrap_or_default()
    }

    pub fn shows(&self) -> Vec<Show> {
        self.results().into_iter().map(|hit| hit.show).collect()
    }

    /// Hits by relevance score, best first
    pub fn sorted_by_score(&self) -> Vec<SearchHit> {
        let mut hits = self.results();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits
    }

    /// Shows by rating, best first; unrated shows last
    pub fn sorted_by_rating(&self) -> Vec<Show> {
        let mut shows = self.shows();
        shows.sort_by(|a, b| b.score().total_cmp(&a.score()));
        shows
    }
}

impl Drop for SearchView {
    fn drop(&mut self) {
        self.abort_pending();
    }
}
