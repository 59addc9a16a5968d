//! Paginated show index
//!
//! One page of `/shows` at a time. Pages already in the shared
//! [`PageCache`] are served from it; fetched pages are written to it.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::{PageParams, GET_SHOWS_PAGE};
use crate::models::Show;
use crate::net::{LiveRequest, NetworkError, NetworkHandler, PageCache, RequestOptions};
use crate::reactive::{Computed, Signal, Subscription};

/// A source of one page of shows, as consumed by the aggregating views
pub trait PageFeed: Send + Sync + 'static {
    fn data(&self) -> &Signal<Option<Arc<Vec<Show>>>>;
    fn loading(&self) -> &Signal<bool>;
    fn error(&self) -> &Signal<Option<NetworkError>>;
    /// Fetch the page again
    fn refresh(&self);
}

pub struct ShowsPage {
    page: Signal<u32>,
    request: LiveRequest<PageParams, Vec<Show>>,
    cache: PageCache<Show>,
    data: Signal<Option<Arc<Vec<Show>>>>,
    ok: Computed<bool>,
    _subscriptions: Vec<Subscription>,
}

impl ShowsPage {
    pub fn new(
        handler: &NetworkHandler,
        cache: PageCache<Show>,
        page: u32,
        options: RequestOptions<Vec<Show>>,
    ) -> Self {
        let request = handler.use_request(GET_SHOWS_PAGE, Some(PageParams { page }), options);
        let page = Signal::new(page);
        let data = Signal::new(cache.get(page.get()));

        let ok = {
            let status = request.status().clone();
            Computed::new(&[request.status()], move || {
                status.get().is_some_and(|s| (200..300).contains(&s))
            })
        };

        // Guards "is this still the current page" together with the write
        // to `data`, so a late result cannot overwrite a newer page's shows.
        let gate = Arc::new(Mutex::new(()));

        // Fresh results are cached under the page they were fetched for
        // (first write wins) and shown only while that page is current.
        {
            let page = page.clone();
            let cache = cache.clone();
            let data = data.clone();
            let gate = Arc::clone(&gate);
            request.on_success(move |params: Option<&PageParams>, shows: &Vec<Show>| {
                let fetched = params.map_or(0, |p| p.page);
                let shows = Arc::new(shows.clone());
                if cache.set(fetched, Arc::clone(&shows)) {
                    debug!(page = fetched, count = shows.len(), "cached shows page");
                }
                let _gate = gate.lock();
                if page.get() == fetched {
                    data.set(Some(shows));
                } else {
                    debug!(page = fetched, current = page.get(), "page changed, result cached only");
                }
            });
        }

        let load = {
            let request = request.clone();
            let cache = cache.clone();
            let data = data.clone();
            move |page: &u32| {
                let _gate = gate.lock();
                match cache.get(*page) {
                    Some(cached) => {
                        debug!(page = *page, "shows page cache hit");
                        request.cancel();
                        data.set(Some(cached));
                    }
                    None => {
                        request.spawn_run(Some(PageParams { page: *page }));
                    }
                }
            }
        };
        load(&page.get());
        let follow = page.subscribe_changes(load);

        Self {
            page,
            request,
            cache,
            data,
            ok,
            _subscriptions: vec![follow],
        }
    }

    pub fn page(&self) -> &Signal<u32> {
        &self.page
    }

    pub fn set_page(&self, page: u32) {
        self.page.set(page);
    }

    /// Current page's shows, from the cache or the latest fetch
    pub fn data(&self) -> &Signal<Option<Arc<Vec<Show>>>> {
        &self.data
    }

    /// Current page's shows, empty while none have arrived
    pub fn shows(&self) -> Arc<Vec<Show>> {
        self.data.get().unwrap_or_default()
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

    /// Whether the last response status was 2xx
    pub fn ok(&self) -> &Computed<bool> {
        &self.ok
    }

    pub fn cache(&self) -> &PageCache<Show> {
        &self.cache
    }

    /// Fetch the current page from the network, even if cached. The cache
    /// keeps its first entry; the view shows the fresh result.
    pub fn refresh(&self) -> JoinHandle<()> {
        self.request.spawn_run(Some(PageParams {
            page: self.page.get(),
        }))
    }

    pub fn cancel(&self) {
        self.request.cancel();
    }

    /// Wait until no fetch is in flight. A fetch that was cancelled leaves
    /// the page without data or error.
    pub async fn settled(&self) {
        self.loading().wait_until(|loading| !*loading).await;
    }
}

impl PageFeed for ShowsPage {
    fn data(&self) -> &Signal<Option<Arc<Vec<Show>>>> {
        &self.data
    }

    fn loading(&self) -> &Signal<bool> {
        self.request.loading()
    }

    fn error(&self) -> &Signal<Option<NetworkError>> {
        self.request.error()
    }

    fn refresh(&self) {
        ShowsPage::refresh(self);
    }
}
