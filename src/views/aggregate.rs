//! State shared by views that combine several pages

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::shows_page::PageFeed;
use crate::models::Show;
use crate::net::NetworkError;
use crate::reactive::{Computed, Observable, Subscription};

/// A fixed set of pages with combined loading / error state
pub(crate) struct Aggregate<P> {
    pages: Arc<Vec<P>>,
    loading: Computed<bool>,
    error: Computed<Option<NetworkError>>,
    pending: Computed<bool>,
    _init: Vec<Subscription>,
}

impl<P: PageFeed> Aggregate<P> {
    pub(crate) fn new(pages: Vec<P>) -> Self {
        let pages = Arc::new(pages);
        let inputs: Vec<&dyn Observable> = pages
            .iter()
            .flat_map(|p| {
                [
                    p.data() as &dyn Observable,
                    p.loading() as &dyn Observable,
                    p.error() as &dyn Observable,
                ]
            })
            .collect();

        let loading = {
            let pages = Arc::clone(&pages);
            Computed::new(&inputs, move || pages.iter().any(|p| p.loading().get()))
        };
        let error = {
            let pages = Arc::clone(&pages);
            Computed::new(&inputs, move || pages.iter().find_map(|p| p.error().get()))
        };
        let pending = {
            let pages = Arc::clone(&pages);
            Computed::new(&inputs, move || pages.iter().any(is_pending))
        };

        let init = pages
            .iter()
            .enumerate()
            .flat_map(|(index, _)| init_effect(Arc::clone(&pages), index))
            .collect();

        Self {
            pages,
            loading,
            error,
            pending,
            _init: init,
        }
    }

    pub(crate) fn pages(&self) -> &[P] {
        &self.pages
    }

    pub(crate) fn loading(&self) -> &Computed<bool> {
        &self.loading
    }

    pub(crate) fn error(&self) -> &Computed<Option<NetworkError>> {
        &self.error
    }

    pub(crate) fn refresh_all(&self) {
        for page in self.pages.iter() {
            page.refresh();
        }
    }

    /// Wait until no page is loading and every page has data or an error
    pub(crate) async fn settled(&self) {
        self.pending.wait_until(|pending| !*pending).await;
    }

    /// Value recomputed from the loaded pages (in page order) whenever any
    /// page's data changes
    pub(crate) fn derive<T>(
        &self,
        f: impl Fn(&[Arc<Vec<Show>>]) -> T + Send + Sync + 'static,
    ) -> Computed<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let inputs: Vec<&dyn Observable> = self
            .pages
            .iter()
            .map(|p| p.data() as &dyn Observable)
            .collect();
        let pages = Arc::clone(&self.pages);
        Computed::new(&inputs, move || {
            let loaded: Vec<Arc<Vec<Show>>> = pages.iter().filter_map(|p| p.data().get()).collect();
            f(&loaded)
        })
    }
}

fn is_idle_empty<P: PageFeed>(page: &P) -> bool {
    page.data().with(Option::is_none) && !page.loading().get() && page.error().with(Option::is_none)
}

fn is_pending<P: PageFeed>(page: &P) -> bool {
    page.loading().get() || (page.data().with(Option::is_none) && page.error().with(Option::is_none))
}

/// Refresh the page once each time it is seen with no data, not loading and
/// no error. The latch re-arms when the page leaves that state.
fn init_effect<P: PageFeed>(pages: Arc<Vec<P>>, index: usize) -> Vec<Subscription> {
    let armed = Arc::new(AtomicBool::new(true));
    let check: Arc<dyn Fn() + Send + Sync> = {
        let pages = Arc::clone(&pages);
        Arc::new(move || {
            let page = &pages[index];
            if is_idle_empty(page) {
                if armed.swap(false, Ordering::SeqCst) {
                    page.refresh();
                }
            } else {
                armed.store(true, Ordering::SeqCst);
            }
        })
    };

    // Subscribe first so the state changes caused by the first refresh are seen
    let page = &pages[index];
    let subscriptions = vec![
        page.data().observe(Arc::clone(&check)),
        page.loading().observe(Arc::clone(&check)),
        page.error().observe(Arc::clone(&check)),
    ];
    check();
    subscriptions
}
