//! Best-rated shows over the first pages of the show index

use std::sync::Arc;

use super::aggregate::Aggregate;
use super::shows_page::{PageFeed, ShowsPage};
use crate::models::Show;
use crate::net::NetworkError;
use crate::reactive::Computed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopRatedOptions {
    pub limit: usize,
    pub pages_to_scan: u32,
}

impl Default for TopRatedOptions {
    fn default() -> Self {
        Self {
            limit: 12,
            pages_to_scan: 2,
        }
    }
}

/// Best-rated first, ties in encounter order, at most `limit`
pub fn rank_by_rating<'a>(shows: impl IntoIterator<Item = &'a Show>, limit: usize) -> Vec<Show> {
    let mut ranked: Vec<Show> = shows.into_iter().cloned().collect();
    ranked.sort_by(|a, b| b.score().total_cmp(&a.score()));
    ranked.truncate(limit);
    ranked
}

pub struct TopRatedView<P: PageFeed = ShowsPage> {
    aggregate: Aggregate<P>,
    items: Computed<Vec<Show>>,
}

impl<P: PageFeed> TopRatedView<P> {
    pub fn new(pages: Vec<P>, limit: usize) -> Self {
        let aggregate = Aggregate::new(pages);
        let items = aggregate.derive(move |loaded: &[Arc<Vec<Show>>]| {
            rank_by_rating(loaded.iter().flat_map(|page| page.iter()), limit)
        });
        Self { aggregate, items }
    }

    pub fn items(&self) -> &Computed<Vec<Show>> {
        &self.items
    }

    pub fn loading(&self) -> &Computed<bool> {
        self.aggregate.loading()
    }

    pub fn error(&self) -> &Computed<Option<NetworkError>> {
        self.aggregate.error()
    }

    pub fn pages(&self) -> &[P] {
        self.aggregate.pages()
    }

    pub fn refresh_all(&self) {
        self.aggregate.refresh_all();
    }

    pub async fn settled(&self) {
        self.aggregate.settled().await;
    }
}
