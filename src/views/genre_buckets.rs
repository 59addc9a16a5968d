//! Per-genre rankings over the first pages of the show index

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

use super::aggregate::Aggregate;
use super::shows_page::{PageFeed, ShowsPage};
use crate::models::Show;
use crate::net::NetworkError;
use crate::reactive::Computed;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenreBucketOptions {
    /// Index pages to scan (250 shows each)
    pub pages_to_scan: u32,
    pub per_genre_limit: usize,
    /// Shows rated below this are left out; unrated shows count as 0
    pub min_rating: f64,
}

impl Default for GenreBucketOptions {
    fn default() -> Self {
        Self {
            pages_to_scan: 2,
            per_genre_limit: 12,
            min_rating: 0.0,
        }
    }
}

/// Genre -> ranked shows, in the order the genres were supplied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenreBuckets {
    buckets: Vec<(String, Vec<Show>)>,
}

impl GenreBuckets {
    fn with_genres(genres: &[String]) -> Self {
        let mut buckets: Vec<(String, Vec<Show>)> = Vec::with_capacity(genres.len());
        for genre in genres {
            if !buckets.iter().any(|(g, _)| g == genre) {
                buckets.push((genre.clone(), Vec::new()));
            }
        }
        Self { buckets }
    }

    fn bucket_mut(&mut self, genre: &str) -> Option<&mut Vec<Show>> {
        self.buckets
            .iter_mut()
            .find(|(g, _)| g == genre)
            .map(|(_, shows)| shows)
    }

    pub fn get(&self, genre: &str) -> Option<&[Show]> {
        self.buckets
            .iter()
            .find(|(g, _)| g == genre)
            .map(|(_, shows)| shows.as_slice())
    }

    pub fn genres(&self) -> impl Iterator<Item = &str> {
        self.buckets.iter().map(|(g, _)| g.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Show])> {
        self.buckets.iter().map(|(g, s)| (g.as_str(), s.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Serialize for GenreBuckets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for (genre, shows) in &self.buckets {
            map.serialize_entry(genre, shows)?;
        }
        map.end()
    }
}

/// Group `shows` under each of `genres` they carry.
///
/// Every supplied genre gets a key, even when empty. Shows rated below
/// `min_rating` are skipped and genres not supplied are ignored. Each bucket
/// is sorted by rating, best first (ties keep encounter order), then cut to
/// `per_genre_limit`.
pub fn bucket_by_genre<'a>(
    shows: impl IntoIterator<Item = &'a Show>,
    genres: &[String],
    min_rating: f64,
    per_genre_limit: usize,
) -> GenreBuckets {
    let mut buckets = GenreBuckets::with_genres(genres);

    for show in shows {
        if show.score() < min_rating {
            continue;
        }
        for genre in &show.genres {
            if let Some(bucket) = buckets.bucket_mut(genre) {
                bucket.push(show.clone());
            }
        }
    }

    for (_, bucket) in buckets.buckets.iter_mut() {
        bucket.sort_by(|a, b| b.score().total_cmp(&a.score()));
        bucket.truncate(per_genre_limit);
    }
    buckets
}

/// Genre rankings over several pages, recomputed as pages arrive
pub struct GenreBucketsView<P: PageFeed = ShowsPage> {
    genres: Vec<String>,
    options: GenreBucketOptions,
    aggregate: Aggregate<P>,
    buckets: Computed<GenreBuckets>,
}

impl<P: PageFeed> GenreBucketsView<P> {
    /// Pages that have neither data nor an error and are not loading are
    /// refreshed once on sight.
    pub fn new(pages: Vec<P>, genres: Vec<String>, options: GenreBucketOptions) -> Self {
        let aggregate = Aggregate::new(pages);
        let buckets = {
            let genres = genres.clone();
            aggregate.derive(move |loaded: &[Arc<Vec<Show>>]| {
                bucket_by_genre(
                    loaded.iter().flat_map(|page| page.iter()),
                    &genres,
                    options.min_rating,
                    options.per_genre_limit,
                )
            })
        };

        Self {
            genres,
            options,
            aggregate,
            buckets,
        }
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    pub fn options(&self) -> GenreBucketOptions {
        self.options
    }

    pub fn buckets(&self) -> &Computed<GenreBuckets> {
        &self.buckets
    }

    /// True while any page is loading
    pub fn loading(&self) -> &Computed<bool> {
        self.aggregate.loading()
    }

    /// First page error, by page order
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
