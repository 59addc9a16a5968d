//! View-models
//!
//! Reactive objects built on live request bindings. Each one owns its
//! bindings and subscriptions; dropping a view detaches it.
//!
//! - `entity` - one record (or list) keyed by a show/season id
//! - `search` - debounced show search
//! - `shows_page` - paginated show index backed by the page cache
//! - `genre_buckets` - multi-page aggregation into per-genre rankings
//! - `top_rated` - multi-page aggregation into one ranking
//!
//! Views spawn their fetches on the current Tokio runtime, so they must be
//! created from within one.

mod aggregate;
pub mod entity;
pub mod genre_buckets;
pub mod search;
pub mod shows_page;
pub mod top_rated;

pub use entity::{CastView, CrewView, EntityView, EpisodesView, SeasonsView, ShowView};
pub use genre_buckets::{bucket_by_genre, GenreBucketOptions, GenreBuckets, GenreBucketsView};
pub use search::{SearchOptions, SearchView, DEFAULT_DEBOUNCE};
pub use shows_page::{PageFeed, ShowsPage};
pub use top_rated::{rank_by_rating, TopRatedOptions, TopRatedView};
