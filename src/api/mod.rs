//! Catalog transport
//!
//! - `tvmaze` - HTTP client for the TVmaze REST API
//! - `requests` - typed request keys and the registry binding them to the client

pub mod requests;
pub mod tvmaze;

pub use requests::{
    tv_registry, EpisodesParams, IdParams, PageParams, SearchParams, GET_CAST, GET_CREW,
    GET_EPISODES, GET_SEASONS, GET_SHOW, GET_SHOWS_PAGE, SEARCH_SHOWS,
};
pub use tvmaze::TvMazeClient;
