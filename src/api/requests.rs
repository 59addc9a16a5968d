//! Catalog requests
//!
//! Typed request keys for every catalog endpoint, and the registry that binds
//! them to a [`TvMazeClient`].

use serde::{Deserialize, Serialize};

use super::tvmaze::TvMazeClient;
use crate::models::{CastMember, CrewMember, Episode, SearchHit, Season, Show};
use crate::net::{Registry, RequestKey, TransportError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageParams {
    pub page: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdParams {
    pub id: u64,
}

/// Episodes of a whole show, or of a single season when `season_id` is set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodesParams {
    pub id: Option<u64>,
    pub season_id: Option<u64>,
}

impl From<IdParams> for EpisodesParams {
    fn from(p: IdParams) -> Self {
        Self {
            id: Some(p.id),
            season_id: None,
        }
    }
}

pub const GET_SHOWS_PAGE: RequestKey<PageParams, Vec<Show>> = RequestKey::new("getShowsPage");
pub const SEARCH_SHOWS: RequestKey<SearchParams, Vec<SearchHit>> = RequestKey::new("searchShows");
pub const GET_SHOW: RequestKey<IdParams, Show> = RequestKey::new("getShow");
pub const GET_SEASONS: RequestKey<IdParams, Vec<Season>> = RequestKey::new("getSeasons");
pub const GET_EPISODES: RequestKey<EpisodesParams, Vec<Episode>> = RequestKey::new("getEpisodes");
pub const GET_CAST: RequestKey<IdParams, Vec<CastMember>> = RequestKey::new("getCast");
pub const GET_CREW: RequestKey<IdParams, Vec<CrewMember>> = RequestKey::new("getCrew");

fn required_id(request: &str, params: Option<IdParams>) -> Result<u64, TransportError> {
    params
        .map(|p| p.id)
        .ok_or_else(|| TransportError::MissingParam(format!("{}: \"id\" is required", request)))
}

/// Registry with every catalog request bound to `client`
pub fn tv_registry(client: TvMazeClient) -> Registry {
    let shows_page = client.clone();
    let search = client.clone();
    let show = client.clone();
    let seasons = client.clone();
    let episodes = client.clone();
    let cast = client.clone();
    let crew = client;

    Registry::new()
        .set_request(GET_SHOWS_PAGE, move |params, ctx| {
            let client = shows_page.clone();
            async move {
                let page = params.unwrap_or_default().page;
                client.shows_page(page, &ctx).await
            }
        })
        .set_request(SEARCH_SHOWS, move |params, ctx| {
            let client = search.clone();
            async move {
                let SearchParams { q, page } = params.unwrap_or_default();
                client.search_shows(&q, page, &ctx).await
            }
        })
        .set_request(GET_SHOW, move |params, ctx| {
            let client = show.clone();
            async move {
                let id = required_id(GET_SHOW.name(), params)?;
                client.show(id, &ctx).await
            }
        })
        .set_request(GET_SEASONS, move |params, ctx| {
            let client = seasons.clone();
            async move {
                let id = required_id(GET_SEASONS.name(), params)?;
                client.seasons(id, &ctx).await
            }
        })
        .set_request(GET_EPISODES, move |params: Option<EpisodesParams>, ctx| {
            let client = episodes.clone();
            async move {
                let params = params.unwrap_or_default();
                if let Some(season_id) = params.season_id {
                    return client.season_episodes(season_id, &ctx).await;
                }
                let id = params.id.ok_or_else(|| {
                    TransportError::MissingParam(
                        "getEpisodes: \"id\" is required when \"seasonId\" is not provided".into(),
                    )
                })?;
                client.show_episodes(id, &ctx).await
            }
        })
        .set_request(GET_CAST, move |params, ctx| {
            let client = cast.clone();
            async move {
                let id = required_id(GET_CAST.name(), params)?;
                client.cast(id, &ctx).await
            }
        })
        .set_request(GET_CREW, move |params, ctx| {
            let client = crew.clone();
            async move {
                let id = required_id(GET_CREW.name(), params)?;
                client.crew(id, &ctx).await
            }
        })
}
