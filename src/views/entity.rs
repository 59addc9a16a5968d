//! Single record (or list) keyed by an id
//!
//! The view follows an id signal: every new id runs the bound request, and
//! clearing the id cancels it and resets the data.

use tokio::task::JoinHandle;

use crate::api::{EpisodesParams, IdParams, GET_CAST, GET_CREW, GET_EPISODES, GET_SEASONS, GET_SHOW};
use crate::models::{CastMember, CrewMember, Episode, Season, Show};
use crate::net::{LiveRequest, NetworkError, NetworkHandler, RequestOptions};
use crate::reactive::{Signal, Subscription};

pub type ShowView = EntityView<IdParams, Show>;
pub type CastView = EntityView<IdParams, Vec<CastMember>>;
pub type CrewView = EntityView<IdParams, Vec<CrewMember>>;
pub type SeasonsView = EntityView<IdParams, Vec<Season>>;
pub type EpisodesView = EntityView<EpisodesParams, Vec<Episode>>;

/// Live request driven by an optional id
pub struct EntityView<P, R> {
    id: Signal<Option<u64>>,
    request: LiveRequest<P, R>,
    to_params: fn(u64) -> P,
    _watch: Subscription,
}

impl<P, R> EntityView<P, R>
where
    P: Clone + Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Drive `request` from `id`. The current id is applied right away;
    /// `empty` is what `data` resets to when the id is cleared.
    pub fn bind(
        request: LiveRequest<P, R>,
        id: Signal<Option<u64>>,
        to_params: fn(u64) -> P,
        empty: Option<R>,
    ) -> Self {
        let apply = {
            let request = request.clone();
            move |id: &Option<u64>| match *id {
                Some(id) => {
                    request.spawn_run(Some(to_params(id)));
                }
                None => {
                    request.cancel();
                    request.data().set(empty.clone());
                    request.error().set(None);
                }
            }
        };

        apply(&id.get());
        let watch = id.subscribe_changes(apply);

        Self {
            id,
            request,
            to_params,
            _watch: watch,
        }
    }

    pub fn id(&self) -> &Signal<Option<u64>> {
        &self.id
    }

    pub fn set_id(&self, id: Option<u64>) {
        self.id.set(id);
    }

    pub fn data(&self) -> &Signal<Option<R>> {
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

    pub fn request(&self) -> &LiveRequest<P, R> {
        &self.request
    }

    /// Re-run for the current id. Does nothing while no id is set.
    pub fn refresh(&self) -> Option<JoinHandle<()>> {
        self.id
            .get()
            .map(|id| self.request.spawn_run(Some((self.to_params)(id))))
    }

    pub fn cancel(&self) {
        self.request.cancel();
    }

    /// Wait until no fetch is in flight
    pub async fn settled(&self) {
        self.request.loading().wait_until(|loading| !*loading).await;
    }
}

impl<P, T> EntityView<P, Vec<T>>
where
    P: Clone + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Current list, empty until the first success
    pub fn items(&self) -> Vec<T> {
        self.request.data().get().unwrap_or_default()
    }
}

fn by_id(id: u64) -> IdParams {
    IdParams { id }
}

impl ShowView {
    pub fn new(handler: &NetworkHandler, id: Signal<Option<u64>>, options: RequestOptions<Show>) -> Self {
        let request = handler.use_request(GET_SHOW, id.get().map(by_id), options);
        Self::bind(request, id, by_id, None)
    }

    pub fn show(&self) -> Option<Show> {
        self.data().get()
    }
}

impl CastView {
    pub fn new(
        handler: &NetworkHandler,
        id: Signal<Option<u64>>,
        options: RequestOptions<Vec<CastMember>>,
    ) -> Self {
        let request = handler.use_request(GET_CAST, id.get().map(by_id), options);
        Self::bind(request, id, by_id, Some(Vec::new()))
    }
}

impl CrewView {
    pub fn new(
        handler: &NetworkHandler,
        id: Signal<Option<u64>>,
        options: RequestOptions<Vec<CrewMember>>,
    ) -> Self {
        let request = handler.use_request(GET_CREW, id.get().map(by_id), options);
        Self::bind(request, id, by_id, Some(Vec::new()))
    }
}

impl SeasonsView {
    pub fn new(
        handler: &NetworkHandler,
        id: Signal<Option<u64>>,
        options: RequestOptions<Vec<Season>>,
    ) -> Self {
        let request = handler.use_request(GET_SEASONS, id.get().map(by_id), options);
        Self::bind(request, id, by_id, Some(Vec::new()))
    }
}

impl EpisodesView {
    /// Episodes of the show whose id `id` holds
    pub fn new(
        handler: &NetworkHandler,
        id: Signal<Option<u64>>,
        options: RequestOptions<Vec<Episode>>,
    ) -> Self {
        fn of_show(id: u64) -> EpisodesParams {
            EpisodesParams {
                id: Some(id),
                season_id: None,
            }
        }
        let request = handler.use_request(GET_EPISODES, id.get().map(of_show), options);
        Self::bind(request, id, of_show, Some(Vec::new()))
    }

    /// Episodes of the season whose id `season_id` holds
    pub fn for_season(
        handler: &NetworkHandler,
        season_id: Signal<Option<u64>>,
        options: RequestOptions<Vec<Episode>>,
    ) -> Self {
        fn of_season(season_id: u64) -> EpisodesParams {
            EpisodesParams {
                id: None,
                season_id: Some(season_id),
            }
        }
        let request = handler.use_request(GET_EPISODES, season_id.get().map(of_season), options);
        Self::bind(request, season_id, of_season, Some(Vec::new()))
    }
}
