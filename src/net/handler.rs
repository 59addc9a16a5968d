//! Request execution engine
//!
//! [`NetworkHandler::use_request`] binds one registered request to a set of
//! reactive cells (`data`, `status`, `loading`, `error`) and returns a
//! [`LiveRequest`] with `run` / `refresh` / `cancel`.
//!
//! Every `run` starts a new generation: the previous invocation's token is
//! cancelled and only the newest generation may commit its outcome. The
//! generation check and the cell writes happen under the same lock, and the
//! cells are published after it is released.

use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::{default_retryable, is_abort_error, NetworkError};
use super::registry::Registry;
use super::types::{NetResult, RequestCtx, RequestKey};
use crate::reactive::Signal;

/// Default pause between retries
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(400);

/// Future driving one invocation to completion. Dropping it before it
/// finishes cancels the invocation.
pub type RunFuture = BoxFuture<'static, ()>;

type MapFn<R> = Arc<dyn Fn(R) -> R + Send + Sync>;
type RetryableFn = Arc<dyn Fn(Option<u16>) -> bool + Send + Sync>;
type SuccessHook<P, R> = Arc<dyn Fn(Option<&P>, &R) + Send + Sync>;

// =============================================================================
// Options
// =============================================================================

/// Per-binding behavior
pub struct RequestOptions<R> {
    map_response: Option<MapFn<R>>,
    retry: u32,
    retry_delay: Duration,
    retryable: RetryableFn,
}

impl<R> Default for RequestOptions<R> {
    fn default() -> Self {
        Self {
            map_response: None,
            retry: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            retryable: Arc::new(default_retryable),
        }
    }
}

impl<R> Clone for RequestOptions<R> {
    fn clone(&self) -> Self {
        Self {
            map_response: self.map_response.clone(),
            retry: self.retry,
            retry_delay: self.retry_delay,
            retryable: Arc::clone(&self.retryable),
        }
    }
}

impl<R> RequestOptions<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transform every successful payload before it is stored
    pub fn map_response(mut self, f: impl Fn(R) -> R + Send + Sync + 'static) -> Self {
        self.map_response = Some(Arc::new(f));
        self
    }

    /// Extra attempts allowed after the first failure
    pub fn retry(mut self, retry: u32) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Replace the default 408/429/5xx retry policy
    pub fn retryable_status(
        mut self,
        f: impl Fn(Option<u16>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.retryable = Arc::new(f);
        self
    }

    pub fn retries(&self) -> u32 {
        self.retry
    }

    pub fn delay(&self) -> Duration {
        self.retry_delay
    }
}

impl<R> fmt::Debug for RequestOptions<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("map_response", &self.map_response.is_some())
            .field("retry", &self.retry)
            .field("retry_delay", &self.retry_delay)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Handler
// =============================================================================

/// Creates live request bindings over a registry
#[derive(Debug, Clone)]
pub struct NetworkHandler {
    registry: Registry,
}

impl NetworkHandler {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Bind `key` to fresh reactive state. Nothing is fetched until `run`.
    pub fn use_request<P, R>(
        &self,
        key: RequestKey<P, R>,
        initial_params: Option<P>,
        options: RequestOptions<R>,
    ) -> LiveRequest<P, R>
    where
        P: Clone + Send + 'static,
        R: Clone + Send + Sync + 'static,
    {
        LiveRequest {
            shared: Arc::new(Shared {
                key,
                registry: self.registry.clone(),
                options,
                data: Signal::new(None),
                status: Signal::new(None),
                loading: Signal::new(false),
                error: Signal::new(None),
                on_success: Mutex::new(Vec::new()),
                control: Mutex::new(Control {
                    last_params: initial_params,
                    token: None,
                    generation: 0,
                }),
            }),
        }
    }
}

// =============================================================================
// Live request
// =============================================================================

/// One binding of a registered request to reactive state. Clones share the
/// same state.
pub struct LiveRequest<P, R> {
    shared: Arc<Shared<P, R>>,
}

impl<P, R> Clone for LiveRequest<P, R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<P, R> {
    key: RequestKey<P, R>,
    registry: Registry,
    options: RequestOptions<R>,
    data: Signal<Option<R>>,
    status: Signal<Option<u16>>,
    loading: Signal<bool>,
    error: Signal<Option<NetworkError>>,
    on_success: Mutex<Vec<SuccessHook<P, R>>>,
    control: Mutex<Control<P>>,
}

struct Control<P> {
    last_params: Option<P>,
    token: Option<CancellationToken>,
    generation: u64,
}

enum Outcome<R> {
    Success(NetResult<R>),
    Aborted,
    Failed(NetworkError),
}

impl<P, R> LiveRequest<P, R>
where
    P: Clone + Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    pub fn name(&self) -> &'static str {
        self.shared.key.name()
    }

    /// Last successful payload (after `map_response`)
    pub fn data(&self) -> &Signal<Option<R>> {
        &self.shared.data
    }

    /// Last status: the response status, `0` after an abort, or the failure's
    /// status (`0` when it had none)
    pub fn status(&self) -> &Signal<Option<u16>> {
        &self.shared.status
    }

    pub fn loading(&self) -> &Signal<bool> {
        &self.shared.loading
    }

    pub fn error(&self) -> &Signal<Option<NetworkError>> {
        &self.shared.error
    }

    pub fn last_params(&self) -> Option<P> {
        self.shared.control.lock().last_params.clone()
    }

    /// Call `f` with the params and payload of every successful commit,
    /// before `loading` is published as false. The hook lives as long as
    /// the binding.
    pub fn on_success(&self, f: impl Fn(Option<&P>, &R) + Send + Sync + 'static) {
        self.shared.on_success.lock().push(Arc::new(f));
    }

    /// Start a new invocation.
    ///
    /// Params are recorded, the previous invocation is cancelled and
    /// `loading` is raised before this returns; the returned future performs
    /// the attempts and commits the outcome.
    pub fn run(&self, params: Option<P>, ctx: Option<RequestCtx>) -> RunFuture {
        let ctx = ctx.unwrap_or_default();
        let (generation, token, params) = self.shared.begin(params, &ctx);

        // Armed before the future is first polled, so dropping it unpolled
        // still clears `loading`.
        let mut in_flight = InFlight {
            shared: Arc::clone(&self.shared),
            generation,
            token,
            done: false,
        };
        async move {
            let shared = Arc::clone(&in_flight.shared);
            let token = in_flight.token.clone();
            let outcome = shared.attempt(params.clone(), ctx, &token).await;
            in_flight.done = true;
            shared.commit(generation, &token, params, outcome);
        }
        .boxed()
    }

    /// Re-run with the last used params
    pub fn refresh(&self) -> RunFuture {
        self.run(None, None)
    }

    /// Signal the current invocation to stop. State is updated when the
    /// invocation observes the cancellation.
    pub fn cancel(&self) {
        if let Some(token) = &self.shared.control.lock().token {
            token.cancel();
        }
    }

    /// `run` on the current Tokio runtime
    pub fn spawn_run(&self, params: Option<P>) -> JoinHandle<()> {
        tokio::spawn(self.run(params, None))
    }

    /// `refresh` on the current Tokio runtime
    pub fn spawn_refresh(&self) -> JoinHandle<()> {
        tokio::spawn(self.refresh())
    }
}

impl<P, R> Shared<P, R>
where
    P: Clone + Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    fn begin(&self, params: Option<P>, ctx: &RequestCtx) -> (u64, CancellationToken, Option<P>) {
        let begun = {
            let mut control = self.control.lock();
            if params.is_some() {
                control.last_params = params;
            }
            if let Some(previous) = control.token.take() {
                previous.cancel();
            }
            let token = match &ctx.cancel {
                Some(parent) => parent.child_token(),
                None => CancellationToken::new(),
            };
            control.generation += 1;
            control.token = Some(token.clone());

            self.loading.set_quiet(true);
            self.error.set_quiet(None);
            (control.generation, token, control.last_params.clone())
        };

        self.loading.notify();
        self.error.notify();
        debug!(request = self.key.name(), generation = begun.0, "run");
        begun
    }

    async fn attempt(
        &self,
        params: Option<P>,
        ctx: RequestCtx,
        token: &CancellationToken,
    ) -> Outcome<R> {
        let mut attempts = 0;

        loop {
            let call_ctx = RequestCtx {
                cancel: Some(token.clone()),
                ..ctx.clone()
            };
            let call = match self.registry.execute(self.key, params.clone(), call_ctx) {
                Ok(call) => call,
                Err(e) => {
                    warn!(request = self.key.name(), error = %e, "request not registered");
                    return Outcome::Failed(e.into());
                }
            };

            let result = tokio::select! {
                biased;
                _ = token.cancelled() => return Outcome::Aborted,
                result = call => result,
            };

            let err = match result {
                Ok(res) => return Outcome::Success(res),
                Err(e) if token.is_cancelled() || is_abort_error(&e) => return Outcome::Aborted,
                Err(e) => NetworkError::from_anyhow(e),
            };

            if attempts < self.options.retry && (self.options.retryable)(err.status) {
                attempts += 1;
                debug!(
                    request = self.key.name(),
                    attempt = attempts,
                    status = ?err.status,
                    "retrying after failure"
                );
                if !self.options.retry_delay.is_zero() {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => return Outcome::Aborted,
                        _ = tokio::time::sleep(self.options.retry_delay) => {}
                    }
                }
                continue;
            }

            return Outcome::Failed(err);
        }
    }

    fn commit(
        &self,
        generation: u64,
        token: &CancellationToken,
        params: Option<P>,
        outcome: Outcome<R>,
    ) {
        let outcome = match outcome {
            Outcome::Success(res) => {
                let data = match &self.options.map_response {
                    Some(map) => map(res.data),
                    None => res.data,
                };
                Outcome::Success(NetResult {
                    data,
                    status: res.status,
                    headers: res.headers,
                })
            }
            other => other,
        };

        // `cancel` takes the control lock too, so the cancellation check and
        // the writes below cannot interleave with it.
        let committed = {
            let control = self.control.lock();
            if control.generation != generation {
                debug!(
                    request = self.key.name(),
                    generation,
                    current = control.generation,
                    "superseded, dropping outcome"
                );
                return;
            }

            let outcome = if token.is_cancelled() {
                Outcome::Aborted
            } else {
                outcome
            };

            let committed = match outcome {
                Outcome::Success(res) => {
                    let hooks: Vec<SuccessHook<P, R>> = self.on_success.lock().clone();
                    let kept = (!hooks.is_empty()).then(|| res.data.clone());
                    self.status.set_quiet(Some(res.status.unwrap_or(200)));
                    self.data.set_quiet(Some(res.data));
                    Some((hooks, kept))
                }
                Outcome::Aborted => {
                    debug!(request = self.key.name(), generation, "aborted");
                    self.status.set_quiet(Some(0));
                    self.error.set_quiet(None);
                    None
                }
                Outcome::Failed(err) => {
                    warn!(
                        request = self.key.name(),
                        status = ?err.status,
                        code = ?err.code,
                        "request failed: {}",
                        err.message
                    );
                    self.status.set_quiet(Some(err.status.unwrap_or(0)));
                    self.error.set_quiet(Some(err));
                    None
                }
            };
            self.loading.set_quiet(false);
            committed
        };

        self.status.notify();
        match committed {
            Some((hooks, kept)) => {
                self.data.notify();
                if let Some(data) = kept {
                    for hook in hooks {
                        hook(params.as_ref(), &data);
                    }
                }
            }
            None => self.error.notify(),
        }
        self.loading.notify();
    }
}

/// Commits an aborted outcome if the run future is dropped mid-flight
struct InFlight<P, R>
where
    P: Clone + Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    shared: Arc<Shared<P, R>>,
    generation: u64,
    token: CancellationToken,
    done: bool,
}

impl<P, R> Drop for InFlight<P, R>
where
    P: Clone + Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if !self.done {
            self.token.cancel();
            self.shared
                .commit(self.generation, &self.token, None, Outcome::Aborted);
        }
    }
}

impl<P, R> fmt::Debug for LiveRequest<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveRequest")
            .field("name", &self.shared.key.name())
            .finish_non_exhaustive()
    }
}
