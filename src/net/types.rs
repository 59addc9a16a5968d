//! Request/response shapes shared by the registry and the engine

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Result of one transport call
#[derive(Debug, Clone, PartialEq)]
pub struct NetResult<D> {
    pub data: D,
    /// HTTP-like status; the engine treats `None` as 200
    pub status: Option<u16>,
    pub headers: Option<HashMap<String, String>>,
}

impl<D> NetResult<D> {
    pub fn new(data: D, status: u16) -> Self {
        Self {
            data,
            status: Some(status),
            headers: None,
        }
    }

    /// Payload with no status reported by the transport
    pub fn from_data(data: D) -> Self {
        Self {
            data,
            status: None,
            headers: None,
        }
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = Some(headers);
        self
    }
}

/// Per-invocation data handed to a request function. Never stored past the call.
#[derive(Debug, Clone, Default)]
pub struct RequestCtx {
    pub cancel: Option<CancellationToken>,
    pub headers: HashMap<String, String>,
    pub meta: HashMap<String, serde_json::Value>,
}

impl RequestCtx {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }
}

/// Future returned by a request function
pub type RequestFuture<R> = BoxFuture<'static, anyhow::Result<NetResult<R>>>;

/// Registered request function
pub type RequestFn<P, R> = Arc<dyn Fn(Option<P>, RequestCtx) -> RequestFuture<R> + Send + Sync>;

/// Typed name of a request. `P` is the params type, `R` the payload type.
pub struct RequestKey<P, R> {
    name: &'static str,
    _types: PhantomData<fn(P) -> R>,
}

impl<P, R> RequestKey<P, R> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _types: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<P, R> Clone for RequestKey<P, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, R> Copy for RequestKey<P, R> {}

impl<P, R> fmt::Debug for RequestKey<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RequestKey").field(&self.name).finish()
    }
}

impl<P, R> fmt::Display for RequestKey<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
