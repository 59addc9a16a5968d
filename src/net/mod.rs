//! Reactive network-request layer
//!
//! - `registry` - named, typed request functions
//! - `handler` - live request bindings: run / refresh / cancel, retry, supersession
//! - `cache` - write-once page cache
//! - `error` - registry/transport errors and the normalized `NetworkError`

pub mod cache;
pub mod error;
pub mod handler;
pub mod registry;
pub mod types;

pub use cache::PageCache;
pub use error::{NetworkError, RegistryError, TransportError};
pub use handler::{LiveRequest, NetworkHandler, RequestOptions, RunFuture};
pub use registry::Registry;
pub use types::{NetResult, RequestCtx, RequestFn, RequestKey};
