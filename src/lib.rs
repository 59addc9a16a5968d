//! showdeck - reactive client for the TVmaze TV catalog
//!
//! Requests are registered by name in a [`net::Registry`] and driven by a
//! [`net::NetworkHandler`], which binds each one to observable state
//! (`data`, `status`, `loading`, `error`) with retry, cancellation and
//! supersession of stale runs. View-models in [`views`] compose those
//! bindings into search, detail and ranking screens.
//!
//! # Modules
//!
//! - `reactive` - observable cells (`Signal`, `Computed`)
//! - `net` - request registry, execution engine, page cache, errors
//! - `api` - TVmaze transport and the catalog request registry
//! - `models` - catalog records
//! - `views` - view-models built on live requests
//! - `catalog` - façade wiring views to one handler and cache
//! - `config` - config file and defaults
//! - `cli` / `commands` - command line front end

pub mod api;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod models;
pub mod net;
pub mod reactive;
pub mod views;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogSettings};
pub use models::{CastMember, CrewMember, Episode, SearchHit, Season, Show};
pub use net::{LiveRequest, NetworkError, NetworkHandler, PageCache, Registry, RequestOptions};
pub use reactive::{Computed, Signal, Subscription};
