//! Request registry
//!
//! Maps request names to async request functions. A registry is never
//! mutated: [`Registry::set_request`] returns a new value, so a registry that
//! has been handed to a handler keeps the bindings it was built with.

use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::error::RegistryError;
use super::types::{NetResult, RequestCtx, RequestFn, RequestFuture, RequestKey};

type ErasedFn = Arc<dyn Any + Send + Sync>;

/// Immutable, cheaply cloneable collection of named request functions
#[derive(Clone, Default)]
pub struct Registry {
    entries: Arc<Vec<(&'static str, ErasedFn)>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a registry with `key` bound to `f`. An existing binding of the
    /// same name is shadowed in the returned registry only.
    pub fn set_request<P, R, F, Fut>(&self, key: RequestKey<P, R>, f: F) -> Registry
    where
        P: Send + 'static,
        R: Send + 'static,
        F: Fn(Option<P>, RequestCtx) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<NetResult<R>>> + Send + 'static,
    {
        let request: RequestFn<P, R> = Arc::new(move |params, ctx| f(params, ctx).boxed());
        let erased: ErasedFn = Arc::new(request);

        let mut entries = (*self.entries).clone();
        match entries.iter_mut().find(|(name, _)| *name == key.name()) {
            Some(entry) => entry.1 = erased,
            None => entries.push((key.name(), erased)),
        }

        Registry {
            entries: Arc::new(entries),
        }
    }

    /// Look up a request. `None` when absent or bound with other types.
    pub fn get_request<P, R>(&self, key: RequestKey<P, R>) -> Option<RequestFn<P, R>>
    where
        P: Send + 'static,
        R: Send + 'static,
    {
        self.lookup(key).ok()
    }

    /// Invoke a request by name. Fails immediately, before any future is
    /// created, when the name is not registered.
    pub fn execute<P, R>(
        &self,
        key: RequestKey<P, R>,
        params: Option<P>,
        ctx: RequestCtx,
    ) -> Result<RequestFuture<R>, RegistryError>
    where
        P: Send + 'static,
        R: Send + 'static,
    {
        let request = self.lookup(key)?;
        Ok(request(params, ctx))
    }

    /// Registered names in insertion order
    pub fn list(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(name, _)| *name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| *n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup<P, R>(&self, key: RequestKey<P, R>) -> Result<RequestFn<P, R>, RegistryError>
    where
        P: Send + 'static,
        R: Send + 'static,
    {
        let (_, erased) = self
            .entries
            .iter()
            .find(|(name, _)| *name == key.name())
            .ok_or_else(|| RegistryError::NotFound(key.name().to_string()))?;

        erased
            .downcast_ref::<RequestFn<P, R>>()
            .cloned()
            .ok_or_else(|| RegistryError::TypeMismatch(key.name().to_string()))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("requests", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PING: RequestKey<(), &'static str> = RequestKey::new("ping");
    const ECHO: RequestKey<u32, u32> = RequestKey::new("echo");
    const ECHO_AS_TEXT: RequestKey<u32, String> = RequestKey::new("echo");

    fn base() -> Registry {
        Registry::new()
            .set_request(PING, |_, _| async { Ok(NetResult::new("pong", 200)) })
            .set_request(ECHO, |p: Option<u32>, _| async move {
                Ok(NetResult::new(p.unwrap_or(0), 200))
            })
    }

    #[tokio::test]
    async fn test_execute_registered() {
        let registry = base();
        let res = registry.execute(PING, None, RequestCtx::new()).unwrap().await.unwrap();
        assert_eq!(res.status, Some(200));
        assert_eq!(res.data, "pong");

        let res = registry.execute(ECHO, Some(7), RequestCtx::new()).unwrap().await.unwrap();
        assert_eq!(res.data, 7);
    }

    #[test]
    fn test_list_insertion_order() {
        assert_eq!(base().list(), vec!["ping", "echo"]);
    }

    #[test]
    fn test_execute_unknown_fails_synchronously() {
        const MISSING: RequestKey<(), ()> = RequestKey::new("missing");
        match Registry::new().execute(MISSING, None, RequestCtx::new()) {
            Err(RegistryError::NotFound(name)) => assert_eq!(name, "missing"),
            _ => panic!("expected NotFound"),
        }
    }

    #[test]
    fn test_type_mismatch() {
        let registry = base();
        assert!(registry.get_request(ECHO).is_some());
        assert!(registry.get_request(ECHO_AS_TEXT).is_none());
        assert!(matches!(
            registry.execute(ECHO_AS_TEXT, None, RequestCtx::new()),
            Err(RegistryError::TypeMismatch(_))
        ));
    }

    #[tokio::test]
    async fn test_set_request_does_not_mutate_receiver() {
        let original = base();
        let shadowed = original.set_request(ECHO, |p: Option<u32>, _| async move {
            Ok(NetResult::new(p.unwrap_or(0) * 100, 200))
        });

        let old = original.execute(ECHO, Some(2), RequestCtx::new()).unwrap().await.unwrap();
        let new = shadowed.execute(ECHO, Some(2), RequestCtx::new()).unwrap().await.unwrap();
        assert_eq!(old.data, 2);
        assert_eq!(new.data, 200);

        // Shadowing keeps the original position
        assert_eq!(shadowed.list(), vec!["ping", "echo"]);
        assert_eq!(shadowed.len(), 2);
    }

    #[test]
    fn test_contains() {
        let registry = base();
        assert!(registry.contains("ping"));
        assert!(!registry.contains("pong"));
        assert!(Registry::new().is_empty());
    }
}
