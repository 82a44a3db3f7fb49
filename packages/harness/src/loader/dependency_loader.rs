// packages/harness/src/loader/dependency_loader.rs
//! Sequential dependency loading
//!
//! Resources are fetched and installed strictly one after another: each step
//! is chained onto the completion of the previous one, so a later resource
//! always sees the symbols of every earlier one. The first failure
//! short-circuits the rest of the chain.

use crate::loader::definitions::{DefinitionModule, Definitions};
use crate::loader::fetcher::ResourceFetcher;
use crate::utils::errors::Result;
use futures::future::{BoxFuture, FutureExt, TryFutureExt};
use std::sync::Arc;
use tracing::{debug, error, info};

/// A chain of load steps that resolves once, after the last resource
pub struct PendingLoad {
    fetcher: Arc<dyn ResourceFetcher>,
    resources: Vec<String>,
    chain: BoxFuture<'static, Result<Definitions>>,
}

impl PendingLoad {
    /// Start an empty chain; it resolves immediately to no definitions
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self {
            fetcher,
            resources: Vec::new(),
            chain: futures::future::ok(Definitions::new()).boxed(),
        }
    }

    /// Chain one more resource after everything queued so far
    pub fn then_load(mut self, resource: impl Into<String>) -> Self {
        let resource = resource.into();
        let fetcher = Arc::clone(&self.fetcher);
        let step = resource.clone();

        self.chain = self
            .chain
            .and_then(move |defs| load_one(fetcher, step, defs))
            .boxed();
        self.resources.push(resource);
        self
    }

    /// Resources queued, in load order
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// The single completion future for the whole chain
    pub fn finish(self) -> BoxFuture<'static, Result<Definitions>> {
        let count = self.resources.len();
        self.chain
            .inspect(move |result| match result {
                Ok(defs) => info!(
                    "Loaded {} resources ({})",
                    count,
                    defs.modules().join(", ")
                ),
                Err(e) => error!("Dependency loading failed: {}", e),
            })
            .boxed()
    }
}

async fn load_one(
    fetcher: Arc<dyn ResourceFetcher>,
    resource: String,
    mut defs: Definitions,
) -> Result<Definitions> {
    debug!("Loading resource {}", resource);

    let source = fetcher.fetch(&resource).await?;
    let module = DefinitionModule::parse(&resource, &source)?;
    defs.install(&resource, module)?;

    Ok(defs)
}

/// Loads an ordered resource list through a fetcher
#[derive(Clone)]
pub struct DependencyLoader {
    fetcher: Arc<dyn ResourceFetcher>,
}

impl DependencyLoader {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>) -> Self {
        Self { fetcher }
    }

    /// Build the chain for `resources` without driving it
    pub fn chain<I, S>(&self, resources: I) -> PendingLoad
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        resources
            .into_iter()
            .fold(PendingLoad::new(Arc::clone(&self.fetcher)), |load, r| {
                load.then_load(r)
            })
    }

    /// Load every resource in order
    pub async fn load<I, S>(&self, resources: I) -> Result<Definitions>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.chain(resources).finish().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::fetcher::StaticFetcher;
    use crate::utils::config::DEFAULT_RESOURCES;
    use crate::utils::errors::HarnessError;
    use parking_lot::Mutex;

    /// Records fetch order and fails on request
    struct TracingFetcher {
        inner: StaticFetcher,
        fetched: Mutex<Vec<String>>,
    }

    impl ResourceFetcher for TracingFetcher {
        fn fetch<'a>(&'a self, resource: &'a str) -> BoxFuture<'a, Result<String>> {
            self.fetched.lock().push(resource.to_string());
            self.inner.fetch(resource)
        }
    }

    fn tracing_fetcher(inner: StaticFetcher) -> Arc<TracingFetcher> {
        Arc::new(TracingFetcher {
            inner,
            fetched: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_bundled_load() {
        let loader = DependencyLoader::new(Arc::new(StaticFetcher::bundled()));
        let defs = loader.load(DEFAULT_RESOURCES).await.unwrap();

        assert_eq!(defs.modules().len(), 3);
        assert!(defs.interface("blink.mojom.IdleManager").is_some());
        assert!(defs.enum_def("blink.mojom.IdleState").is_some());
    }

    #[tokio::test]
    async fn test_loads_in_order() {
        let fetcher = tracing_fetcher(StaticFetcher::bundled());
        let loader = DependencyLoader::new(fetcher.clone());
        loader.load(DEFAULT_RESOURCES).await.unwrap();

        assert_eq!(*fetcher.fetched.lock(), DEFAULT_RESOURCES.to_vec());
    }

    #[tokio::test]
    async fn test_out_of_order_fails() {
        let loader = DependencyLoader::new(Arc::new(StaticFetcher::bundled()));
        let reversed: Vec<_> = DEFAULT_RESOURCES.iter().rev().collect();

        let err = loader.load(reversed.into_iter().copied()).await.unwrap_err();
        assert!(matches!(
            err,
            HarnessError::LoadFailure { ref resource, .. } if resource == "resources/idle_manager.yaml"
        ));
    }

    #[tokio::test]
    async fn test_failure_stops_chain() {
        let inner = StaticFetcher::new()
            .with_resource("a.yaml", "module: a\n")
            .with_resource("c.yaml", "module: c\n");
        let fetcher = tracing_fetcher(inner);
        let loader = DependencyLoader::new(fetcher.clone());

        let err = loader.load(["a.yaml", "b.yaml", "c.yaml"]).await.unwrap_err();

        assert!(matches!(err, HarnessError::LoadFailure { ref resource, .. } if resource == "b.yaml"));
        // c.yaml is never fetched
        assert_eq!(*fetcher.fetched.lock(), vec!["a.yaml", "b.yaml"]);
    }

    #[tokio::test]
    async fn test_chain_is_lazy() {
        let fetcher = tracing_fetcher(StaticFetcher::bundled());
        let pending = DependencyLoader::new(fetcher.clone()).chain(DEFAULT_RESOURCES);

        assert_eq!(pending.resources().len(), 3);
        assert!(fetcher.fetched.lock().is_empty());

        pending.finish().await.unwrap();
        assert_eq!(fetcher.fetched.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_list_resolves() {
        let loader = DependencyLoader::new(Arc::new(StaticFetcher::new()));
        let defs = loader.load(Vec::<String>::new()).await.unwrap();
        assert!(defs.modules().is_empty());
    }
}
