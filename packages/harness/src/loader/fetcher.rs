// packages/harness/src/loader/fetcher.rs
//! Resource fetchers
//!
//! A fetcher turns a resource identifier into its source text. The loader
//! decides ordering; fetchers only fetch.

use crate::utils::config::DEFAULT_RESOURCES;
use crate::utils::errors::{HarnessError, Result};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Source of definition resources
pub trait ResourceFetcher: Send + Sync {
    fn fetch<'a>(&'a self, resource: &'a str) -> BoxFuture<'a, Result<String>>;
}

/// Reads resources from a directory
#[derive(Debug, Clone)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceFetcher for FileFetcher {
    fn fetch<'a>(&'a self, resource: &'a str) -> BoxFuture<'a, Result<String>> {
        async move {
            // Locators may be absolute-looking ("/resources/x.yaml")
            let path = self.root.join(resource.trim_start_matches('/'));
            debug!("Reading resource {} from {:?}", resource, path);

            tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| HarnessError::load_failure(resource, format!("{:?}: {}", path, e)))
        }
        .boxed()
    }
}

/// Serves resources from memory
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    resources: HashMap<String, String>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// The definitions shipped with the crate, keyed by the default
    /// dependency list
    pub fn bundled() -> Self {
        let sources = [
            include_str!("../../resources/mojo_bindings.yaml"),
            include_str!("../../resources/string16.yaml"),
            include_str!("../../resources/idle_manager.yaml"),
        ];

        DEFAULT_RESOURCES
            .iter()
            .zip(sources)
            .fold(Self::new(), |fetcher, (name, source)| {
                fetcher.with_resource(*name, source)
            })
    }

    pub fn with_resource(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.resources.insert(name.into(), source.into());
        self
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceFetcher for StaticFetcher {
    fn fetch<'a>(&'a self, resource: &'a str) -> BoxFuture<'a, Result<String>> {
        let result = self
            .resources
            .get(resource)
            .cloned()
            .ok_or_else(|| HarnessError::load_failure(resource, "resource not found"));
        futures::future::ready(result).boxed()
    }
}
