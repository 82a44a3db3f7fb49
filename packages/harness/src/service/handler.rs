// packages/harness/src/service/handler.rs
//! Handler: method name to callback mapping

use crate::utils::errors::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Callback answering one mocked method with raw wire values
pub type Callback = Arc<dyn Fn(Vec<Value>) -> Result<Value> + Send + Sync>;

/// The override installed on a fake service
#[derive(Clone, Default)]
pub struct Handler {
    callbacks: HashMap<String, Callback>,
}

impl Handler {
    /// Handler answering a single method
    pub fn new<F>(method: impl Into<String>, callback: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        Self::from_callback(method, Arc::new(callback))
    }

    pub fn from_callback(method: impl Into<String>, callback: Callback) -> Self {
        Self::default().with_callback(method, callback)
    }

    /// Add (or replace) the callback for another method
    pub fn with<F>(self, method: impl Into<String>, callback: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        self.with_callback(method, Arc::new(callback))
    }

    pub fn with_callback(mut self, method: impl Into<String>, callback: Callback) -> Self {
        self.callbacks.insert(method.into(), callback);
        self
    }

    pub fn get(&self, method: &str) -> Option<Callback> {
        self.callbacks.get(method).cloned()
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.callbacks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.methods().collect();
        methods.sort_unstable();
        f.debug_struct("Handler").field("methods", &methods).finish()
    }
}
