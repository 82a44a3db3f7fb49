// packages/harness/src/utils/errors.rs
//! Error types for the interception harness
//!
//! `HarnessError` is `Clone` because the memoized setup future hands the
//! same outcome to every waiting caller.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Harness error taxonomy
#[derive(Debug, Clone, Error)]
pub enum HarnessError {
    /// A dependency resource could not be fetched or executed
    #[error("failed to load resource {resource}: {reason}")]
    LoadFailure { resource: String, reason: String },

    /// The mocked method was invoked with no callback installed for it
    #[error("{method} is not mocked: call expect({method}).and_return(..) first")]
    UnmockedCall { method: String },

    /// The test-supplied callback failed
    #[error("handler for {method} failed: {source}")]
    Handler {
        method: String,
        #[source]
        source: CallbackError,
    },

    /// The interface is not present in the loaded definitions
    #[error("interface {0} is not defined")]
    UnknownInterface(String),

    /// The interface has no such method
    #[error("interface {interface} has no method {method}")]
    UnknownMethod { interface: String, method: String },

    /// Wire arguments did not match the method signature
    #[error("invalid arguments for {method}: {reason}")]
    InvalidArguments { method: String, reason: String },

    /// Neither an interceptor nor a default binder serves the interface
    #[error("no route for interface {0}")]
    NoRoute(String),

    /// The pipe is unbound or its binding was closed
    #[error("connection to {0} is disconnected")]
    Disconnected(String),

    /// The fake service was closed
    #[error("fake service for {0} is closed")]
    Closed(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("observability error: {0}")]
    Observability(String),
}

impl HarnessError {
    /// Wrap a callback failure, keeping the original error as the source
    pub fn handler(method: impl Into<String>, err: anyhow::Error) -> Self {
        Self::Handler {
            method: method.into(),
            source: CallbackError(Arc::new(err)),
        }
    }

    /// The error a test callback returned, if this is a `Handler` failure
    pub fn callback_error(&self) -> Option<&CallbackError> {
        match self {
            Self::Handler { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn load_failure(resource: impl Into<String>, reason: impl ToString) -> Self {
        Self::LoadFailure {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_unmocked(&self) -> bool {
        matches!(self, Self::UnmockedCall { .. })
    }
}

/// Error returned by a test callback, shared so `HarnessError` stays `Clone`
///
/// The original error value is kept intact; `downcast_ref` recovers it.
#[derive(Clone)]
pub struct CallbackError(Arc<anyhow::Error>);

impl CallbackError {
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.0.downcast_ref::<E>()
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }
}

impl fmt::Debug for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl StdError for CallbackError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        StdError::source(&**self.0)
    }
}

impl From<config::ConfigError> for HarnessError {
    fn from(err: config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
