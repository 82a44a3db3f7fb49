// packages/harness/src/interception/pipe.rs
//! Message pipes between callers and service implementations
//!
//! `pipe()` returns a connected pair: the `Remote` is what the caller keeps,
//! the `PendingReceiver` is handed to whoever serves the interface. Calls on
//! the remote fail with `Disconnected` until the receiver is bound, and again
//! once the receiving side disconnects.

use crate::utils::errors::{HarnessError, Result};
use parking_lot::RwLock;
use serde_json::Value;
use std::sync::{Arc, Weak};
use tracing::trace;

/// Anything that can answer calls arriving on a pipe
pub trait ServiceImpl: Send + Sync {
    fn dispatch(&self, method: &str, args: Vec<Value>) -> Result<Value>;
}

struct Endpoint {
    interface: String,
    target: RwLock<Option<Arc<dyn ServiceImpl>>>,
}

/// Create a connected remote/receiver pair for `interface`
pub fn pipe(interface: &str) -> (Remote, PendingReceiver) {
    let endpoint = Arc::new(Endpoint {
        interface: interface.to_string(),
        target: RwLock::new(None),
    });

    (
        Remote {
            endpoint: Arc::clone(&endpoint),
        },
        PendingReceiver { endpoint },
    )
}

/// Calling side of a pipe
#[derive(Clone)]
pub struct Remote {
    endpoint: Arc<Endpoint>,
}

impl Remote {
    pub fn interface(&self) -> &str {
        &self.endpoint.interface
    }

    pub fn is_connected(&self) -> bool {
        self.endpoint.target.read().is_some()
    }

    /// Invoke `method` on whatever the receiver is bound to
    pub fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        // Clone out so the lock is not held while the target runs
        let target = self.endpoint.target.read().clone();
        let target =
            target.ok_or_else(|| HarnessError::Disconnected(self.endpoint.interface.clone()))?;

        trace!("{}.{} called with {} args", self.interface(), method, args.len());
        target.dispatch(method, args)
    }
}

impl std::fmt::Debug for Remote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Remote")
            .field("interface", &self.endpoint.interface)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Receiving side of a pipe, not yet bound
pub struct PendingReceiver {
    endpoint: Arc<Endpoint>,
}

impl PendingReceiver {
    pub fn interface(&self) -> &str {
        &self.endpoint.interface
    }

    /// Route calls from the remote to `target`
    pub fn bind(self, target: Arc<dyn ServiceImpl>) -> ReceiverHandle {
        *self.endpoint.target.write() = Some(target);
        ReceiverHandle {
            endpoint: Arc::downgrade(&self.endpoint),
        }
    }
}

/// Lets the serving side cut a bound pipe
pub struct ReceiverHandle {
    endpoint: Weak<Endpoint>,
}

impl ReceiverHandle {
    /// Detach the target; the remote's later calls fail
    pub fn disconnect(&self) {
        if let Some(endpoint) = self.endpoint.upgrade() {
            endpoint.target.write().take();
        }
    }

    /// False once the remote side has been dropped
    pub fn is_alive(&self) -> bool {
        self.endpoint.strong_count() > 0
    }
}
