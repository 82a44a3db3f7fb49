// packages/harness/src/service/fake_service.rs
//! Fake service instance
//!
//! Stands in for the real service behind an interception. Every call is
//! answered by the installed handler; a call with no callback for its method
//! fails with `UnmockedCall` instead of returning a default, so a test that
//! forgot an expectation fails loudly.

use crate::interception::interceptor::InterceptionHandle;
use crate::interception::pipe::ServiceImpl;
use crate::observability::{DISPATCH_COUNTER, UNMOCKED_COUNTER};
use crate::service::handler::Handler;
use crate::utils::errors::{HarnessError, Result};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Harness lifecycle
///
/// `Uninitialized → Armed → Configured → Closed`, with `Failed` when setup
/// did not complete. `Closed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HarnessState {
    /// Setup has not finished
    Uninitialized,
    /// Interception active, no handler installed
    Armed,
    /// Handler installed; calls dispatch to it
    Configured,
    /// Interception released
    Closed,
    /// Setup failed; nothing is intercepted
    Failed,
}

pub struct FakeService {
    interface: String,
    handler: Mutex<Option<Handler>>,
    interception: Mutex<Option<InterceptionHandle>>,
    closed: AtomicBool,
}

impl FakeService {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            handler: Mutex::new(None),
            interception: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Install `handler`, replacing any previous one (last write wins)
    ///
    /// A closed fake ignores the handler; use [`FakeService::try_set_handler`]
    /// to observe that.
    pub fn set_handler(&self, handler: Handler) -> &Self {
        if self.try_set_handler(handler).is_err() {
            warn!("Ignoring handler for closed {} fake", self.interface);
        }
        self
    }

    /// Install `handler`, failing with `Closed` once the fake is closed
    pub fn try_set_handler(&self, handler: Handler) -> Result<&Self> {
        let mut slot = self.handler.lock();
        if self.is_closed() {
            return Err(HarnessError::Closed(self.interface.clone()));
        }

        debug!("Installing {:?} on {}", handler, self.interface);
        if slot.replace(handler).is_some() {
            debug!("Replaced previous {} handler", self.interface);
        }
        Ok(self)
    }

    /// Take ownership of the interception feeding this fake
    pub fn set_interception(&self, handle: InterceptionHandle) -> &Self {
        if let Some(previous) = self.interception.lock().replace(handle) {
            warn!("Replacing interception {} of {}", previous.id(), self.interface);
            previous.close();
        }
        self
    }

    /// Answer `method` with the installed handler
    pub fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        if self.is_closed() {
            return Err(HarnessError::Closed(self.interface.clone()));
        }

        // Released before the callback runs so it may reinstall handlers
        let callback = self.handler.lock().as_ref().and_then(|h| h.get(method));

        let Some(callback) = callback else {
            metrics::counter!(UNMOCKED_COUNTER, "method" => method.to_string()).increment(1);
            warn!("Unmocked call to {}.{}", self.interface, method);
            return Err(HarnessError::UnmockedCall {
                method: method.to_string(),
            });
        };

        metrics::counter!(DISPATCH_COUNTER, "method" => method.to_string()).increment(1);
        debug!("Dispatching {}.{} ({} args)", self.interface, method, args.len());
        callback(args)
    }

    /// Release the interception; later calls fail and later connections use
    /// default routing. Safe to call repeatedly.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("{} fake already closed", self.interface);
            return;
        }

        if let Some(handle) = self.interception.lock().take() {
            handle.close();
        }
        info!("Closed {} fake", self.interface);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Whether an interception is currently feeding this fake
    pub fn is_intercepting(&self) -> bool {
        self.interception
            .lock()
            .as_ref()
            .map_or(false, InterceptionHandle::is_active)
    }

    pub fn state(&self) -> HarnessState {
        if self.is_closed() {
            HarnessState::Closed
        } else if self.handler.lock().is_some() {
            HarnessState::Configured
        } else {
            HarnessState::Armed
        }
    }
}

impl ServiceImpl for FakeService {
    fn dispatch(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        self.invoke(method, args)
    }
}

impl Drop for FakeService {
    fn drop(&mut self) {
        self.close();
    }
}
