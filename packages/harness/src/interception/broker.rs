// packages/harness/src/interception/broker.rs
//! Interface broker
//!
//! Stands in for the platform's interface lookup: production code asks the
//! broker for a connection to a named interface, and the broker hands the
//! receiving end to the started interceptor for that name, or to the default
//! binder when nothing intercepts it.

use crate::interception::pipe::{pipe, PendingReceiver, Remote};
use crate::utils::errors::{HarnessError, Result};
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};
use ulid::Ulid;

static GLOBAL: Lazy<Arc<InterfaceBroker>> = Lazy::new(|| Arc::new(InterfaceBroker::new()));

/// A request to open a connection to an interface
pub struct InterfaceRequest {
    pub interface: String,
    pub receiver: PendingReceiver,
}

/// Receives interface requests routed by the broker
pub trait InterfaceRequestHandler: Send + Sync {
    fn on_interface_request(&self, request: InterfaceRequest);
}

impl<F> InterfaceRequestHandler for F
where
    F: Fn(InterfaceRequest) + Send + Sync,
{
    fn on_interface_request(&self, request: InterfaceRequest) {
        self(request)
    }
}

struct Registration {
    id: Ulid,
    handler: Arc<dyn InterfaceRequestHandler>,
}

/// Interface name to interceptor mapping
pub struct InterfaceBroker {
    interceptors: DashMap<String, Registration>,
    default_binder: RwLock<Option<Arc<dyn InterfaceRequestHandler>>>,
}

impl InterfaceBroker {
    pub fn new() -> Self {
        Self {
            interceptors: DashMap::new(),
            default_binder: RwLock::new(None),
        }
    }

    /// Process-wide broker
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Route requests for `interface` to `handler`
    ///
    /// A second registration for the same interface replaces the first.
    pub fn register(
        &self,
        interface: impl Into<String>,
        id: Ulid,
        handler: Arc<dyn InterfaceRequestHandler>,
    ) {
        let interface = interface.into();

        if let Some(previous) = self
            .interceptors
            .insert(interface.clone(), Registration { id, handler })
        {
            warn!(
                "Interceptor {} for {} replaced by {} without being stopped",
                previous.id, interface, id
            );
        } else {
            info!("Intercepting {} ({})", interface, id);
        }
    }

    /// Remove the registration for `interface` if it is still `id`'s
    pub fn unregister(&self, interface: &str, id: Ulid) -> bool {
        let removed = self
            .interceptors
            .remove_if(interface, |_, registration| registration.id == id)
            .is_some();

        if removed {
            info!("Stopped intercepting {} ({})", interface, id);
        } else {
            debug!("Interceptor {} for {} no longer registered", id, interface);
        }
        removed
    }

    pub fn is_intercepted(&self, interface: &str) -> bool {
        self.interceptors.contains_key(interface)
    }

    /// Default platform routing for interfaces nobody intercepts
    pub fn set_default_binder(&self, binder: Option<Arc<dyn InterfaceRequestHandler>>) {
        *self.default_binder.write() = binder;
    }

    /// Open a connection to `interface`
    pub fn connect(&self, interface: &str) -> Result<Remote> {
        // The map guard must be gone before the handler runs
        let intercepted = self
            .interceptors
            .get(interface)
            .map(|registration| Arc::clone(&registration.handler));

        let handler = match intercepted {
            Some(handler) => {
                debug!("Routing {} request to interceptor", interface);
                handler
            }
            None => self
                .default_binder
                .read()
                .clone()
                .ok_or_else(|| HarnessError::NoRoute(interface.to_string()))?,
        };

        let (remote, receiver) = pipe(interface);
        handler.on_interface_request(InterfaceRequest {
            interface: interface.to_string(),
            receiver,
        });

        Ok(remote)
    }
}

impl Default for InterfaceBroker {
    fn default() -> Self {
        Self::new()
    }
}
