// packages/harness/src/interception/interceptor.rs
//! Interface interceptor and the registrar that wires a fake into it
//!
//! `intercept()` binds a target to an interface definition and starts
//! redirecting broker requests for that interface to it. The returned
//! `InterceptionHandle` is a scoped resource: closing or dropping it stops
//! the redirection and disconnects every pipe it served.

use crate::interception::binding::Binding;
use crate::interception::broker::{InterfaceBroker, InterfaceRequest, InterfaceRequestHandler};
use crate::interception::pipe::ServiceImpl;
use crate::loader::definitions::InterfaceDef;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};
use ulid::Ulid;

/// Registers a request handler with the broker while started
pub struct InterfaceInterceptor {
    id: Ulid,
    interface: String,
    broker: Arc<InterfaceBroker>,
    handler: Arc<dyn InterfaceRequestHandler>,
    started: AtomicBool,
}

impl InterfaceInterceptor {
    pub fn new(
        broker: Arc<InterfaceBroker>,
        interface: impl Into<String>,
        handler: Arc<dyn InterfaceRequestHandler>,
    ) -> Self {
        Self {
            id: Ulid::new(),
            interface: interface.into(),
            broker,
            handler,
            started: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> Ulid {
        self.id
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Begin receiving requests for the interface
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            debug!("Interceptor {} already started", self.id);
            return;
        }
        self.broker
            .register(self.interface.clone(), self.id, Arc::clone(&self.handler));
    }

    /// Stop receiving requests; safe to call repeatedly
    pub fn stop(&self) {
        if self.started.swap(false, Ordering::SeqCst) {
            self.broker.unregister(&self.interface, self.id);
        }
    }

    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

impl Drop for InterfaceInterceptor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// An active interception of one interface
pub struct InterceptionHandle {
    interceptor: InterfaceInterceptor,
    binding: Arc<Binding>,
}

impl InterceptionHandle {
    pub fn interface(&self) -> &str {
        self.interceptor.interface()
    }

    pub fn id(&self) -> Ulid {
        self.interceptor.id()
    }

    /// Redirecting requests and not closed
    pub fn is_active(&self) -> bool {
        self.interceptor.is_started() && !self.binding.is_closed()
    }

    /// Resume redirection after `stop()`; a closed handle stays closed
    pub fn start(&self) {
        if self.binding.is_closed() {
            warn!("Cannot restart interception of {}: closed", self.interface());
            return;
        }
        self.interceptor.start();
    }

    /// Pause redirection; pipes already bound keep working
    pub fn stop(&self) {
        self.interceptor.stop();
    }

    /// Stop redirection and disconnect every bound pipe
    pub fn close(&self) {
        self.interceptor.stop();
        self.binding.close();
    }

    /// Pipes currently served
    pub fn bound_count(&self) -> usize {
        self.binding.bound_count()
    }
}

impl Drop for InterceptionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Redirect broker requests for `interface` to `target`
pub fn intercept<T>(
    broker: &Arc<InterfaceBroker>,
    interface: InterfaceDef,
    target: &Arc<T>,
) -> InterceptionHandle
where
    T: ServiceImpl + 'static,
{
    let name = interface.name.clone();
    let implementation: Weak<dyn ServiceImpl> = Arc::downgrade(target) as Weak<dyn ServiceImpl>;
    let binding = Binding::new(interface, implementation);

    let request_binding = Arc::clone(&binding);
    let handler: Arc<dyn InterfaceRequestHandler> = Arc::new(move |request: InterfaceRequest| {
        if let Err(e) = request_binding.bind(request.receiver) {
            warn!("Failed to bind {} request: {}", request.interface, e);
        }
    });

    let interceptor = InterfaceInterceptor::new(Arc::clone(broker), name, handler);
    interceptor.start();

    InterceptionHandle {
        interceptor,
        binding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interception::pipe::Remote;
    use crate::loader::definitions::DefinitionModule;
    use crate::utils::errors::{HarnessError, Result};
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl ServiceImpl for Counting {
        fn dispatch(&self, _method: &str, _args: Vec<Value>) -> Result<Value> {
            Ok(json!(self.calls.fetch_add(1, Ordering::SeqCst) + 1))
        }
    }

    fn ping_interface() -> InterfaceDef {
        DefinitionModule::parse(
            "ping.yaml",
            "module: ping\ninterfaces:\n  - name: test.Ping\n    methods:\n      - name: ping\n",
        )
        .unwrap()
        .interfaces
        .remove(0)
    }

    fn connect(broker: &InterfaceBroker) -> Result<Remote> {
        broker.connect("test.Ping")
    }

    #[test]
    fn test_intercept_routes_to_target() {
        let broker = Arc::new(InterfaceBroker::new());
        let target = Arc::new(Counting::default());
        let handle = intercept(&broker, ping_interface(), &target);

        assert!(handle.is_active());
        let remote = connect(&broker).unwrap();
        assert_eq!(remote.call("ping", vec![]).unwrap(), json!(1));
        assert_eq!(handle.bound_count(), 1);
    }

    #[test]
    fn test_close_reverts_routing() {
        let broker = Arc::new(InterfaceBroker::new());
        let target = Arc::new(Counting::default());
        let handle = intercept(&broker, ping_interface(), &target);
        let remote = connect(&broker).unwrap();

        handle.close();
        handle.close();

        assert!(!handle.is_active());
        assert!(matches!(connect(&broker), Err(HarnessError::NoRoute(_))));
        assert!(remote.call("ping", vec![]).is_err());
        assert_eq!(target.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stop_and_restart() {
        let broker = Arc::new(InterfaceBroker::new());
        let target = Arc::new(Counting::default());
        let handle = intercept(&broker, ping_interface(), &target);

        handle.stop();
        assert!(!broker.is_intercepted("test.Ping"));

        handle.start();
        assert!(broker.is_intercepted("test.Ping"));

        handle.close();
        handle.start();
        assert!(!broker.is_intercepted("test.Ping"));
    }

    #[test]
    fn test_drop_releases_interception() {
        let broker = Arc::new(InterfaceBroker::new());
        let target = Arc::new(Counting::default());
        {
            let _handle = intercept(&broker, ping_interface(), &target);
            assert!(broker.is_intercepted("test.Ping"));
        }
        assert!(!broker.is_intercepted("test.Ping"));
    }

    #[test]
    fn test_reregistration_does_not_crash() {
        let broker = Arc::new(InterfaceBroker::new());
        let first = Arc::new(Counting::default());
        let second = Arc::new(Counting::default());

        let first_handle = intercept(&broker, ping_interface(), &first);
        let _second_handle = intercept(&broker, ping_interface(), &second);

        let remote = connect(&broker).unwrap();
        remote.call("ping", vec![]).unwrap();
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);

        // Closing the replaced handle leaves the newer registration in place
        first_handle.close();
        assert!(broker.is_intercepted("test.Ping"));
    }
}
