// packages/harness/src/interception/binding.rs
//! Binds receivers to a service implementation for one interface
//!
//! The binding checks each call against the interface definition before it
//! reaches the implementation, and holds the implementation weakly so the
//! implementation can own the interception that feeds it.

use crate::interception::pipe::{PendingReceiver, ReceiverHandle, ServiceImpl};
use crate::loader::definitions::InterfaceDef;
use crate::utils::errors::{HarnessError, Result};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

pub struct Binding {
    interface: InterfaceDef,
    implementation: Weak<dyn ServiceImpl>,
    receivers: Mutex<Vec<ReceiverHandle>>,
    closed: AtomicBool,
}

impl Binding {
    pub fn new(interface: InterfaceDef, implementation: Weak<dyn ServiceImpl>) -> Arc<Self> {
        Arc::new(Self {
            interface,
            implementation,
            receivers: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn interface(&self) -> &InterfaceDef {
        &self.interface
    }

    /// Serve `receiver` through this binding
    pub fn bind(self: &Arc<Self>, receiver: PendingReceiver) -> Result<()> {
        if self.is_closed() {
            warn!("Dropping {} request: binding is closed", receiver.interface());
            return Err(HarnessError::Disconnected(self.interface.name.clone()));
        }

        if receiver.interface() != self.interface.name {
            return Err(HarnessError::UnknownInterface(receiver.interface().to_string()));
        }

        let target: Arc<dyn ServiceImpl> = Arc::clone(self) as Arc<dyn ServiceImpl>;
        let handle = receiver.bind(target);

        let mut receivers = self.receivers.lock();
        receivers.retain(ReceiverHandle::is_alive);
        receivers.push(handle);
        debug!("Bound {} receiver ({} live)", self.interface.name, receivers.len());

        Ok(())
    }

    /// Disconnect every bound receiver and refuse new ones
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let receivers = std::mem::take(&mut *self.receivers.lock());
        for receiver in &receivers {
            receiver.disconnect();
        }
        debug!(
            "Closed {} binding, disconnected {} receivers",
            self.interface.name,
            receivers.len()
        );
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Receivers whose remote is still alive
    pub fn bound_count(&self) -> usize {
        let mut receivers = self.receivers.lock();
        receivers.retain(ReceiverHandle::is_alive);
        receivers.len()
    }
}

impl ServiceImpl for Binding {
    fn dispatch(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        if self.is_closed() {
            return Err(HarnessError::Disconnected(self.interface.name.clone()));
        }

        let signature =
            self.interface
                .method(method)
                .ok_or_else(|| HarnessError::UnknownMethod {
                    interface: self.interface.name.clone(),
                    method: method.to_string(),
                })?;

        if signature.params.len() != args.len() {
            return Err(HarnessError::InvalidArguments {
                method: method.to_string(),
                reason: format!(
                    "expected {} arguments, got {}",
                    signature.params.len(),
                    args.len()
                ),
            });
        }

        let implementation = self
            .implementation
            .upgrade()
            .ok_or_else(|| HarnessError::Disconnected(self.interface.name.clone()))?;

        implementation.dispatch(method, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interception::pipe::pipe;
    use crate::loader::definitions::DefinitionModule;
    use serde_json::json;

    struct Sum;

    impl ServiceImpl for Sum {
        fn dispatch(&self, _method: &str, args: Vec<Value>) -> Result<Value> {
            Ok(json!(args.iter().filter_map(Value::as_i64).sum::<i64>()))
        }
    }

    fn calculator() -> InterfaceDef {
        let module = DefinitionModule::parse(
            "calc.yaml",
            r#"
module: calc
interfaces:
  - name: test.Calculator
    methods:
      - name: add
        params:
          - { name: a, type: int64 }
          - { name: b, type: int64 }
"#,
        )
        .unwrap();
        module.interfaces[0].clone()
    }

    fn bound(service: &Arc<Sum>) -> (Arc<Binding>, crate::interception::pipe::Remote) {
        let implementation: Weak<dyn ServiceImpl> = Arc::downgrade(service) as Weak<dyn ServiceImpl>;
        let binding = Binding::new(calculator(), implementation);
        let (remote, receiver) = pipe("test.Calculator");
        binding.bind(receiver).unwrap();
        (binding, remote)
    }

    #[test]
    fn test_dispatch_through_binding() {
        let service = Arc::new(Sum);
        let (binding, remote) = bound(&service);

        assert_eq!(remote.call("add", vec![json!(2), json!(3)]).unwrap(), json!(5));
        assert_eq!(binding.bound_count(), 1);
    }

    #[test]
    fn test_unknown_method() {
        let service = Arc::new(Sum);
        let (_binding, remote) = bound(&service);

        let err = remote.call("multiply", vec![]).unwrap_err();
        assert!(matches!(err, HarnessError::UnknownMethod { .. }));
    }

    #[test]
    fn test_arity_checked() {
        let service = Arc::new(Sum);
        let (_binding, remote) = bound(&service);

        let err = remote.call("add", vec![json!(1)]).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidArguments { .. }));
    }

    #[test]
    fn test_close_disconnects_and_is_idempotent() {
        let service = Arc::new(Sum);
        let (binding, remote) = bound(&service);

        binding.close();
        binding.close();

        assert!(!remote.is_connected());
        let (_late, receiver) = pipe("test.Calculator");
        assert!(binding.bind(receiver).is_err());
    }

    #[test]
    fn test_dropped_implementation_disconnects() {
        let service = Arc::new(Sum);
        let (_binding, remote) = bound(&service);
        drop(service);

        let err = remote.call("add", vec![json!(1), json!(2)]).unwrap_err();
        assert!(matches!(err, HarnessError::Disconnected(_)));
    }

    #[test]
    fn test_wrong_interface_rejected() {
        let service = Arc::new(Sum);
        let (binding, _remote) = bound(&service);
        let (_other, receiver) = pipe("test.Other");

        assert!(matches!(
            binding.bind(receiver),
            Err(HarnessError::UnknownInterface(_))
        ));
    }
}
