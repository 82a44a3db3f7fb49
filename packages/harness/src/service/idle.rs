// packages/harness/src/service/idle.rs
//! Idle detection service surface
//!
//! `AddMonitor` is the mockable method; `IdleManagerRemote` is what
//! production code uses to talk to the service through the broker, whether
//! or not a fake is intercepting it.

use crate::interception::broker::InterfaceBroker;
use crate::interception::pipe::Remote;
use crate::service::method::MockableMethod;
use crate::utils::errors::{HarnessError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Canonical interface name
pub const IDLE_MANAGER: &str = "blink.mojom.IdleManager";

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Opaque handle to the monitor the service reports state changes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonitorHandle(pub u64);

impl MonitorHandle {
    pub fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Opaque handle to the caller's reply callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackHandle(pub u64);

impl CallbackHandle {
    pub fn next() -> Self {
        Self(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }
}

/// Reply to `addMonitor`: the current state as the engine encodes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorReply {
    pub state: i64,
}

impl MonitorReply {
    pub fn new(state: i64) -> Self {
        Self { state }
    }
}

/// `addMonitor(threshold, monitor, callback)`
#[derive(Debug, Clone, Copy, Default)]
pub struct AddMonitor;

impl AddMonitor {
    pub const NAME: &'static str = "addMonitor";
}

impl MockableMethod for AddMonitor {
    type Args = (u32, MonitorHandle, CallbackHandle);
    type Output = MonitorReply;

    fn name(&self) -> &str {
        Self::NAME
    }
}

/// Typed client for the idle manager
#[derive(Debug, Clone)]
pub struct IdleManagerRemote {
    remote: Remote,
}

impl IdleManagerRemote {
    pub fn connect(broker: &InterfaceBroker) -> Result<Self> {
        let remote = broker.connect(IDLE_MANAGER)?;
        Ok(Self { remote })
    }

    pub fn is_connected(&self) -> bool {
        self.remote.is_connected()
    }

    pub fn add_monitor(
        &self,
        threshold: u32,
        monitor: MonitorHandle,
        callback: CallbackHandle,
    ) -> Result<MonitorReply> {
        let args = vec![
            Value::from(threshold),
            serde_json::to_value(monitor)?,
            serde_json::to_value(callback)?,
        ];

        let reply = self.remote.call(AddMonitor::NAME, args)?;
        serde_json::from_value(reply).map_err(|e| HarnessError::Serialization(format!(
            "malformed {} reply: {}",
            AddMonitor::NAME,
            e
        )))
    }
}

/// Ask the idle manager for the current state, registering a fresh monitor
pub fn query(broker: &InterfaceBroker, threshold: u32) -> Result<MonitorReply> {
    debug!("Querying idle state with threshold {}", threshold);
    IdleManagerRemote::connect(broker)?.add_monitor(
        threshold,
        MonitorHandle::next(),
        CallbackHandle::next(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interception::broker::InterfaceRequest;
    use crate::interception::pipe::ServiceImpl;
    use serde_json::json;
    use std::sync::Arc;

    struct Recorded;

    impl ServiceImpl for Recorded {
        fn dispatch(&self, method: &str, args: Vec<Value>) -> Result<Value> {
            assert_eq!(method, "addMonitor");
            Ok(json!({ "state": args[0].as_i64().unwrap_or(-1) }))
        }
    }

    fn broker_with(service: Arc<dyn ServiceImpl>) -> InterfaceBroker {
        let broker = InterfaceBroker::new();
        broker.set_default_binder(Some(Arc::new(move |request: InterfaceRequest| {
            request.receiver.bind(Arc::clone(&service));
        })));
        broker
    }

    #[test]
    fn test_wire_encoding() {
        let broker = broker_with(Arc::new(Recorded));
        let reply = query(&broker, 60).unwrap();
        assert_eq!(reply, MonitorReply::new(60));
    }

    #[test]
    fn test_handles_are_unique() {
        assert_ne!(MonitorHandle::next(), MonitorHandle::next());
        assert_eq!(serde_json::to_value(MonitorHandle(7)).unwrap(), json!(7));
    }

    #[test]
    fn test_malformed_reply() {
        struct Garbage;
        impl ServiceImpl for Garbage {
            fn dispatch(&self, _method: &str, _args: Vec<Value>) -> Result<Value> {
                Ok(json!("not a reply"))
            }
        }

        let broker = broker_with(Arc::new(Garbage));
        let err = query(&broker, 1).unwrap_err();
        assert!(matches!(err, HarnessError::Serialization(_)));
    }

    #[test]
    fn test_no_service() {
        let broker = InterfaceBroker::new();
        assert!(matches!(query(&broker, 1), Err(HarnessError::NoRoute(_))));
    }
}
