// packages/harness/src/service/mod.rs
//! Fake service and the method surface it mocks
//!
//! - **Fake Service**: dispatches calls to the installed handler
//! - **Handler**: method name to callback mapping
//! - **Method**: typed descriptors for mockable methods
//! - **Idle**: the idle manager's method and typed client

pub mod fake_service;
pub mod handler;
pub mod idle;
pub mod method;

pub use fake_service::{FakeService, HarnessState};
pub use handler::{Callback, Handler};
pub use idle::{query, AddMonitor, CallbackHandle, IdleManagerRemote, MonitorHandle, MonitorReply, IDLE_MANAGER};
pub use method::{typed_callback, DynamicMethod, MockableMethod};
