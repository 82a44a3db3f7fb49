// packages/harness/src/interception/mod.rs
//! Interface interception layer
//!
//! - **Broker**: platform-style interface lookup, keyed by interface name
//! - **Pipe**: remote/receiver pairs carrying calls
//! - **Binding**: validates calls against an interface definition
//! - **Interceptor**: registers with the broker while started
//!
//! # Architecture
//!
//! ```text
//! Production code
//!     │ connect("blink.mojom.IdleManager")
//!     ▼
//! InterfaceBroker ──(intercepted?)──▶ InterfaceInterceptor ──▶ Binding ──▶ FakeService
//!     │
//!     └──(otherwise)──▶ default binder
//! ```

pub mod binding;
pub mod broker;
pub mod interceptor;
pub mod pipe;

// Re-export commonly used types
pub use binding::Binding;
pub use broker::{InterfaceBroker, InterfaceRequest, InterfaceRequestHandler};
pub use interceptor::{intercept, InterceptionHandle, InterfaceInterceptor};
pub use pipe::{pipe, PendingReceiver, ReceiverHandle, Remote, ServiceImpl};
