// packages/harness/src/lib.rs
//! Intercept Harness
//!
//! Replaces a platform service with a controllable fake during tests, so a
//! test can assert on what production code sends and script what it gets
//! back, without the real service behind it.
//!
//! # Architecture
//!
//! - **loader**: ordered, sequential loading of interface definitions
//! - **interception**: interface broker, pipes, bindings, interceptors
//! - **service**: the fake service, its handler, the mocked method surface
//! - **harness**: memoized setup, expectation API, state constants
//! - **observability**: logging setup and dispatch counters
//! - **utils**: errors, configuration, timing helpers
//!
//! # Usage
//!
//! ```no_run
//! use intercept_harness::{query, AddMonitor, Harness, MonitorReply};
//!
//! # async fn run() -> intercept_harness::Result<()> {
//! let harness = Harness::new(Default::default());
//! let active = {
//!     harness.ready().await?;
//!     harness.constants().map(|c| c.active()).unwrap_or_default()
//! };
//!
//! harness
//!     .expect(AddMonitor)
//!     .and_return(move |(threshold, _monitor, _callback)| {
//!         assert_eq!(threshold, 60);
//!         Ok(MonitorReply::new(active))
//!     })
//!     .await?;
//!
//! let reply = query(harness.broker(), 60)?;
//! assert_eq!(reply.state, active);
//!
//! harness.close().await?;
//! # Ok(())
//! # }
//! ```

// Public module exports
pub mod harness;
pub mod interception;
pub mod loader;
pub mod observability;
pub mod service;
pub mod utils;

// Re-export commonly used types
pub use harness::{Expectation, Harness, StateConstants, SymbolicState};
pub use interception::{InterfaceBroker, InterceptionHandle, Remote};
pub use loader::{DependencyLoader, FileFetcher, ResourceFetcher, StaticFetcher};
pub use service::{
    query, AddMonitor, DynamicMethod, FakeService, Handler, HarnessState, IdleManagerRemote,
    MockableMethod, MonitorReply,
};
pub use utils::config::HarnessConfig;
pub use utils::errors::{CallbackError, HarnessError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
