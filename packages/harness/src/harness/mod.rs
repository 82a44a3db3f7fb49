// packages/harness/src/harness/mod.rs
//! Test-facing harness
//!
//! - **Lifecycle**: memoized setup, `service()`, `close()`
//! - **Expectation**: `expect(method).and_return(callback)`
//! - **Constants**: ACTIVE / IDLE / LOCKED mirrored from the engine enum
//!
//! ```text
//! Uninitialized ──load──▶ Armed ──and_return──▶ Configured ──close──▶ Closed
//!       │                                          ▲    │
//!       └──load failure──▶ Failed                  └────┘ (re-mock)
//! ```

pub mod constants;
pub mod expectation;
pub mod lifecycle;

pub use constants::{ConstantMirror, StateConstants, SymbolicState};
pub use expectation::Expectation;
pub use lifecycle::Harness;
