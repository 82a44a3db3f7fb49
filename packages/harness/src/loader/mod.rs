// packages/harness/src/loader/mod.rs
//! Dependency loading
//!
//! - **Fetcher**: turns resource identifiers into definition source
//! - **Definitions**: parsed modules and the symbol registry
//! - **Dependency Loader**: ordered, sequential, fail-fast loading
//!
//! ```text
//! resources[0] ─▶ fetch ─▶ parse ─▶ install
//!                                      │
//! resources[1] ─▶ fetch ─▶ parse ─▶ install
//!                                      │
//!                                 Definitions
//! ```

pub mod definitions;
pub mod dependency_loader;
pub mod fetcher;

pub use definitions::{DefinitionModule, Definitions, EnumDef, InterfaceDef, MethodDef};
pub use dependency_loader::{DependencyLoader, PendingLoad};
pub use fetcher::{FileFetcher, ResourceFetcher, StaticFetcher};
