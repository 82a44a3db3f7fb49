// packages/harness/src/harness/lifecycle.rs
//! Harness setup and teardown
//!
//! Setup is one memoized future: load the dependency list in order, then
//! create the fake, mirror the state constants and start intercepting. Every
//! caller awaits the same shared future, so concurrent expectations converge
//! on one fake and a failed setup fails every caller the same way without
//! being retried.

use crate::harness::constants::{ConstantMirror, StateConstants};
use crate::harness::expectation::Expectation;
use crate::interception::broker::InterfaceBroker;
use crate::interception::interceptor::intercept;
use crate::loader::definitions::Definitions;
use crate::loader::dependency_loader::DependencyLoader;
use crate::loader::fetcher::{FileFetcher, ResourceFetcher, StaticFetcher};
use crate::service::fake_service::{FakeService, HarnessState};
use crate::service::method::MockableMethod;
use crate::utils::config::{HarnessConfig, InterceptionConfig};
use crate::utils::errors::{HarnessError, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use tracing::{debug, info, warn};

type SetupFuture = Shared<BoxFuture<'static, Result<Arc<FakeService>>>>;

pub struct Harness {
    config: HarnessConfig,
    broker: Arc<InterfaceBroker>,
    constants: Arc<ConstantMirror>,
    service: SetupFuture,
}

impl Harness {
    /// Harness on the global broker, reading resources as configured
    pub fn new(config: HarnessConfig) -> Self {
        let fetcher: Arc<dyn ResourceFetcher> = match &config.resources.root {
            Some(root) => Arc::new(FileFetcher::new(root)),
            None => Arc::new(StaticFetcher::bundled()),
        };

        Self::with_parts(config, InterfaceBroker::global(), fetcher)
    }

    /// Default configuration and bundled resources on `broker`
    pub fn with_broker(broker: Arc<InterfaceBroker>) -> Self {
        Self::with_parts(
            HarnessConfig::default(),
            broker,
            Arc::new(StaticFetcher::bundled()),
        )
    }

    /// Start setup with explicit collaborators
    ///
    /// Inside a Tokio runtime setup is spawned right away; otherwise it runs
    /// when first awaited.
    pub fn with_parts(
        config: HarnessConfig,
        broker: Arc<InterfaceBroker>,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> Self {
        let constants = Arc::new(ConstantMirror::new());
        let load = DependencyLoader::new(fetcher)
            .chain(config.resources.scripts.iter().cloned())
            .finish();

        let service = {
            let broker = Arc::clone(&broker);
            let constants = Arc::clone(&constants);
            let interception = config.interception.clone();

            async move {
                let defs = load.await?;
                arm(&defs, &broker, &interception, &constants)
            }
            .boxed()
            .shared()
        };

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            debug!("Spawning harness setup");
            runtime.spawn(service.clone());
        }

        Self {
            config,
            broker,
            constants,
            service,
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn broker(&self) -> &Arc<InterfaceBroker> {
        &self.broker
    }

    /// Wait for setup and return the fake
    pub async fn service(&self) -> Result<Arc<FakeService>> {
        self.service.clone().await
    }

    /// Wait for setup without taking the fake
    pub async fn ready(&self) -> Result<()> {
        self.service().await.map(|_| ())
    }

    /// Declare how `method` should be answered
    pub fn expect<M>(&self, method: M) -> Expectation<'_, M>
    where
        M: MockableMethod + 'static,
    {
        Expectation::new(self, method)
    }

    /// Release the interception. Always succeeds, including when called
    /// again or after a failed setup.
    pub async fn close(&self) -> Result<()> {
        match self.service().await {
            Ok(service) => service.close(),
            Err(e) => warn!("Nothing to close, setup failed: {}", e),
        }
        Ok(())
    }

    /// Symbolic state constants; `None` until setup completes
    pub fn constants(&self) -> Option<&StateConstants> {
        self.constants.get()
    }

    pub fn state(&self) -> HarnessState {
        match self.service.peek() {
            None => HarnessState::Uninitialized,
            Some(Err(_)) => HarnessState::Failed,
            Some(Ok(service)) => service.state(),
        }
    }
}

/// Create the fake and intercept the configured interface
fn arm(
    defs: &Definitions,
    broker: &Arc<InterfaceBroker>,
    config: &InterceptionConfig,
    constants: &ConstantMirror,
) -> Result<Arc<FakeService>> {
    let interface = defs
        .interface(&config.interface)
        .cloned()
        .ok_or_else(|| HarnessError::UnknownInterface(config.interface.clone()))?;

    let states = defs.enum_def(&config.state_enum).ok_or_else(|| {
        HarnessError::load_failure(
            config.state_enum.as_str(),
            "state enum not defined by any loaded resource",
        )
    })?;

    // Filled before interception starts so tests never observe it empty
    constants.populate(states)?;

    let fake = Arc::new(FakeService::new(interface.name.as_str()));
    let handle = intercept(broker, interface, &fake);
    fake.set_interception(handle);

    info!("Harness armed for {}", config.interface);
    Ok(fake)
}
