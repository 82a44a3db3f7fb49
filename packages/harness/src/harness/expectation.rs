// packages/harness/src/harness/expectation.rs
//! Expectation API: `harness.expect(method).and_return(callback)`

use crate::harness::lifecycle::Harness;
use crate::service::handler::Handler;
use crate::service::method::{typed_callback, MockableMethod};
use crate::utils::errors::Result;
use tracing::debug;

/// A pending expectation for one method
#[must_use = "an expectation does nothing until `and_return` is awaited"]
pub struct Expectation<'h, M> {
    harness: &'h Harness,
    method: M,
}

impl<'h, M> Expectation<'h, M>
where
    M: MockableMethod + 'static,
{
    pub(crate) fn new(harness: &'h Harness, method: M) -> Self {
        Self { harness, method }
    }

    /// Answer calls to the method with `callback`
    ///
    /// Waits for setup to finish, then installs a handler holding only this
    /// method, replacing whatever was installed before. Fails with `Closed`
    /// once the harness has been closed.
    pub async fn and_return<F>(self, callback: F) -> Result<()>
    where
        F: Fn(M::Args) -> anyhow::Result<M::Output> + Send + Sync + 'static,
    {
        let name = self.method.name().to_string();
        let callback = typed_callback(&self.method, callback);

        let service = self.harness.service().await?;
        service.try_set_handler(Handler::from_callback(name.as_str(), callback))?;
        debug!("Expectation set for {}.{}", service.interface(), name);

        Ok(())
    }
}
