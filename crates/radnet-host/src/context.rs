//! The execution context as a scoped resource.

use crate::abi::ContextToken;
use crate::error::Result;
use crate::hosting::{InitParams, RuntimeHost, ShutdownReport};
use tracing::{debug, info};

/// One live foreign execution context.
///
/// Shutdown consumes the value, so teardown happens at most once no
/// matter which path reaches it first.
pub struct ExecutionContext {
    token: ContextToken,
}

impl ExecutionContext {
    /// Creates the context through the host's initializer.
    pub fn start(host: &dyn RuntimeHost, params: &InitParams<'_>) -> Result<Self> {
        debug!(
            base_path = %params.base_path.display(),
            context_name = params.context_name,
            properties = params.properties.len(),
            "initializing execution context"
        );
        let token = host.initialize(params)?;
        info!(domain_id = token.domain_id, "execution context initialized");
        Ok(Self { token })
    }

    pub fn token(&self) -> ContextToken {
        self.token
    }

    /// Shuts the context down, reporting the hosting status and the
    /// latched exit code.
    pub fn shutdown(self, host: &dyn RuntimeHost) -> Result<ShutdownReport> {
        host.shutdown(self.token)
    }
}
