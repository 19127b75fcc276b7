//! The bridge façade: one instance per configured module.

use crate::binder::bind_all;
use crate::context::ExecutionContext;
use crate::dispatch::dispatch_stage;
use crate::error::Result;
use crate::hosting::{InitParams, RuntimeHost, ShutdownReport};
use crate::loader::LoadedRuntime;
use crate::table::EntryPointTable;
use radnet_core::{BridgeConfig, RequestContext, Stage, Verdict};
use std::fmt;
use tracing::{debug, error, info, warn};

/// One managed-runtime bridge instance: the loaded runtime, its
/// execution context, and the per-stage entry points.
///
/// Instances hold no internal locking; the host serializes access, as
/// the `&mut self` dispatch surface enforces.
pub struct RuntimeBridge {
    config: BridgeConfig,
    runtime: Box<dyn RuntimeHost>,
    context: Option<ExecutionContext>,
    table: EntryPointTable,
}

// SAFETY: the context handle and the bound delegates are not
// thread-affine; the hosting contract only forbids concurrent calls,
// which the &mut receiver on every entry point rules out.
unsafe impl Send for RuntimeBridge {}

impl RuntimeBridge {
    /// Loads the configured runtime library and brings a bridge up on
    /// it: context initialization, delegate binding, and the managed
    /// `instantiate` hook if one is bound.
    pub fn instantiate(config: BridgeConfig) -> Result<Self> {
        config.validate()?;
        let runtime = LoadedRuntime::load(&config.runtime_library)?;
        Self::with_runtime(config, Box::new(runtime))
    }

    /// Brings a bridge up on an already-available runtime host. This is
    /// the seam tests drive with stub hosts.
    pub fn with_runtime(config: BridgeConfig, runtime: Box<dyn RuntimeHost>) -> Result<Self> {
        config.validate()?;
        let table = EntryPointTable::from_config(&config)?;
        let properties = config.hosting_properties()?;

        let mut bridge = Self {
            config,
            runtime,
            context: None,
            table,
        };

        let params = InitParams {
            base_path: &bridge.config.base_path,
            context_name: &bridge.config.context_name,
            properties: &properties,
        };
        let context = ExecutionContext::start(bridge.runtime.as_ref(), &params)?;
        let token = context.token();
        bridge.context = Some(context);

        let summary = bind_all(bridge.runtime.as_ref(), token, &mut bridge.table)?;
        info!(
            library = %bridge.config.runtime_library.display(),
            configured = bridge.table.configured_count(),
            bound = summary.bound,
            failed = summary.failed,
            "bridge instantiated"
        );

        bridge.run_lifecycle(Stage::Instantiate);
        Ok(bridge)
    }

    /// Runs a pipeline stage against the request.
    pub fn dispatch(&mut self, stage: Stage, request: &mut RequestContext) -> Verdict {
        match self.table.slot(stage) {
            Some(slot) => dispatch_stage(slot, request),
            None => Verdict::Noop,
        }
    }

    pub fn authorize(&mut self, request: &mut RequestContext) -> Verdict {
        self.dispatch(Stage::Authorize, request)
    }

    pub fn authenticate(&mut self, request: &mut RequestContext) -> Verdict {
        self.dispatch(Stage::Authenticate, request)
    }

    pub fn preacct(&mut self, request: &mut RequestContext) -> Verdict {
        self.dispatch(Stage::Preacct, request)
    }

    pub fn accounting(&mut self, request: &mut RequestContext) -> Verdict {
        self.dispatch(Stage::Accounting, request)
    }

    pub fn checksimul(&mut self, request: &mut RequestContext) -> Verdict {
        self.dispatch(Stage::Checksimul, request)
    }

    pub fn pre_proxy(&mut self, request: &mut RequestContext) -> Verdict {
        self.dispatch(Stage::PreProxy, request)
    }

    pub fn post_proxy(&mut self, request: &mut RequestContext) -> Verdict {
        self.dispatch(Stage::PostProxy, request)
    }

    pub fn post_auth(&mut self, request: &mut RequestContext) -> Verdict {
        self.dispatch(Stage::PostAuth, request)
    }

    #[cfg(feature = "coa")]
    pub fn recv_coa(&mut self, request: &mut RequestContext) -> Verdict {
        self.dispatch(Stage::RecvCoa, request)
    }

    #[cfg(feature = "coa")]
    pub fn send_coa(&mut self, request: &mut RequestContext) -> Verdict {
        self.dispatch(Stage::SendCoa, request)
    }

    /// Detaches the bridge: runs the managed `detach` hook if one is
    /// bound, then shuts the execution context down. Always succeeds
    /// toward the caller; the shutdown report (when a context existed
    /// and the runtime could shut it down) is returned for inspection
    /// and logged either way.
    pub fn detach(mut self) -> Option<ShutdownReport> {
        self.run_lifecycle(Stage::Detach);
        self.release_context()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn table(&self) -> &EntryPointTable {
        &self.table
    }

    fn run_lifecycle(&mut self, stage: Stage) {
        let Some(slot) = self.table.slot(stage) else {
            return;
        };
        if !slot.is_bound() {
            return;
        }
        let mut request = RequestContext::new();
        let verdict = dispatch_stage(slot, &mut request);
        debug!(%stage, %verdict, "lifecycle delegate completed");
    }

    fn release_context(&mut self) -> Option<ShutdownReport> {
        let context = self.context.take()?;
        match context.shutdown(self.runtime.as_ref()) {
            Ok(report) => {
                info!(
                    status = %report.status,
                    latched_exit_code = report.latched_exit_code,
                    "execution context shut down"
                );
                Some(report)
            }
            Err(e) => {
                error!(error = %e, "execution context shutdown failed");
                None
            }
        }
    }
}

impl fmt::Debug for RuntimeBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeBridge")
            .field("config", &self.config)
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        if self.context.is_some() {
            warn!("bridge dropped without detach, releasing execution context");
            self.release_context();
        }
    }
}
