//! The hosting seam: what the bridge needs from a managed runtime.

use crate::abi::{
    ContextToken, StageDelegate, StageDelegateFn, StatusCode, CREATE_DELEGATE_SYMBOL,
    INITIALIZE_SYMBOL, SHUTDOWN_SYMBOL,
};
use crate::error::{HostError, Result};
use crate::loader::LoadedRuntime;
use radnet_core::DelegateTarget;
use std::ffi::{c_void, CString};
use std::os::raw::{c_char, c_int, c_uint};
use std::path::Path;

/// What execution-context creation needs from configuration.
#[derive(Debug)]
pub struct InitParams<'a> {
    pub base_path: &'a Path,
    pub context_name: &'a str,
    /// Ordered hosting properties; always starts with the trusted
    /// assembly list.
    pub properties: &'a [(String, String)],
}

/// Outcome of a context shutdown: the hosting status plus the exit
/// code managed code latched before teardown.
#[derive(Debug, Clone, Copy)]
pub struct ShutdownReport {
    pub status: StatusCode,
    pub latched_exit_code: i32,
}

/// The three capabilities the bridge needs from a managed runtime.
///
/// [`LoadedRuntime`] implements this over the real hosting ABI; tests
/// substitute their own implementations to drive the bridge through
/// failure paths no real runtime produces on demand.
pub trait RuntimeHost: Send {
    /// Creates the execution context. Called at most once per bridge
    /// instance, before any binding or dispatch.
    fn initialize(&self, params: &InitParams<'_>) -> Result<ContextToken>;

    /// Resolves a managed function into a callable stage delegate.
    fn create_delegate(
        &self,
        context: ContextToken,
        target: &DelegateTarget,
    ) -> Result<StageDelegate>;

    /// Tears the context down. Called at most once; the caller reports
    /// failures but never escalates them.
    fn shutdown(&self, context: ContextToken) -> Result<ShutdownReport>;
}

impl RuntimeHost for LoadedRuntime {
    fn initialize(&self, params: &InitParams<'_>) -> Result<ContextToken> {
        let initialize = self.api().initialize.ok_or(HostError::MissingSymbol {
            symbol: INITIALIZE_SYMBOL,
        })?;

        let base_path = c_string(&params.base_path.to_string_lossy(), "base path")?;
        let context_name = c_string(params.context_name, "context name")?;
        let keys: Vec<CString> = params
            .properties
            .iter()
            .map(|(key, _)| c_string(key, "property key"))
            .collect::<Result<_>>()?;
        let values: Vec<CString> = params
            .properties
            .iter()
            .map(|(_, value)| c_string(value, "property value"))
            .collect::<Result<_>>()?;
        let key_ptrs: Vec<*const c_char> = keys.iter().map(|key| key.as_ptr()).collect();
        let value_ptrs: Vec<*const c_char> = values.iter().map(|value| value.as_ptr()).collect();

        let mut handle: *mut c_void = std::ptr::null_mut();
        let mut domain_id: c_uint = 0;
        // SAFETY: every pointer references a local that outlives the
        // call; the key/value arrays are parallel and their shared
        // length is passed alongside them.
        let status = unsafe {
            initialize(
                base_path.as_ptr(),
                context_name.as_ptr(),
                key_ptrs.len() as c_int,
                key_ptrs.as_ptr(),
                value_ptrs.as_ptr(),
                &mut handle,
                &mut domain_id,
            )
        };
        if status != 0 {
            return Err(HostError::ContextInit {
                status: StatusCode(status),
            });
        }
        if handle.is_null() {
            return Err(HostError::NullContext);
        }
        Ok(ContextToken::new(handle, domain_id))
    }

    fn create_delegate(
        &self,
        context: ContextToken,
        target: &DelegateTarget,
    ) -> Result<StageDelegate> {
        let create_delegate = self.api().create_delegate.ok_or(HostError::MissingSymbol {
            symbol: CREATE_DELEGATE_SYMBOL,
        })?;

        let assembly = c_string(&target.assembly, "assembly name")?;
        let class = c_string(&target.class, "class name")?;
        let method = c_string(&target.function, "function name")?;

        let mut delegate: *mut c_void = std::ptr::null_mut();
        // SAFETY: the CStrings outlive the call and delegate points at
        // a local.
        let status = unsafe {
            create_delegate(
                context.handle,
                context.domain_id,
                assembly.as_ptr(),
                class.as_ptr(),
                method.as_ptr(),
                &mut delegate,
            )
        };
        if status != 0 {
            return Err(HostError::DelegateCreation {
                status: StatusCode(status),
                target: target.clone(),
            });
        }
        if delegate.is_null() {
            return Err(HostError::NullDelegate {
                target: target.clone(),
            });
        }
        // SAFETY: the runtime resolved the method against the delegate
        // signature managed code was compiled with; the pointer is only
        // ever called through StageDelegateFn.
        let stage_fn = unsafe { std::mem::transmute::<*mut c_void, StageDelegateFn>(delegate) };
        Ok(StageDelegate::from_fn(stage_fn))
    }

    fn shutdown(&self, context: ContextToken) -> Result<ShutdownReport> {
        let shutdown = self.api().shutdown.ok_or(HostError::MissingSymbol {
            symbol: SHUTDOWN_SYMBOL,
        })?;

        let mut latched_exit_code: c_int = 0;
        // SAFETY: latched_exit_code points at a local.
        let status = unsafe { shutdown(context.handle, context.domain_id, &mut latched_exit_code) };
        Ok(ShutdownReport {
            status: StatusCode(status),
            latched_exit_code,
        })
    }
}

fn c_string(value: &str, what: &str) -> Result<CString> {
    CString::new(value).map_err(|_| HostError::InvalidParameter(format!("embedded NUL in {what}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_string_rejects_embedded_nul() {
        assert!(c_string("plain", "test value").is_ok());
        let error = c_string("bad\0value", "test value").unwrap_err();
        assert!(error.to_string().contains("test value"));
    }
}
