//! Raw hosting ABI shared with the foreign runtime library.
//!
//! The function signatures mirror the CoreCLR hosting contract. The
//! loader resolves them by name; the rest of the crate only ever sees
//! the typed aliases defined here, never raw pointers.

use std::ffi::c_void;
use std::fmt;
use std::os::raw::{c_char, c_int, c_uint};

/// Symbol that creates an execution context.
pub const INITIALIZE_SYMBOL: &str = "coreclr_initialize";
/// Symbol that resolves a managed function into a native pointer.
pub const CREATE_DELEGATE_SYMBOL: &str = "coreclr_create_delegate";
/// Symbol that shuts a context down and reports the latched exit code.
pub const SHUTDOWN_SYMBOL: &str = "coreclr_shutdown_2";

/// Creates an execution context from a base path, a friendly context
/// name, and parallel property key/value arrays. Writes the context
/// handle and the domain id through the out parameters.
pub type RuntimeInitializeFn = unsafe extern "C" fn(
    exe_path: *const c_char,
    app_domain_friendly_name: *const c_char,
    property_count: c_int,
    property_keys: *const *const c_char,
    property_values: *const *const c_char,
    host_handle: *mut *mut c_void,
    domain_id: *mut c_uint,
) -> c_int;

/// Resolves an (assembly, class, function) triple into a callable
/// pointer written through the `delegate` out parameter.
pub type RuntimeCreateDelegateFn = unsafe extern "C" fn(
    host_handle: *mut c_void,
    domain_id: c_uint,
    entry_point_assembly_name: *const c_char,
    entry_point_type_name: *const c_char,
    entry_point_method_name: *const c_char,
    delegate: *mut *mut c_void,
) -> c_int;

/// Tears the context down, writing the exit code managed code latched
/// before teardown through the out parameter.
pub type RuntimeShutdownFn = unsafe extern "C" fn(
    host_handle: *mut c_void,
    domain_id: c_uint,
    latched_exit_code: *mut c_int,
) -> c_int;

/// The calling convention every bound stage delegate follows: JSON
/// request in, optional JSON reply written into the caller's buffer
/// (see `radnet_core::wire`), nonzero return for foreign failure.
/// Delegates must not unwind across this boundary.
pub type StageDelegateFn = unsafe extern "C" fn(
    input: *const u8,
    input_len: usize,
    reply: *mut u8,
    reply_capacity: usize,
    reply_len: *mut usize,
) -> i32;

/// A status returned by the hosting ABI, rendered in the hosting
/// convention's `0x%08X` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub i32);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(0);

    pub fn is_ok(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0 as u32)
    }
}

/// An initialized execution context: the opaque handle plus the domain
/// id the hosting calls expect alongside it. Plain data; only the
/// hosting implementation ever dereferences the handle.
#[derive(Debug, Clone, Copy)]
pub struct ContextToken {
    pub handle: *mut c_void,
    pub domain_id: u32,
}

impl ContextToken {
    pub fn new(handle: *mut c_void, domain_id: u32) -> Self {
        Self { handle, domain_id }
    }
}

/// A bound stage delegate, ready to invoke.
#[derive(Clone, Copy)]
pub struct StageDelegate {
    function: StageDelegateFn,
}

impl StageDelegate {
    pub fn from_fn(function: StageDelegateFn) -> Self {
        Self { function }
    }

    /// Calls the delegate with the marshaled input, handing it `reply`
    /// as output space. Returns the foreign status and how many reply
    /// bytes the delegate claims to have written.
    pub fn invoke(&self, input: &[u8], reply: &mut [u8]) -> DelegateCall {
        let mut reply_len: usize = 0;
        // SAFETY: input and reply outlive the call, reply_len points at
        // a local, and the pointee signature is the one the delegate
        // was compiled against.
        let status = unsafe {
            (self.function)(
                input.as_ptr(),
                input.len(),
                reply.as_mut_ptr(),
                reply.len(),
                &mut reply_len,
            )
        };
        DelegateCall {
            status: StatusCode(status),
            reply_len,
        }
    }
}

impl fmt::Debug for StageDelegate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StageDelegate({:p})", self.function as *const ())
    }
}

/// Raw outcome of one delegate call, before the dispatcher maps it to
/// a verdict.
#[derive(Debug, Clone, Copy)]
pub struct DelegateCall {
    pub status: StatusCode,
    pub reply_len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_renders_as_hex() {
        assert_eq!(StatusCode(0).to_string(), "0x00000000");
        assert_eq!(StatusCode(-2146233054).to_string(), "0x80131522");
        assert!(StatusCode::OK.is_ok());
        assert!(!StatusCode(1).is_ok());
    }

    unsafe extern "C" fn echo_len(
        _input: *const u8,
        input_len: usize,
        _reply: *mut u8,
        _reply_capacity: usize,
        reply_len: *mut usize,
    ) -> i32 {
        *reply_len = input_len;
        0
    }

    #[test]
    fn test_invoke_reports_status_and_reply_len() {
        let delegate = StageDelegate::from_fn(echo_len);
        let mut reply = [0u8; 8];
        let call = delegate.invoke(b"abc", &mut reply);
        assert!(call.status.is_ok());
        assert_eq!(call.reply_len, 3);
    }
}
