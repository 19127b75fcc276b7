//! Stage dispatch: marshal the request, invoke the delegate, translate
//! the outcome.

use crate::table::EntryPointSlot;
use radnet_core::wire::{self, REPLY_CAPACITY};
use radnet_core::{RequestContext, Verdict};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error, trace, warn};

/// Runs one pipeline stage against its slot.
///
/// An unbound slot is a pass-through: the request stays untouched and
/// the verdict is `Noop`. A bound slot goes through the marshaling
/// protocol; every exceptional outcome on that path, from a nonzero
/// foreign status to a malformed reply, maps to `Fail` and never
/// crosses into the caller. The invocation runs under `catch_unwind`
/// so a dispatch-side fault cannot take the host process down.
pub fn dispatch_stage(slot: &EntryPointSlot, request: &mut RequestContext) -> Verdict {
    let stage = slot.stage();
    let Some(delegate) = slot.delegate() else {
        trace!(%stage, "no delegate bound, passing request through");
        return Verdict::Noop;
    };

    let payload = match wire::encode_dispatch(stage.key(), request.request()) {
        Ok(payload) => payload,
        Err(e) => {
            error!(%stage, error = %e, "failed to marshal request");
            return Verdict::Fail;
        }
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let mut reply = vec![0u8; REPLY_CAPACITY];
        let call = delegate.invoke(&payload, &mut reply);
        (call, reply)
    }));
    let (call, reply) = match outcome {
        Ok(outcome) => outcome,
        Err(_) => {
            error!(%stage, "stage invocation panicked");
            return Verdict::Fail;
        }
    };

    if !call.status.is_ok() {
        warn!(%stage, status = %call.status, "stage delegate reported failure");
        return Verdict::Fail;
    }
    if call.reply_len > REPLY_CAPACITY {
        error!(
            %stage,
            reply_len = call.reply_len,
            "stage delegate overflowed the reply buffer"
        );
        return Verdict::Fail;
    }

    match wire::decode_reply(&reply[..call.reply_len]) {
        Ok(attributes) if attributes.is_empty() => {
            debug!(%stage, "stage delegate completed");
            Verdict::Ok
        }
        Ok(attributes) => {
            debug!(
                %stage,
                reply = attributes.len(),
                "stage delegate updated the request"
            );
            request.append_reply(attributes);
            Verdict::Updated
        }
        Err(e) => {
            error!(%stage, error = %e, "stage delegate returned a malformed reply");
            Verdict::Fail
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::StageDelegate;
    use crate::table::EntryPointTable;
    use radnet_core::{BridgeConfig, Stage};

    unsafe extern "C" fn quiet_ok(
        _input: *const u8,
        _input_len: usize,
        _reply: *mut u8,
        _reply_capacity: usize,
        reply_len: *mut usize,
    ) -> i32 {
        *reply_len = 0;
        0
    }

    unsafe extern "C" fn write_reply(
        _input: *const u8,
        _input_len: usize,
        reply: *mut u8,
        reply_capacity: usize,
        reply_len: *mut usize,
    ) -> i32 {
        const PAYLOAD: &[u8] = br#"[{"name":"Reply-Message","value":"welcome"}]"#;
        if PAYLOAD.len() > reply_capacity {
            return 1;
        }
        std::ptr::copy_nonoverlapping(PAYLOAD.as_ptr(), reply, PAYLOAD.len());
        *reply_len = PAYLOAD.len();
        0
    }

    unsafe extern "C" fn write_garbage(
        _input: *const u8,
        _input_len: usize,
        reply: *mut u8,
        _reply_capacity: usize,
        reply_len: *mut usize,
    ) -> i32 {
        const PAYLOAD: &[u8] = b"not json at all";
        std::ptr::copy_nonoverlapping(PAYLOAD.as_ptr(), reply, PAYLOAD.len());
        *reply_len = PAYLOAD.len();
        0
    }

    unsafe extern "C" fn report_failure(
        _input: *const u8,
        _input_len: usize,
        _reply: *mut u8,
        _reply_capacity: usize,
        reply_len: *mut usize,
    ) -> i32 {
        *reply_len = 0;
        0x8013_1500u32 as i32
    }

    unsafe extern "C" fn claim_overflow(
        _input: *const u8,
        _input_len: usize,
        _reply: *mut u8,
        reply_capacity: usize,
        reply_len: *mut usize,
    ) -> i32 {
        *reply_len = reply_capacity + 1;
        0
    }

    fn authorize_table() -> EntryPointTable {
        let config = BridgeConfig::from_options(vec![
            ("base_path", "/opt/radnet"),
            ("trusted_assemblies", "/opt/radnet/managed"),
            ("assembly", "Radnet.Managed"),
            ("class", "Radnet.Managed.Handlers"),
            ("func_authorize", "Authorize"),
        ])
        .unwrap();
        EntryPointTable::from_config(&config).unwrap()
    }

    fn bind_authorize(table: &mut EntryPointTable, delegate: StageDelegate) {
        for slot in table.slots_mut() {
            if slot.stage() == Stage::Authorize {
                slot.bind(delegate);
            }
        }
    }

    #[test]
    fn test_unbound_slot_is_noop_and_leaves_request_alone() {
        let table = authorize_table();
        let mut request = RequestContext::new();
        request.push_request("User-Name", "alice");

        let slot = table.slot(Stage::Authenticate).unwrap();
        assert_eq!(dispatch_stage(slot, &mut request), Verdict::Noop);
        assert!(request.reply().is_empty());

        // Configured but not bound: same contract.
        let slot = table.slot(Stage::Authorize).unwrap();
        assert_eq!(dispatch_stage(slot, &mut request), Verdict::Noop);
    }

    #[test]
    fn test_reply_less_success_is_ok() {
        let mut table = authorize_table();
        bind_authorize(&mut table, StageDelegate::from_fn(quiet_ok));

        let mut request = RequestContext::new();
        let slot = table.slot(Stage::Authorize).unwrap();
        assert_eq!(dispatch_stage(slot, &mut request), Verdict::Ok);
        assert!(request.reply().is_empty());
    }

    #[test]
    fn test_reply_attributes_yield_updated() {
        let mut table = authorize_table();
        bind_authorize(&mut table, StageDelegate::from_fn(write_reply));

        let mut request = RequestContext::new();
        request.push_request("User-Name", "alice");
        let slot = table.slot(Stage::Authorize).unwrap();
        assert_eq!(dispatch_stage(slot, &mut request), Verdict::Updated);
        assert_eq!(request.reply_value("Reply-Message"), Some("welcome"));
        assert_eq!(request.request_value("User-Name"), Some("alice"));
    }

    #[test]
    fn test_foreign_failure_status_maps_to_fail() {
        let mut table = authorize_table();
        bind_authorize(&mut table, StageDelegate::from_fn(report_failure));

        let mut request = RequestContext::new();
        let slot = table.slot(Stage::Authorize).unwrap();
        assert_eq!(dispatch_stage(slot, &mut request), Verdict::Fail);
    }

    #[test]
    fn test_malformed_reply_maps_to_fail() {
        let mut table = authorize_table();
        bind_authorize(&mut table, StageDelegate::from_fn(write_garbage));

        let mut request = RequestContext::new();
        let slot = table.slot(Stage::Authorize).unwrap();
        assert_eq!(dispatch_stage(slot, &mut request), Verdict::Fail);
        assert!(request.reply().is_empty());
    }

    #[test]
    fn test_overflowing_reply_claim_maps_to_fail() {
        let mut table = authorize_table();
        bind_authorize(&mut table, StageDelegate::from_fn(claim_overflow));

        let mut request = RequestContext::new();
        let slot = table.slot(Stage::Authorize).unwrap();
        assert_eq!(dispatch_stage(slot, &mut request), Verdict::Fail);
    }
}
