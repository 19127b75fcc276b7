//! Best-effort binding of configured stage targets.

use crate::abi::ContextToken;
use crate::error::{HostError, Result};
use crate::hosting::RuntimeHost;
use crate::table::EntryPointTable;
use tracing::{debug, error};

/// What one binding pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindSummary {
    pub bound: usize,
    pub failed: usize,
}

/// Binds every configured slot, each independently: a target the
/// runtime cannot resolve is logged and left unbound while the rest of
/// the batch proceeds. Nothing is rolled back.
///
/// Only a missing create-delegate capability aborts the batch, since
/// every remaining slot would fail the same way.
pub fn bind_all(
    host: &dyn RuntimeHost,
    context: ContextToken,
    table: &mut EntryPointTable,
) -> Result<BindSummary> {
    let mut summary = BindSummary::default();
    for slot in table.slots_mut() {
        let Some(target) = slot.target().cloned() else {
            continue;
        };
        let stage = slot.stage();
        debug!(%stage, %target, "binding stage delegate");
        match host.create_delegate(context, &target) {
            Ok(delegate) => {
                slot.bind(delegate);
                summary.bound += 1;
                debug!(%stage, "stage delegate bound");
            }
            Err(e @ HostError::MissingSymbol { .. }) => return Err(e),
            Err(e) => {
                error!(%stage, error = %e, "failed to bind stage delegate");
                summary.failed += 1;
            }
        }
    }
    Ok(summary)
}
