//! The per-stage entry-point table.

use crate::abi::StageDelegate;
use radnet_core::config::{BridgeConfig, Result as ConfigResult};
use radnet_core::{DelegateTarget, Stage};

/// One stage's slot: the configured target, if any, and the delegate
/// once binding succeeds.
///
/// The states are exactly the dispatch contract: no target means the
/// stage is disabled; a target without a delegate means binding has
/// not happened or failed; dispatch must no-op in both cases.
#[derive(Debug)]
pub struct EntryPointSlot {
    stage: Stage,
    target: Option<DelegateTarget>,
    delegate: Option<StageDelegate>,
}

impl EntryPointSlot {
    fn new(stage: Stage, target: Option<DelegateTarget>) -> Self {
        Self {
            stage,
            target,
            delegate: None,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn target(&self) -> Option<&DelegateTarget> {
        self.target.as_ref()
    }

    pub fn delegate(&self) -> Option<StageDelegate> {
        self.delegate
    }

    /// True when configuration selected a function for this stage.
    pub fn is_configured(&self) -> bool {
        self.target.is_some()
    }

    /// True once the binder resolved the target into a delegate.
    pub fn is_bound(&self) -> bool {
        self.delegate.is_some()
    }

    pub(crate) fn bind(&mut self, delegate: StageDelegate) {
        self.delegate = Some(delegate);
    }
}

/// All slots, in pipeline order.
#[derive(Debug)]
pub struct EntryPointTable {
    slots: Vec<EntryPointSlot>,
}

impl EntryPointTable {
    /// Lays the table out from resolved configuration, one slot per
    /// stage in pipeline order.
    pub fn from_config(config: &BridgeConfig) -> ConfigResult<Self> {
        let slots = config
            .resolve_targets()?
            .into_iter()
            .map(|(stage, target)| EntryPointSlot::new(stage, target))
            .collect();
        Ok(Self { slots })
    }

    pub fn slot(&self, stage: Stage) -> Option<&EntryPointSlot> {
        self.slots.iter().find(|slot| slot.stage() == stage)
    }

    pub fn slots(&self) -> &[EntryPointSlot] {
        &self.slots
    }

    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = &mut EntryPointSlot> {
        self.slots.iter_mut()
    }

    /// How many stages have a configured target.
    pub fn configured_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.is_configured())
            .count()
    }

    /// How many stages are actually bound.
    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_bound()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn table_with_authorize() -> EntryPointTable {
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

    #[test]
    fn test_table_covers_every_stage_in_order() {
        let table = table_with_authorize();
        assert_eq!(table.slots().len(), Stage::ALL.len());
        for (slot, &stage) in table.slots().iter().zip(Stage::ALL) {
            assert_eq!(slot.stage(), stage);
        }
    }

    #[test]
    fn test_slot_states() {
        let mut table = table_with_authorize();
        assert_eq!(table.configured_count(), 1);
        assert_eq!(table.bound_count(), 0);

        let authorize = table.slot(Stage::Authorize).unwrap();
        assert!(authorize.is_configured());
        assert!(!authorize.is_bound());
        assert!(authorize.delegate().is_none());

        let accounting = table.slot(Stage::Accounting).unwrap();
        assert!(!accounting.is_configured());

        for slot in table.slots_mut() {
            if slot.stage() == Stage::Authorize {
                slot.bind(StageDelegate::from_fn(quiet_ok));
            }
        }
        assert_eq!(table.bound_count(), 1);
        assert!(table.slot(Stage::Authorize).unwrap().is_bound());
    }
}
